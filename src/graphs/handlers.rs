use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{
    app_state::AppState,
    fetcher::FetchError,
    generator::{GenerateError, GenerateOptions},
    graph::ParseResult,
    graphs::dtos::{DetectRequest, DetectResponse, ErrorResponse, GenerateRequest},
};

pub fn error_status(err: &GenerateError) -> StatusCode {
    match err {
        GenerateError::Fetch(
            FetchError::InvalidUrl(_) | FetchError::BlockedUrl(_) | FetchError::NotDocumentationUrl(_),
        ) => StatusCode::BAD_REQUEST,
        GenerateError::Fetch(FetchError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        GenerateError::BrowserUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        GenerateError::Fetch(_) => StatusCode::BAD_GATEWAY,
    }
}

#[utoipa::path(
    post,
    path = "/v1/graphs",
    tag = "graphs",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Graph extracted", body = ParseResult),
        (status = 400, description = "Invalid, blocked or non-documentation URL", body = ErrorResponse),
        (status = 502, description = "Upstream fetch failed", body = ErrorResponse),
        (status = 504, description = "Upstream fetch timed out", body = ErrorResponse)
    )
)]
pub async fn create_graph(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let options = GenerateOptions {
        render_js: payload.render_js,
        bypass_cache: payload.bypass_cache,
    };

    match state.generator.generate(payload.url.trim(), options).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            warn!(url = %payload.url, error = %err, "graph generation failed");
            (
                error_status(&err),
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/graphs/detect",
    tag = "graphs",
    request_body = DetectRequest,
    responses(
        (status = 200, description = "Strategy that would handle the page", body = DetectResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn detect_strategy(
    State(state): State<AppState>,
    Json(payload): Json<DetectRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let parser = state.generator.parser();
    let response = DetectResponse {
        strategy: parser.detect_strategy(&payload.html, &payload.url).to_string(),
        available: parser
            .available_strategies()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

#[utoipa::path(
    delete,
    path = "/v1/cache",
    tag = "cache",
    responses(
        (status = 204, description = "Cache cleared")
    )
)]
pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.cache().clear();
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::HtmlCache,
        fetcher::{Fetcher, FetcherConfig},
        generator::Generator,
        parser::DocumentationParser,
    };
    use axum::{
        Router,
        body::Body,
        http::Request,
        routing::{delete, post},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let fetcher = Fetcher::new(FetcherConfig::default()).unwrap();
        AppState::new(Generator::new(
            Arc::new(HtmlCache::default()),
            fetcher,
            DocumentationParser::default(),
            1,
        ))
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/v1/graphs", post(create_graph))
            .route("/v1/graphs/detect", post(detect_strategy))
            .route("/v1/cache", delete(clear_cache))
            .with_state(state)
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_graph_from_cached_page() {
        let state = test_state();
        state.cache().set(
            "https://docs.github.com/en/actions",
            r#"<nav><ul><li><a href="/en/actions">GitHub Actions</a>
                <ul><li><a href="/en/actions/workflows">Workflows</a></li></ul></li></ul></nav>"#,
        );

        let response = app(state)
            .oneshot(json_request(
                "/v1/graphs",
                serde_json::json!({ "url": "https://docs.github.com/en/actions" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["metadata"]["strategy"], "template");
        assert_eq!(body["metadata"]["source_url"], "https://docs.github.com/en/actions");
        assert_eq!(body["nodes"][0]["type"], "product");
        assert_eq!(body["edges"][0]["type"], "hierarchy");
    }

    #[tokio::test]
    async fn test_create_graph_rejects_blocked_url() {
        let response = app(test_state())
            .oneshot(json_request(
                "/v1/graphs",
                serde_json::json!({ "url": "https://192.168.0.10/docs" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("blocked"));
    }

    #[tokio::test]
    async fn test_create_graph_rejects_empty_url() {
        let response = app(test_state())
            .oneshot(json_request("/v1/graphs", serde_json::json!({ "url": "" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_detect_strategy() {
        let response = app(test_state())
            .oneshot(json_request(
                "/v1/graphs/detect",
                serde_json::json!({
                    "html": "<h1>Guides</h1>",
                    "url": "https://example.com/docs"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["strategy"], "html");
        assert_eq!(
            body["available"],
            serde_json::json!(["template", "schema", "html", "heuristic"])
        );
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let state = test_state();
        state.cache().set("https://docs.example.com", "<h1>Docs</h1>");

        let request = Request::builder()
            .method("DELETE")
            .uri("/v1/cache")
            .body(Body::empty())
            .unwrap();
        let response = app(state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.cache().is_empty());
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (FetchError::InvalidUrl("x".into()), StatusCode::BAD_REQUEST),
            (FetchError::BlockedUrl("x".into()), StatusCode::BAD_REQUEST),
            (FetchError::NotDocumentationUrl("x".into()), StatusCode::BAD_REQUEST),
            (FetchError::NotFound, StatusCode::BAD_GATEWAY),
            (FetchError::RateLimited, StatusCode::BAD_GATEWAY),
            (FetchError::TooManyRedirects(3), StatusCode::BAD_GATEWAY),
            (FetchError::Browser("crashed".into()), StatusCode::BAD_GATEWAY),
            (FetchError::Timeout, StatusCode::GATEWAY_TIMEOUT),
        ];

        for (err, status) in cases {
            assert_eq!(error_status(&GenerateError::Fetch(err)), status);
        }
        assert_eq!(
            error_status(&GenerateError::BrowserUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
