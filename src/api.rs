use axum::{
    Json, Router, middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::{
    app_state::AppState,
    graph::{
        EdgeType, ExtractedEdge, ExtractedNode, GenerationMetadata, GenerationStats,
        InferenceMethod, Link, NodeData, NodeType, ParseResult,
    },
    graphs::{
        dtos::{DetectRequest, DetectResponse, ErrorResponse, GenerateRequest},
        handlers::{clear_cache, create_graph, detect_strategy},
    },
    health::{HealthResponse, health_check},
    middleware::rate_limit::{RateLimit, rate_limit_middleware},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::health::health_check,
        crate::graphs::handlers::create_graph,
        crate::graphs::handlers::detect_strategy,
        crate::graphs::handlers::clear_cache,
    ),
    components(schemas(
        HealthResponse,
        ErrorResponse,
        GenerateRequest,
        DetectRequest,
        DetectResponse,
        ParseResult,
        ExtractedNode,
        ExtractedEdge,
        NodeData,
        NodeType,
        EdgeType,
        InferenceMethod,
        Link,
        GenerationMetadata,
        GenerationStats,
    )),
    tags(
        (name = "graphs", description = "Documentation graph extraction"),
        (name = "cache", description = "Fetched page cache"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// The `/v1` routes behind the per-IP rate limit, plus health and the OpenAPI document.
///
/// The rate limit reads the peer address, so serve with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn router(state: AppState, rate_limit: RateLimit) -> Router {
    let v1 = Router::new()
        .route("/v1/graphs", post(create_graph))
        .route("/v1/graphs/detect", post(detect_strategy))
        .route("/v1/cache", delete(clear_cache))
        .route_layer(middleware::from_fn_with_state(rate_limit, rate_limit_middleware));

    Router::new()
        .route("/healthz", get(health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(v1)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
