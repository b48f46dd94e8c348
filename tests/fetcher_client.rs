use docmap::fetcher::{FetchError, Fetcher, FetcherConfig};
use flate2::{Compression, write::GzEncoder};
use std::{io::Write, time::Duration};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn local_fetcher(mock_server: &MockServer) -> Fetcher {
    Fetcher::new(FetcherConfig::default())
        .unwrap()
        .with_trusted_origin(&mock_server.uri())
        .unwrap()
}

fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(body.as_bytes())
        .insert_header("Content-Type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(html_response(
            "<html><head><title>Docs</title></head><body><h1>Hello World</h1></body></html>",
        ))
        .mount(&mock_server)
        .await;

    let url = format!("{}/docs", mock_server.uri());
    let result = local_fetcher(&mock_server).fetch_documentation(&url).await.unwrap();

    assert_eq!(result.status, 200);
    assert!(result.html.contains("Hello World"));
    assert_eq!(result.final_url.as_str(), url);
    assert_eq!(result.redirects, 0);
    assert_eq!(result.charset, "UTF-8");
    assert!(!result.rendered);
}

#[tokio::test]
async fn test_fetch_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/notfound", mock_server.uri());
    let err = local_fetcher(&mock_server).fetch_documentation(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::NotFound));
    assert!(!err.should_retry());
}

#[tokio::test]
async fn test_fetch_403_and_429() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let fetcher = local_fetcher(&mock_server);

    let forbidden = fetcher
        .fetch_documentation(&format!("{}/private", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(forbidden, FetchError::Forbidden));
    assert!(!forbidden.should_retry());

    let limited = fetcher
        .fetch_documentation(&format!("{}/busy", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(limited, FetchError::RateLimited));
    assert!(limited.should_retry());
}

#[tokio::test]
async fn test_fetch_500_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let url = format!("{}/error", mock_server.uri());
    let err = local_fetcher(&mock_server).fetch_documentation(&url).await.unwrap_err();

    match &err {
        FetchError::Http { status } => assert_eq!(status.as_u16(), 500),
        other => panic!("Expected HTTP 500 error, got {other:?}"),
    }
    assert!(err.should_retry());
}

#[tokio::test]
async fn test_follows_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_response("<h1>Moved</h1>"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/old", mock_server.uri());
    let result = local_fetcher(&mock_server).fetch_documentation(&url).await.unwrap();

    assert_eq!(result.url.as_str(), url);
    assert_eq!(result.final_url.path(), "/new");
    assert_eq!(result.redirects, 1);
    assert!(result.html.contains("Moved"));
}

#[tokio::test]
async fn test_redirect_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let url = format!("{}/loop", mock_server.uri());
    let err = local_fetcher(&mock_server).fetch_documentation(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::TooManyRedirects(3)));
}

#[tokio::test]
async fn test_redirect_without_location() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nowhere"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&mock_server)
        .await;

    let url = format!("{}/nowhere", mock_server.uri());
    let err = local_fetcher(&mock_server).fetch_documentation(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::MissingLocation));
}

#[tokio::test]
async fn test_gzip_body_is_decompressed() {
    let mock_server = MockServer::start().await;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"<nav><ul><li>Compressed Docs</li></ul></nav>").unwrap();
    let compressed = encoder.finish().unwrap();

    Mock::given(method("GET"))
        .and(path("/gzip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed)
                .insert_header("Content-Type", "text/html; charset=utf-8")
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/gzip", mock_server.uri());
    let result = local_fetcher(&mock_server).fetch_documentation(&url).await.unwrap();

    assert!(result.html.contains("Compressed Docs"));
}

#[tokio::test]
async fn test_legacy_charset_is_decoded() {
    let mock_server = MockServer::start().await;

    let mut body = b"<h1>Caf".to_vec();
    body.push(0xE9);
    body.extend_from_slice(b" Guide</h1>");

    Mock::given(method("GET"))
        .and(path("/latin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("Content-Type", "text/html; charset=windows-1252"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/latin", mock_server.uri());
    let result = local_fetcher(&mock_server).fetch_documentation(&url).await.unwrap();

    assert!(result.html.contains("Café Guide"));
    assert_eq!(result.charset, "windows-1252");
}

#[tokio::test]
async fn test_unsupported_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.7".to_vec())
                .insert_header("Content-Type", "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/manual.pdf", mock_server.uri());
    let err = local_fetcher(&mock_server).fetch_documentation(&url).await.unwrap_err();

    match err {
        FetchError::UnsupportedContentType(ct) => assert_eq!(ct, "application/pdf"),
        other => panic!("Expected unsupported content type, got {other:?}"),
    }
}

#[tokio::test]
async fn test_body_too_large() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(html_response(&"x".repeat(100)))
        .mount(&mock_server)
        .await;

    let config = FetcherConfig {
        max_body_size: 16,
        ..FetcherConfig::default()
    };
    let fetcher = Fetcher::new(config)
        .unwrap()
        .with_trusted_origin(&mock_server.uri())
        .unwrap();

    let url = format!("{}/huge", mock_server.uri());
    let err = fetcher.fetch_documentation(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::BodyTooLarge(100)));
}

#[tokio::test]
async fn test_redirect_to_private_host_is_blocked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/escape"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://10.0.0.1/admin"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/escape", mock_server.uri());
    let err = local_fetcher(&mock_server).fetch_documentation(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::BlockedUrl(_)), "{err:?}");
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_response("<h1>Too late</h1>").set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let config = FetcherConfig {
        timeout: Duration::from_millis(200),
        ..FetcherConfig::default()
    };
    let fetcher = Fetcher::new(config)
        .unwrap()
        .with_trusted_origin(&mock_server.uri())
        .unwrap();

    let url = format!("{}/slow", mock_server.uri());
    let err = fetcher.fetch_documentation(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout), "{err:?}");
    assert!(err.should_retry());
}

#[tokio::test]
async fn test_guard_rejects_mock_server_and_private_hosts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html_response("<h1>never served</h1>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new(FetcherConfig::default()).unwrap();

    // plain http on loopback
    let err = fetcher
        .fetch_documentation(&format!("{}/docs", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
    assert!(err.is_client_error());

    for url in [
        "https://localhost/docs",
        "https://127.0.0.1/docs",
        "https://10.0.0.1/docs",
        "https://172.16.5.4/docs",
        "https://192.168.1.1/docs",
        "https://[::1]/docs",
        "https://0.0.0.0/docs",
    ] {
        let err = fetcher.fetch_documentation(url).await.unwrap_err();
        assert!(matches!(err, FetchError::BlockedUrl(_)), "{url}: {err:?}");
    }

    let err = fetcher.fetch_documentation("not a url").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}

#[tokio::test]
async fn test_browser_fetch_rejects_non_documentation_url() {
    let fetcher = Fetcher::new(FetcherConfig::default()).unwrap();

    let err = fetcher
        .fetch_with_browser("https://example.com/pricing")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotDocumentationUrl(_)));
    assert!(err.is_client_error());
}
