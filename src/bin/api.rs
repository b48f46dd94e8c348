use anyhow::Result;
use docmap::{api, app_state::AppState, config::Config, middleware::rate_limit::RateLimit};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;
    let rate_limit = RateLimit::new(config.rate_limit_max_requests(), config.rate_limit_window_secs());
    let app = api::router(state, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = config.bind_addr(), "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
