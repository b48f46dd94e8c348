//! One-shot extraction: `docmap <url> [--render-js]` prints the graph as JSON.

use anyhow::{Context, Result, bail};
use docmap::{app_state::AppState, config::Config, generator::GenerateOptions};

fn usage() -> &'static str {
    "usage: docmap <url> [--render-js]"
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut url = None;
    let mut options = GenerateOptions::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--render-js" => options.render_js = true,
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{}", usage()),
            _ if url.is_some() => bail!("{}", usage()),
            _ => url = Some(arg.clone()),
        }
    }
    let Some(url) = url else {
        bail!("{}", usage());
    };

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;
    let result = state
        .generator
        .generate(&url, options)
        .await
        .with_context(|| format!("failed to generate graph for {url}"))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
