use url::Url;

use crate::fetcher::{client::FetcherConfig, errors::FetchError};

#[cfg(feature = "browser")]
pub async fn render(url: &Url, config: &FetcherConfig) -> Result<String, FetchError> {
    use chromiumoxide::{Browser, BrowserConfig};
    use futures::StreamExt;
    use tracing::debug;

    let browser_config = BrowserConfig::builder()
        .no_sandbox()
        .arg("--disable-dev-shm-usage")
        .request_timeout(config.browser_timeout)
        .build()
        .map_err(FetchError::BrowserLaunch)?;

    let (mut browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| FetchError::BrowserLaunch(e.to_string()))?;

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let outcome = tokio::time::timeout(
        config.browser_timeout,
        render_page(&browser, url, config.browser_settle),
    )
    .await;

    // The process is released whatever `outcome` holds. If this future is dropped
    // early, `Browser`'s own drop kills the child instead.
    shut_down(&mut browser).await;
    handler_task.abort();
    debug!("browser closed");

    match outcome {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout),
    }
}

/// The parts of a launched browser that teardown needs.
#[cfg(feature = "browser")]
trait BrowserProcess {
    async fn close(&mut self) -> Result<(), String>;
    async fn kill(&mut self) -> Option<std::io::Result<()>>;
    async fn wait(&mut self) -> std::io::Result<()>;
}

#[cfg(feature = "browser")]
impl BrowserProcess for chromiumoxide::Browser {
    async fn close(&mut self) -> Result<(), String> {
        chromiumoxide::Browser::close(self)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn kill(&mut self) -> Option<std::io::Result<()>> {
        chromiumoxide::Browser::kill(self).await
    }

    async fn wait(&mut self) -> std::io::Result<()> {
        chromiumoxide::Browser::wait(self).await.map(|_| ())
    }
}

/// Asks the browser to exit, kills it when that fails, then reaps the process.
#[cfg(feature = "browser")]
async fn shut_down<B: BrowserProcess>(browser: &mut B) {
    use tracing::warn;

    if let Err(err) = browser.close().await {
        warn!(error = %err, "browser did not close, killing process");
        if let Some(Err(err)) = browser.kill().await {
            warn!(error = %err, "failed to kill browser process");
        }
    }
    if let Err(err) = browser.wait().await {
        warn!(error = %err, "failed to reap browser process");
    }
}

#[cfg(feature = "browser")]
async fn render_page(
    browser: &chromiumoxide::Browser,
    url: &Url,
    settle: std::time::Duration,
) -> Result<String, FetchError> {
    let page = browser
        .new_page(url.as_str())
        .await
        .map_err(|e| FetchError::Browser(e.to_string()))?;

    page.wait_for_navigation()
        .await
        .map_err(|e| FetchError::Browser(e.to_string()))?;

    // client-side navigation usually finishes rendering shortly after load
    tokio::time::sleep(settle).await;

    page.content()
        .await
        .map_err(|e| FetchError::Browser(e.to_string()))
}

#[cfg(not(feature = "browser"))]
pub async fn render(_url: &Url, _config: &FetcherConfig) -> Result<String, FetchError> {
    Err(FetchError::BrowserLaunch(
        "browser support not compiled in".to_string(),
    ))
}
