//! Headless Chromium render surface
//!
//! Drives a browser over the Chrome DevTools Protocol. Each
//! [`PageSession`] maps to one browser page, opened for one URL and closed
//! after use.

use crate::render::{PageSession, RenderError, RenderResult, RenderSurface};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Interval between element-presence polls while waiting for a selector
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A shared headless browser that mints one page per URL
pub struct ChromeSurface {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl ChromeSurface {
    /// Launches a headless browser
    ///
    /// The CDP event handler runs on a background task for the lifetime of
    /// the surface.
    pub async fn launch() -> RenderResult<Self> {
        let config = BrowserConfig::builder()
            .window_size(1920, 1080)
            .build()
            .map_err(RenderError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Closes the browser and stops the event handler
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "failed to close browser cleanly");
        }
        self.handler_task.abort();
    }
}

#[async_trait]
impl RenderSurface for ChromeSurface {
    async fn open_session(&self) -> RenderResult<Box<dyn PageSession>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;

        Ok(Box::new(ChromeSession { page: Some(page) }))
    }
}

/// One browser page, used for exactly one URL
struct ChromeSession {
    page: Option<Page>,
}

impl ChromeSession {
    fn page(&self) -> RenderResult<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| RenderError::Browser("session already closed".to_string()))
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> RenderResult<()> {
        let page = self.page()?;

        let navigation = async {
            page.goto(url)
                .await
                .map_err(|e| RenderError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            page.wait_for_navigation()
                .await
                .map_err(|e| RenderError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::Navigation {
                url: url.to_string(),
                message: format!("navigation timed out after {}ms", timeout.as_millis()),
            }),
        }
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> RenderResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let present = self
                .page()?
                .find_element(selector)
                .await
                .is_ok();

            if present {
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(RenderError::WaitTimeout {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }

            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn count(&mut self, selector: &str) -> RenderResult<usize> {
        let count = self
            .page()?
            .find_elements(selector)
            .await
            .map(|elements| elements.len())
            .unwrap_or(0);

        Ok(count)
    }

    async fn attr_values(&mut self, selector: &str, attr: &str) -> RenderResult<Vec<String>> {
        let elements = self
            .page()?
            .find_elements(selector)
            .await
            .unwrap_or_default();

        let mut values = Vec::new();
        for element in elements {
            if let Ok(Some(value)) = element.attribute(attr).await {
                values.push(value);
            }
        }

        Ok(values)
    }

    async fn scroll_to_bottom(&mut self) -> RenderResult<()> {
        self.page()?
            .evaluate(SCROLL_TO_BOTTOM_JS)
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn content(&mut self) -> RenderResult<String> {
        self.page()?
            .content()
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))
    }

    async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::warn!(error = %e, "failed to close page cleanly");
            }
        }
    }
}
