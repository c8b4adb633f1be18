use std::time::Duration;

use anyhow::{bail, Context, Result};
use fantoccini::{Client as BrowserClient, ClientBuilder, Locator};
use tokio::time::{sleep, timeout};
use tracing::warn;

/// What a click attempt observed. `EffectConfirmed` means the DOM changed
/// after the click; `ClickedOnly` means the click landed but nothing
/// visibly happened within the settle window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickObservation {
    EffectConfirmed,
    ClickedOnly,
    TargetMissing,
}

/// A live WebDriver session pointed at one deployed page.
pub struct InteractiveSession {
    browser: BrowserClient,
}

impl InteractiveSession {
    /// Open a session against a WebDriver endpoint and navigate to the
    /// page, bounded by `page_timeout`.
    pub async fn open(webdriver_url: &str, url: &str, page_timeout: Duration) -> Result<Self> {
        let browser = ClientBuilder::rustls()
            .connect(webdriver_url)
            .await
            .with_context(|| format!("connect webdriver {webdriver_url}"))?;
        let session = Self { browser };
        match timeout(page_timeout, session.browser.goto(url)).await {
            Ok(Ok(())) => Ok(session),
            Ok(Err(e)) => {
                session.close().await;
                Err(e).with_context(|| format!("navigate to {url}"))
            }
            Err(_) => {
                session.close().await;
                bail!("page load timed out after {page_timeout:?}")
            }
        }
    }

    pub async fn count(&self, selector: &str) -> Result<usize> {
        let elements = self
            .browser
            .find_all(Locator::Css(selector))
            .await
            .with_context(|| format!("find {selector:?}"))?;
        Ok(elements.len())
    }

    pub async fn has_button_with_text(&self, texts: &[String]) -> Result<bool> {
        let wanted: Vec<String> = texts.iter().map(|t| t.to_lowercase()).collect();
        let candidates = self
            .browser
            .find_all(Locator::Css(
                "button, a, [role=\"button\"], input[type=\"button\"], input[type=\"submit\"]",
            ))
            .await
            .context("find button candidates")?;
        for el in candidates {
            let mut label = el.text().await.unwrap_or_default();
            if label.trim().is_empty() {
                if let Ok(Some(value)) = el.attr("value").await {
                    label = value;
                }
            }
            let label = label.trim().to_lowercase();
            if wanted.iter().any(|t| label.contains(t)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Click the first match and watch for a DOM reaction within the
    /// settle window.
    pub async fn click_and_observe(&self, selector: &str) -> Result<ClickObservation> {
        let Some(target) = self
            .browser
            .find_all(Locator::Css(selector))
            .await
            .with_context(|| format!("find {selector:?}"))?
            .into_iter()
            .next()
        else {
            return Ok(ClickObservation::TargetMissing);
        };

        let before = self.browser.source().await.context("snapshot page")?;
        target.click().await.with_context(|| format!("click {selector:?}"))?;
        sleep(Duration::from_millis(500)).await;
        let after = self.browser.source().await.context("snapshot page")?;

        Ok(if before != after {
            ClickObservation::EffectConfirmed
        } else {
            ClickObservation::ClickedOnly
        })
    }

    /// Resize through each breakpoint and verify the page body still
    /// renders within the window. Returns the fraction of breakpoints that
    /// held up.
    pub async fn responsive_score(&self, breakpoints: &[u32]) -> Result<f64> {
        if breakpoints.is_empty() {
            return Ok(1.0);
        }
        let mut passed = 0usize;
        for &width in breakpoints {
            self.browser
                .set_window_size(width, 800)
                .await
                .with_context(|| format!("resize to {width}px"))?;
            sleep(Duration::from_millis(200)).await;
            let body = self
                .browser
                .find(Locator::Css("body"))
                .await
                .context("find body")?;
            let (_, _, body_width, _) = body.rectangle().await.context("measure body")?;
            // small slack for scrollbars
            if body_width > 0.0 && body_width <= f64::from(width) + 20.0 {
                passed += 1;
            }
        }
        Ok(passed as f64 / breakpoints.len() as f64)
    }

    /// Best-effort teardown; a leaked session only costs the WebDriver host.
    pub async fn close(self) {
        if let Err(e) = self.browser.close().await {
            warn!("webdriver session close failed: {e}");
        }
    }
}
