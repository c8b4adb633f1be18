use std::time::Duration;

use anyhow::Result;
use tracing::warn;

use crate::interactive::{ClickObservation, InteractiveSession};
use crate::static_dom::StaticPage;

/// How a page is inspected. Interactive sessions can click and resize;
/// the static fallback only sees the served HTML.
pub enum PageBackend {
    Interactive(InteractiveSession),
    Static(StaticPage),
}

impl PageBackend {
    /// Prefer a WebDriver session; degrade to the already-fetched HTML
    /// when none is configured or the session cannot be opened.
    pub async fn open(
        webdriver_url: Option<&str>,
        pages_url: &str,
        fallback: StaticPage,
        page_timeout: Duration,
    ) -> Self {
        if let Some(webdriver_url) = webdriver_url {
            match InteractiveSession::open(webdriver_url, pages_url, page_timeout).await {
                Ok(session) => return PageBackend::Interactive(session),
                Err(e) => {
                    warn!("interactive backend unavailable, using static fallback: {e:?}");
                }
            }
        }
        PageBackend::Static(fallback)
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, PageBackend::Interactive(_))
    }

    pub async fn count(&self, selector: &str) -> Result<usize> {
        match self {
            PageBackend::Interactive(session) => session.count(selector).await,
            PageBackend::Static(page) => page.count(selector),
        }
    }

    pub async fn has_button_with_text(&self, texts: &[String]) -> Result<bool> {
        match self {
            PageBackend::Interactive(session) => session.has_button_with_text(texts).await,
            PageBackend::Static(page) => page.has_button_with_text(texts),
        }
    }

    /// Static pages cannot click; `None` tells the engine to score the
    /// check neutrally.
    pub async fn click_and_observe(&self, selector: &str) -> Result<Option<ClickObservation>> {
        match self {
            PageBackend::Interactive(session) => {
                Ok(Some(session.click_and_observe(selector).await?))
            }
            PageBackend::Static(_) => Ok(None),
        }
    }

    pub async fn responsive_score(&self, breakpoints: &[u32]) -> Result<Option<f64>> {
        match self {
            PageBackend::Interactive(session) => {
                Ok(Some(session.responsive_score(breakpoints).await?))
            }
            PageBackend::Static(_) => Ok(None),
        }
    }

    pub async fn close(self) {
        if let PageBackend::Interactive(session) = self {
            session.close().await;
        }
    }
}
