use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};

/// A fetched page held as raw HTML. The parsed DOM is rebuilt per query
/// because `scraper::Html` is not `Send` and these values cross await
/// points inside the engine.
#[derive(Clone, Debug)]
pub struct StaticPage {
    html: String,
}

impl StaticPage {
    pub fn from_html(html: &str) -> Self {
        Self {
            html: html.to_string(),
        }
    }

    /// GET a deployed page. Anything but a 200 with a body is a load
    /// failure.
    pub async fn fetch(client: &Client, url: &str) -> Result<Self> {
        let resp = client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetch {url}"))?;
        let status = resp.status().as_u16();
        if status != 200 {
            bail!("page returned {status}");
        }
        let html = resp.text().await.context("read page body")?;
        if html.trim().is_empty() {
            bail!("page body is empty");
        }
        Ok(Self { html })
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Count elements matching a CSS selector. An unparsable selector is a
    /// check-definition bug, reported as an error rather than a zero count.
    pub fn count(&self, selector: &str) -> Result<usize> {
        let sel = Selector::parse(selector)
            .map_err(|e| anyhow!("bad selector {selector:?}: {e:?}"))?;
        let doc = Html::parse_document(&self.html);
        Ok(doc.select(&sel).count())
    }

    /// Look for a clickable element whose label matches any of the given
    /// texts, case-insensitively. Covers `<button>`, submit/button inputs
    /// and anchor/role buttons.
    pub fn has_button_with_text(&self, texts: &[String]) -> Result<bool> {
        let doc = Html::parse_document(&self.html);
        let buttons = Selector::parse("button, a, [role=\"button\"]")
            .map_err(|e| anyhow!("selector error: {e:?}"))?;
        let inputs = Selector::parse("input[type=\"button\"], input[type=\"submit\"]")
            .map_err(|e| anyhow!("selector error: {e:?}"))?;

        let wanted: Vec<String> = texts.iter().map(|t| t.to_lowercase()).collect();
        let matches = |label: &str| {
            let label = label.to_lowercase();
            wanted.iter().any(|t| label.contains(t))
        };

        for el in doc.select(&buttons) {
            let label: String = el.text().collect::<String>();
            if matches(label.trim()) {
                return Ok(true);
            }
        }
        for el in doc.select(&inputs) {
            if let Some(value) = el.value().attr("value") {
                if matches(value.trim()) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

}

/// Resolve a sibling artifact (LICENSE, README.md) relative to a deployed
/// page URL.
pub fn sibling_url(pages_url: &str, name: &str) -> String {
    let base = pages_url
        .strip_suffix("index.html")
        .unwrap_or(pages_url)
        .trim_end_matches('/');
    format!("{base}/{name}")
}

/// Fetch a text artifact next to the page; `Ok(None)` means a clean 404.
pub async fn fetch_sibling(client: &Client, pages_url: &str, name: &str) -> Result<Option<String>> {
    let url = sibling_url(pages_url, name);
    let resp = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("fetch {url}"))?;
    if resp.status().as_u16() == 404 {
        return Ok(None);
    }
    if resp.status().as_u16() != 200 {
        bail!("artifact {name} returned {}", resp.status());
    }
    Ok(Some(resp.text().await.context("read artifact body")?))
}
