//! HTML table column-pair scraper.
//!
//! Locates two sets of cells by CSS selector (a key column and a value
//! column) and pairs them up in document order. Tables that mark their
//! columns with classes, like `<td class="COL1 DATE">` next to
//! `<td class="COL4 CASES">`, need no row structure to be understood.

use scraper::{ElementRef, Html, Selector};

use crate::{ScrapeConfig, ScrapeError, retry};

/// Scraper that extracts `(key, value)` text pairs from an HTML page.
#[derive(Debug, Clone)]
pub struct HtmlTableScraper {
    /// Request settings for live fetches.
    config: ScrapeConfig,
    /// CSS selector for key cells.
    key_selector: String,
    /// CSS selector for value cells.
    value_selector: String,
}

impl HtmlTableScraper {
    /// Creates a scraper pairing cells matched by `key_selector` with cells
    /// matched by `value_selector`.
    #[must_use]
    pub fn new(key_selector: &str, value_selector: &str) -> Self {
        Self {
            config: ScrapeConfig::default(),
            key_selector: key_selector.to_owned(),
            value_selector: value_selector.to_owned(),
        }
    }

    /// Replaces the request settings.
    #[must_use]
    pub fn with_config(mut self, config: ScrapeConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns a reference to the request settings.
    #[must_use]
    pub const fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Fetches `url` with retry and returns the raw body.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the request fails after all retries.
    pub async fn fetch(&self, client: &reqwest::Client, url: &str) -> Result<String, ScrapeError> {
        log::debug!("Fetching {url}");
        retry::send_text(|| client.get(url), self.config.max_retries).await
    }

    /// Extracts the `(key, value)` pairs from an HTML document.
    ///
    /// Cell text is trimmed. If the two columns have different lengths the
    /// extra cells are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if either selector is invalid.
    pub fn extract(&self, html: &str) -> Result<Vec<(String, String)>, ScrapeError> {
        let key_sel = parse_selector(&self.key_selector)?;
        let value_sel = parse_selector(&self.value_selector)?;
        let document = Html::parse_document(html);

        let keys: Vec<String> = document.select(&key_sel).map(cell_text).collect();
        let values: Vec<String> = document.select(&value_sel).map(cell_text).collect();

        if keys.len() != values.len() {
            log::warn!(
                "Column length mismatch: {} cells for '{}' vs {} for '{}'",
                keys.len(),
                self.key_selector,
                values.len(),
                self.value_selector
            );
        }

        Ok(keys.into_iter().zip(values).collect())
    }
}

/// Parses a CSS selector string, returning a [`ScrapeError`] on failure.
fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_owned()
}
