//! Where case pages come from: the live site or a saved snapshot.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use property_map_scraper::{HtmlTableScraper, ScrapeConfig};

use crate::{CaseError, CaseSeries, parse_series, region_slug};

/// Default selector for the date column.
pub const DEFAULT_DATE_SELECTOR: &str = "td.COL1.DATE";
/// Default selector for the cumulative count column.
pub const DEFAULT_COUNT_SELECTOR: &str = "td.COL4.CASES";

/// Retrieves the cumulative case series for a region.
#[async_trait]
pub trait CaseSeriesSource: Send + Sync {
    /// Short label for log lines (e.g. `"live"`).
    fn name(&self) -> &str;

    /// Fetches and parses the series for `region`.
    ///
    /// A page with no parseable rows is an empty series, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError`] if the page cannot be fetched or read.
    async fn fetch(&self, region: &str) -> Result<CaseSeries, CaseError>;
}

/// Column selectors and table year shared by both sources.
#[derive(Debug, Clone)]
pub struct CasePageFormat {
    scraper: HtmlTableScraper,
    year: i32,
}

impl CasePageFormat {
    #[must_use]
    pub fn new(date_selector: &str, count_selector: &str, year: i32) -> Self {
        Self {
            scraper: HtmlTableScraper::new(date_selector, count_selector),
            year,
        }
    }

    /// Parses a page into a series.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Scrape`] if a selector is invalid.
    pub fn parse(&self, html: &str) -> Result<CaseSeries, CaseError> {
        let pairs = self.scraper.extract(html)?;
        Ok(parse_series(&pairs, self.year))
    }
}

impl Default for CasePageFormat {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_SELECTOR, DEFAULT_COUNT_SELECTOR, 2021)
    }
}

/// Snapshot file for a region inside `dir`.
#[must_use]
pub fn snapshot_path(dir: &Path, region: &str) -> PathBuf {
    dir.join(format!("{}.html", region_slug(region)))
}

/// Fetches `{base_url}/{slug}` over HTTP.
pub struct LiveCaseSource {
    client: reqwest::Client,
    base_url: String,
    format: CasePageFormat,
    scraper: HtmlTableScraper,
    snapshot_dir: Option<PathBuf>,
}

impl LiveCaseSource {
    /// Creates a live source.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Scrape`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        format: CasePageFormat,
        config: ScrapeConfig,
    ) -> Result<Self, CaseError> {
        let client = config.build_client()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            scraper: format.scraper.clone().with_config(config),
            format,
            snapshot_dir: None,
        })
    }

    /// Also saves every fetched page to `dir` as `{slug}.html`.
    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: PathBuf) -> Self {
        self.snapshot_dir = Some(dir);
        self
    }

    /// URL of a region's page.
    #[must_use]
    pub fn url_for(&self, region: &str) -> String {
        format!("{}/{}", self.base_url, region_slug(region))
    }
}

#[async_trait]
impl CaseSeriesSource for LiveCaseSource {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn fetch(&self, region: &str) -> Result<CaseSeries, CaseError> {
        let url = self.url_for(region);
        let html = self.scraper.fetch(&self.client, &url).await?;

        if let Some(dir) = &self.snapshot_dir {
            tokio::fs::create_dir_all(dir).await?;
            let path = snapshot_path(dir, region);
            tokio::fs::write(&path, &html).await?;
            log::debug!("Saved {url} to {}", path.display());
        }

        self.format.parse(&html)
    }
}

/// Reads `{dir}/{slug}.html` saved by an earlier live run.
pub struct SnapshotCaseSource {
    dir: PathBuf,
    format: CasePageFormat,
}

impl SnapshotCaseSource {
    #[must_use]
    pub const fn new(dir: PathBuf, format: CasePageFormat) -> Self {
        Self { dir, format }
    }
}

#[async_trait]
impl CaseSeriesSource for SnapshotCaseSource {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn fetch(&self, region: &str) -> Result<CaseSeries, CaseError> {
        let path = snapshot_path(&self.dir, region);
        let html = tokio::fs::read_to_string(&path).await?;
        self.format.parse(&html)
    }
}
