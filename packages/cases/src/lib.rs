#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-region case figures from scraped cumulative counts.
//!
//! A region's page lists the cumulative case count for each day. The
//! figures attached to every property are differences between a handful of
//! reference dates: the count on the last day, and the average daily
//! increase over the preceding fortnight, month and two months.
//!
//! Series come from a [`source::CaseSeriesSource`] (live pages or saved
//! snapshots) and are collected for all regions at once into a
//! [`table::CaseTable`].

pub mod source;
pub mod table;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use property_map_property_models::CaseFigures;
use serde::{Deserialize, Serialize};

pub use source::{CaseSeriesSource, LiveCaseSource, SnapshotCaseSource};
pub use table::CaseTable;

/// Cumulative count per day for one region.
pub type CaseSeries = BTreeMap<NaiveDate, i64>;

/// Errors that can occur while retrieving a region's series.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    /// Fetching or parsing the page failed.
    #[error("Scrape error: {0}")]
    Scrape(#[from] property_map_scraper::ScrapeError),

    /// Reading or writing a snapshot file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The five dates the figures are differenced between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDates {
    /// Day the point count is taken for.
    pub point: NaiveDate,
    /// Day before `point`; the end of every averaging window.
    pub anchor: NaiveDate,
    /// Start of the 14-day window.
    pub fortnight_start: NaiveDate,
    /// Start of the 30-day window.
    pub month_start: NaiveDate,
    /// Start of the 60-day window.
    pub two_month_start: NaiveDate,
}

impl ReferenceDates {
    /// Sep 30, Sep 29, Sep 16, Aug 31 and Aug 01 of `year`.
    ///
    /// Returns `None` if `year` is outside the supported date range.
    #[must_use]
    pub fn for_year(year: i32) -> Option<Self> {
        Some(Self {
            point: NaiveDate::from_ymd_opt(year, 9, 30)?,
            anchor: NaiveDate::from_ymd_opt(year, 9, 29)?,
            fortnight_start: NaiveDate::from_ymd_opt(year, 9, 16)?,
            month_start: NaiveDate::from_ymd_opt(year, 8, 31)?,
            two_month_start: NaiveDate::from_ymd_opt(year, 8, 1)?,
        })
    }
}

impl Default for ReferenceDates {
    fn default() -> Self {
        Self::for_year(2021).expect("2021 is a valid year")
    }
}

const FORTNIGHT_DAYS: i64 = 14;
const MONTH_DAYS: i64 = 30;
const TWO_MONTH_DAYS: i64 = 60;

/// Computes a region's four figures from its series.
///
/// Returns `None` unless every reference date is present in the series.
#[must_use]
pub fn aggregate(series: &CaseSeries, dates: &ReferenceDates) -> Option<CaseFigures> {
    let at = |date: NaiveDate| series.get(&date).copied();

    let point = at(dates.point)?;
    let anchor = at(dates.anchor)?;
    let fortnight_start = at(dates.fortnight_start)?;
    let month_start = at(dates.month_start)?;
    let two_month_start = at(dates.two_month_start)?;

    Some(CaseFigures {
        point_count: point - anchor,
        fortnight_avg: daily_average(anchor - fortnight_start, FORTNIGHT_DAYS),
        month_avg: daily_average(anchor - month_start, MONTH_DAYS),
        two_month_avg: daily_average(anchor - two_month_start, TWO_MONTH_DAYS),
    })
}

/// `increase / days`, rounded half-to-even.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn daily_average(increase: i64, days: i64) -> i64 {
    (increase as f64 / days as f64).round_ties_even() as i64
}

/// URL path segment for a region: lower-cased, spaces replaced by `-`.
#[must_use]
pub fn region_slug(region: &str) -> String {
    region.to_lowercase().replace(' ', "-")
}

/// Builds a series from scraped `(date, count)` text pairs.
///
/// Dates look like `30 Sep` and are placed in `year`; counts may carry
/// thousands separators (`1,234`). Unparseable rows are skipped. When a
/// date appears twice the first row wins.
#[must_use]
pub fn parse_series(pairs: &[(String, String)], year: i32) -> CaseSeries {
    let mut series = CaseSeries::new();
    let mut skipped = 0usize;

    for (date, count) in pairs {
        match (parse_day(date, year), parse_count(count)) {
            (Some(date), Some(count)) => {
                series.entry(date).or_insert(count);
            }
            _ => {
                log::debug!("Skipping case row ({date:?}, {count:?})");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {skipped} unparseable case rows");
    }
    series
}

fn parse_day(text: &str, year: i32) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{} {year}", text.trim()), "%d %b %Y").ok()
}

fn parse_count(text: &str) -> Option<i64> {
    text.trim().replace(',', "").parse().ok()
}
