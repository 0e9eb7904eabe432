//! Concurrent collection of case figures for every region.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt as _};
use property_map_property_models::CaseFigures;

use crate::{CaseSeriesSource, ReferenceDates, aggregate};

/// Case figures per region name. Regions whose series could not be fetched
/// or lacked a reference date map to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseTable {
    figures: BTreeMap<String, Option<CaseFigures>>,
}

impl CaseTable {
    /// Fetches every distinct region in `regions` with up to `concurrency`
    /// requests in flight and aggregates each series.
    ///
    /// A failed fetch is logged and only affects its own region.
    pub async fn collect<'a>(
        source: &dyn CaseSeriesSource,
        regions: impl IntoIterator<Item = &'a str>,
        dates: &ReferenceDates,
        concurrency: usize,
    ) -> Self {
        let distinct: std::collections::BTreeSet<&str> = regions.into_iter().collect();
        log::info!(
            "Fetching case series for {} regions from {} source ({concurrency} concurrent)",
            distinct.len(),
            source.name()
        );

        let results: Vec<_> = stream::iter(distinct.into_iter().map(|region| async move {
            let result = source.fetch(region).await;
            (region, result)
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

        let mut figures = BTreeMap::new();
        for (region, result) in results {
            let entry = match result {
                Ok(series) => {
                    let aggregated = aggregate(&series, dates);
                    if aggregated.is_none() {
                        log::warn!(
                            "{region}: {} days scraped but a reference date is missing",
                            series.len()
                        );
                    }
                    aggregated
                }
                Err(e) => {
                    log::warn!("{region}: case series unavailable: {e}");
                    None
                }
            };
            figures.insert(region.to_string(), entry);
        }

        let available = figures.values().filter(|f| f.is_some()).count();
        log::info!("Case figures available for {available} of {} regions", figures.len());

        Self { figures }
    }

    /// Figures for `region`, or `None` if unavailable or never collected.
    #[must_use]
    pub fn get(&self, region: &str) -> Option<CaseFigures> {
        self.figures.get(region).copied().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.figures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }
}

impl FromIterator<(String, Option<CaseFigures>)> for CaseTable {
    fn from_iter<I: IntoIterator<Item = (String, Option<CaseFigures>)>>(iter: I) -> Self {
        Self {
            figures: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::{PAGE, snapshot_dir};
    use crate::source::{CasePageFormat, SnapshotCaseSource};

    #[tokio::test]
    async fn failing_region_does_not_affect_others() {
        let dir = snapshot_dir("table");
        std::fs::write(dir.join("moonee-valley.html"), PAGE).unwrap();
        std::fs::write(dir.join("alpine.html"), "<p>empty</p>").unwrap();

        let source = SnapshotCaseSource::new(dir, CasePageFormat::default());
        let table = CaseTable::collect(
            &source,
            ["MOONEE VALLEY", "ALPINE", "GONE", "MOONEE VALLEY"],
            &ReferenceDates::default(),
            4,
        )
        .await;

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get("MOONEE VALLEY"),
            Some(CaseFigures {
                point_count: 12,
                fortnight_avg: 5,
                month_avg: 3,
                two_month_avg: 2,
            })
        );
        assert_eq!(table.get("ALPINE"), None);
        assert_eq!(table.get("GONE"), None);
        assert_eq!(table.get("NEVER ASKED"), None);
    }
}
