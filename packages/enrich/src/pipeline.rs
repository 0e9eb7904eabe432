//! End-to-end run: load every input, build the lookups, derive the table.
//!
//! Phases run in order and each lookup table is complete before the next
//! phase reads it:
//!
//! 1. load and merge the property sources
//! 2. load boundaries, regions and the transit feed
//! 3. locate every property (suburb, region, nearest stop)
//! 4. evaluate journey minutes once per distinct nearest stop
//! 5. collect case figures once per distinct region (concurrently)
//! 6. attach the columns row by row, keeping merged order

use std::path::PathBuf;
use std::sync::Arc;

use property_map_cases::source::CasePageFormat;
use property_map_cases::{CaseSeriesSource, CaseTable, LiveCaseSource, SnapshotCaseSource};
use property_map_geography::{RegionResolver, boundaries, regions};
use property_map_ingest::MergeReport;
use property_map_property_models::{EnrichedProperty, Property};
use property_map_scraper::ScrapeConfig;
use property_map_spatial::{NearestStopFinder, SuburbResolver};
use property_map_transit::feed::resolve_destination;
use property_map_transit::{DirectJourneyEvaluator, GtfsFeed, JourneyTimes, Schedule};

use crate::PipelineError;
use crate::config::{CaseSourceMode, PipelineConfig};
use crate::enricher::{Location, PropertyEnricher, SpatialLookup};
use crate::progress::{ProgressCallback, null_progress};

/// Result of a run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Enriched properties in merged order.
    pub rows: Vec<EnrichedProperty>,
    /// Row accounting from the merge.
    pub merge: MergeReport,
}

/// Transit lookups built from the feed.
struct TransitLookup {
    stops: NearestStopFinder,
    schedule: Schedule,
    destination: u64,
}

/// Runs the enrichment for one configuration.
pub struct Pipeline {
    config: PipelineConfig,
    progress: Arc<dyn ProgressCallback>,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            progress: null_progress(),
        }
    }

    /// Reports phase progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every phase and returns the enriched table.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if an input is missing or malformed or the
    /// destination stop cannot be resolved. Unresolvable joins and failed
    /// case fetches are not errors.
    pub async fn run(&self) -> Result<PipelineOutput, PipelineError> {
        let (properties, merge) = self.load_properties()?;

        let (suburbs, regions) = self.load_geography()?;
        let transit = self.load_transit()?;
        let spatial = SpatialLookup {
            suburbs,
            regions,
            stops: transit.stops,
        };

        let locations = self.locate(&spatial, &properties);

        let evaluator =
            DirectJourneyEvaluator::new(&transit.schedule, self.config.transit.max_departure_hour);
        let journeys = JourneyTimes::compute(
            &evaluator,
            transit.destination,
            locations
                .iter()
                .filter_map(|l| l.nearest_stop.map(|s| s.stop_id)),
        );

        let cases = self
            .collect_cases(locations.iter().filter_map(|l| l.region.as_deref()))
            .await?;

        let enricher = PropertyEnricher::new(&spatial, &journeys, &cases);
        let rows: Vec<EnrichedProperty> = properties
            .iter()
            .zip(locations)
            .map(|(property, location)| enricher.enrich_located(property, location))
            .collect();

        log_coverage(&rows);
        Ok(PipelineOutput { rows, merge })
    }

    /// Fetches every region in the region table from the live site and
    /// saves the pages to `dir`, for later snapshot runs.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the region table cannot be loaded or the
    /// HTTP client cannot be built. Individual fetch failures are logged.
    pub async fn save_case_snapshots(&self, dir: PathBuf) -> Result<CaseTable, PipelineError> {
        let map = regions::load(&self.config.regions.path)?;
        let source = self.live_source()?.with_snapshot_dir(dir);
        let dates = self.config.cases.reference_dates()?;

        Ok(CaseTable::collect(
            &source,
            map.iter().map(|(region, _)| region),
            &dates,
            self.config.cases.concurrency,
        )
        .await)
    }

    fn load_properties(&self) -> Result<(Vec<Property>, MergeReport), PipelineError> {
        let sources = &self.config.properties;
        let json = property_map_ingest::load_json(&sources.json)?;
        let xml = property_map_ingest::load_xml(&sources.xml)?;

        Ok(property_map_ingest::merge_records(&json, &xml))
    }

    fn load_geography(&self) -> Result<(SuburbResolver, RegionResolver), PipelineError> {
        let config = &self.config.boundaries;
        let boundaries = boundaries::load(&config.path, &config.name_property)?;
        let suburbs = SuburbResolver::new(&boundaries, config.ring_mode);

        let map = regions::load(&self.config.regions.path)?;
        Ok((suburbs, RegionResolver::new(&map)))
    }

    fn load_transit(&self) -> Result<TransitLookup, PipelineError> {
        let config = &self.config.transit;
        let feed = GtfsFeed::load(&config.gtfs_dir)?;
        let destination = resolve_destination(
            &feed.stops,
            config.destination_stop_id,
            config.destination_stop_name.as_deref(),
        )?;
        let schedule = Schedule::build(&feed.calendar, &feed.trips, &feed.stop_times, &config.window);

        Ok(TransitLookup {
            stops: NearestStopFinder::new(feed.stops),
            schedule,
            destination,
        })
    }

    fn locate(&self, spatial: &SpatialLookup, properties: &[Property]) -> Vec<Location> {
        self.progress.set_total(properties.len() as u64);
        self.progress.set_message("Locating properties".to_string());

        let locations = properties
            .iter()
            .map(|property| {
                let location = spatial.locate(property);
                self.progress.inc(1);
                location
            })
            .collect();

        self.progress
            .finish(format!("Located {} properties", properties.len()));
        locations
    }

    async fn collect_cases<'a>(
        &self,
        regions: impl IntoIterator<Item = &'a str>,
    ) -> Result<CaseTable, PipelineError> {
        let config = &self.config.cases;
        let dates = config.reference_dates()?;
        let source = self.case_source()?;
        Ok(CaseTable::collect(source.as_ref(), regions, &dates, config.concurrency).await)
    }

    /// Builds the case source for the configured mode.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if snapshot mode has no snapshot
    /// directory, or [`PipelineError::Case`] if the HTTP client cannot be
    /// built.
    pub fn case_source(&self) -> Result<Box<dyn CaseSeriesSource>, PipelineError> {
        let config = &self.config.cases;
        match config.mode {
            CaseSourceMode::Live => {
                let mut source = self.live_source()?;
                if config.save_snapshots
                    && let Some(dir) = &config.snapshot_dir
                {
                    source = source.with_snapshot_dir(dir.clone());
                }
                Ok(Box::new(source))
            }
            CaseSourceMode::Snapshot => {
                let dir = config.snapshot_dir.clone().ok_or_else(|| PipelineError::Config {
                    message: "cases.mode = \"snapshot\" requires cases.snapshot_dir".to_string(),
                })?;
                log::info!("Reading case pages from {}", dir.display());
                Ok(Box::new(SnapshotCaseSource::new(dir, self.page_format())))
            }
        }
    }

    fn live_source(&self) -> Result<LiveCaseSource, PipelineError> {
        let config = &self.config.cases;
        let scrape = ScrapeConfig::default()
            .with_timeout(config.timeout())
            .with_max_retries(config.max_retries);
        Ok(LiveCaseSource::new(
            &config.base_url,
            self.page_format(),
            scrape,
        )?)
    }

    fn page_format(&self) -> CasePageFormat {
        let config = &self.config.cases;
        CasePageFormat::new(&config.date_selector, &config.count_selector, config.year)
    }
}

fn log_coverage(rows: &[EnrichedProperty]) {
    let count = |f: fn(&EnrichedProperty) -> bool| rows.iter().filter(|r| f(r)).count();
    log::info!(
        "Enriched {} properties: suburb {}, region {}, nearest stop {}, direct journey {}, cases {}",
        rows.len(),
        count(|r| r.suburb.is_some()),
        count(|r| r.region.is_some()),
        count(|r| r.nearest_stop.is_some()),
        count(|r| r.direct_journey_minutes.is_some()),
        count(|r| r.cases.is_some()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use property_map_property_models::CaseFigures;
    use std::path::Path;

    const PROPERTIES_JSON: &str = r#"[
  {"property_id": 1, "lat": -37.805, "lng": 144.965, "addr_street": "1 Lygon Street"},
  {"property_id": 2, "lat": "-37.775", "lng": "144.955", "addr_street": "2 Sydney Road"},
  {"property_id": 3, "lat": -33.86, "lng": 151.21, "addr_street": "3 George Street"},
  {"property_id": "oops", "lat": -37.8, "lng": 144.9, "addr_street": "4 Nowhere"},
  {"property_id": 6, "lat": null, "lng": 144.9, "addr_street": "6 Null Lane"}
]"#;

    const PROPERTIES_XML: &str = "<root>
<property><property_id>1</property_id><lat>-37.805</lat><lng>144.965</lng><addr_street>1 Lygon Street</addr_street></property>
<property><property_id>7</property_id><lat>-37.815</lat><addr_street>7 Lonsdale Street</addr_street></property>
<property><property_id>5</property_id><lat>-37.815</lat><lng>144.975</lng><addr_street>5 Collins Street</addr_street></property>
</root>";

    const BOUNDARIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"VIC_LOCA_2": "CARLTON"},
     "geometry": {"type": "Polygon", "coordinates": [[[144.96,-37.81],[144.97,-37.81],[144.97,-37.80],[144.96,-37.80],[144.96,-37.81]]]}},
    {"type": "Feature", "properties": {"VIC_LOCA_2": "BRUNSWICK"},
     "geometry": {"type": "Polygon", "coordinates": [[[144.95,-37.78],[144.96,-37.78],[144.96,-37.77],[144.95,-37.77],[144.95,-37.78]]]}},
    {"type": "Feature", "properties": {"VIC_LOCA_2": "MELBOURNE"},
     "geometry": {"type": "Polygon", "coordinates": [[[144.97,-37.82],[144.98,-37.82],[144.98,-37.81],[144.97,-37.81],[144.97,-37.82]]]}}
  ]
}"#;

    const REGIONS: &str = "\
MELBOURNE : ['Carlton', 'Melbourne']
MORELAND : ['Brunswick']
";

    const STOPS: &str = "\
stop_id,stop_name,stop_lat,stop_lon
100,Lygon St/Grattan St,-37.8049,144.9651
200,Sydney Rd/Brunswick Rd,-37.7749,144.9551
19842,Melbourne Central Railway Station,-37.8100,144.9626
";

    const CALENDAR: &str = "\
service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date
WD,1,1,1,1,1,0,0,20210101,20211231
";

    const TRIPS: &str = "\
route_id,service_id,trip_id
R1,WD,T1
R1,WD,T2
";

    const STOP_TIMES: &str = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence
T1,08:12:00,08:12:00,19842,2
T1,08:00:00,08:00:00,100,1
T2,08:30:00,08:30:00,100,1
T2,08:43:00,08:43:00,19842,2
";

    const MELBOURNE_PAGE: &str = r#"<table>
<tr><td class="COL1 DATE">30 Sep</td><td class="COL4 CASES">1,112</td></tr>
<tr><td class="COL1 DATE">29 Sep</td><td class="COL4 CASES">1,100</td></tr>
<tr><td class="COL1 DATE">16 Sep</td><td class="COL4 CASES">1,030</td></tr>
<tr><td class="COL1 DATE">31 Aug</td><td class="COL4 CASES">1,010</td></tr>
<tr><td class="COL1 DATE">01 Aug</td><td class="COL4 CASES">1,000</td></tr>
</table>"#;

    fn write(path: &Path, text: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn fixture(name: &str) -> PipelineConfig {
        let dir = std::env::temp_dir().join(format!(
            "property_map_pipeline_{name}_{}",
            std::process::id()
        ));
        write(&dir.join("properties.json"), PROPERTIES_JSON);
        write(&dir.join("properties.xml"), PROPERTIES_XML);
        write(&dir.join("suburbs.geojson"), BOUNDARIES);
        write(&dir.join("regions.txt"), REGIONS);
        write(&dir.join("gtfs/stops.txt"), STOPS);
        write(&dir.join("gtfs/calendar.txt"), CALENDAR);
        write(&dir.join("gtfs/trips.txt"), TRIPS);
        write(&dir.join("gtfs/stop_times.txt"), STOP_TIMES);
        write(&dir.join("cases/melbourne.html"), MELBOURNE_PAGE);

        let text = r#"
[properties]
json = "properties.json"
xml = "properties.xml"

[boundaries]
path = "suburbs.geojson"

[regions]
path = "regions.txt"

[transit]
gtfs_dir = "gtfs"

[cases]
mode = "snapshot"
snapshot_dir = "cases"
"#;
        let mut config = PipelineConfig::parse(text).unwrap();
        config.resolve_relative_to(&dir);
        config
    }

    #[tokio::test]
    async fn enriches_merged_properties_in_order() {
        let output = Pipeline::new(fixture("order")).run().await.unwrap();

        assert_eq!(output.merge.input_rows, 8);
        assert_eq!(output.merge.rejected, 3);
        assert_eq!(output.merge.duplicates_removed, 1);

        let ids: Vec<i64> = output.rows.iter().map(|r| r.property.property_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 5]);

        let carlton = &output.rows[0];
        assert_eq!(carlton.suburb.as_deref(), Some("CARLTON"));
        assert_eq!(carlton.region.as_deref(), Some("MELBOURNE"));
        assert_eq!(carlton.nearest_stop.map(|s| s.stop_id), Some(100));
        // Trips of 12 and 13 minutes average to 12.5, rounded to even.
        assert_eq!(carlton.direct_journey_minutes, Some(12));
        assert_eq!(
            carlton.cases,
            Some(CaseFigures {
                point_count: 12,
                fortnight_avg: 5,
                month_avg: 3,
                two_month_avg: 2,
            })
        );

        let brunswick = &output.rows[1];
        assert_eq!(brunswick.region.as_deref(), Some("MORELAND"));
        assert_eq!(brunswick.nearest_stop.map(|s| s.stop_id), Some(200));
        assert_eq!(brunswick.direct_journey_minutes, None);
        // No snapshot page for MORELAND.
        assert_eq!(brunswick.cases, None);

        let sydney = &output.rows[2];
        assert_eq!(sydney.suburb, None);
        assert_eq!(sydney.region, None);
        assert!(sydney.nearest_stop.is_some());
        assert_eq!(sydney.cases, None);

        let melbourne = &output.rows[3];
        assert_eq!(melbourne.suburb.as_deref(), Some("MELBOURNE"));
        assert_eq!(melbourne.nearest_stop.map(|s| s.stop_id), Some(19842));
        assert_eq!(melbourne.direct_journey_minutes, Some(0));
    }

    #[tokio::test]
    async fn reruns_produce_identical_tables() {
        let pipeline = Pipeline::new(fixture("rerun"));
        let first = pipeline.run().await.unwrap();
        let second = pipeline.run().await.unwrap();
        assert_eq!(first.rows, second.rows);
    }

    #[tokio::test]
    async fn pure_enrich_matches_pipeline_rows() {
        let pipeline = Pipeline::new(fixture("pure"));
        let output = pipeline.run().await.unwrap();

        let (properties, _) = pipeline.load_properties().unwrap();
        let (suburbs, regions) = pipeline.load_geography().unwrap();
        let transit = pipeline.load_transit().unwrap();
        let spatial = SpatialLookup {
            suburbs,
            regions,
            stops: transit.stops,
        };
        let evaluator = DirectJourneyEvaluator::new(&transit.schedule, 9);
        let journeys = JourneyTimes::compute(&evaluator, transit.destination, [100, 200, 19842]);
        let cases: CaseTable = [(
            "MELBOURNE".to_string(),
            output.rows[0].cases,
        )]
        .into_iter()
        .collect();
        let enricher = PropertyEnricher::new(&spatial, &journeys, &cases);

        for (property, row) in properties.iter().zip(&output.rows) {
            assert_eq!(&enricher.enrich(property), row);
        }
    }

    #[tokio::test]
    async fn unknown_destination_is_fatal() {
        let mut config = fixture("destination");
        config.transit.destination_stop_name = Some("Flinders Street".to_string());
        let result = Pipeline::new(config).run().await;
        assert!(matches!(result, Err(PipelineError::Transit(_))));
    }

    #[test]
    fn snapshot_mode_requires_directory() {
        let mut config = fixture("nodir");
        config.cases.snapshot_dir = None;
        assert!(matches!(
            Pipeline::new(config).case_source(),
            Err(PipelineError::Config { .. })
        ));
    }
}
