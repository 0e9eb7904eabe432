//! Pipeline configuration loaded from a TOML file.
//!
//! Only input paths are required; every tunable has a default:
//!
//! ```toml
//! output = "output/properties.csv"
//!
//! [properties]
//! json = "data/properties.json"
//! xml = "data/properties.xml"
//!
//! [boundaries]
//! path = "data/vic_localities.geojson"
//!
//! [regions]
//! path = "data/regions.txt"
//!
//! [transit]
//! gtfs_dir = "data/gtfs"
//! destination_stop_name = "Melbourne Central"
//!
//! [cases]
//! mode = "snapshot"
//! snapshot_dir = "data/cases"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use property_map_cases::ReferenceDates;
use property_map_cases::source::{DEFAULT_COUNT_SELECTOR, DEFAULT_DATE_SELECTOR};
use property_map_geography_models::RingMode;
use property_map_transit::ScheduleWindow;
use property_map_transit::journey::DEFAULT_MAX_DEPARTURE_HOUR;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::PipelineError;

/// Where case pages are read from.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CaseSourceMode {
    /// Fetch each region's page over HTTP.
    #[default]
    Live,
    /// Read pages saved by an earlier live run.
    Snapshot,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Output CSV path.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    pub properties: PropertySources,
    pub boundaries: BoundaryConfig,
    pub regions: RegionConfig,
    pub transit: TransitConfig,
    #[serde(default)]
    pub cases: CaseConfig,
}

/// The two property inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySources {
    /// JSON array of property records.
    pub json: PathBuf,
    /// XML property records.
    pub xml: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// GeoJSON `FeatureCollection` of suburb polygons.
    pub path: PathBuf,
    /// Feature property holding the suburb name.
    #[serde(default = "default_name_property")]
    pub name_property: String,
    #[serde(default)]
    pub ring_mode: RingMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Text file of `REGION : ['Suburb', ...]` lines.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitConfig {
    /// Directory containing the GTFS text files.
    pub gtfs_dir: PathBuf,
    /// Destination stop by id. Takes precedence over the name.
    #[serde(default)]
    pub destination_stop_id: Option<u64>,
    /// Destination stop by (case-insensitive, partial) name.
    #[serde(default = "default_destination_name")]
    pub destination_stop_name: Option<String>,
    /// Latest hour-of-day a qualifying trip may leave its origin.
    #[serde(default = "default_max_departure_hour")]
    pub max_departure_hour: u32,
    #[serde(default)]
    pub window: ScheduleWindow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseConfig {
    #[serde(default)]
    pub mode: CaseSourceMode,
    /// Live pages are fetched from `{base_url}/{slug}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Snapshot directory. Read in snapshot mode; written in live mode
    /// when `save_snapshots` is set.
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
    #[serde(default)]
    pub save_snapshots: bool,
    /// Year the scraped `30 Sep` style dates belong to.
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default = "default_date_selector")]
    pub date_selector: String,
    #[serde(default = "default_count_selector")]
    pub count_selector: String,
    /// Maximum requests in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Overrides the reference dates derived from `year`.
    #[serde(default)]
    pub reference_dates: Option<ReferenceDates>,
}

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            mode: CaseSourceMode::default(),
            base_url: default_base_url(),
            snapshot_dir: None,
            save_snapshots: false,
            year: default_year(),
            date_selector: default_date_selector(),
            count_selector: default_count_selector(),
            concurrency: default_concurrency(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            reference_dates: None,
        }
    }
}

impl CaseConfig {
    /// The configured reference dates, or those of `year`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if `year` is out of range.
    pub fn reference_dates(&self) -> Result<ReferenceDates, PipelineError> {
        self.reference_dates
            .or_else(|| ReferenceDates::for_year(self.year))
            .ok_or_else(|| PipelineError::Config {
                message: format!("cases.year {} is out of range", self.year),
            })
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("output/properties.csv")
}

fn default_name_property() -> String {
    "VIC_LOCA_2".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_destination_name() -> Option<String> {
    Some("Melbourne Central".to_string())
}

const fn default_max_departure_hour() -> u32 {
    DEFAULT_MAX_DEPARTURE_HOUR
}

fn default_base_url() -> String {
    "https://covidlive.com.au/vic".to_string()
}

const fn default_year() -> i32 {
    2021
}

fn default_date_selector() -> String {
    DEFAULT_DATE_SELECTOR.to_string()
}

fn default_count_selector() -> String {
    DEFAULT_COUNT_SELECTOR.to_string()
}

const fn default_concurrency() -> usize {
    8
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_timeout_secs() -> u64 {
    30
}

impl PipelineConfig {
    /// Reads and parses a TOML configuration file.
    ///
    /// Relative input paths are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses a TOML configuration string.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Toml`] on malformed input or missing
    /// required keys.
    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        Ok(toml::de::from_str(text)?)
    }

    /// Joins every relative path onto `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.output);
        join(&mut self.properties.json);
        join(&mut self.properties.xml);
        join(&mut self.boundaries.path);
        join(&mut self.regions.path);
        join(&mut self.transit.gtfs_dir);
        if let Some(dir) = self.cases.snapshot_dir.as_mut() {
            join(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use property_map_transit_models::ServiceTime;

    const MINIMAL: &str = r#"
[properties]
json = "data/properties.json"
xml = "data/properties.xml"

[boundaries]
path = "data/suburbs.geojson"

[regions]
path = "data/regions.txt"

[transit]
gtfs_dir = "data/gtfs"
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = PipelineConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.output, PathBuf::from("output/properties.csv"));
        assert_eq!(config.boundaries.name_property, "VIC_LOCA_2");
        assert_eq!(config.boundaries.ring_mode, RingMode::FirstRing);
        assert_eq!(config.transit.destination_stop_id, None);
        assert_eq!(
            config.transit.destination_stop_name.as_deref(),
            Some("Melbourne Central")
        );
        assert_eq!(config.transit.max_departure_hour, 9);
        assert_eq!(config.transit.window, ScheduleWindow::default());
        assert_eq!(config.cases.mode, CaseSourceMode::Live);
        assert_eq!(config.cases.date_selector, "td.COL1.DATE");
        assert_eq!(config.cases.count_selector, "td.COL4.CASES");
        assert_eq!(config.cases.max_retries, 3);
        assert_eq!(config.cases.timeout(), Duration::from_secs(30));
        assert_eq!(
            config.cases.reference_dates().unwrap(),
            ReferenceDates::default()
        );
    }

    #[test]
    fn overrides_are_read() {
        let text = format!(
            r#"{MINIMAL}
[cases]
mode = "snapshot"
snapshot_dir = "data/cases"
year = 2022
concurrency = 2
"#
        );
        let config = PipelineConfig::parse(&text).unwrap();
        assert_eq!(config.cases.mode, CaseSourceMode::Snapshot);
        assert_eq!(config.cases.concurrency, 2);
        assert_eq!(
            config.cases.reference_dates().unwrap(),
            ReferenceDates::for_year(2022).unwrap()
        );
    }

    #[test]
    fn nested_window_and_ring_mode_parse() {
        let text = r#"
[properties]
json = "a.json"
xml = "a.xml"

[boundaries]
path = "b.geojson"
ring_mode = "all-rings"

[regions]
path = "r.txt"

[transit]
gtfs_dir = "gtfs"
destination_stop_id = 19842
max_departure_hour = 8

[transit.window]
earliest_departure = "06:30:00"
departure_before = "12:00:00"
arrival_before = "13:00:00"
"#;
        let config = PipelineConfig::parse(text).unwrap();
        assert_eq!(config.boundaries.ring_mode, RingMode::AllRings);
        assert_eq!(config.transit.destination_stop_id, Some(19842));
        assert_eq!(
            config.transit.window.earliest_departure,
            ServiceTime::from_hms(6, 30, 0)
        );
    }

    #[test]
    fn missing_required_input_is_an_error() {
        let result = PipelineConfig::parse("[properties]\njson = \"a.json\"\n");
        assert!(matches!(result, Err(PipelineError::Toml(_))));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let mut config = PipelineConfig::parse(MINIMAL).unwrap();
        config.resolve_relative_to(Path::new("/srv/run"));
        assert_eq!(config.properties.json, PathBuf::from("/srv/run/data/properties.json"));
        assert_eq!(config.output, PathBuf::from("/srv/run/output/properties.csv"));
    }

    #[test]
    fn case_source_mode_names_are_kebab_case() {
        assert_eq!(CaseSourceMode::Snapshot.to_string(), "snapshot");
        assert_eq!("live".parse::<CaseSourceMode>().unwrap(), CaseSourceMode::Live);
    }
}
