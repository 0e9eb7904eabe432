#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Property enrichment pipeline.
//!
//! Joins the merged property table against suburb boundaries, the region
//! table, the transit feed and per-region case figures, producing one
//! [`EnrichedProperty`](property_map_property_models::EnrichedProperty) per
//! property. Lookups that cannot be resolved leave the column `None`; only
//! missing or malformed inputs are errors.

pub mod config;
pub mod enricher;
pub mod output;
pub mod pipeline;
pub mod progress;

pub use config::{CaseSourceMode, PipelineConfig};
pub use enricher::{PropertyEnricher, SpatialLookup};
pub use pipeline::{Pipeline, PipelineOutput};
pub use progress::{NullProgress, ProgressCallback};

/// Errors that can occur while running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Loading a property source failed.
    #[error("Property input error: {0}")]
    Ingest(#[from] property_map_ingest::IngestError),

    /// Loading boundaries or the region table failed.
    #[error("Geography input error: {0}")]
    Geo(#[from] property_map_geography::GeoError),

    /// Loading the transit feed or resolving the destination failed.
    #[error("Transit input error: {0}")]
    Transit(#[from] property_map_transit::TransitError),

    /// Building the case source failed.
    #[error("Case source error: {0}")]
    Case(#[from] property_map_cases::CaseError),

    /// The configuration file is not valid TOML or misses a key.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration is well-formed but unusable.
    #[error("Config error: {message}")]
    Config {
        /// What is wrong.
        message: String,
    },

    /// Writing the output failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
