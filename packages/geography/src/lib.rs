#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Suburb boundary and region table loading.
//!
//! Reads suburb polygons from a `GeoJSON` `FeatureCollection` ([`boundaries`])
//! and the region-to-suburb table from its text export ([`regions`]), and
//! resolves suburbs to their administrative region ([`RegionResolver`]).

pub mod boundaries;
pub mod regions;

use thiserror::Error;

pub use regions::RegionResolver;

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// I/O error reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
