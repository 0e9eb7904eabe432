#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Property source loaders and record merging.
//!
//! Properties arrive from two differently-typed sources: a JSON array
//! ([`json`]) and an XML document of tagged fields ([`xml`]). Both loaders
//! produce [`RawPropertyRecord`]s, which [`merge::merge_records`] coerces
//! into the canonical [`Property`](property_map_property_models::Property)
//! table.

pub mod json;
pub mod merge;
pub mod xml;

use std::path::Path;

use property_map_property_models::RawPropertyRecord;

pub use merge::{MergeReport, merge_records};

/// Errors that can occur while loading property sources.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// I/O error reading a source file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads a JSON property file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be read or parsed.
pub fn load_json(path: &Path) -> Result<Vec<RawPropertyRecord>, IngestError> {
    let text = std::fs::read_to_string(path)?;
    let records = json::parse(&text)?;
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Reads an XML property file.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be read.
pub fn load_xml(path: &Path) -> Result<Vec<RawPropertyRecord>, IngestError> {
    let text = std::fs::read_to_string(path)?;
    let records = xml::parse(&text);
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}
