//! JSON property source: a top-level array of
//! `{property_id, lat, lng, addr_street}` objects.

use property_map_property_models::RawPropertyRecord;

use crate::IngestError;

/// Parses a JSON array of property records.
///
/// # Errors
///
/// Returns [`IngestError::Json`] if the text is not an array of records.
/// A `null` or absent field does not fail the file; it is left for the
/// merger to reject.
pub fn parse(text: &str) -> Result<Vec<RawPropertyRecord>, IngestError> {
    Ok(serde_json::from_str(text)?)
}
