//! Record merging.
//!
//! Coerces both raw batches into canonical [`Property`] rows, concatenates
//! them (first batch first), and drops rows that are identical in every
//! field. Rows that only share an address or an identifier are kept: the
//! same street name legitimately exists in different suburbs.

use std::collections::BTreeSet;

use property_map_property_models::{
    COORDINATE_PRECISION, Property, RawPropertyRecord, is_valid_coordinate, round_to,
};

/// Row counts from a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Rows across both inputs.
    pub input_rows: usize,
    /// Rows excluded because a field could not be coerced.
    pub rejected: usize,
    /// Exact duplicates removed.
    pub duplicates_removed: usize,
    /// Rows in the merged table.
    pub output_rows: usize,
}

/// Full-row identity used for exact-duplicate detection.
type RowKey = (i64, u64, u64, String);

fn row_key(p: &Property) -> RowKey {
    (
        p.property_id,
        p.latitude.to_bits(),
        p.longitude.to_bits(),
        p.address.clone(),
    )
}

/// Coerces a single raw record, returning the reason on failure.
///
/// # Errors
///
/// Returns a human-readable reason if a field is missing or cannot be
/// coerced, or the coordinates are out of range.
pub fn coerce(record: &RawPropertyRecord) -> Result<Property, String> {
    let property_id = record
        .property_id
        .as_i64()
        .ok_or_else(|| format!("unparseable property_id {}", record.property_id))?;
    let lat = record
        .lat
        .as_f64()
        .ok_or_else(|| format!("unparseable lat {}", record.lat))?;
    let lng = record
        .lng
        .as_f64()
        .ok_or_else(|| format!("unparseable lng {}", record.lng))?;
    let address = record
        .addr_street
        .as_text()
        .ok_or_else(|| format!("unparseable addr_street {}", record.addr_street))?;

    let latitude = round_to(lat, COORDINATE_PRECISION);
    let longitude = round_to(lng, COORDINATE_PRECISION);
    if !is_valid_coordinate(latitude, longitude) {
        return Err(format!("coordinate out of range ({latitude}, {longitude})"));
    }

    Ok(Property {
        property_id,
        latitude,
        longitude,
        address,
    })
}

/// Merges two raw batches into one canonical table.
///
/// Output order is input order with duplicates and rejected rows removed.
#[must_use]
pub fn merge_records(
    first: &[RawPropertyRecord],
    second: &[RawPropertyRecord],
) -> (Vec<Property>, MergeReport) {
    let mut report = MergeReport {
        input_rows: first.len() + second.len(),
        ..MergeReport::default()
    };
    let mut seen: BTreeSet<RowKey> = BTreeSet::new();
    let mut merged = Vec::with_capacity(report.input_rows);

    for (index, record) in first.iter().chain(second).enumerate() {
        let property = match coerce(record) {
            Ok(p) => p,
            Err(reason) => {
                log::warn!("Excluding property row {index}: {reason}");
                report.rejected += 1;
                continue;
            }
        };

        if seen.insert(row_key(&property)) {
            merged.push(property);
        } else {
            report.duplicates_removed += 1;
        }
    }

    report.output_rows = merged.len();
    log::info!(
        "Merged {} rows: {} kept, {} duplicates, {} rejected",
        report.input_rows,
        report.output_rows,
        report.duplicates_removed,
        report.rejected
    );

    (merged, report)
}
