//! CSV output of the enriched table.

use std::io::Write;
use std::path::Path;

use property_map_property_models::EnrichedProperty;

use crate::PipelineError;

/// Output column names, in order.
pub const HEADER: [&str; 14] = [
    "property_id",
    "lat",
    "lng",
    "addr_street",
    "suburb",
    "region",
    "nearest_stop_id",
    "nearest_stop_distance_km",
    "direct_journey_minutes",
    "direct_journey_flag",
    "point_cases",
    "fortnight_avg_cases",
    "month_avg_cases",
    "two_month_avg_cases",
];

/// Writes the table to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be created or written.
pub fn write_csv(path: &Path, rows: &[EnrichedProperty]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_rows(file, rows)?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Writes the header and one line per row. Unavailable cells are
/// `not available`.
///
/// # Errors
///
/// Returns [`PipelineError::Csv`] if serialization or the write fails.
pub fn write_rows<W: Write>(writer: W, rows: &[EnrichedProperty]) -> Result<(), PipelineError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row.to_row())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use property_map_property_models::{CaseFigures, NearestStop, Property};

    const HEADER_LINE: &str = "property_id,lat,lng,addr_street,suburb,region,nearest_stop_id,nearest_stop_distance_km,direct_journey_minutes,direct_journey_flag,point_cases,fortnight_avg_cases,month_avg_cases,two_month_avg_cases";

    fn property() -> Property {
        Property {
            property_id: 1001,
            latitude: -37.805_123_4,
            longitude: 144.965_432_1,
            address: "12 Lygon Street".to_string(),
        }
    }

    #[test]
    fn writes_header_and_resolved_row() {
        let row = EnrichedProperty {
            property: property(),
            suburb: Some("CARLTON".to_string()),
            region: Some("MELBOURNE".to_string()),
            nearest_stop: Some(NearestStop {
                stop_id: 19842,
                distance_km: 0.512,
            }),
            direct_journey_minutes: Some(0),
            cases: Some(CaseFigures {
                point_count: 12,
                fortnight_avg: 5,
                month_avg: 3,
                two_month_avg: 2,
            }),
        };
        let mut buf = Vec::new();
        write_rows(&mut buf, &[row]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], HEADER_LINE);
        assert_eq!(
            lines[1],
            "1001,-37.8051234,144.9654321,12 Lygon Street,CARLTON,MELBOURNE,19842,0.512,0,1,12,5,3,2"
        );
    }

    #[test]
    fn unavailable_cells_use_marker() {
        let row = EnrichedProperty {
            property: property(),
            suburb: None,
            region: None,
            nearest_stop: None,
            direct_journey_minutes: None,
            cases: None,
        };
        let mut buf = Vec::new();
        write_rows(&mut buf, &[row]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let line = text.lines().nth(1).unwrap();

        assert_eq!(
            line,
            "1001,-37.8051234,144.9654321,12 Lygon Street,not available,not available,not available,not available,not available,0,not available,not available,not available,not available"
        );
    }

    #[test]
    fn writes_to_nested_path() {
        let dir = std::env::temp_dir().join(format!("property_map_output_{}", std::process::id()));
        let path = dir.join("nested").join("out.csv");
        write_csv(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim_end(), HEADER.join(","));
        std::fs::remove_dir_all(dir).unwrap();
    }
}
