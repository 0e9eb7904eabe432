//! GTFS static feed loading.

use std::path::Path;

use property_map_transit_models::{
    CalendarEntry, StopRecord, StopTimeRecord, TransitStop, TripRecord,
};
use serde::de::DeserializeOwned;

use crate::TransitError;

/// The four GTFS tables the pipeline reads.
#[derive(Debug, Clone, Default)]
pub struct GtfsFeed {
    /// Stops in file order.
    pub stops: Vec<TransitStop>,
    pub calendar: Vec<CalendarEntry>,
    pub trips: Vec<TripRecord>,
    pub stop_times: Vec<StopTimeRecord>,
}

impl GtfsFeed {
    /// Loads `stops.txt`, `calendar.txt`, `trips.txt` and `stop_times.txt`
    /// from a feed directory.
    ///
    /// # Errors
    ///
    /// Returns [`TransitError`] if any file is missing or malformed.
    pub fn load(dir: &Path) -> Result<Self, TransitError> {
        let stops = load_stops(&dir.join("stops.txt"))?;
        let calendar: Vec<CalendarEntry> = read_csv(&dir.join("calendar.txt"))?;
        let trips: Vec<TripRecord> = read_csv(&dir.join("trips.txt"))?;
        let stop_times: Vec<StopTimeRecord> = read_csv(&dir.join("stop_times.txt"))?;

        log::info!(
            "Loaded GTFS feed from {}: {} stops, {} services, {} trips, {} stop times",
            dir.display(),
            stops.len(),
            calendar.len(),
            trips.len(),
            stop_times.len()
        );

        Ok(Self {
            stops,
            calendar,
            trips,
            stop_times,
        })
    }
}

/// Deserializes every row of a headed CSV file.
///
/// # Errors
///
/// Returns [`TransitError::Csv`] on the first unreadable row.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, TransitError> {
    let file = std::fs::File::open(path)?;
    read_csv_from(file)
}

fn read_csv_from<T: DeserializeOwned, R: std::io::Read>(reader: R) -> Result<Vec<T>, TransitError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Reads `stops.txt`, keeping file order.
///
/// Stops whose id is not numeric are skipped with a warning.
///
/// # Errors
///
/// Returns [`TransitError`] if the file cannot be read or parsed.
pub fn load_stops(path: &Path) -> Result<Vec<TransitStop>, TransitError> {
    let records: Vec<StopRecord> = read_csv(path)?;
    Ok(to_stops(records))
}

fn to_stops(records: Vec<StopRecord>) -> Vec<TransitStop> {
    records
        .into_iter()
        .filter_map(|record| match record.stop_id.parse::<u64>() {
            Ok(stop_id) => Some(TransitStop {
                stop_id,
                name: record.stop_name,
                latitude: record.stop_lat,
                longitude: record.stop_lon,
            }),
            Err(_) => {
                log::warn!("Skipping stop with non-numeric id {:?}", record.stop_id);
                None
            }
        })
        .collect()
}

/// Resolves the destination stop by id, or failing that by name.
///
/// A name matches when it is contained (case-insensitively) in a stop's
/// name; the first match in file order wins.
///
/// # Errors
///
/// Returns [`TransitError::UnknownDestination`] if neither lookup finds a
/// stop.
pub fn resolve_destination(
    stops: &[TransitStop],
    stop_id: Option<u64>,
    name: Option<&str>,
) -> Result<u64, TransitError> {
    if let Some(id) = stop_id {
        if stops.iter().any(|s| s.stop_id == id) {
            return Ok(id);
        }
        return Err(TransitError::UnknownDestination {
            message: format!("stop id {id} not in stop set"),
        });
    }

    let Some(name) = name else {
        return Err(TransitError::UnknownDestination {
            message: "neither destination_stop_id nor destination_stop_name is set".to_string(),
        });
    };

    let needle = name.to_lowercase();
    stops
        .iter()
        .find(|s| s.name.to_lowercase().contains(&needle))
        .map(|s| {
            log::info!("Destination '{name}' resolved to stop {} ({})", s.stop_id, s.name);
            s.stop_id
        })
        .ok_or_else(|| TransitError::UnknownDestination {
            message: format!("no stop named like '{name}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use property_map_transit_models::ServiceTime;

    const STOPS: &str = "\
stop_id,stop_name,stop_lat,stop_lon
\"19842\",\"Melbourne Central Railway Station (Melbourne City)\",\"-37.8099387\",\"144.9626131\"
\"19843\",\"Parliament Railway Station (Melbourne City)\",\"-37.8110079\",\"144.9728563\"
\"X1\",\"Bus bay\",\"-37.8\",\"144.9\"
";

    fn stops() -> Vec<TransitStop> {
        to_stops(read_csv_from(STOPS.as_bytes()).unwrap())
    }

    #[test]
    fn loads_stops_in_file_order_with_full_precision() {
        let stops = stops();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].stop_id, 19842);
        assert!((stops[0].latitude - -37.809_938_7).abs() < 1e-12);
        assert_eq!(stops[1].stop_id, 19843);
    }

    #[test]
    fn resolves_destination_by_id_or_name() {
        let stops = stops();
        assert_eq!(resolve_destination(&stops, Some(19843), None).unwrap(), 19843);
        assert_eq!(
            resolve_destination(&stops, None, Some("melbourne central")).unwrap(),
            19842
        );
        assert!(resolve_destination(&stops, Some(1), None).is_err());
        assert!(resolve_destination(&stops, None, Some("Flinders")).is_err());
        assert!(resolve_destination(&stops, None, None).is_err());
    }

    #[test]
    fn reads_stop_times_with_extra_columns() {
        let data = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence,stop_headsign,pickup_type
T1, 07:58:00 ,08:00:00,19843,1,,0
T1,08:03:00,08:03:00,19842,2,,0
";
        let rows: Vec<StopTimeRecord> = read_csv_from(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].arrival_time, ServiceTime::from_hms(7, 58, 0));
        assert_eq!(rows[1].stop_id, "19842");
    }

    #[test]
    fn malformed_time_is_an_error() {
        let data = "trip_id,arrival_time,departure_time,stop_id\nT1,soon,08:00:00,1\n";
        let result: Result<Vec<StopTimeRecord>, _> = read_csv_from(data.as_bytes());
        assert!(matches!(result, Err(TransitError::Csv(_))));
    }
}
