//! Nearest transit stop search.

use geo::{Distance, Haversine, Point};
use property_map_property_models::{NearestStop, round_to};
use property_map_transit_models::TransitStop;

/// Great-circle distance in kilometres between two points given in degrees.
///
/// Uses [`Haversine`] with the mean Earth radius of 6371.0088 km.
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    Haversine.distance(Point::new(lng1, lat1), Point::new(lng2, lat2)) / 1000.0
}

/// Linear-scan nearest-stop search.
///
/// Stops are kept in the order given (file order). On an exact distance
/// tie the earlier stop wins.
#[derive(Debug, Clone, Default)]
pub struct NearestStopFinder {
    stops: Vec<TransitStop>,
}

impl NearestStopFinder {
    /// Wraps a stop set, preserving its order.
    #[must_use]
    pub const fn new(stops: Vec<TransitStop>) -> Self {
        Self { stops }
    }

    /// Returns the closest stop and its distance rounded to 3 places, or
    /// `None` if the stop set is empty.
    #[must_use]
    pub fn nearest(&self, lat: f64, lng: f64) -> Option<NearestStop> {
        let mut best: Option<(&TransitStop, f64)> = None;

        for stop in &self.stops {
            let distance = haversine_km(lat, lng, stop.latitude, stop.longitude);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((stop, distance)),
            }
        }

        best.map(|(stop, distance)| NearestStop {
            stop_id: stop.stop_id,
            distance_km: round_to(distance, 3),
        })
    }

    /// The stops in search order.
    #[must_use]
    pub fn stops(&self) -> &[TransitStop] {
        &self.stops
    }
}
