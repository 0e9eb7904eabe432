//! Schedule filtering and per-trip stop sequences.
//!
//! Filters the raw tables down to weekday services and the configured
//! departure window, then derives each trip's ordered sequence of distinct
//! stops. Rows are sorted by time within a trip before the sequence is
//! taken, so the result does not depend on the row order of
//! `stop_times.txt`.

use std::collections::{BTreeMap, BTreeSet};

use property_map_transit_models::{CalendarEntry, ServiceTime, StopTimeRecord, TripRecord};
use serde::{Deserialize, Serialize};

/// Time window a stop-time row must fall in to be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    /// Earliest departure kept (inclusive).
    pub earliest_departure: ServiceTime,
    /// Departures at or after this are dropped.
    pub departure_before: ServiceTime,
    /// Arrivals at or after this are dropped.
    pub arrival_before: ServiceTime,
}

impl Default for ScheduleWindow {
    fn default() -> Self {
        Self {
            earliest_departure: ServiceTime::from_hms(7, 0, 0),
            departure_before: ServiceTime::from_hms(24, 0, 0),
            arrival_before: ServiceTime::from_hms(24, 0, 0),
        }
    }
}

impl ScheduleWindow {
    /// Returns `true` if the row's times fall in the window.
    #[must_use]
    pub fn contains(&self, arrival: ServiceTime, departure: ServiceTime) -> bool {
        departure >= self.earliest_departure
            && departure < self.departure_before
            && arrival < self.arrival_before
    }
}

/// One stop visit within a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripStop {
    /// Visited stop.
    pub stop_id: u64,
    /// Scheduled arrival.
    pub arrival: ServiceTime,
    /// Scheduled departure.
    pub departure: ServiceTime,
}

/// Filtered schedule: every kept trip with its ordered distinct stops.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    /// `(trip id, stops)` in trip-id order.
    trips: Vec<(String, Vec<TripStop>)>,
    /// Stop id to indices into `trips` of the trips visiting it.
    trips_by_stop: BTreeMap<u64, Vec<usize>>,
}

impl Schedule {
    /// Filters the raw tables and builds per-trip stop sequences.
    #[must_use]
    pub fn build(
        calendar: &[CalendarEntry],
        trips: &[TripRecord],
        stop_times: &[StopTimeRecord],
        window: &ScheduleWindow,
    ) -> Self {
        let services: BTreeSet<&str> = calendar
            .iter()
            .filter(|c| c.runs_every_weekday())
            .map(|c| c.service_id.as_str())
            .collect();
        log::info!(
            "{} of {} services run every weekday",
            services.len(),
            calendar.len()
        );

        let trip_ids: BTreeSet<&str> = trips
            .iter()
            .filter(|t| services.contains(t.service_id.as_str()))
            .map(|t| t.trip_id.as_str())
            .collect();
        log::info!("{} of {} trips on weekday services", trip_ids.len(), trips.len());

        let mut grouped: BTreeMap<&str, Vec<(TripStop, u32)>> = BTreeMap::new();
        let mut kept = 0usize;
        let mut bad_stop_ids = 0usize;

        for row in stop_times {
            if !trip_ids.contains(row.trip_id.as_str())
                || !window.contains(row.arrival_time, row.departure_time)
            {
                continue;
            }
            let Ok(stop_id) = row.stop_id.parse::<u64>() else {
                bad_stop_ids += 1;
                continue;
            };
            kept += 1;
            grouped.entry(row.trip_id.as_str()).or_default().push((
                TripStop {
                    stop_id,
                    arrival: row.arrival_time,
                    departure: row.departure_time,
                },
                row.stop_sequence.unwrap_or(u32::MAX),
            ));
        }

        if bad_stop_ids > 0 {
            log::warn!("Skipped {bad_stop_ids} stop times with non-numeric stop ids");
        }
        log::info!(
            "{kept} of {} stop times in window {}..{} (arrival before {})",
            stop_times.len(),
            window.earliest_departure,
            window.departure_before,
            window.arrival_before
        );

        let mut schedule = Self::default();
        for (trip_id, mut visits) in grouped {
            visits.sort_by_key(|(visit, sequence)| (visit.departure, visit.arrival, *sequence));

            let mut seen = BTreeSet::new();
            let stops: Vec<TripStop> = visits
                .into_iter()
                .map(|(visit, _)| visit)
                .filter(|visit| seen.insert(visit.stop_id))
                .collect();

            let index = schedule.trips.len();
            for visit in &stops {
                schedule
                    .trips_by_stop
                    .entry(visit.stop_id)
                    .or_default()
                    .push(index);
            }
            schedule.trips.push((trip_id.to_string(), stops));
        }

        log::info!("Built stop sequences for {} trips", schedule.trips.len());
        schedule
    }

    /// Number of trips with at least one kept stop time.
    #[must_use]
    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// Ordered distinct stops of a trip.
    #[must_use]
    pub fn trip(&self, trip_id: &str) -> Option<&[TripStop]> {
        self.trips
            .binary_search_by(|(id, _)| id.as_str().cmp(trip_id))
            .ok()
            .map(|i| self.trips[i].1.as_slice())
    }

    /// Trips visiting `stop_id`, in trip-id order.
    pub fn trips_through(&self, stop_id: u64) -> impl Iterator<Item = (&str, &[TripStop])> {
        self.trips_by_stop
            .get(&stop_id)
            .into_iter()
            .flatten()
            .map(|&i| (self.trips[i].0.as_str(), self.trips[i].1.as_slice()))
    }
}
