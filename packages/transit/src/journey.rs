//! Direct (single-trip) journey times to a fixed destination.

use std::collections::BTreeMap;

use crate::schedule::Schedule;

/// Default latest hour-of-day a qualifying trip may leave the origin.
pub const DEFAULT_MAX_DEPARTURE_HOUR: u32 = 9;

/// Answers "how long does a direct trip from A to B take in the morning".
#[derive(Debug, Clone)]
pub struct DirectJourneyEvaluator<'a> {
    schedule: &'a Schedule,
    max_departure_hour: u32,
}

impl<'a> DirectJourneyEvaluator<'a> {
    #[must_use]
    pub const fn new(schedule: &'a Schedule, max_departure_hour: u32) -> Self {
        Self {
            schedule,
            max_departure_hour,
        }
    }

    /// Mean travel time in whole minutes over every trip that visits
    /// `origin` and later `destination`, departing `origin` no later than
    /// hour `max_departure_hour`.
    ///
    /// Returns `Some(0)` when the two stops are the same and `None` when no
    /// trip qualifies. The mean is rounded half-to-even.
    #[must_use]
    pub fn evaluate(&self, origin: u64, destination: u64) -> Option<i64> {
        if origin == destination {
            return Some(0);
        }

        let mut total = 0.0;
        let mut count = 0u32;
        let mut connecting = 0u32;

        for (_, stops) in self.schedule.trips_through(origin) {
            let Some(from) = stops.iter().position(|s| s.stop_id == origin) else {
                continue;
            };
            let Some(to) = stops[from + 1..]
                .iter()
                .find(|s| s.stop_id == destination)
            else {
                continue;
            };
            connecting += 1;

            let departure = stops[from].departure;
            if departure.hour() > self.max_departure_hour {
                continue;
            }
            total += to.arrival.minutes_since(departure);
            count += 1;
        }

        if count == 0 {
            if connecting > 0 {
                log::debug!(
                    "Stop {origin}: {connecting} direct trips to {destination}, none leaving by hour {}",
                    self.max_departure_hour
                );
            }
            return None;
        }

        #[allow(clippy::cast_possible_truncation)]
        let minutes = (total / f64::from(count)).round_ties_even() as i64;
        Some(minutes)
    }
}

/// Journey minutes to the destination, evaluated once per origin stop.
#[derive(Debug, Clone, Default)]
pub struct JourneyTimes {
    destination: u64,
    minutes: BTreeMap<u64, Option<i64>>,
}

impl JourneyTimes {
    /// Evaluates every distinct origin in `origins` against `destination`.
    #[must_use]
    pub fn compute(
        evaluator: &DirectJourneyEvaluator<'_>,
        destination: u64,
        origins: impl IntoIterator<Item = u64>,
    ) -> Self {
        let mut minutes = BTreeMap::new();
        for origin in origins {
            minutes
                .entry(origin)
                .or_insert_with(|| evaluator.evaluate(origin, destination));
        }

        let reachable = minutes.values().filter(|m| m.is_some()).count();
        log::info!(
            "{reachable} of {} nearest stops have a direct morning trip to stop {destination}",
            minutes.len()
        );

        Self {
            destination,
            minutes,
        }
    }

    /// The destination stop the table was computed for.
    #[must_use]
    pub const fn destination(&self) -> u64 {
        self.destination
    }

    /// Minutes from `origin`, or `None` if unreachable or never computed.
    #[must_use]
    pub fn minutes(&self, origin: u64) -> Option<i64> {
        self.minutes.get(&origin).copied().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }
}
