#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Transit feed loading and direct-journey evaluation.
//!
//! The pipeline only needs two things from the schedule: the stop set (for
//! nearest-stop search) and, for a fixed destination stop, the average
//! single-trip travel time from any origin stop during the weekday morning
//! window. [`feed`] reads the GTFS files, [`schedule`] filters them down to
//! per-trip stop sequences, and [`journey`] answers the travel-time query.

pub mod feed;
pub mod journey;
pub mod schedule;

pub use feed::GtfsFeed;
pub use journey::{DirectJourneyEvaluator, JourneyTimes};
pub use schedule::{Schedule, ScheduleWindow};

/// Errors that can occur while loading the transit feed.
#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    /// I/O error reading a feed file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The configured destination stop is not in the stop set.
    #[error("Unknown destination stop: {message}")]
    UnknownDestination {
        /// Description of what was looked up.
        message: String,
    },
}
