//! Core domain models for weekly course timetables.
//!
//! This module defines the fundamental data structures used throughout the
//! crate: weekdays, event bodies, events, and the schedules that hold them.

pub mod domain;
pub mod error;
pub mod schedule;

pub use domain::{
    title_case, DurationHint, EventBody, EventDuration, Location, ScheduleEvent, Weekday,
    TALL_BLOCK_HEIGHT_PX,
};
pub use error::ParsingError;
pub use schedule::{Schedule, ScheduleGroup};
