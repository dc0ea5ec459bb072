//! Schedule transformations.
//!
//! # Modules
//!
//! - [`filtering`]: Keep only selected course shifts
//! - [`merging`]: Combine several schedules into one
//!
//! Neither operation fails: unknown courses, shifts or weekdays are dropped
//! or carried over silently.

pub mod filtering;
pub mod merging;

pub use filtering::{filter_schedule, ShiftSelection};
pub use merging::merge_schedules;
