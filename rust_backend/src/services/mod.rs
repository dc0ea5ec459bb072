//! Service layer for fetching and converting course timetables.
//!
//! This module sits between the timetable source and the callers (Python
//! bindings or a request handler). It owns the source session and
//! orchestrates parsing, caching, filtering and rendering.

pub mod fetcher;
pub mod pipeline;

pub use fetcher::{FetchError, FetcherSession, InMemoryFetcher, ScheduleFetcher, SessionLease};
pub use pipeline::{
    PipelineError, PipelineResult, ScheduleRequest, SchedulePipeline, Semester, SemesterDates,
    YearSelection, MAX_YEAR,
};
