//! Output format builders.
//!
//! Every builder consumes one [`Schedule`] (several inputs are merged first)
//! and renders it to bytes tagged with a content type.
//!
//! # Builders
//!
//! - [`xlsx`]: Spreadsheet grid, laid out by [`crate::algorithms::allocate`]
//! - [`ical`]: Recurring weekly calendar feed
//! - [`json`]: Structured weekday to events mapping
//!
//! Builders are usually obtained through a [`BuilderRegistry`]:
//!
//! ```
//! use shifter_rust::builders::{Builder, BuilderRegistry, RenderSettings};
//! use shifter_rust::core::{Schedule, Weekday};
//!
//! let registry = BuilderRegistry::with_defaults(RenderSettings::default());
//! let builder = registry.create("json", Schedule::new([Weekday::Monday])).unwrap();
//! let output = builder.build().unwrap();
//! assert_eq!(output.content_type, "application/json");
//! ```

pub mod error;
pub mod ical;
pub mod json;
pub mod registry;
pub mod timezone;
pub mod xlsx;

use chrono::NaiveDate;

use crate::algorithms::PaletteExhaustion;
use crate::core::Schedule;

pub use error::{BuildError, BuildResult, ConfigurationError};
pub use ical::IcalBuilder;
pub use json::{decode_schedule, JsonBuilder};
pub use registry::{BuilderConstructor, BuilderRegistry, OutputFormat};
pub use timezone::{TimezoneRules, ZoneObservance, ZoneTransition};
pub use xlsx::XlsxBuilder;

/// Rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Common contract of all output builders.
pub trait Builder: Send + Sync {
    /// Render the schedule held by the builder.
    fn build(&self) -> BuildResult<BuildOutput>;

    /// MIME type of the rendered document.
    fn content_type(&self) -> &'static str;

    /// Conventional file extension, without the dot.
    fn extension(&self) -> &'static str;
}

/// One schedule, or several to be merged before rendering.
#[derive(Debug, Clone)]
pub enum ScheduleInput {
    Single(Schedule),
    Many(Vec<Schedule>),
}

impl ScheduleInput {
    pub fn into_schedule(self) -> Schedule {
        match self {
            ScheduleInput::Single(schedule) => schedule,
            ScheduleInput::Many(schedules) => Schedule::merge(&schedules),
        }
    }
}

impl From<Schedule> for ScheduleInput {
    fn from(schedule: Schedule) -> Self {
        ScheduleInput::Single(schedule)
    }
}

impl From<Vec<Schedule>> for ScheduleInput {
    fn from(schedules: Vec<Schedule>) -> Self {
        ScheduleInput::Many(schedules)
    }
}

/// Presentation settings shared by the builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub sheet_name: String,
    pub palette_exhaustion: PaletteExhaustion,
    pub calendar_name: String,
    /// IANA zone name attached to calendar times.
    pub timezone: String,
    /// `VTIMEZONE` definition of `timezone`.
    pub timezone_rules: TimezoneRules,
    /// Events are anchored on the first matching weekday on or after this date.
    pub reference_date: NaiveDate,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sheet_name: "Your Schedule".to_string(),
            palette_exhaustion: PaletteExhaustion::default(),
            calendar_name: "Shifter Schedule".to_string(),
            timezone: "Europe/Lisbon".to_string(),
            timezone_rules: TimezoneRules::default(),
            reference_date: NaiveDate::from_ymd_opt(2021, 7, 30).unwrap_or_default(),
        }
    }
}
