//! High-level file loading utilities.
//!
//! Loaders combine format detection, parsing and error context, and produce
//! ready-to-use [`crate::core::Schedule`] values from saved timetable pages or
//! JSON documents.
//!
//! # Example
//!
//! ```no_run
//! use shifter_rust::io::loaders::ScheduleLoader;
//! use std::path::Path;
//!
//! let result = ScheduleLoader::load_from_file(Path::new("timetable.html"))
//!     .expect("Failed to load");
//! println!("Loaded {} events", result.num_events);
//! ```

pub mod loaders;


pub use loaders::{ScheduleLoadResult, ScheduleLoader, ScheduleSourceType};
