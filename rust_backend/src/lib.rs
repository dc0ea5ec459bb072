//! Shifter: weekly course timetable toolkit.
//!
//! Parses institutional weekly timetable grids into typed schedules, detects
//! overlapping events, lays them out on a spreadsheet grid and renders them
//! as spreadsheets, calendar feeds or JSON.
//!
//! # Modules
//!
//! - [`core`]: Weekdays, events and schedules
//! - [`parsing`]: Timetable grid parser
//! - [`algorithms`]: Collision detection, palette and layout allocation
//! - [`transformations`]: Shift filtering and schedule merging
//! - [`builders`]: Output formats and the builder registry
//! - [`cache`]: Time-to-live cache for fetched schedules
//! - [`services`]: Timetable source session and fetch/convert pipeline
//! - [`config`]: `shifter.toml` configuration
//! - [`io`]: File loaders

pub mod algorithms;
pub mod builders;
pub mod cache;
pub mod config;
pub mod core;
pub mod io;
pub mod parsing;
pub mod services;
pub mod transformations;

#[cfg(feature = "python")]
pub mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Shifter Python module
#[cfg(feature = "python")]
#[pymodule]
fn shifter_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Parsing and loading
    m.add_function(wrap_pyfunction!(python::parse_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(python::load_schedule, m)?)?;

    // Rendering
    m.add_function(wrap_pyfunction!(python::build_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(python::schedule_collisions, m)?)?;

    Ok(())
}
