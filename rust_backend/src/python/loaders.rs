use pyo3::prelude::*;
use std::path::PathBuf;

use super::{encode, runtime_error};
use crate::io::loaders::ScheduleLoader;
use crate::parsing::parse_schedule_html;

/// Parse a timetable page into a schedule document
///
/// Args:
///     markup: HTML of the weekly timetable grid
///
/// Returns:
///     str: JSON schedule document (weekday label -> events)
///
/// Example:
///     >>> import json, shifter_rust
///     >>> schedule = json.loads(shifter_rust.parse_schedule(html))
///     >>> schedule["Segunda-Feira"][0]["starts_at"]
///     '09:00'
#[pyfunction]
pub fn parse_schedule(markup: &str) -> PyResult<String> {
    let schedule =
        parse_schedule_html(markup).map_err(|e| runtime_error("Failed to parse timetable", e))?;
    encode(&schedule)
}

/// Load a schedule from a file (.html, .htm or .json)
///
/// Args:
///     file_path: Path to a saved timetable page or schedule document
///
/// Returns:
///     str: JSON schedule document
#[pyfunction]
pub fn load_schedule(file_path: &str) -> PyResult<String> {
    let path = PathBuf::from(file_path);

    let result = ScheduleLoader::load_from_file(&path)
        .map_err(|e| runtime_error("Failed to load schedule", format!("{:#}", e)))?;

    encode(&result.schedule)
}
