use pyo3::prelude::*;
use pyo3::types::PyBytes;
use std::collections::HashMap;

use super::{decode, runtime_error};
use crate::builders::{BuilderRegistry, RenderSettings};
use crate::core::{Schedule, Weekday};
use crate::transformations::ShiftSelection;

/// Render one or more schedule documents
///
/// Documents are optionally filtered, then merged in order before rendering.
///
/// Args:
///     documents: JSON schedule documents
///     format: Output format key ("xlsx", "ics" or "json")
///     selection: Optional mapping of course name -> allowed shift codes
///
/// Returns:
///     tuple[bytes, str]: Rendered document and its content type
///
/// Example:
///     >>> data, content_type = shifter_rust.build_schedule([doc], "ics")
#[pyfunction]
#[pyo3(signature = (documents, format, selection=None))]
pub fn build_schedule<'py>(
    py: Python<'py>,
    documents: Vec<String>,
    format: &str,
    selection: Option<HashMap<String, Vec<String>>>,
) -> PyResult<(Bound<'py, PyBytes>, String)> {
    let selection = selection.map(|courses| {
        courses
            .into_iter()
            .fold(ShiftSelection::new(), |selection, (course, shifts)| {
                selection.allow(&course, shifts)
            })
    });

    let schedules = documents
        .iter()
        .map(|document| {
            let schedule = decode(document)?;
            Ok(match &selection {
                Some(selection) => schedule.filter(selection),
                None => schedule,
            })
        })
        .collect::<PyResult<Vec<Schedule>>>()?;

    let registry = BuilderRegistry::with_defaults(RenderSettings::default());
    let builder = registry
        .create(format, schedules)
        .map_err(|e| runtime_error("Failed to create builder", e))?;
    let output = builder
        .build()
        .map_err(|e| runtime_error("Failed to build schedule", e))?;

    Ok((
        PyBytes::new(py, &output.bytes),
        output.content_type.to_string(),
    ))
}

/// Collision markers of one weekday
///
/// Args:
///     document: JSON schedule document
///     weekday: Weekday label, Portuguese or English ("Segunda-Feira", "Monday")
///
/// Returns:
///     list[str]: "HH:MM" for simultaneous starts, "(HH:MM, HH:MM)" for overlaps
#[pyfunction]
pub fn schedule_collisions(document: &str, weekday: &str) -> PyResult<Vec<String>> {
    let schedule = decode(document)?;
    let weekday =
        Weekday::from_label(weekday).map_err(|e| runtime_error("Invalid weekday", e))?;

    Ok(schedule
        .collisions(weekday)
        .iter()
        .map(ToString::to_string)
        .collect())
}
