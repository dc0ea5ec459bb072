//! Python bindings for the Shifter timetable toolkit.
//!
//! This module exposes Rust functions to Python via PyO3. Schedules cross
//! the boundary as JSON documents in the format written by
//! [`crate::builders::json`].
//!
//! # Modules
//!
//! - [`loaders`]: Parsing timetable markup and loading saved files
//! - [`builders`]: Rendering documents and reporting collisions
//!
//! # Python API
//!
//! All functions are available in the `shifter_rust` Python module after
//! installation with the `extension-module` feature.

pub mod builders;
pub mod loaders;

pub use builders::*;
pub use loaders::*;

use pyo3::exceptions::PyRuntimeError;
use pyo3::PyErr;

use crate::core::Schedule;

fn runtime_error(context: &str, e: impl std::fmt::Display) -> PyErr {
    PyRuntimeError::new_err(format!("{}: {}", context, e))
}

fn encode(schedule: &Schedule) -> Result<String, PyErr> {
    let bytes = crate::builders::json::encode_schedule(schedule)
        .map_err(|e| runtime_error("Failed to encode schedule", e))?;
    String::from_utf8(bytes).map_err(|e| runtime_error("Failed to encode schedule", e))
}

fn decode(document: &str) -> Result<Schedule, PyErr> {
    crate::builders::decode_schedule(document.as_bytes())
        .map_err(|e| runtime_error("Failed to decode schedule", e))
}
