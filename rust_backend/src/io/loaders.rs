use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::Path;

use crate::builders::{decode_schedule, BuildOutput};
use crate::core::Schedule;
use crate::parsing::parse_schedule_html;

/// Represents the source type of schedule data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSourceType {
    Html,
    Json,
}

/// Result of loading schedule data
#[derive(Debug, Clone)]
pub struct ScheduleLoadResult {
    pub schedule: Schedule,
    pub source_type: ScheduleSourceType,
    pub num_events: usize,
}

impl ScheduleLoadResult {
    pub fn new(schedule: Schedule, source_type: ScheduleSourceType) -> Self {
        let num_events = schedule.len();
        Self {
            schedule,
            source_type,
            num_events,
        }
    }
}

/// Unified interface for loading schedules from timetable pages or JSON
pub struct ScheduleLoader;

impl ScheduleLoader {
    /// Load a schedule from a file (detects HTML or JSON by extension)
    pub fn load_from_file(path: &Path) -> Result<ScheduleLoadResult> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .context("File has no extension")?;

        match extension.to_lowercase().as_str() {
            "html" | "htm" => Self::load_from_html(path),
            "json" => Self::load_from_json(path),
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        }
    }

    /// Load a schedule from a saved timetable page
    pub fn load_from_html(html_path: &Path) -> Result<ScheduleLoadResult> {
        let markup = fs::read_to_string(html_path)
            .with_context(|| format!("Failed to read {}", html_path.display()))?;
        let result = Self::load_from_html_str(&markup)?;
        info!(
            "Loaded {} events from {}",
            result.num_events,
            html_path.display()
        );
        Ok(result)
    }

    /// Load a schedule from timetable markup
    pub fn load_from_html_str(markup: &str) -> Result<ScheduleLoadResult> {
        let schedule = parse_schedule_html(markup).context("Failed to parse timetable markup")?;
        Ok(ScheduleLoadResult::new(schedule, ScheduleSourceType::Html))
    }

    /// Load a schedule from a JSON document
    pub fn load_from_json(json_path: &Path) -> Result<ScheduleLoadResult> {
        let bytes = fs::read(json_path)
            .with_context(|| format!("Failed to read {}", json_path.display()))?;
        let schedule = decode_schedule(&bytes).context("Failed to parse JSON file")?;
        Ok(ScheduleLoadResult::new(schedule, ScheduleSourceType::Json))
    }

    /// Load a schedule from a JSON string
    pub fn load_from_json_str(json_str: &str) -> Result<ScheduleLoadResult> {
        let schedule =
            decode_schedule(json_str.as_bytes()).context("Failed to parse JSON string")?;
        Ok(ScheduleLoadResult::new(schedule, ScheduleSourceType::Json))
    }

    /// Write a rendered document to disk
    pub fn save_output(output: &BuildOutput, path: &Path) -> Result<()> {
        fs::write(path, &output.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "Wrote {} bytes of {} to {}",
            output.bytes.len(),
            output.content_type,
            path.display()
        );
        Ok(())
    }
}
