//! Fetch, parse, cache and convert pipeline.
//!
//! [`SchedulePipeline::load_group`] turns a [`ScheduleRequest`] into a
//! [`ScheduleGroup`] (one schedule per curricular year), answering from the
//! cache when a fresh entry exists. [`SchedulePipeline::convert`] narrows a
//! group to the selected shifts and renders it through the builder registry.

use std::collections::BTreeMap;

use log::{info, warn};

use super::fetcher::{FetchError, FetcherSession, ScheduleFetcher};
use crate::builders::{BuildError, BuildOutput, BuilderRegistry, ConfigurationError};
use crate::cache::{CacheError, CacheStoreFactory, TtlCache};
use crate::config::ShifterConfig;
use crate::core::{ParsingError, Schedule, ScheduleGroup};
use crate::parsing::ScheduleParser;
use crate::transformations::ShiftSelection;

/// Highest curricular year requested when fetching every year.
pub const MAX_YEAR: u8 = 4;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error raised by the pipeline. Collaborator errors pass through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parsing error: {0}")]
    Parsing(#[from] ParsingError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Academic semester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub fn from_number(number: u8) -> Result<Self, PipelineError> {
        match number {
            1 => Ok(Semester::First),
            2 => Ok(Semester::Second),
            other => Err(PipelineError::InvalidRequest(format!(
                "semester must be 1 or 2, got {}",
                other
            ))),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Semester::First => 1,
            Semester::Second => 2,
        }
    }
}

/// Curricular years covered by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YearSelection {
    All,
    Year(u8),
}

impl YearSelection {
    /// `0` selects every year, `1..=4` a single one.
    pub fn from_number(number: u8) -> Result<Self, PipelineError> {
        match number {
            0 => Ok(YearSelection::All),
            1..=MAX_YEAR => Ok(YearSelection::Year(number)),
            other => Err(PipelineError::InvalidRequest(format!(
                "year must be between 0 and {}, got {}",
                MAX_YEAR, other
            ))),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            YearSelection::All => 0,
            YearSelection::Year(year) => *year,
        }
    }
}

/// Validated request for a course timetable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub course_name: String,
    pub semester: Semester,
    pub years: YearSelection,
}

impl ScheduleRequest {
    /// # Errors
    /// [`PipelineError::InvalidRequest`] for a blank course name, a semester
    /// outside `1..=2` or a year outside `0..=4`.
    pub fn new(course_name: &str, semester: u8, years: u8) -> Result<Self, PipelineError> {
        let course_name = course_name.trim();
        if course_name.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "course name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            course_name: course_name.to_string(),
            semester: Semester::from_number(semester)?,
            years: YearSelection::from_number(years)?,
        })
    }

    /// Cache key: lowercased course name without spaces, then years and
    /// semester numbers.
    ///
    /// ```
    /// use shifter_rust::services::ScheduleRequest;
    ///
    /// let request = ScheduleRequest::new("Engenharia Informática", 1, 0).unwrap();
    /// assert_eq!(request.cache_key(), "engenhariainformática_0_1");
    /// ```
    pub fn cache_key(&self) -> String {
        let course: String = self
            .course_name
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        format!("{}_{}_{}", course, self.years.number(), self.semester.number())
    }
}

/// Reference dates (`dd-mm-yyyy`) sent to the source for each semester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterDates {
    pub first: String,
    pub second: String,
}

impl Default for SemesterDates {
    fn default() -> Self {
        Self {
            first: "01-11-2023".to_string(),
            second: "01-03-2024".to_string(),
        }
    }
}

impl SemesterDates {
    pub fn date_for(&self, semester: Semester) -> &str {
        match semester {
            Semester::First => &self.first,
            Semester::Second => &self.second,
        }
    }
}

/// Orchestrates the timetable source, parser, cache and builders.
pub struct SchedulePipeline<F: ScheduleFetcher> {
    session: FetcherSession<F>,
    cache: TtlCache,
    parser: ScheduleParser,
    registry: BuilderRegistry,
    dates: SemesterDates,
}

impl<F: ScheduleFetcher> SchedulePipeline<F> {
    pub fn new(
        fetcher: F,
        cache: TtlCache,
        registry: BuilderRegistry,
        dates: SemesterDates,
    ) -> PipelineResult<Self> {
        Ok(Self {
            session: FetcherSession::new(fetcher),
            cache,
            parser: ScheduleParser::new()?,
            registry,
            dates,
        })
    }

    /// Build a pipeline from application configuration.
    pub fn from_config(fetcher: F, config: &ShifterConfig) -> PipelineResult<Self> {
        let cache = CacheStoreFactory::create_cache(&config.cache)?;
        let registry = BuilderRegistry::with_defaults(config.render_settings());
        Self::new(fetcher, cache, registry, config.semester_dates())
    }

    pub fn session(&self) -> &FetcherSession<F> {
        &self.session
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    pub fn registry(&self) -> &BuilderRegistry {
        &self.registry
    }

    /// Load the schedules of every requested year.
    ///
    /// A fresh cache entry short-circuits the source. Otherwise the session
    /// is leased for the whole fetch, each page is parsed and the resulting
    /// group is cached before being returned. When every year is requested,
    /// years are fetched from 1 upwards until the source reports
    /// [`FetchError::YearOutOfBounds`].
    pub fn load_group(&self, request: &ScheduleRequest) -> PipelineResult<ScheduleGroup> {
        let key = request.cache_key();
        if let Some(group) = self.cache.get::<ScheduleGroup>(&key, None)? {
            info!("Pipeline: cache hit for '{}'", key);
            return Ok(group);
        }

        info!("Pipeline: fetching '{}'", request.course_name);
        let mut fetcher = self.session.lease();
        let course_name = fetcher.resolve_course(&request.course_name)?;
        let date = self.dates.date_for(request.semester);

        let mut group = ScheduleGroup::new(course_name.clone());
        match request.years {
            YearSelection::All => {
                for year in 1..=MAX_YEAR {
                    match fetcher.fetch(&course_name, Some(year), date) {
                        Ok(markup) => group.insert_year(year, self.parser.parse(&markup)?),
                        Err(FetchError::YearOutOfBounds { .. }) => break,
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            YearSelection::Year(year) => {
                let markup = fetcher.fetch(&course_name, Some(year), date)?;
                group.insert_year(year, self.parser.parse(&markup)?);
            }
        }
        drop(fetcher);

        info!(
            "Pipeline: loaded {} year(s) of '{}'",
            group.years.len(),
            group.course_name
        );
        self.cache.set(&key, &group)?;
        Ok(group)
    }

    /// Narrow `group` to the selected shifts and render it as `format`.
    ///
    /// Each selected year is filtered with its own [`ShiftSelection`] and the
    /// results are merged in year order. Years absent from the group are
    /// skipped.
    pub fn convert(
        &self,
        group: &ScheduleGroup,
        selections: &BTreeMap<u8, ShiftSelection>,
        format: &str,
    ) -> PipelineResult<BuildOutput> {
        let mut schedules: Vec<Schedule> = Vec::with_capacity(selections.len());
        for (year, selection) in selections {
            match group.year(*year) {
                Some(schedule) => schedules.push(schedule.filter(selection)),
                None => warn!(
                    "Pipeline: '{}' has no year {}, skipping its selection",
                    group.course_name, year
                ),
            }
        }

        let builder = self.registry.create(format, schedules)?;
        let output = builder.build()?;
        info!(
            "Pipeline: rendered {} bytes of {}",
            output.bytes.len(),
            output.content_type
        );
        Ok(output)
    }
}
