//! Builder registry keyed by output format name.
//!
//! Callers select an output format by a short string such as `"xlsx"`; the
//! registry maps that key to a constructor and hands back a boxed
//! [`Builder`] bound to the registry's [`RenderSettings`].

use std::collections::HashMap;

use log::debug;

use super::error::ConfigurationError;
use super::ical::ICAL_CONTENT_TYPE;
use super::json::JSON_CONTENT_TYPE;
use super::xlsx::XLSX_CONTENT_TYPE;
use super::{Builder, IcalBuilder, JsonBuilder, RenderSettings, ScheduleInput, XlsxBuilder};

/// Constructor stored in a [`BuilderRegistry`].
pub type BuilderConstructor = fn(ScheduleInput, &RenderSettings) -> Box<dyn Builder>;

/// Output formats shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Spreadsheet workbook
    Xlsx,
    /// iCalendar feed
    Ics,
    /// JSON document
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Xlsx, OutputFormat::Ics, OutputFormat::Json];

    /// Parse an output format from its registry key.
    ///
    /// # Arguments
    /// * `s` - Key, case-insensitive (`"xlsx"`, `"ics"`, `"json"`)
    ///
    /// # Returns
    /// * `Ok(OutputFormat)` if known
    /// * `Err(ConfigurationError::UnknownFormat)` otherwise
    pub fn from_str(s: &str) -> Result<Self, ConfigurationError> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "ics" | "ical" => Ok(Self::Ics),
            "json" => Ok(Self::Json),
            _ => Err(ConfigurationError::UnknownFormat(s.to_string())),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Ics => "ics",
            OutputFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => XLSX_CONTENT_TYPE,
            OutputFormat::Ics => ICAL_CONTENT_TYPE,
            OutputFormat::Json => JSON_CONTENT_TYPE,
        }
    }

    fn constructor(&self) -> BuilderConstructor {
        match self {
            OutputFormat::Xlsx => XlsxBuilder::boxed,
            OutputFormat::Ics => IcalBuilder::boxed,
            OutputFormat::Json => JsonBuilder::boxed,
        }
    }
}

/// Maps format keys to builder constructors.
///
/// # Example
/// ```
/// use shifter_rust::builders::{BuilderRegistry, OutputFormat, RenderSettings};
/// use shifter_rust::core::Schedule;
///
/// let registry = BuilderRegistry::with_defaults(RenderSettings::default());
/// assert!(registry.supports("XLSX"));
/// assert!(registry.create("pdf", Schedule::default()).is_err());
/// assert_eq!(OutputFormat::from_str("ics").unwrap().key(), "ics");
/// ```
pub struct BuilderRegistry {
    constructors: HashMap<String, BuilderConstructor>,
    settings: RenderSettings,
}

impl BuilderRegistry {
    /// Create an empty registry.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            constructors: HashMap::new(),
            settings,
        }
    }

    /// Create a registry with every [`OutputFormat`] registered.
    pub fn with_defaults(settings: RenderSettings) -> Self {
        let mut registry = Self::new(settings);
        for format in OutputFormat::ALL {
            registry.register(format.key(), format.constructor());
        }
        registry
    }

    /// Register or replace the constructor for `key`.
    pub fn register(&mut self, key: &str, constructor: BuilderConstructor) {
        let key = key.trim().to_lowercase();
        debug!("Builder registry: registering '{}'", key);
        self.constructors.insert(key, constructor);
    }

    /// Whether `key` has a registered constructor.
    pub fn supports(&self, key: &str) -> bool {
        self.constructors.contains_key(&key.trim().to_lowercase())
    }

    /// Instantiate the builder registered under `key`.
    ///
    /// # Errors
    /// [`ConfigurationError::UnknownFormat`] when nothing is registered for `key`.
    pub fn create(
        &self,
        key: &str,
        input: impl Into<ScheduleInput>,
    ) -> Result<Box<dyn Builder>, ConfigurationError> {
        let constructor = self
            .constructors
            .get(&key.trim().to_lowercase())
            .ok_or_else(|| ConfigurationError::UnknownFormat(key.to_string()))?;
        Ok(constructor(input.into(), &self.settings))
    }

    /// Registered keys, sorted.
    pub fn formats(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        Self::with_defaults(RenderSettings::default())
    }
}
