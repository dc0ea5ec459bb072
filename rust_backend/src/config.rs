//! Configuration file support.
//!
//! Settings are read from a `shifter.toml` file. Every section and field is
//! optional and falls back to the defaults below.
//!
//! ```toml
//! [cache]
//! store = "local"            # or "sqlite"
//! path = "shifter_cache.sqlite3"
//! ttl_secs = 1209600
//!
//! [semesters]
//! first = "01-11-2023"
//! second = "01-03-2024"
//!
//! [calendar]
//! name = "Shifter Schedule"
//! timezone = "Europe/Lisbon"
//! reference_date = "2021-07-30"
//!
//! # VTIMEZONE rules of `timezone`; omit `daylight` for a fixed offset
//! [calendar.zone.standard]
//! name = "WET"
//! offset = "+0000"
//! transition = { month = 10, day = "-1SU", at = "02:00" }
//!
//! [calendar.zone.daylight]
//! name = "WEST"
//! offset = "+0100"
//! transition = { month = 3, day = "-1SU", at = "01:00" }
//!
//! [spreadsheet]
//! sheet_name = "Your Schedule"
//! palette_exhaustion = "wrap"  # "fallback" or "error"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::algorithms::PaletteExhaustion;
use crate::builders::{ConfigurationError, RenderSettings, TimezoneRules};
use crate::cache::{CacheStoreType, DEFAULT_TTL_DAYS};
use crate::services::SemesterDates;

/// Application configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShifterConfig {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub semesters: SemesterSettings,
    #[serde(default)]
    pub calendar: CalendarSettings,
    #[serde(default)]
    pub spreadsheet: SpreadsheetSettings,
}

/// Cache store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_store")]
    pub store: String,
    /// Database file for the SQLite store.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

/// Reference dates sent to the timetable source, `dd-mm-yyyy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterSettings {
    #[serde(default = "default_first_semester")]
    pub first: String,
    #[serde(default = "default_second_semester")]
    pub second: String,
}

/// Calendar feed settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSettings {
    #[serde(default = "default_calendar_name")]
    pub name: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_reference_date")]
    pub reference_date: NaiveDate,
    /// `VTIMEZONE` rules for `timezone`; the defaults describe Europe/Lisbon.
    #[serde(default)]
    pub zone: TimezoneRules,
}

/// Spreadsheet settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetSettings {
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default)]
    pub palette_exhaustion: PaletteExhaustion,
}

fn default_store() -> String {
    "local".to_string()
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("shifter_cache.sqlite3")
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_DAYS as u64 * 24 * 60 * 60
}

fn default_first_semester() -> String {
    "01-11-2023".to_string()
}

fn default_second_semester() -> String {
    "01-03-2024".to_string()
}

fn default_calendar_name() -> String {
    RenderSettings::default().calendar_name
}

fn default_timezone() -> String {
    RenderSettings::default().timezone
}

fn default_reference_date() -> NaiveDate {
    RenderSettings::default().reference_date
}

fn default_sheet_name() -> String {
    RenderSettings::default().sheet_name
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            store: default_store(),
            path: default_cache_path(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheSettings {
    /// Get the store type from configuration.
    pub fn store_type(&self) -> Result<CacheStoreType, String> {
        CacheStoreType::from_str(&self.store)
    }
}

impl Default for SemesterSettings {
    fn default() -> Self {
        Self {
            first: default_first_semester(),
            second: default_second_semester(),
        }
    }
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            name: default_calendar_name(),
            timezone: default_timezone(),
            reference_date: default_reference_date(),
            zone: TimezoneRules::default(),
        }
    }
}

impl Default for SpreadsheetSettings {
    fn default() -> Self {
        Self {
            sheet_name: default_sheet_name(),
            palette_exhaustion: PaletteExhaustion::default(),
        }
    }
}

impl ShifterConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ShifterConfig)` if successful
    /// * `Err(ConfigurationError)` if the file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigurationError::Invalid(format!("Failed to read config file: {}", e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        let config: ShifterConfig = toml::from_str(content).map_err(|e| {
            ConfigurationError::Invalid(format!("Failed to parse config file: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `shifter.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigurationError> {
        let search_paths = [
            PathBuf::from("shifter.toml"),
            PathBuf::from("rust_backend/shifter.toml"),
            PathBuf::from("../shifter.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(ConfigurationError::Invalid(
            "No shifter.toml found in standard locations".to_string(),
        ))
    }

    /// Check values that deserialize but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.cache.store_type().map_err(|e| {
            ConfigurationError::Invalid(format!("Invalid cache store: {}", e))
        })?;

        if self.cache.ttl_secs == 0 {
            return Err(ConfigurationError::Invalid(
                "'cache.ttl_secs' must be positive".to_string(),
            ));
        }

        for (field, value) in [
            ("semesters.first", &self.semesters.first),
            ("semesters.second", &self.semesters.second),
        ] {
            NaiveDate::parse_from_str(value, "%d-%m-%Y").map_err(|_| {
                ConfigurationError::Invalid(format!(
                    "'{}' must be a dd-mm-yyyy date, got '{}'",
                    field, value
                ))
            })?;
        }

        if self.calendar.timezone.trim().is_empty() {
            return Err(ConfigurationError::Invalid(
                "'calendar.timezone' must not be empty".to_string(),
            ));
        }
        self.calendar.zone.validate()?;

        Ok(())
    }

    /// Presentation settings for the builders.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            sheet_name: self.spreadsheet.sheet_name.clone(),
            palette_exhaustion: self.spreadsheet.palette_exhaustion,
            calendar_name: self.calendar.name.clone(),
            timezone: self.calendar.timezone.clone(),
            timezone_rules: self.calendar.zone.clone(),
            reference_date: self.calendar.reference_date,
        }
    }

    pub fn semester_dates(&self) -> SemesterDates {
        SemesterDates {
            first: self.semesters.first.clone(),
            second: self.semesters.second.clone(),
        }
    }
}
