//! Domain models for timetable events.
//!
//! A timetable is a weekly grid: every event belongs to a [`Weekday`], starts
//! on a 30 minute boundary and lasts one or two hours. The free-text title of a
//! rendered block is decomposed into an [`EventBody`] carrying the course name,
//! its [`Location`] and the shift code.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::ParsingError;

/// Rendered block height above which an event is considered two hours long.
pub const TALL_BLOCK_HEIGHT_PX: u32 = 200;

static TITLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*)\[(.*)\](.*)$").expect("valid title regex"));

static HEIGHT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"height:\s*(\d+)px").expect("valid height regex"));

/// Words kept lowercase by [`title_case`] unless they open the phrase.
const MINOR_WORDS: [&str; 9] = ["e", "de", "da", "do", "das", "dos", "em", "na", "para"];

/// Day of the week an event recurs on.
///
/// Ordering follows the calendar week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Every weekday in calendar order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Parse a weekday header label.
    ///
    /// Accepts the timetable's own labels (`Segunda-Feira`, `Sábado`, ...) in
    /// any casing, their short form without `-feira`, unaccented spellings and
    /// English day names.
    ///
    /// # Examples
    ///
    /// ```
    /// use shifter_rust::core::Weekday;
    ///
    /// assert_eq!(Weekday::from_label("segunda-feira").unwrap(), Weekday::Monday);
    /// assert_eq!(Weekday::from_label("Wednesday").unwrap(), Weekday::Wednesday);
    /// assert!(Weekday::from_label("Someday").is_err());
    /// ```
    pub fn from_label(label: &str) -> Result<Self, ParsingError> {
        let key = fold_accents(&label.trim().to_lowercase());
        Self::ALL
            .into_iter()
            .find(|day| {
                let local = fold_accents(&day.label().to_lowercase());
                key == local
                    || local.split('-').next() == Some(key.as_str())
                    || key == day.english().to_lowercase()
            })
            .ok_or_else(|| ParsingError::UnknownWeekday(label.trim().to_string()))
    }

    /// Header label as rendered by the timetable site.
    pub fn label(&self) -> &'static str {
        match self {
            Weekday::Monday => "Segunda-Feira",
            Weekday::Tuesday => "Terça-Feira",
            Weekday::Wednesday => "Quarta-Feira",
            Weekday::Thursday => "Quinta-Feira",
            Weekday::Friday => "Sexta-Feira",
            Weekday::Saturday => "Sábado",
            Weekday::Sunday => "Domingo",
        }
    }

    pub fn english(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Two-letter `BYDAY` code used in iCalendar recurrence rules.
    pub fn ical_code(&self) -> &'static str {
        match self {
            Weekday::Monday => "MO",
            Weekday::Tuesday => "TU",
            Weekday::Wednesday => "WE",
            Weekday::Thursday => "TH",
            Weekday::Friday => "FR",
            Weekday::Saturday => "SA",
            Weekday::Sunday => "SU",
        }
    }

    /// Zero-based position in the week, Monday being 0.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Weekday {
    type Err = ParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl Serialize for Weekday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::from_label(&label).map_err(serde::de::Error::custom)
    }
}

fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Title-case a course name for display.
///
/// Every word is capitalized except the minor connecting words, which stay
/// lowercase unless they are the first word.
///
/// ```
/// use shifter_rust::core::title_case;
///
/// assert_eq!(title_case("bases de dados"), "Bases de Dados");
/// assert_eq!(title_case("DE volta"), "De Volta");
/// ```
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i > 0 && MINOR_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                lower
                    .split('-')
                    .map(capitalize)
                    .collect::<Vec<_>>()
                    .join("-")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Room address parsed from a `Campus-Building-Room` fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub campus: String,
    pub building: String,
    pub room: String,
}

impl FromStr for Location {
    type Err = ParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let parts: Vec<&str> = compact.split('-').collect();
        let [campus, building, room] = parts.as_slice() else {
            return Err(ParsingError::InvalidLocation(s.to_string()));
        };

        Ok(Self {
            campus: campus.to_string(),
            building: building.replace("Edifício", "CP").replace("Edificio", "CP"),
            room: room.to_string(),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} {}", self.campus, self.building, self.room)
    }
}

/// Parsed content of an event block title: `name [location] shift`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventBody {
    /// Lowercased course name, used for equality and selection lookups.
    #[serde(rename = "name")]
    pub course_name: String,
    pub location: Location,
    pub shift: String,
}

impl EventBody {
    pub fn new(course_name: &str, location: Location, shift: &str) -> Self {
        Self {
            course_name: course_name.trim().to_lowercase(),
            location,
            shift: shift.trim().to_string(),
        }
    }

    /// Decompose a block title into its three segments.
    ///
    /// # Errors
    /// * [`ParsingError::InvalidTitle`] when the bracketed segment is missing or
    ///   the name or shift is blank
    /// * [`ParsingError::InvalidLocation`] when the bracketed segment is not a
    ///   three-part location
    pub fn from_title(title: &str) -> Result<Self, ParsingError> {
        let flattened = title.replace(['\r', '\n'], "");
        let captures = TITLE_PATTERN
            .captures(&flattened)
            .ok_or_else(|| ParsingError::InvalidTitle(title.to_string()))?;

        let name = captures[1].trim();
        let shift = captures[3].trim();
        if name.is_empty() || shift.is_empty() {
            return Err(ParsingError::InvalidTitle(title.to_string()));
        }

        let location: Location = captures[2].parse()?;
        Ok(Self::new(name, location, shift))
    }

    pub fn display_name(&self) -> String {
        title_case(&self.course_name)
    }
}

impl fmt::Display for EventBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{} - {}",
            self.display_name(),
            self.location,
            self.shift
        )
    }
}

/// Layout hint extracted from a rendered block, before it becomes a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationHint {
    /// Block at most [`TALL_BLOCK_HEIGHT_PX`] high.
    Compact,
    /// Block taller than [`TALL_BLOCK_HEIGHT_PX`].
    Tall,
}

impl DurationHint {
    pub fn from_height(height_px: u32) -> Self {
        if height_px > TALL_BLOCK_HEIGHT_PX {
            DurationHint::Tall
        } else {
            DurationHint::Compact
        }
    }

    /// Read the `height:<n>px` declaration of an inline style attribute.
    pub fn from_style(style: &str) -> Result<Self, ParsingError> {
        HEIGHT_PATTERN
            .captures(style)
            .and_then(|c| c[1].parse::<u32>().ok())
            .map(Self::from_height)
            .ok_or_else(|| ParsingError::MissingHeight(style.to_string()))
    }
}

/// Length of an event. The timetable only ever renders these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventDuration {
    OneHour,
    TwoHours,
}

impl EventDuration {
    pub fn minutes(&self) -> u32 {
        match self {
            EventDuration::OneHour => 60,
            EventDuration::TwoHours => 120,
        }
    }

    /// Number of 30 minute grid rows the event covers.
    pub fn rows(&self) -> usize {
        (self.minutes() / 30) as usize
    }

    pub fn as_chrono(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventDuration::OneHour => "01:00",
            EventDuration::TwoHours => "02:00",
        }
    }
}

impl From<DurationHint> for EventDuration {
    fn from(hint: DurationHint) -> Self {
        match hint {
            DurationHint::Compact => EventDuration::OneHour,
            DurationHint::Tall => EventDuration::TwoHours,
        }
    }
}

impl FromStr for EventDuration {
    type Err = ParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "01:00" | "1:00" => Ok(EventDuration::OneHour),
            "02:00" | "2:00" => Ok(EventDuration::TwoHours),
            other => Err(ParsingError::UnexpectedDuration(other.to_string())),
        }
    }
}

impl fmt::Display for EventDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// One weekly occurrence of a course shift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub body: EventBody,
    #[serde(with = "hh_mm")]
    pub starts_at: NaiveTime,
    pub duration: EventDuration,
    pub weekday: Weekday,
}

impl ScheduleEvent {
    pub fn new(
        body: EventBody,
        starts_at: NaiveTime,
        duration: EventDuration,
        weekday: Weekday,
    ) -> Self {
        Self {
            body,
            starts_at,
            duration,
            weekday,
        }
    }

    /// Minutes since midnight at which the event starts.
    pub fn start_minutes(&self) -> u32 {
        self.starts_at.hour() * 60 + self.starts_at.minute()
    }

    /// Minutes since midnight at which the event ends. May exceed one day.
    pub fn end_minutes(&self) -> u32 {
        self.start_minutes() + self.duration.minutes()
    }

    /// Whether the two events are active at a common instant.
    pub fn overlaps(&self, other: &ScheduleEvent) -> bool {
        self.weekday == other.weekday
            && self.start_minutes() < other.end_minutes()
            && other.start_minutes() < self.end_minutes()
    }
}

impl fmt::Display for ScheduleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.body.fmt(f)
    }
}

/// Serde adapter rendering a time of day as `HH:MM`.
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let value = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&value, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_weekday_labels() {
        assert_eq!(Weekday::from_label("Terça-Feira").unwrap(), Weekday::Tuesday);
        assert_eq!(Weekday::from_label("TERÇA-FEIRA").unwrap(), Weekday::Tuesday);
        assert_eq!(Weekday::from_label("terca").unwrap(), Weekday::Tuesday);
        assert_eq!(Weekday::from_label(" Sábado ").unwrap(), Weekday::Saturday);
        assert_eq!(Weekday::from_label("sunday").unwrap(), Weekday::Sunday);
        assert!(matches!(
            Weekday::from_label("Funday"),
            Err(ParsingError::UnknownWeekday(_))
        ));
        assert_eq!(Weekday::Friday.ical_code(), "FR");
        assert!(Weekday::Monday < Weekday::Sunday);
    }

    #[test]
    fn test_title_case_keeps_minor_words() {
        assert_eq!(
            title_case("introdução à programação e algoritmos"),
            "Introdução À Programação e Algoritmos"
        );
        assert_eq!(title_case("sistemas   DE  informação"), "Sistemas de Informação");
        assert_eq!(title_case("e-business"), "E-Business");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_location_parsing() {
        let location: Location = "Gualtar - Edificio 7 - 1.04".parse().unwrap();
        assert_eq!(location.campus, "Gualtar");
        assert_eq!(location.building, "CP7");
        assert_eq!(location.room, "1.04");
        assert_eq!(location.to_string(), "Gualtar - CP7 1.04");

        assert!(matches!(
            "Gualtar-7".parse::<Location>(),
            Err(ParsingError::InvalidLocation(_))
        ));
    }

    #[test]
    fn test_event_body_from_title() {
        let body =
            EventBody::from_title("Bases de Dados\n[Gualtar - Edificio 2 - 0.20]\nT1").unwrap();
        assert_eq!(body.course_name, "bases de dados");
        assert_eq!(body.shift, "T1");
        assert_eq!(body.location.building, "CP2");
        assert_eq!(body.to_string(), "Bases de Dados\nGualtar - CP2 0.20 - T1");
    }

    #[test]
    fn test_event_body_rejects_malformed_titles() {
        for title in ["Bases de Dados T1", "[Gualtar-CP1-1]T1", "Bases [Gualtar-CP1-1]  "] {
            assert!(
                matches!(EventBody::from_title(title), Err(ParsingError::InvalidTitle(_))),
                "{title:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_duration_hint_threshold() {
        assert_eq!(DurationHint::from_height(TALL_BLOCK_HEIGHT_PX), DurationHint::Compact);
        assert_eq!(DurationHint::from_height(TALL_BLOCK_HEIGHT_PX + 1), DurationHint::Tall);
        assert_eq!(
            DurationHint::from_style("width: 100%; height:218px;").unwrap(),
            DurationHint::Tall
        );
        assert_eq!(
            EventDuration::from(DurationHint::from_style("height: 98px").unwrap()),
            EventDuration::OneHour
        );
        assert!(matches!(
            DurationHint::from_style("width: 100%"),
            Err(ParsingError::MissingHeight(_))
        ));
    }

    #[test]
    fn test_duration_strings() {
        assert_eq!("02:00".parse::<EventDuration>().unwrap(), EventDuration::TwoHours);
        assert_eq!(EventDuration::OneHour.rows(), 2);
        assert_eq!(EventDuration::TwoHours.rows(), 4);
        assert!(matches!(
            "01:30".parse::<EventDuration>(),
            Err(ParsingError::UnexpectedDuration(_))
        ));
    }

    #[test]
    fn test_event_serialization_shape() {
        let body = EventBody::new("Algoritmos", "Gualtar-CP1-0.01".parse().unwrap(), "PL3");
        let event = ScheduleEvent::new(body, time(10, 0), EventDuration::OneHour, Weekday::Monday);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["body"]["name"], "algoritmos");
        assert_eq!(value["body"]["location"]["room"], "0.01");
        assert_eq!(value["starts_at"], "10:00");
        assert_eq!(value["duration"], "01:00");
        assert_eq!(value["weekday"], "Segunda-Feira");

        let decoded: ScheduleEvent = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_event_overlap() {
        let body = EventBody::new("x", "A-B-C".parse().unwrap(), "T1");
        let a = ScheduleEvent::new(body.clone(), time(9, 0), EventDuration::TwoHours, Weekday::Monday);
        let b = ScheduleEvent::new(body.clone(), time(10, 0), EventDuration::OneHour, Weekday::Monday);
        let c = ScheduleEvent::new(body, time(11, 0), EventDuration::OneHour, Weekday::Monday);

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.end_minutes(), 11 * 60);
    }
}
