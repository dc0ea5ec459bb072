//! Structured-data builder.
//!
//! Serializes a schedule as a JSON object mapping each weekday label, in
//! schedule order, to its list of event records:
//!
//! ```json
//! {
//!     "Segunda-Feira": [
//!         {
//!             "body": {
//!                 "name": "bases de dados",
//!                 "location": { "campus": "Gualtar", "building": "CP2", "room": "0.20" },
//!                 "shift": "T1"
//!             },
//!             "starts_at": "09:00",
//!             "duration": "02:00",
//!             "weekday": "Segunda-Feira"
//!         }
//!     ]
//! }
//! ```

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::ser::PrettyFormatter;

use super::error::BuildResult;
use super::{BuildOutput, Builder, RenderSettings, ScheduleInput};
use crate::core::{ParsingError, Schedule, ScheduleEvent, Weekday};

pub const JSON_CONTENT_TYPE: &str = "application/json";

const INDENT: &[u8] = b"    ";

/// Renders a schedule as a JSON document.
pub struct JsonBuilder {
    schedule: Schedule,
}

impl JsonBuilder {
    pub fn new(input: impl Into<ScheduleInput>, _settings: &RenderSettings) -> Self {
        Self {
            schedule: input.into().into_schedule(),
        }
    }

    /// Registry constructor.
    pub fn boxed(input: ScheduleInput, settings: &RenderSettings) -> Box<dyn Builder> {
        Box::new(Self::new(input, settings))
    }

    pub fn render(&self) -> BuildResult<Vec<u8>> {
        encode_schedule(&self.schedule)
    }
}

impl Builder for JsonBuilder {
    fn build(&self) -> BuildResult<BuildOutput> {
        Ok(BuildOutput {
            bytes: self.render()?,
            content_type: JSON_CONTENT_TYPE,
        })
    }

    fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

/// Weekday-keyed view of a schedule, serialized in declaration order.
struct WeekdayMap<'a>(&'a Schedule);

impl Serialize for WeekdayMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let weekdays = self.0.weekdays();
        let mut map = serializer.serialize_map(Some(weekdays.len()))?;
        for weekday in weekdays {
            map.serialize_entry(weekday, self.0.events_for(*weekday))?;
        }
        map.end()
    }
}

/// Weekday entries as they appear in a document.
struct WeekdayEntries(Vec<(Weekday, Vec<ScheduleEvent>)>);

impl<'de> Deserialize<'de> for WeekdayEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor)
    }
}

struct EntriesVisitor;

impl<'de> Visitor<'de> for EntriesVisitor {
    type Value = WeekdayEntries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of weekday labels to event lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<Weekday, Vec<ScheduleEvent>>()? {
            entries.push(entry);
        }
        Ok(WeekdayEntries(entries))
    }
}

/// Serialize a schedule as pretty-printed JSON, non-ASCII kept verbatim.
pub fn encode_schedule(schedule: &Schedule) -> BuildResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut bytes, PrettyFormatter::with_indent(INDENT));
    WeekdayMap(schedule).serialize(&mut serializer)?;
    Ok(bytes)
}

/// Decode a document produced by [`encode_schedule`].
///
/// Weekdays are declared in document order and events keep their listed
/// order within each weekday.
///
/// # Errors
/// [`ParsingError::InvalidDocument`] naming the JSON path of the first
/// offending value, e.g. an unknown weekday, a `"01:30"` duration or an
/// event whose `weekday` differs from the list it is filed under.
pub fn decode_schedule(bytes: &[u8]) -> Result<Schedule, ParsingError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let entries: WeekdayEntries =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
            ParsingError::InvalidDocument {
                path: e.path().to_string(),
                message: e.inner().to_string(),
            }
        })?;
    deserializer
        .end()
        .map_err(|e| ParsingError::InvalidDocument {
            path: ".".to_string(),
            message: e.to_string(),
        })?;

    let mut schedule = Schedule::new(entries.0.iter().map(|(weekday, _)| *weekday));
    for (weekday, events) in entries.0 {
        for (index, event) in events.into_iter().enumerate() {
            if event.weekday != weekday {
                return Err(ParsingError::InvalidDocument {
                    path: format!("{}[{}].weekday", weekday.label(), index),
                    message: format!(
                        "event weekday {} does not match its list {}",
                        event.weekday, weekday
                    ),
                });
            }
            schedule.add_event(event);
        }
    }
    Ok(schedule)
}
