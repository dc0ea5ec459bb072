//! Calendar feed builder.
//!
//! Produces an RFC 5545 `VCALENDAR` with one weekly recurring `VEVENT` per
//! schedule event. Each event is anchored on the first date, on or after the
//! configured reference date, that falls on its weekday. Times are local to
//! the configured zone, defined once in a `VTIMEZONE` component.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use sha2::{Digest, Sha256};

use super::error::BuildResult;
use super::timezone::TimezoneRules;
use super::{BuildOutput, Builder, RenderSettings, ScheduleInput};
use crate::core::{Schedule, ScheduleEvent, Weekday};

pub const ICAL_CONTENT_TYPE: &str = "text/calendar";

const PRODID: &str = "-//Shifter//Schedule Builder//PT";
const MAX_LINE_OCTETS: usize = 75;
const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Renders a schedule as an iCalendar feed.
pub struct IcalBuilder {
    schedule: Schedule,
    calendar_name: String,
    timezone: String,
    timezone_rules: TimezoneRules,
    reference_date: NaiveDate,
}

impl IcalBuilder {
    pub fn new(input: impl Into<ScheduleInput>, settings: &RenderSettings) -> Self {
        Self {
            schedule: input.into().into_schedule(),
            calendar_name: settings.calendar_name.clone(),
            timezone: settings.timezone.clone(),
            timezone_rules: settings.timezone_rules.clone(),
            reference_date: settings.reference_date,
        }
    }

    /// Registry constructor.
    pub fn boxed(input: ScheduleInput, settings: &RenderSettings) -> Box<dyn Builder> {
        Box::new(Self::new(input, settings))
    }

    /// Render the calendar as text with CRLF line endings.
    ///
    /// # Errors
    /// [`BuildError::Configuration`](super::BuildError::Configuration) when the
    /// timezone rules are malformed.
    pub fn render(&self) -> BuildResult<String> {
        let mut lines = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            format!("PRODID:{PRODID}"),
            "CALSCALE:GREGORIAN".to_string(),
            format!("NAME:{}", escape_text(&self.calendar_name)),
            format!("X-WR-CALNAME:{}", escape_text(&self.calendar_name)),
            format!("X-WR-TIMEZONE:{}", self.timezone),
        ];
        lines.extend(self.timezone_rules.component_lines(&self.timezone)?);

        for (index, event) in self.schedule.events().enumerate() {
            lines.extend(self.event_lines(index, event));
        }
        lines.push("END:VCALENDAR".to_string());

        let mut calendar = String::new();
        for line in &lines {
            calendar.push_str(&fold_line(line));
            calendar.push_str("\r\n");
        }
        Ok(calendar)
    }

    fn event_lines(&self, index: usize, event: &ScheduleEvent) -> Vec<String> {
        let date = anchor_date(self.reference_date, event.weekday);
        let starts_at = date.and_time(event.starts_at);
        let ends_at = starts_at + event.duration.as_chrono();
        let stamp = self.reference_date.and_time(NaiveTime::default());

        let summary = format!(
            "{} - {} - {}",
            event.body.shift,
            event.body.location,
            abbreviate(&event.body.course_name)
        );

        vec![
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}", event_uid(index, event)),
            format!("DTSTAMP:{}Z", stamp.format(LOCAL_FORMAT)),
            format!("DTSTART;TZID={}:{}", self.timezone, local(starts_at)),
            format!("DTEND;TZID={}:{}", self.timezone, local(ends_at)),
            format!("RRULE:FREQ=WEEKLY;BYDAY={}", event.weekday.ical_code()),
            format!("SUMMARY:{}", escape_text(&summary)),
            format!("DESCRIPTION:{}", escape_text(&event.to_string())),
            format!("LOCATION:{}", escape_text(&event.body.location.to_string())),
            "END:VEVENT".to_string(),
        ]
    }
}

impl Builder for IcalBuilder {
    fn build(&self) -> BuildResult<BuildOutput> {
        Ok(BuildOutput {
            bytes: self.render()?.into_bytes(),
            content_type: ICAL_CONTENT_TYPE,
        })
    }

    fn content_type(&self) -> &'static str {
        ICAL_CONTENT_TYPE
    }

    fn extension(&self) -> &'static str {
        "ics"
    }
}

/// Initials of the words longer than three characters, uppercased.
///
/// Falls back to the whole name uppercased when no word qualifies.
///
/// ```
/// use shifter_rust::builders::ical::abbreviate;
///
/// assert_eq!(abbreviate("bases de dados"), "BD");
/// assert_eq!(abbreviate("sig"), "SIG");
/// ```
pub fn abbreviate(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();

    if initials.is_empty() {
        name.trim().to_uppercase()
    } else {
        initials
    }
}

/// First date on or after `reference` falling on `weekday`.
pub fn anchor_date(reference: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = reference.weekday().num_days_from_monday();
    let target = weekday.to_chrono().num_days_from_monday();
    let offset = (7 + target - current) % 7;
    reference
        .checked_add_days(Days::new(u64::from(offset)))
        .unwrap_or(reference)
}

fn local(at: NaiveDateTime) -> String {
    at.format(LOCAL_FORMAT).to_string()
}

fn event_uid(index: usize, event: &ScheduleEvent) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_le_bytes());
    hasher.update(event.weekday.ical_code());
    hasher.update(event.starts_at.format("%H:%M").to_string());
    hasher.update(event.duration.as_str());
    hasher.update(&event.body.course_name);
    hasher.update(&event.body.shift);
    hasher.update(event.body.location.to_string());
    let digest = hex::encode(hasher.finalize());
    format!("{}@shifter", &digest[..32])
}

/// Escape a TEXT property value.
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Fold a content line into 75-octet segments without splitting characters.
fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    for c in line.chars() {
        let octets = c.len_utf8();
        if width + octets > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(c);
        width += octets;
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventBody, EventDuration};

    fn event(weekday: Weekday, h: u32) -> ScheduleEvent {
        ScheduleEvent::new(
            EventBody::new(
                "bases de dados",
                "Gualtar-Edificio2-0.20".parse().unwrap(),
                "T1",
            ),
            NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
            EventDuration::TwoHours,
            weekday,
        )
    }

    #[test]
    fn test_abbreviation_skips_short_words() {
        assert_eq!(abbreviate("bases de dados"), "BD");
        assert_eq!(abbreviate("redes de computadores"), "RC");
        assert_eq!(abbreviate("álgebra linear para engenharia"), "ÁLPE");
        assert_eq!(abbreviate("poo"), "POO");
    }

    #[test]
    fn test_anchor_date_matches_weekday() {
        // 2021-07-30 is a Friday.
        let reference = NaiveDate::from_ymd_opt(2021, 7, 30).unwrap();
        assert_eq!(anchor_date(reference, Weekday::Friday), reference);
        assert_eq!(
            anchor_date(reference, Weekday::Monday),
            NaiveDate::from_ymd_opt(2021, 8, 2).unwrap()
        );
        assert_eq!(
            anchor_date(reference, Weekday::Thursday),
            NaiveDate::from_ymd_opt(2021, 8, 5).unwrap()
        );
    }

    #[test]
    fn test_event_lines() {
        let mut schedule = Schedule::new([Weekday::Monday]);
        schedule.add_event(event(Weekday::Monday, 9));
        let calendar = IcalBuilder::new(schedule, &RenderSettings::default())
            .render()
            .unwrap();

        assert!(calendar.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(calendar.ends_with("END:VCALENDAR\r\n"));
        assert!(calendar.contains("X-WR-CALNAME:Shifter Schedule\r\n"));
        assert!(calendar.contains("DTSTART;TZID=Europe/Lisbon:20210802T090000\r\n"));
        assert!(calendar.contains("DTEND;TZID=Europe/Lisbon:20210802T110000\r\n"));
        assert!(calendar.contains("RRULE:FREQ=WEEKLY;BYDAY=MO\r\n"));
        assert!(calendar.contains("SUMMARY:T1 - Gualtar - CP2 0.20 - BD\r\n"));
        assert!(calendar.contains("DESCRIPTION:Bases de Dados\\nGualtar - CP2 0.20 - T1\r\n"));
        assert!(calendar.contains("LOCATION:Gualtar - CP2 0.20\r\n"));

        let zone = calendar.find("BEGIN:VTIMEZONE\r\nTZID:Europe/Lisbon\r\n").unwrap();
        assert!(zone < calendar.find("BEGIN:VEVENT").unwrap());
        assert_eq!(calendar.matches("BEGIN:VTIMEZONE").count(), 1);
    }

    #[test]
    fn test_malformed_timezone_rules_fail_the_build() {
        let settings = RenderSettings {
            timezone_rules: TimezoneRules::fixed("XYZ", "0100"),
            ..RenderSettings::default()
        };
        let builder = IcalBuilder::new(Schedule::new([Weekday::Monday]), &settings);
        assert!(matches!(
            builder.build(),
            Err(crate::builders::BuildError::Configuration(_))
        ));
    }

    #[test]
    fn test_uids_are_stable_and_distinct() {
        let mut schedule = Schedule::new([Weekday::Monday]);
        schedule.add_event(event(Weekday::Monday, 9));
        schedule.add_event(event(Weekday::Monday, 9));
        let builder = IcalBuilder::new(schedule, &RenderSettings::default());

        let uids = |calendar: String| -> Vec<String> {
            calendar
                .lines()
                .filter(|line| line.starts_with("UID:"))
                .map(str::to_string)
                .collect()
        };
        let first = uids(builder.render().unwrap());
        assert_eq!(first.len(), 2);
        assert_ne!(first[0], first[1]);
        assert_eq!(first, uids(builder.render().unwrap()));
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(escape_text("a,b;c\\d\ne"), "a\\,b\\;c\\\\d\\ne");
    }

    #[test]
    fn test_long_lines_are_folded() {
        let line = format!("DESCRIPTION:{}", "é".repeat(60));
        let folded = fold_line(&line);
        for segment in folded.split("\r\n") {
            assert!(segment.len() <= MAX_LINE_OCTETS, "{} octets", segment.len());
        }
        assert_eq!(folded.replace("\r\n ", ""), line);
        assert_eq!(fold_line("SHORT:1"), "SHORT:1");
    }
}
