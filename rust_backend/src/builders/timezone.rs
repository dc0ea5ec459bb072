//! `VTIMEZONE` definitions for the calendar feed.
//!
//! A zone is described by its standard observance and, for zones with
//! daylight saving time, a daylight observance. Each observance with a
//! transition starts yearly on an RRULE-style `BYDAY` date of a month, at a
//! wall-clock time expressed in the offset in force just before the switch.
//!
//! The defaults describe `Europe/Lisbon`.

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;

/// First year of every observance.
const EPOCH_YEAR: i32 = 1970;
const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Yearly switch into an observance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneTransition {
    /// Month, `1..=12`.
    pub month: u32,
    /// `BYDAY` value, e.g. `-1SU` for the last Sunday or `2SU` for the second.
    pub day: String,
    /// Local wall-clock time of the switch, `HH:MM`.
    pub at: String,
}

/// One observance (`STANDARD` or `DAYLIGHT`) of a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneObservance {
    /// `TZNAME`, e.g. `WET`.
    pub name: String,
    /// UTC offset, `+HHMM` or `-HHMM`.
    pub offset: String,
    /// Required for both observances of a zone with daylight saving time.
    #[serde(default)]
    pub transition: Option<ZoneTransition>,
}

/// Offsets and transition rules of the calendar timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneRules {
    pub standard: ZoneObservance,
    #[serde(default)]
    pub daylight: Option<ZoneObservance>,
}

impl Default for TimezoneRules {
    fn default() -> Self {
        Self {
            standard: ZoneObservance {
                name: "WET".to_string(),
                offset: "+0000".to_string(),
                transition: Some(ZoneTransition {
                    month: 10,
                    day: "-1SU".to_string(),
                    at: "02:00".to_string(),
                }),
            },
            daylight: Some(ZoneObservance {
                name: "WEST".to_string(),
                offset: "+0100".to_string(),
                transition: Some(ZoneTransition {
                    month: 3,
                    day: "-1SU".to_string(),
                    at: "01:00".to_string(),
                }),
            }),
        }
    }
}

impl TimezoneRules {
    /// Zone without daylight saving time.
    pub fn fixed(name: &str, offset: &str) -> Self {
        Self {
            standard: ZoneObservance {
                name: name.to_string(),
                offset: offset.to_string(),
                transition: None,
            },
            daylight: None,
        }
    }

    /// Check offsets and transitions.
    ///
    /// # Errors
    /// [`ConfigurationError::Invalid`] on a malformed offset or transition, or
    /// when a daylight observance is given without both transitions.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.observances().map(|_| ())
    }

    /// `BEGIN:VTIMEZONE` .. `END:VTIMEZONE` content lines for `tzid`.
    pub fn component_lines(&self, tzid: &str) -> Result<Vec<String>, ConfigurationError> {
        let mut lines = vec!["BEGIN:VTIMEZONE".to_string(), format!("TZID:{}", tzid)];
        for observance in self.observances()? {
            lines.extend(observance.lines());
        }
        lines.push("END:VTIMEZONE".to_string());
        Ok(lines)
    }

    fn observances(&self) -> Result<Vec<Observance<'_>>, ConfigurationError> {
        check_offset(&self.standard.offset)?;

        let Some(daylight) = &self.daylight else {
            return Ok(vec![Observance {
                kind: "STANDARD",
                name: &self.standard.name,
                offset_from: &self.standard.offset,
                offset_to: &self.standard.offset,
                start: NaiveDate::from_ymd_opt(EPOCH_YEAR, 1, 1)
                    .unwrap_or_default()
                    .and_time(NaiveTime::default()),
                rule: None,
            }]);
        };

        check_offset(&daylight.offset)?;
        let (Some(standard_switch), Some(daylight_switch)) =
            (&self.standard.transition, &daylight.transition)
        else {
            return Err(ConfigurationError::Invalid(
                "daylight saving time needs a transition for both observances".to_string(),
            ));
        };

        Ok(vec![
            Observance::yearly("DAYLIGHT", daylight, &self.standard.offset, daylight_switch)?,
            Observance::yearly("STANDARD", &self.standard, &daylight.offset, standard_switch)?,
        ])
    }
}

struct Observance<'a> {
    kind: &'static str,
    name: &'a str,
    offset_from: &'a str,
    offset_to: &'a str,
    start: chrono::NaiveDateTime,
    rule: Option<String>,
}

impl<'a> Observance<'a> {
    fn yearly(
        kind: &'static str,
        observance: &'a ZoneObservance,
        offset_from: &'a str,
        transition: &ZoneTransition,
    ) -> Result<Self, ConfigurationError> {
        let at = NaiveTime::parse_from_str(transition.at.trim(), "%H:%M").map_err(|_| {
            ConfigurationError::Invalid(format!(
                "Invalid transition time {:?}, expected HH:MM",
                transition.at
            ))
        })?;
        let (ordinal, weekday) = parse_by_day(&transition.day)?;
        let date = nth_weekday_of_month(EPOCH_YEAR, transition.month, ordinal, weekday)
            .ok_or_else(|| {
                ConfigurationError::Invalid(format!(
                    "No day {} in month {}",
                    transition.day, transition.month
                ))
            })?;

        Ok(Self {
            kind,
            name: &observance.name,
            offset_from,
            offset_to: &observance.offset,
            start: date.and_time(at),
            rule: Some(format!(
                "RRULE:FREQ=YEARLY;BYMONTH={};BYDAY={}",
                transition.month,
                transition.day.trim().to_uppercase()
            )),
        })
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("BEGIN:{}", self.kind),
            format!("TZNAME:{}", self.name),
            format!("TZOFFSETFROM:{}", self.offset_from),
            format!("TZOFFSETTO:{}", self.offset_to),
            format!("DTSTART:{}", self.start.format(LOCAL_FORMAT)),
        ];
        lines.extend(self.rule.clone());
        lines.push(format!("END:{}", self.kind));
        lines
    }
}

fn check_offset(offset: &str) -> Result<(), ConfigurationError> {
    let bytes = offset.as_bytes();
    let valid = bytes.len() == 5
        && matches!(bytes[0], b'+' | b'-')
        && bytes[1..].iter().all(u8::is_ascii_digit)
        && &offset[1..3] < "24"
        && &offset[3..5] < "60";
    if valid {
        Ok(())
    } else {
        Err(ConfigurationError::Invalid(format!(
            "Invalid UTC offset {:?}, expected +HHMM or -HHMM",
            offset
        )))
    }
}

/// Split a `BYDAY` value such as `-1SU` into its ordinal and weekday.
fn parse_by_day(value: &str) -> Result<(i8, chrono::Weekday), ConfigurationError> {
    let invalid = || ConfigurationError::Invalid(format!("Invalid BYDAY value {:?}", value));

    let value = value.trim().to_uppercase();
    if value.len() < 3 || !value.is_char_boundary(value.len() - 2) {
        return Err(invalid());
    }
    let (ordinal, code) = value.split_at(value.len() - 2);
    let ordinal: i8 = ordinal.parse().map_err(|_| invalid())?;
    if ordinal == 0 || !(-5..=5).contains(&ordinal) {
        return Err(invalid());
    }

    let weekday = match code {
        "MO" => chrono::Weekday::Mon,
        "TU" => chrono::Weekday::Tue,
        "WE" => chrono::Weekday::Wed,
        "TH" => chrono::Weekday::Thu,
        "FR" => chrono::Weekday::Fri,
        "SA" => chrono::Weekday::Sat,
        "SU" => chrono::Weekday::Sun,
        _ => return Err(invalid()),
    };
    Ok((ordinal, weekday))
}

/// `ordinal`-th `weekday` of a month; negative ordinals count from its end.
fn nth_weekday_of_month(
    year: i32,
    month: u32,
    ordinal: i8,
    weekday: chrono::Weekday,
) -> Option<NaiveDate> {
    if ordinal > 0 {
        return NaiveDate::from_weekday_of_month_opt(year, month, weekday, ordinal as u8);
    }

    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = first_of_next.pred_opt()?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    let date = last
        .checked_sub_days(Days::new(u64::from(back)))?
        .checked_sub_days(Days::new(7 * u64::from(ordinal.unsigned_abs() - 1)))?;
    (date.month() == month).then_some(date)
}
