use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::Schedule;

/// Allow-list of shift codes per course.
///
/// Course names are stored lowercased so lookups match
/// [`EventBody::course_name`](crate::core::EventBody::course_name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct ShiftSelection {
    courses: BTreeMap<String, Vec<String>>,
}

impl ShiftSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ShiftSelection::insert`].
    pub fn allow<I, S>(mut self, course: &str, shifts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(course, shifts);
        self
    }

    /// Add shifts to the allow-list of a course.
    pub fn insert<I, S>(&mut self, course: &str, shifts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = self.courses.entry(course.trim().to_lowercase()).or_default();
        for shift in shifts {
            let shift = shift.into();
            if !allowed.contains(&shift) {
                allowed.push(shift);
            }
        }
    }

    pub fn allows(&self, course_name: &str, shift: &str) -> bool {
        self.courses
            .get(course_name)
            .is_some_and(|shifts| shifts.iter().any(|s| s == shift))
    }

    pub fn courses(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.courses
            .iter()
            .map(|(course, shifts)| (course.as_str(), shifts.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl From<BTreeMap<String, Vec<String>>> for ShiftSelection {
    fn from(courses: BTreeMap<String, Vec<String>>) -> Self {
        let mut selection = Self::new();
        for (course, shifts) in courses {
            selection.insert(&course, shifts);
        }
        selection
    }
}

impl From<ShiftSelection> for BTreeMap<String, Vec<String>> {
    fn from(selection: ShiftSelection) -> Self {
        selection.courses
    }
}

/// Keep only the events whose course and shift are both selected.
///
/// Courses absent from the selection contribute no events. Declared weekdays
/// are kept even when they end up empty.
pub fn filter_schedule(schedule: &Schedule, selection: &ShiftSelection) -> Schedule {
    let mut filtered = Schedule::new(schedule.weekdays().iter().copied());
    for event in schedule.events() {
        if selection.allows(&event.body.course_name, &event.body.shift) {
            filtered.add_event(event.clone());
        }
    }
    filtered
}
