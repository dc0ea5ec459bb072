//! Weekly schedule containers.
//!
//! A [`Schedule`] groups events by weekday and keeps every weekday's events in
//! non-decreasing start order. All mutation goes through
//! [`Schedule::add_event`], which inserts after any event starting at the same
//! time, so encounter order is kept among simultaneous events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{title_case, ScheduleEvent, Weekday};
use crate::algorithms::conflicts::{detect_collisions, CollisionMarker};
use crate::transformations::filtering::{filter_schedule, ShiftSelection};
use crate::transformations::merging::merge_schedules;

/// Events of one timetable, grouped by weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    weekdays: Vec<Weekday>,
    events: BTreeMap<Weekday, Vec<ScheduleEvent>>,
}

impl Schedule {
    /// Create an empty schedule declaring the given weekdays, in order.
    ///
    /// Repeated weekdays are only declared once.
    pub fn new(weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        let mut schedule = Self::default();
        for weekday in weekdays {
            schedule.declare_weekday(weekday);
        }
        schedule
    }

    /// Declare a weekday without adding events to it. No-op if already declared.
    pub fn declare_weekday(&mut self, weekday: Weekday) {
        if !self.weekdays.contains(&weekday) {
            self.weekdays.push(weekday);
            self.events.entry(weekday).or_default();
        }
    }

    /// Weekdays in declaration order.
    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    /// Add an event under its weekday, declaring the weekday if needed.
    ///
    /// The event is placed after every event that starts no later than it.
    pub fn add_event(&mut self, event: ScheduleEvent) {
        self.declare_weekday(event.weekday);
        let day = self.events.entry(event.weekday).or_default();
        let position = day.partition_point(|existing| existing.starts_at <= event.starts_at);
        day.insert(position, event);
    }

    /// Events of one weekday in chronological order. Empty for undeclared days.
    pub fn events_for(&self, weekday: Weekday) -> &[ScheduleEvent] {
        self.events.get(&weekday).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All events, weekday by weekday in declaration order.
    pub fn events(&self) -> impl Iterator<Item = &ScheduleEvent> + '_ {
        self.weekdays
            .iter()
            .flat_map(move |weekday| self.events_for(*weekday).iter())
    }

    pub fn len(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collision markers between chronologically adjacent events of a weekday.
    ///
    /// The number of markers is the number of extra grid columns the weekday
    /// needs when rendered.
    pub fn collisions(&self, weekday: Weekday) -> Vec<CollisionMarker> {
        detect_collisions(self.events_for(weekday))
    }

    /// New schedule holding only the selected course shifts.
    pub fn filter(&self, selection: &ShiftSelection) -> Schedule {
        filter_schedule(self, selection)
    }

    /// Combine several schedules into one, in list order.
    pub fn merge(schedules: &[Schedule]) -> Schedule {
        merge_schedules(schedules)
    }

    /// Distinct course names, title-cased, in order of first appearance.
    pub fn course_names(&self) -> Vec<String> {
        let mut seen: Vec<&str> = Vec::new();
        for event in self.events() {
            if !seen.contains(&event.body.course_name.as_str()) {
                seen.push(&event.body.course_name);
            }
        }
        seen.into_iter().map(title_case).collect()
    }

    /// Shift codes offered per course, keyed by lowercased course name.
    ///
    /// Each course lists its shifts once, in order of first appearance.
    pub fn shifts(&self) -> BTreeMap<String, Vec<String>> {
        let mut shifts: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for event in self.events() {
            let course = shifts.entry(event.body.course_name.clone()).or_default();
            if !course.contains(&event.body.shift) {
                course.push(event.body.shift.clone());
            }
        }
        shifts
    }

    /// Earliest start and latest end over all events, in minutes since midnight.
    pub fn time_bounds(&self) -> Option<(u32, u32)> {
        let start = self.events().map(ScheduleEvent::start_minutes).min()?;
        let end = self.events().map(ScheduleEvent::end_minutes).max()?;
        Some((start, end))
    }
}

/// Schedules of one course across its curricular years.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleGroup {
    pub course_name: String,
    pub years: BTreeMap<u8, Schedule>,
}

impl ScheduleGroup {
    pub fn new(course_name: impl Into<String>) -> Self {
        Self {
            course_name: course_name.into(),
            years: BTreeMap::new(),
        }
    }

    pub fn insert_year(&mut self, year: u8, schedule: Schedule) {
        self.years.insert(year, schedule);
    }

    pub fn year(&self, year: u8) -> Option<&Schedule> {
        self.years.get(&year)
    }

    /// Shift codes per course for every year.
    pub fn shifts(&self) -> BTreeMap<u8, BTreeMap<String, Vec<String>>> {
        self.years
            .iter()
            .map(|(year, schedule)| (*year, schedule.shifts()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{EventBody, EventDuration};
    use chrono::NaiveTime;

    fn event(course: &str, shift: &str, weekday: Weekday, h: u32, m: u32) -> ScheduleEvent {
        ScheduleEvent::new(
            EventBody::new(course, "Gualtar-CP1-0.01".parse().unwrap(), shift),
            NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            EventDuration::OneHour,
            weekday,
        )
    }

    #[test]
    fn test_new_schedule_declares_weekdays_once() {
        let schedule = Schedule::new([Weekday::Monday, Weekday::Tuesday, Weekday::Monday]);
        assert_eq!(schedule.weekdays(), &[Weekday::Monday, Weekday::Tuesday]);
        assert!(schedule.events_for(Weekday::Monday).is_empty());
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_add_event_keeps_chronological_order() {
        let mut schedule = Schedule::new([Weekday::Monday]);
        schedule.add_event(event("a", "T1", Weekday::Monday, 11, 0));
        schedule.add_event(event("b", "T1", Weekday::Monday, 9, 0));
        schedule.add_event(event("c", "T1", Weekday::Monday, 11, 0));

        let names: Vec<&str> = schedule
            .events_for(Weekday::Monday)
            .iter()
            .map(|e| e.body.course_name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_add_event_declares_missing_weekday() {
        let mut schedule = Schedule::new([Weekday::Monday]);
        schedule.add_event(event("a", "T1", Weekday::Friday, 9, 0));
        assert_eq!(schedule.weekdays(), &[Weekday::Monday, Weekday::Friday]);
        assert_eq!(schedule.len(), 1);
    }

    #[test]
    fn test_course_names_and_shifts() {
        let mut schedule = Schedule::new([Weekday::Monday, Weekday::Tuesday]);
        schedule.add_event(event("bases de dados", "T1", Weekday::Monday, 9, 0));
        schedule.add_event(event("algoritmos", "PL3", Weekday::Monday, 10, 0));
        schedule.add_event(event("bases de dados", "T2", Weekday::Tuesday, 9, 0));
        schedule.add_event(event("bases de dados", "T1", Weekday::Tuesday, 14, 0));

        assert_eq!(schedule.course_names(), vec!["Bases de Dados", "Algoritmos"]);

        let shifts = schedule.shifts();
        assert_eq!(shifts["bases de dados"], vec!["T1", "T2"]);
        assert_eq!(shifts["algoritmos"], vec!["PL3"]);
    }

    #[test]
    fn test_time_bounds() {
        let mut schedule = Schedule::new([Weekday::Monday]);
        assert_eq!(schedule.time_bounds(), None);

        schedule.add_event(event("a", "T1", Weekday::Monday, 9, 30));
        schedule.add_event(event("b", "T1", Weekday::Monday, 16, 0));
        assert_eq!(schedule.time_bounds(), Some((9 * 60 + 30, 17 * 60)));
    }

    #[test]
    fn test_group_shifts_per_year() {
        let mut first = Schedule::new([Weekday::Monday]);
        first.add_event(event("calculo", "TP1", Weekday::Monday, 9, 0));
        let mut second = Schedule::new([Weekday::Monday]);
        second.add_event(event("redes", "PL1", Weekday::Monday, 9, 0));

        let mut group = ScheduleGroup::new("Engenharia Informática");
        group.insert_year(1, first);
        group.insert_year(2, second);

        let shifts = group.shifts();
        assert_eq!(shifts[&1]["calculo"], vec!["TP1"]);
        assert_eq!(shifts[&2]["redes"], vec!["PL1"]);
        assert!(group.year(3).is_none());
    }
}
