use std::fmt;

use chrono::NaiveTime;

use crate::core::ScheduleEvent;

/// Instant(s) at which two adjacent events of a weekday are judged to overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionMarker {
    /// Both events start at this time.
    Simultaneous(NaiveTime),
    /// The later event starts strictly inside the earlier one:
    /// `(predecessor start, event start)`.
    Overlap(NaiveTime, NaiveTime),
}

impl CollisionMarker {
    /// Whether `time` is one of the instants recorded by this marker.
    pub fn involves(&self, time: NaiveTime) -> bool {
        match *self {
            CollisionMarker::Simultaneous(at) => at == time,
            CollisionMarker::Overlap(first, second) => first == time || second == time,
        }
    }
}

impl fmt::Display for CollisionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionMarker::Simultaneous(at) => write!(f, "{}", at.format("%H:%M")),
            CollisionMarker::Overlap(first, second) => {
                write!(f, "({}, {})", first.format("%H:%M"), second.format("%H:%M"))
            }
        }
    }
}

/// Find collisions between chronologically adjacent events of one weekday.
///
/// Every event is compared only to its immediate predecessor:
/// - same start time gives [`CollisionMarker::Simultaneous`]
/// - a start strictly inside the predecessor's interval gives
///   [`CollisionMarker::Overlap`]
/// - anything else gives no marker
///
/// A three-way overlap therefore shows up as two consecutive markers.
///
/// # Arguments
/// * `events` - Events of a single weekday, in non-decreasing start order
///
/// # Returns
/// Markers in event order; one per extra rendering column
pub fn detect_collisions(events: &[ScheduleEvent]) -> Vec<CollisionMarker> {
    events
        .windows(2)
        .filter_map(|pair| collision_between(&pair[0], &pair[1]))
        .collect()
}

fn collision_between(previous: &ScheduleEvent, event: &ScheduleEvent) -> Option<CollisionMarker> {
    if event.starts_at == previous.starts_at {
        return Some(CollisionMarker::Simultaneous(event.starts_at));
    }

    let start = event.start_minutes();
    if previous.start_minutes() < start && start < previous.end_minutes() {
        return Some(CollisionMarker::Overlap(previous.starts_at, event.starts_at));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventBody, EventDuration, Weekday};

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn event(course: &str, h: u32, m: u32, duration: EventDuration) -> ScheduleEvent {
        ScheduleEvent::new(
            EventBody::new(course, "Gualtar-CP1-0.01".parse().unwrap(), "T1"),
            at(h, m),
            duration,
            Weekday::Monday,
        )
    }

    #[test]
    fn test_inner_start_yields_pair() {
        let events = vec![
            event("databases", 9, 0, EventDuration::TwoHours),
            event("algorithms", 10, 0, EventDuration::OneHour),
        ];
        assert_eq!(
            detect_collisions(&events),
            vec![CollisionMarker::Overlap(at(9, 0), at(10, 0))]
        );
    }

    #[test]
    fn test_same_start_yields_single_time() {
        let events = vec![
            event("a", 14, 0, EventDuration::OneHour),
            event("b", 14, 0, EventDuration::TwoHours),
        ];
        assert_eq!(
            detect_collisions(&events),
            vec![CollisionMarker::Simultaneous(at(14, 0))]
        );
    }

    #[test]
    fn test_back_to_back_events_do_not_collide() {
        let events = vec![
            event("a", 9, 0, EventDuration::OneHour),
            event("b", 10, 0, EventDuration::OneHour),
        ];
        assert!(detect_collisions(&events).is_empty());
    }

    #[test]
    fn test_only_adjacent_pairs_are_compared() {
        // c overlaps a but not its immediate predecessor b.
        let events = vec![
            event("a", 9, 0, EventDuration::TwoHours),
            event("b", 9, 30, EventDuration::OneHour),
            event("c", 10, 30, EventDuration::OneHour),
        ];
        assert_eq!(
            detect_collisions(&events),
            vec![CollisionMarker::Overlap(at(9, 0), at(9, 30))]
        );
    }

    #[test]
    fn test_three_way_overlap_gives_two_markers() {
        let events = vec![
            event("a", 9, 0, EventDuration::TwoHours),
            event("b", 9, 0, EventDuration::OneHour),
            event("c", 9, 30, EventDuration::OneHour),
        ];
        assert_eq!(
            detect_collisions(&events),
            vec![
                CollisionMarker::Simultaneous(at(9, 0)),
                CollisionMarker::Overlap(at(9, 0), at(9, 30)),
            ]
        );
    }

    #[test]
    fn test_marker_involvement() {
        let marker = CollisionMarker::Overlap(at(9, 0), at(10, 0));
        assert!(marker.involves(at(9, 0)));
        assert!(marker.involves(at(10, 0)));
        assert!(!marker.involves(at(9, 30)));
        assert_eq!(marker.to_string(), "(09:00, 10:00)");
        assert!(detect_collisions(&[]).is_empty());
    }
}
