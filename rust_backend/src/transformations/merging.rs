use std::collections::BTreeSet;

use crate::core::Schedule;

/// Merge schedules into one, appending events weekday by weekday in list order.
///
/// The merged schedule declares the union of the input weekdays in calendar
/// order. Events go through [`Schedule::add_event`], so every weekday stays in
/// chronological order; events with equal start times keep input-list order.
pub fn merge_schedules(schedules: &[Schedule]) -> Schedule {
    let weekdays: BTreeSet<_> = schedules
        .iter()
        .flat_map(|schedule| schedule.weekdays().iter().copied())
        .collect();

    let mut merged = Schedule::new(weekdays);
    for schedule in schedules {
        for weekday in schedule.weekdays() {
            for event in schedule.events_for(*weekday) {
                merged.add_event(event.clone());
            }
        }
    }

    log::debug!(
        "Merged {} schedules into {} events",
        schedules.len(),
        merged.len()
    );
    merged
}
