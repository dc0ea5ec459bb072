//! Grid layout for spreadsheet rendering.
//!
//! The grid has one header row followed by one row per 30 minute slot, and
//! one time-label column followed by the weekday bands. A weekday with `N`
//! collision markers gets a band of `N + 1` contiguous columns; events are
//! dealt into the band's lanes following the markers so that two events active
//! at the same time never share a cell.
//!
//! Row and column indices are zero-based: row 0 is the weekday header and
//! column 0 holds the time labels.

use chrono::{Duration, NaiveTime};

use super::conflicts::CollisionMarker;
use super::palette::{CoursePalette, PaletteExhaustion, StyleToken};
use crate::core::{ParsingError, Schedule, ScheduleEvent, Weekday};

/// Granularity of the time axis.
pub const SLOT_MINUTES: u32 = 30;

/// Error raised while laying out a schedule.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    Parsing(#[from] ParsingError),

    #[error("Palette exhausted: only {capacity} course colors available")]
    PaletteExhausted { capacity: usize },
}

/// Uniform time axis from the earliest start to the latest end, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    start_minutes: u32,
    end_minutes: u32,
}

impl TimeAxis {
    /// Axis covering every event of the schedule, or `None` when it is empty.
    pub fn spanning(schedule: &Schedule) -> Option<Self> {
        schedule
            .time_bounds()
            .map(|(start_minutes, end_minutes)| Self {
                start_minutes,
                end_minutes,
            })
    }

    /// Number of slot rows, excluding the header.
    pub fn slots(&self) -> usize {
        ((self.end_minutes - self.start_minutes) / SLOT_MINUTES) as usize + 1
    }

    /// Row at which an event starts.
    ///
    /// # Errors
    /// [`ParsingError::UnalignedStart`] when the start does not fall on a slot
    /// boundary of this axis.
    pub fn row_of(&self, event: &ScheduleEvent) -> Result<usize, ParsingError> {
        let offset = event
            .start_minutes()
            .checked_sub(self.start_minutes)
            .filter(|offset| offset % SLOT_MINUTES == 0)
            .ok_or(ParsingError::UnalignedStart(event.starts_at))?;
        Ok(1 + (offset / SLOT_MINUTES) as usize)
    }

    /// Time of day labelling a slot row.
    pub fn time_at(&self, row: usize) -> NaiveTime {
        let minutes = self.start_minutes + SLOT_MINUTES * row.saturating_sub(1) as u32;
        NaiveTime::default()
            .overflowing_add_signed(Duration::minutes(i64::from(minutes)))
            .0
    }

    /// `(row, label time)` for every slot row.
    pub fn labels(&self) -> impl Iterator<Item = (usize, NaiveTime)> + '_ {
        (1..=self.slots()).map(move |row| (row, self.time_at(row)))
    }
}

/// Contiguous columns allocated to one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBand {
    pub weekday: Weekday,
    pub first_column: usize,
    pub width: usize,
}

impl DayBand {
    pub fn last_column(&self) -> usize {
        self.first_column + self.width - 1
    }
}

/// Cell range assigned to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPlacement<'a> {
    pub event: &'a ScheduleEvent,
    pub column: usize,
    /// Lane within the weekday band, 0 being its first column.
    pub lane: usize,
    pub first_row: usize,
    /// Inclusive.
    pub last_row: usize,
    pub style: StyleToken,
}

impl CellPlacement<'_> {
    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.first_row..=self.last_row
    }
}

/// Result of one layout pass over a schedule.
#[derive(Debug, Clone)]
pub struct GridLayout<'a> {
    axis: Option<TimeAxis>,
    bands: Vec<DayBand>,
    placements: Vec<CellPlacement<'a>>,
    palette: CoursePalette,
}

impl<'a> GridLayout<'a> {
    pub fn axis(&self) -> Option<&TimeAxis> {
        self.axis.as_ref()
    }

    pub fn bands(&self) -> &[DayBand] {
        &self.bands
    }

    pub fn placements(&self) -> &[CellPlacement<'a>] {
        &self.placements
    }

    pub fn placements_for(&self, weekday: Weekday) -> impl Iterator<Item = &CellPlacement<'a>> {
        self.placements
            .iter()
            .filter(move |placement| placement.event.weekday == weekday)
    }

    pub fn palette(&self) -> &CoursePalette {
        &self.palette
    }

    /// Columns used by the grid, time-label column included.
    pub fn total_columns(&self) -> usize {
        1 + self.bands.iter().map(|band| band.width).sum::<usize>()
    }

    /// Rows used by the grid, header row included.
    pub fn total_rows(&self) -> usize {
        1 + self.axis.map(|axis| axis.slots()).unwrap_or(0)
    }
}

/// Lay out a schedule on the spreadsheet grid.
///
/// Weekdays are walked in declaration order with a running column offset so
/// that bands never overlap. Within a weekday, an event whose start is
/// recorded by a collision marker takes the next lane of the band in turn;
/// any other event goes to the first lane and resets the rotation. If the
/// chosen lane is still occupied the next free lane is used, and the band is
/// widened only when every lane is occupied.
///
/// Course colours are assigned in order of first appearance.
///
/// # Arguments
/// * `schedule` - Schedule with chronologically ordered weekdays
/// * `policy` - What to do once the colour palette is exhausted
///
/// # Returns
/// * `Ok(GridLayout)` borrowing the schedule's events
/// * `Err(LayoutError)` on misaligned starts or palette exhaustion
pub fn allocate(
    schedule: &Schedule,
    policy: PaletteExhaustion,
) -> Result<GridLayout<'_>, LayoutError> {
    let palette = CoursePalette::assign(
        schedule.events().map(|event| event.body.course_name.as_str()),
        policy,
    )?;
    let axis = TimeAxis::spanning(schedule);

    let mut bands = Vec::with_capacity(schedule.weekdays().len());
    let mut placements = Vec::with_capacity(schedule.len());
    let mut step = 0;

    for (index, weekday) in schedule.weekdays().iter().copied().enumerate() {
        let first_column = 1 + index + step;
        let markers = schedule.collisions(weekday);
        let width = match &axis {
            Some(axis) => place_weekday(
                schedule.events_for(weekday),
                &markers,
                axis,
                first_column,
                &palette,
                &mut placements,
            )?,
            None => 1,
        };

        log::debug!(
            "Layout: {} spans columns {}..={} ({} markers)",
            weekday,
            first_column,
            first_column + width - 1,
            markers.len()
        );

        bands.push(DayBand {
            weekday,
            first_column,
            width,
        });
        step += width - 1;
    }

    Ok(GridLayout {
        axis,
        bands,
        placements,
        palette,
    })
}

fn place_weekday<'a>(
    events: &'a [ScheduleEvent],
    markers: &[CollisionMarker],
    axis: &TimeAxis,
    first_column: usize,
    palette: &CoursePalette,
    placements: &mut Vec<CellPlacement<'a>>,
) -> Result<usize, ParsingError> {
    // Next unoccupied row of every lane.
    let mut free_from = vec![0usize; markers.len() + 1];
    let mut overlap_index = 0;

    for event in events {
        let first_row = axis.row_of(event)?;
        let last_row = first_row + event.duration.rows() - 1;

        let preferred = if markers.iter().any(|marker| marker.involves(event.starts_at)) {
            let lane = overlap_index % free_from.len();
            overlap_index += 1;
            lane
        } else {
            overlap_index = 0;
            0
        };

        let lane = match free_lane(&free_from, preferred, first_row) {
            Some(lane) => lane,
            None => {
                free_from.push(0);
                free_from.len() - 1
            }
        };
        free_from[lane] = last_row + 1;

        placements.push(CellPlacement {
            event,
            column: first_column + lane,
            lane,
            first_row,
            last_row,
            style: palette.token_for(&event.body.course_name),
        });
    }

    Ok(free_from.len())
}

fn free_lane(free_from: &[usize], preferred: usize, row: usize) -> Option<usize> {
    let width = free_from.len();
    (0..width)
        .map(|offset| (preferred + offset) % width)
        .find(|&lane| free_from[lane] <= row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventBody, EventDuration};

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn event(
        course: &str,
        weekday: Weekday,
        h: u32,
        m: u32,
        duration: EventDuration,
    ) -> ScheduleEvent {
        ScheduleEvent::new(
            EventBody::new(course, "Gualtar-CP1-0.01".parse().unwrap(), "T1"),
            at(h, m),
            duration,
            weekday,
        )
    }

    fn schedule_of(weekdays: &[Weekday], events: Vec<ScheduleEvent>) -> Schedule {
        let mut schedule = Schedule::new(weekdays.iter().copied());
        for event in events {
            schedule.add_event(event);
        }
        schedule
    }

    #[test]
    fn test_overlapping_monday_gets_two_columns() {
        let schedule = schedule_of(
            &[Weekday::Monday],
            vec![
                event("databases", Weekday::Monday, 9, 0, EventDuration::TwoHours),
                event("algorithms", Weekday::Monday, 10, 0, EventDuration::OneHour),
            ],
        );
        let layout = allocate(&schedule, PaletteExhaustion::Wrap).unwrap();

        assert_eq!(layout.bands()[0].width, 2);
        let [a, b] = layout.placements() else {
            panic!("expected two placements");
        };
        assert_eq!((a.column, a.first_row, a.last_row), (1, 1, 4));
        assert_eq!((b.column, b.first_row, b.last_row), (2, 3, 4));
        assert_eq!(layout.axis().unwrap().time_at(a.first_row), at(9, 0));
        assert_eq!(layout.axis().unwrap().time_at(b.first_row), at(10, 0));
    }

    #[test]
    fn test_simultaneous_starts_use_separate_lanes() {
        let schedule = schedule_of(
            &[Weekday::Wednesday],
            vec![
                event("a", Weekday::Wednesday, 14, 0, EventDuration::OneHour),
                event("b", Weekday::Wednesday, 14, 0, EventDuration::TwoHours),
            ],
        );
        let layout = allocate(&schedule, PaletteExhaustion::Wrap).unwrap();
        let columns: Vec<usize> = layout.placements().iter().map(|p| p.column).collect();
        assert_eq!(columns, vec![1, 2]);
    }

    #[test]
    fn test_bands_are_offset_by_previous_widths() {
        let schedule = schedule_of(
            &[Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday],
            vec![
                event("a", Weekday::Monday, 9, 0, EventDuration::OneHour),
                event("b", Weekday::Monday, 9, 0, EventDuration::OneHour),
                event("c", Weekday::Monday, 9, 0, EventDuration::OneHour),
                event("d", Weekday::Tuesday, 9, 0, EventDuration::OneHour),
                event("e", Weekday::Wednesday, 9, 0, EventDuration::OneHour),
            ],
        );
        let layout = allocate(&schedule, PaletteExhaustion::Wrap).unwrap();

        let bands: Vec<(usize, usize)> = layout
            .bands()
            .iter()
            .map(|band| (band.first_column, band.width))
            .collect();
        assert_eq!(bands, vec![(1, 3), (4, 1), (5, 1)]);
        assert_eq!(layout.total_columns(), 6);
    }

    #[test]
    fn test_non_colliding_event_resets_to_first_lane() {
        let schedule = schedule_of(
            &[Weekday::Monday],
            vec![
                event("a", Weekday::Monday, 9, 0, EventDuration::OneHour),
                event("b", Weekday::Monday, 9, 0, EventDuration::OneHour),
                event("c", Weekday::Monday, 14, 0, EventDuration::OneHour),
            ],
        );
        let layout = allocate(&schedule, PaletteExhaustion::Wrap).unwrap();
        let lanes: Vec<usize> = layout.placements().iter().map(|p| p.lane).collect();
        assert_eq!(lanes, vec![0, 1, 0]);
    }

    #[test]
    fn test_occupied_lane_is_skipped() {
        // c overlaps a without a marker of its own and must not land on a.
        let schedule = schedule_of(
            &[Weekday::Monday],
            vec![
                event("a", Weekday::Monday, 9, 0, EventDuration::TwoHours),
                event("b", Weekday::Monday, 9, 30, EventDuration::OneHour),
                event("c", Weekday::Monday, 10, 30, EventDuration::OneHour),
            ],
        );
        let layout = allocate(&schedule, PaletteExhaustion::Wrap).unwrap();
        let lanes: Vec<usize> = layout.placements().iter().map(|p| p.lane).collect();
        assert_eq!(lanes, vec![0, 1, 1]);
        assert_eq!(layout.bands()[0].width, 2);
    }

    #[test]
    fn test_rotation_follows_markers() {
        let schedule = schedule_of(
            &[Weekday::Monday],
            vec![
                event("a", Weekday::Monday, 9, 0, EventDuration::TwoHours),
                event("b", Weekday::Monday, 9, 30, EventDuration::TwoHours),
                event("c", Weekday::Monday, 10, 30, EventDuration::OneHour),
            ],
        );
        let layout = allocate(&schedule, PaletteExhaustion::Wrap).unwrap();
        let lanes: Vec<usize> = layout.placements().iter().map(|p| p.lane).collect();
        assert_eq!(lanes, vec![0, 1, 2]);
        assert_eq!(layout.bands()[0].width, 3);
    }

    #[test]
    fn test_empty_schedule_layout() {
        let schedule = Schedule::new([Weekday::Monday, Weekday::Tuesday]);
        let layout = allocate(&schedule, PaletteExhaustion::Error).unwrap();
        assert!(layout.axis().is_none());
        assert!(layout.placements().is_empty());
        assert_eq!(layout.total_columns(), 3);
        assert_eq!(layout.total_rows(), 1);
    }

    #[test]
    fn test_axis_labels_span_to_latest_end() {
        let schedule = schedule_of(
            &[Weekday::Monday, Weekday::Friday],
            vec![
                event("a", Weekday::Monday, 9, 0, EventDuration::OneHour),
                event("b", Weekday::Friday, 11, 30, EventDuration::TwoHours),
            ],
        );
        let axis = TimeAxis::spanning(&schedule).unwrap();
        let labels: Vec<NaiveTime> = axis.labels().map(|(_, time)| time).collect();
        assert_eq!(labels.first(), Some(&at(9, 0)));
        assert_eq!(labels.last(), Some(&at(13, 30)));
        assert_eq!(axis.slots(), 10);
    }

    #[test]
    fn test_unaligned_start_is_rejected() {
        let schedule = schedule_of(
            &[Weekday::Monday],
            vec![
                event("a", Weekday::Monday, 9, 0, EventDuration::OneHour),
                event("b", Weekday::Monday, 9, 15, EventDuration::OneHour),
            ],
        );
        let result = allocate(&schedule, PaletteExhaustion::Wrap);
        assert!(matches!(
            result,
            Err(LayoutError::Parsing(ParsingError::UnalignedStart(t))) if t == at(9, 15)
        ));
    }

    #[test]
    fn test_styles_follow_first_appearance() {
        let schedule = schedule_of(
            &[Weekday::Monday, Weekday::Tuesday],
            vec![
                event("redes", Weekday::Monday, 9, 0, EventDuration::OneHour),
                event("calculo", Weekday::Monday, 11, 0, EventDuration::OneHour),
                event("redes", Weekday::Tuesday, 9, 0, EventDuration::OneHour),
            ],
        );
        let layout = allocate(&schedule, PaletteExhaustion::Wrap).unwrap();
        let styles: Vec<StyleToken> = layout.placements().iter().map(|p| p.style).collect();
        assert_eq!(
            styles,
            vec![StyleToken::Course(0), StyleToken::Course(1), StyleToken::Course(0)]
        );
    }
}
