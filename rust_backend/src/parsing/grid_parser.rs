use chrono::{Duration, NaiveTime};
use scraper::{ElementRef, Html, Selector};

use crate::core::{
    DurationHint, EventBody, EventDuration, ParsingError, Schedule, ScheduleEvent, Weekday,
};

/// Time covered by one row of the content grid.
const ROW_MINUTES: i64 = 30;

/// Parser for the weekly calendar grid rendered by the timetable site.
///
/// The page holds three tables:
/// - `table.rsHorizontalHeaderTable`: one `<a>` per weekday column
/// - `table.rsVerticalHeaderTable`: time labels, the first one being the
///   start of the grid
/// - `table.rsContentTable`: one row per 30 minute slot, one cell per weekday,
///   each cell holding zero or more `div.rsApt.rsAptSimple` event blocks
///
/// Every block carries its title (`name\n[location]\nshift`) in the `title`
/// attribute and its rendered height in the `style` attribute, from which the
/// duration is inferred.
pub struct ScheduleParser {
    weekday_table: Selector,
    weekday_link: Selector,
    time_table: Selector,
    time_label: Selector,
    content_table: Selector,
    content_rows: Selector,
    event_block: Selector,
}

fn selector(css: &'static str) -> Result<Selector, ParsingError> {
    Selector::parse(css).map_err(|e| ParsingError::InvalidSelector(format!("{css}: {e:?}")))
}

impl ScheduleParser {
    pub fn new() -> Result<Self, ParsingError> {
        Ok(Self {
            weekday_table: selector("table.rsHorizontalHeaderTable")?,
            weekday_link: selector("a")?,
            time_table: selector("table.rsVerticalHeaderTable")?,
            time_label: selector("div")?,
            content_table: selector("table.rsContentTable")?,
            content_rows: selector("table.rsContentTable > tbody > tr")?,
            event_block: selector("div.rsApt.rsAptSimple")?,
        })
    }

    /// Parse timetable markup into a schedule.
    ///
    /// A grid without any event block yields a schedule declaring every
    /// header weekday with no events.
    ///
    /// # Errors
    /// * [`ParsingError::MissingElement`] when a required table is absent
    /// * [`ParsingError::MissingHeight`] when a block style has no height
    /// * [`ParsingError::InvalidTitle`] when a block title is not
    ///   `name [location] shift`
    pub fn parse(&self, markup: &str) -> Result<Schedule, ParsingError> {
        let document = Html::parse_document(markup);

        let weekdays = self.parse_weekdays(&document)?;
        let mut cursor = self.parse_start_time(&document)?;
        let mut schedule = Schedule::new(weekdays.iter().copied());

        if document.select(&self.content_table).next().is_none() {
            return Err(ParsingError::MissingElement("table.rsContentTable".to_string()));
        }

        for (row_index, row) in document.select(&self.content_rows).enumerate() {
            for (column, cell) in cells(row).enumerate() {
                for block in cell.select(&self.event_block) {
                    let starts_at = cursor.ok_or_else(|| {
                        ParsingError::MissingElement(
                            "table.rsVerticalHeaderTable time label".to_string(),
                        )
                    })?;
                    let weekday = *weekdays.get(column).ok_or(ParsingError::ColumnOutOfRange {
                        column,
                        headers: weekdays.len(),
                    })?;

                    let event = parse_block(block, starts_at, weekday)?;
                    log::debug!(
                        "Row {}: {} {} {} ({})",
                        row_index,
                        weekday,
                        starts_at.format("%H:%M"),
                        event.body.course_name,
                        event.body.shift
                    );
                    schedule.add_event(event);
                }
            }

            cursor = cursor
                .map(|time| time.overflowing_add_signed(Duration::minutes(ROW_MINUTES)).0);
        }

        log::info!(
            "Parsed schedule with {} events across {} weekdays",
            schedule.len(),
            schedule.weekdays().len()
        );
        Ok(schedule)
    }

    fn parse_weekdays(&self, document: &Html) -> Result<Vec<Weekday>, ParsingError> {
        let header = document
            .select(&self.weekday_table)
            .next()
            .ok_or_else(|| {
                ParsingError::MissingElement("table.rsHorizontalHeaderTable".to_string())
            })?;

        header
            .select(&self.weekday_link)
            .map(|link| Weekday::from_label(&link.text().collect::<String>()))
            .collect()
    }

    /// First time label of the vertical header, if there is one.
    fn parse_start_time(&self, document: &Html) -> Result<Option<NaiveTime>, ParsingError> {
        let header = document.select(&self.time_table).next().ok_or_else(|| {
            ParsingError::MissingElement("table.rsVerticalHeaderTable".to_string())
        })?;

        header
            .select(&self.time_label)
            .next()
            .map(|label| parse_time_label(&label.text().collect::<String>()))
            .transpose()
    }
}

/// Parse timetable markup with a freshly built [`ScheduleParser`].
pub fn parse_schedule_html(markup: &str) -> Result<Schedule, ParsingError> {
    ScheduleParser::new()?.parse(markup)
}

/// Direct `<td>` children of a grid row, so nested tables are not walked twice.
fn cells(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "td")
}

fn parse_block(
    block: ElementRef<'_>,
    starts_at: NaiveTime,
    weekday: Weekday,
) -> Result<ScheduleEvent, ParsingError> {
    let style = block
        .value()
        .attr("style")
        .ok_or_else(|| ParsingError::MissingHeight(String::new()))?;
    let duration = EventDuration::from(DurationHint::from_style(style)?);

    let title = block.value().attr("title").ok_or(ParsingError::MissingTitle)?;
    let body = EventBody::from_title(title)?;

    Ok(ScheduleEvent::new(body, starts_at, duration, weekday))
}

fn parse_time_label(label: &str) -> Result<NaiveTime, ParsingError> {
    let label = label.trim();
    NaiveTime::parse_from_str(label, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&label.to_lowercase(), "%Hh%M"))
        .map_err(|_| ParsingError::InvalidTime(label.to_string()))
}
