//! Spreadsheet builder.
//!
//! Writes a single-sheet Office Open XML workbook: the weekday header row, a
//! time-label column, an alternating dark/light background and one merged,
//! course-coloured cell range per event, positioned by the layout allocator.
//!
//! The package is assembled by hand from its XML parts and zipped in memory.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::BuildResult;
use super::{BuildOutput, Builder, RenderSettings, ScheduleInput};
use crate::algorithms::{allocate, GridLayout, PaletteExhaustion, StyleToken, COURSE_COLORS};
use crate::core::Schedule;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const FONT: &str = "Verdana";
const FONT_COLOR: &str = "595959";
const HEADER_FILL: &str = "595959";
const DARK_FILL: &str = "D9D9D9";
const LIGHT_FILL: &str = "F2F2F2";
const FALLBACK_FILL: &str = "FFFFFF";

const COLUMN_WIDTH: u32 = 23;
const DEFAULT_ROW_HEIGHT: u32 = 23;
const HEADER_ROW_HEIGHT: u32 = 30;
const EVENT_FONT_SIZE: u32 = 9;
const MAX_SHEET_NAME_LEN: usize = 31;

// Cell format indices into `cellXfs`, see `styles_xml`.
const XF_HEADER: usize = 1;
const XF_DARK: usize = 2;
const XF_LIGHT: usize = 3;
const XF_FIRST_EVENT: usize = 4;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Renders a schedule as an `.xlsx` workbook.
pub struct XlsxBuilder {
    schedule: Schedule,
    sheet_name: String,
    palette_exhaustion: PaletteExhaustion,
}

impl XlsxBuilder {
    pub fn new(input: impl Into<ScheduleInput>, settings: &RenderSettings) -> Self {
        Self {
            schedule: input.into().into_schedule(),
            sheet_name: settings.sheet_name.clone(),
            palette_exhaustion: settings.palette_exhaustion,
        }
    }

    /// Registry constructor.
    pub fn boxed(input: ScheduleInput, settings: &RenderSettings) -> Box<dyn Builder> {
        Box::new(Self::new(input, settings))
    }

    /// Render the workbook bytes.
    pub fn render(&self) -> BuildResult<Vec<u8>> {
        let layout = allocate(&self.schedule, self.palette_exhaustion)?;
        let mut strings = SharedStrings::default();
        let sheet = sheet_xml(&layout, &mut strings);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts = [
            ("[Content_Types].xml", content_types_xml()),
            ("_rels/.rels", root_rels_xml()),
            ("xl/workbook.xml", workbook_xml(&self.sheet_name)),
            ("xl/_rels/workbook.xml.rels", workbook_rels_xml()),
            ("xl/styles.xml", styles_xml()),
            ("xl/sharedStrings.xml", strings.to_xml()),
            ("xl/worksheets/sheet1.xml", sheet),
        ];
        for (name, xml) in parts {
            zip.start_file(name, options)?;
            zip.write_all(xml.as_bytes())?;
        }

        let bytes = zip.finish()?.into_inner();
        log::debug!(
            "Rendered workbook: {} events, {} columns, {} bytes",
            layout.placements().len(),
            layout.total_columns(),
            bytes.len()
        );
        Ok(bytes)
    }
}

impl Builder for XlsxBuilder {
    fn build(&self) -> BuildResult<BuildOutput> {
        Ok(BuildOutput {
            bytes: self.render()?,
            content_type: XLSX_CONTENT_TYPE,
        })
    }

    fn content_type(&self) -> &'static str {
        XLSX_CONTENT_TYPE
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }
}

/// Spreadsheet column name for a zero-based index: 0 is `A`, 26 is `AA`.
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// `B3` style reference for zero-based coordinates.
pub fn cell_reference(row: usize, column: usize) -> String {
    format!("{}{}", column_letter(column), row + 1)
}

fn event_xf(token: StyleToken) -> usize {
    match token {
        StyleToken::Course(index) => XF_FIRST_EVENT + index % COURSE_COLORS.len(),
        StyleToken::Fallback => XF_FIRST_EVENT + COURSE_COLORS.len(),
    }
}

/// Background format of a slot row; even spreadsheet row numbers are dark.
fn background_xf(row: usize) -> usize {
    if (row + 1) % 2 == 0 {
        XF_DARK
    } else {
        XF_LIGHT
    }
}

#[derive(Default)]
struct SharedStrings {
    values: Vec<String>,
    index: HashMap<String, usize>,
}

impl SharedStrings {
    fn intern(&mut self, value: &str) -> usize {
        if let Some(&position) = self.index.get(value) {
            return position;
        }
        let position = self.values.len();
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), position);
        position
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="{MAIN_NS}" count="{n}" uniqueCount="{n}">"#,
            n = self.values.len()
        );
        for value in &self.values {
            xml.push_str(&format!(
                r#"<si><t xml:space="preserve">{}</t></si>"#,
                escape(value.as_str())
            ));
        }
        xml.push_str("</sst>");
        xml
    }
}

#[derive(Clone, Copy)]
struct Cell {
    style: usize,
    string: Option<usize>,
}

fn sheet_xml(layout: &GridLayout<'_>, strings: &mut SharedStrings) -> String {
    let rows = layout.total_rows();
    let columns = layout.total_columns();
    let mut grid = vec![vec![Cell { style: 0, string: None }; columns]; rows];
    let mut merges = Vec::new();

    // Header row.
    for cell in grid[0].iter_mut() {
        cell.style = XF_HEADER;
    }
    for band in layout.bands() {
        grid[0][band.first_column].string = Some(strings.intern(band.weekday.label()));
        if band.width > 1 {
            merges.push(format!(
                "{}:{}",
                cell_reference(0, band.first_column),
                cell_reference(0, band.last_column())
            ));
        }
    }

    // Time labels over the chess background.
    if let Some(axis) = layout.axis() {
        for (row, time) in axis.labels() {
            let style = background_xf(row);
            for cell in grid[row].iter_mut() {
                cell.style = style;
            }
            grid[row][0].string = Some(strings.intern(&time.format("%H:%M").to_string()));
        }
    }

    for placement in layout.placements() {
        let style = event_xf(placement.style);
        let body = &placement.event.body;
        let text = format!("{}\n{}\n{}", body.display_name(), body.location, body.shift);

        for row in placement.rows() {
            grid[row][placement.column] = Cell { style, string: None };
        }
        grid[placement.first_row][placement.column].string = Some(strings.intern(&text));
        merges.push(format!(
            "{}:{}",
            cell_reference(placement.first_row, placement.column),
            cell_reference(placement.last_row, placement.column)
        ));
    }

    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}">"#
    );
    xml.push_str(&format!(
        r#"<dimension ref="A1:{}"/>"#,
        cell_reference(rows - 1, columns - 1)
    ));
    xml.push_str(r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#);
    xml.push_str(&format!(
        r#"<sheetFormatPr defaultRowHeight="{DEFAULT_ROW_HEIGHT}" customHeight="1"/>"#
    ));
    xml.push_str(&format!(
        r#"<cols><col min="1" max="{columns}" width="{COLUMN_WIDTH}" customWidth="1"/></cols>"#
    ));

    xml.push_str("<sheetData>");
    for (row, cells) in grid.iter().enumerate() {
        if row == 0 {
            xml.push_str(&format!(
                r#"<row r="1" ht="{HEADER_ROW_HEIGHT}" customHeight="1">"#
            ));
        } else {
            xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
        }
        for (column, cell) in cells.iter().enumerate() {
            let reference = cell_reference(row, column);
            match cell.string {
                Some(index) => xml.push_str(&format!(
                    r#"<c r="{reference}" s="{}" t="s"><v>{index}</v></c>"#,
                    cell.style
                )),
                None => xml.push_str(&format!(r#"<c r="{reference}" s="{}"/>"#, cell.style)),
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, merges.len()));
        for range in &merges {
            xml.push_str(&format!(r#"<mergeCell ref="{range}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str("</worksheet>");
    xml
}

fn styles_xml() -> String {
    let fonts = format!(
        concat!(
            r#"<fonts count="3">"#,
            r#"<font><sz val="10"/><color rgb="FF{color}"/><name val="{font}"/></font>"#,
            r#"<font><b/><sz val="10"/><color rgb="FFFFFFFF"/><name val="{font}"/></font>"#,
            r#"<font><sz val="{size}"/><color rgb="FF{color}"/><name val="{font}"/></font>"#,
            r#"</fonts>"#
        ),
        color = FONT_COLOR,
        font = FONT,
        size = EVENT_FONT_SIZE
    );

    let solid = |rgb: &str| {
        format!(
            r#"<fill><patternFill patternType="solid"><fgColor rgb="FF{rgb}"/><bgColor indexed="64"/></patternFill></fill>"#
        )
    };
    let mut fills_body = String::from(
        r#"<fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill>"#,
    );
    for rgb in [HEADER_FILL, DARK_FILL, LIGHT_FILL] {
        fills_body.push_str(&solid(rgb));
    }
    for color in COURSE_COLORS {
        fills_body.push_str(&solid(&color.trim_start_matches('#').to_uppercase()));
    }
    fills_body.push_str(&solid(FALLBACK_FILL));
    // none, gray125, header, dark, light, courses, fallback
    let fill_count = 5 + COURSE_COLORS.len() + 1;
    let fills = format!(r#"<fills count="{fill_count}">{fills_body}</fills>"#);

    let centered = r#"<alignment horizontal="center" vertical="center" wrapText="1"/>"#;
    let mut xfs = vec![
        r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#.to_string(),
        format!(
            r#"<xf numFmtId="0" fontId="1" fillId="2" borderId="0" xfId="0" applyFont="1" applyFill="1" applyAlignment="1">{centered}</xf>"#
        ),
        format!(
            r#"<xf numFmtId="0" fontId="0" fillId="3" borderId="0" xfId="0" applyFont="1" applyFill="1" applyAlignment="1">{centered}</xf>"#
        ),
        format!(
            r#"<xf numFmtId="0" fontId="0" fillId="4" borderId="0" xfId="0" applyFont="1" applyFill="1" applyAlignment="1">{centered}</xf>"#
        ),
    ];
    for fill_id in 5..fill_count {
        xfs.push(format!(
            r#"<xf numFmtId="0" fontId="2" fillId="{fill_id}" borderId="0" xfId="0" applyFont="1" applyFill="1" applyBorder="1" applyAlignment="1">{centered}</xf>"#
        ));
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<styleSheet xmlns="{ns}">{fonts}{fills}"#,
            r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="{xf_count}">{xfs}</cellXfs>"#,
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            r#"</styleSheet>"#
        ),
        ns = MAIN_NS,
        fonts = fonts,
        fills = fills,
        xf_count = xfs.len(),
        xfs = xfs.concat()
    )
}

/// Sheet names are limited to 31 characters without `[]:*?/\`.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

fn workbook_xml(sheet_name: &str) -> String {
    let name = sanitize_sheet_name(sheet_name);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        escape(name.as_str())
    )
}

fn workbook_rels_xml() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
        r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        r#"</Relationships>"#
    )
    .to_string()
}

fn root_rels_xml() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
        r#"</Relationships>"#
    )
    .to_string()
}

fn content_types_xml() -> String {
    concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
        r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
        r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        r#"</Types>"#
    )
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use chrono::NaiveTime;
    use zip::ZipArchive;

    use crate::core::{EventBody, EventDuration, ScheduleEvent, Weekday};

    fn event(course: &str, weekday: Weekday, h: u32, duration: EventDuration) -> ScheduleEvent {
        ScheduleEvent::new(
            EventBody::new(course, "Gualtar-CP2-0.20".parse().unwrap(), "T1"),
            NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
            duration,
            weekday,
        )
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
        assert_eq!(cell_reference(0, 1), "B1");
    }

    #[test]
    fn test_background_parity() {
        // Grid row 1 is spreadsheet row 2.
        assert_eq!(background_xf(1), XF_DARK);
        assert_eq!(background_xf(2), XF_LIGHT);
    }

    #[test]
    fn test_sheet_name_sanitizing() {
        assert_eq!(sanitize_sheet_name("Your Schedule"), "Your Schedule");
        assert_eq!(sanitize_sheet_name("a/b:c"), "abc");
        assert_eq!(sanitize_sheet_name("[]"), "Sheet1");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
    }

    #[test]
    fn test_overlapping_events_are_merged_in_separate_columns() {
        let mut schedule = Schedule::new([Weekday::Monday, Weekday::Tuesday]);
        schedule.add_event(event("databases", Weekday::Monday, 9, EventDuration::TwoHours));
        schedule.add_event(event("algorithms", Weekday::Monday, 10, EventDuration::OneHour));
        schedule.add_event(event("databases", Weekday::Tuesday, 9, EventDuration::OneHour));

        let output = XlsxBuilder::new(schedule, &RenderSettings::default())
            .build()
            .unwrap();
        assert_eq!(output.content_type, XLSX_CONTENT_TYPE);

        let sheet = read_part(&output.bytes, "xl/worksheets/sheet1.xml");
        // Monday header spans B:C, Tuesday lands in D.
        assert!(sheet.contains(r#"<mergeCell ref="B1:C1"/>"#));
        assert!(sheet.contains(r#"<mergeCell ref="B2:B5"/>"#));
        assert!(sheet.contains(r#"<mergeCell ref="C4:C5"/>"#));
        assert!(sheet.contains(r#"<mergeCell ref="D2:D3"/>"#));
        assert!(sheet.contains(r#"<row r="1" ht="30" customHeight="1">"#));

        let strings = read_part(&output.bytes, "xl/sharedStrings.xml");
        assert!(strings.contains("Segunda-Feira"));
        assert!(strings.contains("Databases\nGualtar - CP2 0.20\nT1"));
        assert!(strings.contains("09:00"));
    }

    #[test]
    fn test_empty_schedule_still_renders_header() {
        let output = XlsxBuilder::new(Schedule::new([Weekday::Friday]), &RenderSettings::default())
            .build()
            .unwrap();
        let sheet = read_part(&output.bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<dimension ref="A1:B1"/>"#));
        assert!(!sheet.contains("mergeCells"));
    }

    #[test]
    fn test_styles_carry_palette() {
        let styles = styles_xml();
        assert!(styles.contains(r#"<fgColor rgb="FFFFFFCC"/>"#));
        assert!(styles.contains(r#"<fgColor rgb="FFCCFF99"/>"#));
        assert!(styles.contains(r#"<name val="Verdana"/>"#));
        assert!(styles.contains(&format!(r#"<cellXfs count="{}">"#, XF_FIRST_EVENT + 13)));
    }
}
