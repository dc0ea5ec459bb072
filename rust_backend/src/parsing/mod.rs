//! Parsers for scraped timetable markup.
//!
//! # Parsers
//!
//! - [`grid_parser`]: Parse the weekly calendar grid of a timetable page
//!
//! # Example
//!
//! ```no_run
//! use shifter_rust::parsing::ScheduleParser;
//!
//! let markup = std::fs::read_to_string("timetable.html").unwrap();
//! let schedule = ScheduleParser::new()
//!     .and_then(|parser| parser.parse(&markup))
//!     .expect("Failed to parse timetable");
//! println!("{} events", schedule.len());
//! ```

pub mod grid_parser;


pub use grid_parser::{parse_schedule_html, ScheduleParser};
