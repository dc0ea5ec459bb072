//! Collision detection and grid layout algorithms.
//!
//! # Components
//!
//! - [`conflicts`]: Collision markers between chronologically adjacent events
//! - [`palette`]: Course colour assignment for rendered cells
//! - [`layout`]: Column and row allocation for the spreadsheet grid
//!
//! # Example
//!
//! ```
//! use shifter_rust::algorithms::{allocate, PaletteExhaustion};
//! use shifter_rust::core::{Schedule, Weekday};
//!
//! let schedule = Schedule::new([Weekday::Monday, Weekday::Tuesday]);
//! let layout = allocate(&schedule, PaletteExhaustion::Wrap).unwrap();
//! assert_eq!(layout.total_columns(), 3);
//! ```

pub mod conflicts;
pub mod layout;
pub mod palette;

pub use conflicts::{detect_collisions, CollisionMarker};
pub use layout::{allocate, CellPlacement, DayBand, GridLayout, LayoutError, TimeAxis, SLOT_MINUTES};
pub use palette::{CoursePalette, PaletteExhaustion, StyleToken, COURSE_COLORS};
