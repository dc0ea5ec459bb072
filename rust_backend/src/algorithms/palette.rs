//! Course colour assignment.
//!
//! Each distinct course of a render pass receives the next colour of
//! [`COURSE_COLORS`] in order of first appearance. What happens once the
//! palette runs out is chosen by [`PaletteExhaustion`].

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::layout::LayoutError;

/// Fill colours handed out to courses, in assignment order.
pub const COURSE_COLORS: [&str; 12] = [
    "#ffffcc", "#ffcc99", "#ffcccc", "#ff99cc", "#ffccff", "#cc99ff", "#ccccff", "#99ccff",
    "#ccffff", "#99ffcc", "#ccffcc", "#ccff99",
];

/// Fill used by [`StyleToken::Fallback`].
pub const FALLBACK_COLOR: &str = "#ffffff";

/// Style assigned to a course for one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleToken {
    /// Index into [`COURSE_COLORS`].
    Course(usize),
    Fallback,
}

impl StyleToken {
    pub fn fill_color(&self) -> &'static str {
        match self {
            StyleToken::Course(index) => COURSE_COLORS[index % COURSE_COLORS.len()],
            StyleToken::Fallback => FALLBACK_COLOR,
        }
    }
}

/// Policy applied when there are more courses than palette colours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteExhaustion {
    /// Start over from the first colour.
    #[default]
    Wrap,
    /// Give the remaining courses the neutral fallback fill.
    Fallback,
    /// Refuse to render.
    Error,
}

impl FromStr for PaletteExhaustion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wrap" => Ok(Self::Wrap),
            "fallback" => Ok(Self::Fallback),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown palette exhaustion policy: {}", s)),
        }
    }
}

/// Typed mapping from lowercased course name to its style token.
#[derive(Debug, Clone, Default)]
pub struct CoursePalette {
    tokens: HashMap<String, StyleToken>,
    order: Vec<String>,
}

impl CoursePalette {
    /// Assign tokens to courses in the order given. Repeated names keep their
    /// first token.
    ///
    /// # Errors
    /// [`LayoutError::PaletteExhausted`] when the policy is
    /// [`PaletteExhaustion::Error`] and there are more courses than colours.
    pub fn assign<'a>(
        courses: impl IntoIterator<Item = &'a str>,
        policy: PaletteExhaustion,
    ) -> Result<Self, LayoutError> {
        let mut palette = Self::default();
        for course in courses {
            if palette.tokens.contains_key(course) {
                continue;
            }

            let index = palette.order.len();
            let token = if index < COURSE_COLORS.len() {
                StyleToken::Course(index)
            } else {
                match policy {
                    PaletteExhaustion::Wrap => StyleToken::Course(index % COURSE_COLORS.len()),
                    PaletteExhaustion::Fallback => StyleToken::Fallback,
                    PaletteExhaustion::Error => {
                        return Err(LayoutError::PaletteExhausted {
                            capacity: COURSE_COLORS.len(),
                        })
                    }
                }
            };

            if index == COURSE_COLORS.len() {
                log::warn!(
                    "Palette exhausted after {} courses, applying {:?} policy",
                    COURSE_COLORS.len(),
                    policy
                );
            }

            palette.tokens.insert(course.to_string(), token);
            palette.order.push(course.to_string());
        }
        Ok(palette)
    }

    /// Token for a course. Unknown courses get [`StyleToken::Fallback`].
    pub fn token_for(&self, course: &str) -> StyleToken {
        self.tokens
            .get(course)
            .copied()
            .unwrap_or(StyleToken::Fallback)
    }

    /// Courses in assignment order.
    pub fn courses(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("course {i}")).collect()
    }

    #[test]
    fn test_first_encounter_order() {
        let palette =
            CoursePalette::assign(["redes", "calculo", "redes", "fisica"], PaletteExhaustion::Wrap)
                .unwrap();
        assert_eq!(palette.token_for("redes"), StyleToken::Course(0));
        assert_eq!(palette.token_for("calculo"), StyleToken::Course(1));
        assert_eq!(palette.token_for("fisica"), StyleToken::Course(2));
        assert_eq!(palette.token_for("unknown"), StyleToken::Fallback);
        assert_eq!(palette.len(), 3);
        assert_eq!(StyleToken::Course(1).fill_color(), "#ffcc99");
    }

    #[test]
    fn test_wrap_policy_reuses_colors() {
        let names = course_names(14);
        let palette =
            CoursePalette::assign(names.iter().map(String::as_str), PaletteExhaustion::Wrap)
                .unwrap();
        assert_eq!(palette.token_for("course 12").fill_color(), COURSE_COLORS[0]);
        assert_eq!(palette.token_for("course 13").fill_color(), COURSE_COLORS[1]);
    }

    #[test]
    fn test_fallback_policy() {
        let names = course_names(13);
        let palette =
            CoursePalette::assign(names.iter().map(String::as_str), PaletteExhaustion::Fallback)
                .unwrap();
        assert_eq!(palette.token_for("course 11"), StyleToken::Course(11));
        assert_eq!(palette.token_for("course 12"), StyleToken::Fallback);
    }

    #[test]
    fn test_error_policy() {
        let names = course_names(13);
        let result =
            CoursePalette::assign(names.iter().map(String::as_str), PaletteExhaustion::Error);
        assert!(matches!(result, Err(LayoutError::PaletteExhausted { capacity: 12 })));

        let names = course_names(12);
        assert!(
            CoursePalette::assign(names.iter().map(String::as_str), PaletteExhaustion::Error)
                .is_ok()
        );
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("WRAP".parse::<PaletteExhaustion>().unwrap(), PaletteExhaustion::Wrap);
        assert!("cycle".parse::<PaletteExhaustion>().is_err());
    }
}
