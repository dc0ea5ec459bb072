//! Timetable source abstraction and exclusive session access.
//!
//! The timetable source is a stateful, blocking collaborator (typically a
//! browser session) that must not be driven from two places at once. It is
//! owned by a [`FetcherSession`], and callers drive it through a
//! [`SessionLease`] that holds the session lock for its whole lifetime.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use log::debug;
use parking_lot::{Mutex, MutexGuard};

/// Error raised by a timetable source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Year {year} does not exist for course '{course}'")]
    YearOutOfBounds { course: String, year: u8 },

    #[error("Course name not found: {0}")]
    CourseNameNotFound(String),
}

/// Source of raw timetable markup.
pub trait ScheduleFetcher: Send {
    /// Course names the source knows about.
    fn course_names(&mut self) -> Result<Vec<String>, FetchError>;

    /// Fetch the timetable page of `course_name`.
    ///
    /// # Arguments
    /// * `course_name` - Course name as listed by [`Self::course_names`]
    /// * `year` - Curricular year, or `None` for the source's default year
    /// * `date` - Reference date, `dd-mm-yyyy`
    ///
    /// # Errors
    /// * [`FetchError::YearOutOfBounds`] when the course has no such year
    /// * [`FetchError::CourseNameNotFound`] when the course is unknown
    fn fetch(
        &mut self,
        course_name: &str,
        year: Option<u8>,
        date: &str,
    ) -> Result<String, FetchError>;

    /// Resolve `course_name` against [`Self::course_names`], ignoring case
    /// and surrounding whitespace.
    fn resolve_course(&mut self, course_name: &str) -> Result<String, FetchError> {
        let wanted = course_name.trim().to_lowercase();
        self.course_names()?
            .into_iter()
            .find(|name| name.trim().to_lowercase() == wanted)
            .ok_or_else(|| FetchError::CourseNameNotFound(course_name.to_string()))
    }
}

/// Owner of the single timetable source.
pub struct FetcherSession<F: ScheduleFetcher> {
    fetcher: Mutex<F>,
}

impl<F: ScheduleFetcher> FetcherSession<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Mutex::new(fetcher),
        }
    }

    /// Wait for exclusive access to the source.
    pub fn lease(&self) -> SessionLease<'_, F> {
        SessionLease {
            guard: self.fetcher.lock(),
        }
    }

    /// Exclusive access if no one else holds the session.
    pub fn try_lease(&self) -> Option<SessionLease<'_, F>> {
        self.fetcher.try_lock().map(|guard| SessionLease { guard })
    }

    pub fn into_inner(self) -> F {
        self.fetcher.into_inner()
    }
}

/// Exclusive access to the source; released on drop.
pub struct SessionLease<'a, F: ScheduleFetcher> {
    guard: MutexGuard<'a, F>,
}

impl<F: ScheduleFetcher> Deref for SessionLease<'_, F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.guard
    }
}

impl<F: ScheduleFetcher> DerefMut for SessionLease<'_, F> {
    fn deref_mut(&mut self) -> &mut F {
        &mut self.guard
    }
}

/// Source serving pre-loaded pages, for tests and offline use.
///
/// Pages are keyed by lowercased course name and year. A `None` year serves
/// the lowest year registered for the course.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFetcher {
    courses: Vec<String>,
    pages: HashMap<(String, u8), String>,
    requests: Vec<(String, Option<u8>, String)>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the page of one course year.
    pub fn with_page(mut self, course_name: &str, year: u8, markup: impl Into<String>) -> Self {
        let key = course_name.to_lowercase();
        if !self.courses.iter().any(|name| name.to_lowercase() == key) {
            self.courses.push(course_name.to_string());
        }
        self.pages.insert((key, year), markup.into());
        self
    }

    /// Every `(course, year, date)` passed to [`ScheduleFetcher::fetch`].
    pub fn requests(&self) -> &[(String, Option<u8>, String)] {
        &self.requests
    }
}

impl ScheduleFetcher for InMemoryFetcher {
    fn course_names(&mut self) -> Result<Vec<String>, FetchError> {
        Ok(self.courses.clone())
    }

    fn fetch(
        &mut self,
        course_name: &str,
        year: Option<u8>,
        date: &str,
    ) -> Result<String, FetchError> {
        self.requests
            .push((course_name.to_string(), year, date.to_string()));
        let course = course_name.to_lowercase();

        let year = match year {
            Some(year) => year,
            None => self
                .pages
                .keys()
                .filter(|(name, _)| *name == course)
                .map(|(_, year)| *year)
                .min()
                .ok_or_else(|| FetchError::CourseNameNotFound(course_name.to_string()))?,
        };

        debug!("Fetcher: serving '{}' year {} for {}", course_name, year, date);
        match self.pages.get(&(course.clone(), year)) {
            Some(markup) => Ok(markup.clone()),
            None if self.pages.keys().any(|(name, _)| *name == course) => {
                Err(FetchError::YearOutOfBounds {
                    course: course_name.to_string(),
                    year,
                })
            }
            None => Err(FetchError::CourseNameNotFound(course_name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> InMemoryFetcher {
        InMemoryFetcher::new()
            .with_page("Engenharia Informática", 1, "<y1/>")
            .with_page("Engenharia Informática", 2, "<y2/>")
    }

    #[test]
    fn test_resolve_course_ignores_case() {
        let mut fetcher = fetcher();
        assert_eq!(
            fetcher.resolve_course(" engenharia informática ").unwrap(),
            "Engenharia Informática"
        );
        assert_eq!(
            fetcher.resolve_course("Medicina"),
            Err(FetchError::CourseNameNotFound("Medicina".to_string()))
        );
    }

    #[test]
    fn test_fetch_years() {
        let mut fetcher = fetcher();
        let course = "Engenharia Informática";
        assert_eq!(fetcher.fetch(course, Some(2), "01-11-2023").unwrap(), "<y2/>");
        assert_eq!(fetcher.fetch(course, None, "01-11-2023").unwrap(), "<y1/>");
        assert_eq!(
            fetcher.fetch(course, Some(3), "01-11-2023"),
            Err(FetchError::YearOutOfBounds {
                course: course.to_string(),
                year: 3
            })
        );
        assert_eq!(fetcher.requests().len(), 3);
    }

    #[test]
    fn test_lease_is_exclusive() {
        let session = FetcherSession::new(fetcher());
        {
            let mut lease = session.lease();
            assert!(session.try_lease().is_none());
            assert_eq!(lease.course_names().unwrap().len(), 1);
        }
        assert!(session.try_lease().is_some());
        assert!(session.into_inner().requests().is_empty());
    }
}
