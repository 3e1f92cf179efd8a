//! Common type definitions.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, ProgramId, etc.)
//! - [`CourseKey`], the structured course identifier parsed from course key
//!   strings
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type ProgramId = Uuid;
pub type OrganizationId = Uuid;
pub type CourseCodeId = Uuid;
pub type ProgramOrganizationId = Uuid;
pub type ProgramCourseCodeId = Uuid;
pub type RunModeId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// A structured course identifier.
///
/// Course keys arrive as opaque strings in two wire forms: the legacy
/// slash-separated form (`edX/DemoX/Demo_2014`) and the namespaced form
/// (`course-v1:edX+DemoX+Demo_2014`). Both decompose into the organization,
/// the course, and the run. The run segment is what gets persisted as a run
/// mode's `run_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseKey {
    pub org: String,
    pub course: String,
    pub run: String,
}

/// Failure to parse a course key string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid course key: '{raw}'")]
pub struct CourseKeyError {
    pub raw: String,
}

impl FromStr for CourseKey {
    type Err = CourseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CourseKeyError { raw: s.to_string() };

        let parts: Vec<&str> = match s.strip_prefix("course-v1:") {
            Some(rest) => rest.split('+').collect(),
            None => s.split('/').collect(),
        };

        let [org, course, run] = parts.as_slice() else {
            return Err(err());
        };

        if org.is_empty() || course.is_empty() || run.is_empty() {
            return Err(err());
        }
        if [org, course, run].iter().any(|p| p.contains(char::is_whitespace)) {
            return Err(err());
        }

        Ok(CourseKey {
            org: org.to_string(),
            course: course.to_string(),
            run: run.to_string(),
        })
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "course-v1:{}+{}+{}", self.org, self.course, self.run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_course_key() {
        let key: CourseKey = "edX/DemoX/Demo_2014".parse().unwrap();
        assert_eq!(key.org, "edX");
        assert_eq!(key.course, "DemoX");
        assert_eq!(key.run, "Demo_2014");
    }

    #[test]
    fn parses_namespaced_course_key() {
        let key: CourseKey = "course-v1:edX+DemoX+Demo_2014".parse().unwrap();
        assert_eq!(key.org, "edX");
        assert_eq!(key.course, "DemoX");
        assert_eq!(key.run, "Demo_2014");
    }

    #[test]
    fn rejects_malformed_course_keys() {
        for raw in [
            "",
            "edX/DemoX",
            "edX/DemoX/Demo/2014",
            "course-v1:edX+DemoX",
            "course-v1:edX+DemoX+Demo+2014",
            "edX//Demo_2014",
            "edX/Demo X/Demo_2014",
        ] {
            assert!(raw.parse::<CourseKey>().is_err(), "expected failure for {raw:?}");
        }
    }

    #[test]
    fn displays_in_namespaced_form() {
        let key: CourseKey = "edX/DemoX/Demo_2014".parse().unwrap();
        assert_eq!(key.to_string(), "course-v1:edX+DemoX+Demo_2014");
    }
}
