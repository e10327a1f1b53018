//! Path parsing utilities for archive files
//!
//! Each course has its own directory named after its code. Inside it, the
//! course record lives in `course.yaml` and each paper in a file named after
//! its year, period and sitting:
//!
//! ```text
//! CT470/course.yaml
//! CT470/2007-summer-1.yaml
//! CT470/2007-autumn-1.yaml
//! ```

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

use crate::domain::{
    CourseCode, Paper, Period,
    catalog::{InvalidCourseCode, InvalidPeriod},
};

/// File name of the course record inside a course directory.
pub const COURSE_FILE: &str = "course.yaml";

/// Extension of paper files.
pub const PAPER_EXTENSION: &str = "yaml";

static PAPER_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<year>[1-9]\d{3})-(?<period>[A-Za-z]+)-(?<sitting>\d+)$")
        .expect("paper file pattern is valid")
});

/// The identity of a paper as encoded in its file path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PaperKey {
    /// Course code, taken from the parent directory.
    pub course: CourseCode,
    /// The paper's starting year.
    pub year: i32,
    /// The examination period.
    pub period: Period,
    /// Sitting number within the period.
    pub sitting: u32,
}

/// Errors raised while parsing archive file paths.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// The path has no usable file name or parent directory.
    #[error("invalid path")]
    InvalidPath,

    /// The file name does not follow `YEAR-period-sitting`.
    #[error("'{0}' does not match YEAR-period-sitting")]
    FileName(String),

    /// The course directory is not a valid course code.
    #[error(transparent)]
    Course(#[from] InvalidCourseCode),

    /// The period in the file name is not recognised.
    #[error(transparent)]
    Period(#[from] InvalidPeriod),
}

/// Path of the course record for `code`.
#[must_use]
pub fn construct_course_path(root: &Path, code: &CourseCode) -> PathBuf {
    root.join(code.as_str()).join(COURSE_FILE)
}

/// Path of the file holding `paper` of course `code`.
#[must_use]
pub fn construct_paper_path(root: &Path, code: &CourseCode, paper: &Paper) -> PathBuf {
    root.join(code.as_str())
        .join(format!(
            "{}-{}-{}",
            paper.year_start(),
            paper.period(),
            paper.sitting()
        ))
        .with_extension(PAPER_EXTENSION)
}

/// Parse the course code from the directory containing `path`.
///
/// # Errors
///
/// Returns an error if the path has no parent directory or the directory
/// name is not a valid course code.
pub fn parse_course_from_path(path: &Path) -> Result<CourseCode, ParseError> {
    let directory = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|s| s.to_str())
        .ok_or(ParseError::InvalidPath)?;
    Ok(CourseCode::new(directory)?)
}

/// Parse a paper's identity from its file path.
///
/// # Errors
///
/// Returns an error if:
/// - The path has no file stem or parent directory
/// - The file stem doesn't match `YEAR-period-sitting`
/// - The course directory or period is malformed
pub fn parse_paper_from_path(path: &Path) -> Result<PaperKey, ParseError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or(ParseError::InvalidPath)?;

    let captures = PAPER_STEM
        .captures(stem)
        .ok_or_else(|| ParseError::FileName(stem.to_string()))?;
    let malformed = |_| ParseError::FileName(stem.to_string());

    Ok(PaperKey {
        course: parse_course_from_path(path)?,
        year: captures["year"].parse().map_err(malformed)?,
        period: captures["period"].parse()?,
        sitting: captures["sitting"].parse().map_err(malformed)?,
    })
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn parses_paper_path() {
        let key = parse_paper_from_path(Path::new("/archive/ct470/2007-Summer-2.yaml")).unwrap();
        assert_eq!(
            key,
            PaperKey {
                course: CourseCode::new("CT470").unwrap(),
                year: 2007,
                period: Period::Summer,
                sitting: 2,
            }
        );
    }

    #[test_case("2007-summer.yaml"; "missing sitting")]
    #[test_case("summer-2007-1.yaml"; "fields out of order")]
    #[test_case("2007-summer-one.yaml"; "non-numeric sitting")]
    #[test_case("notes.yaml"; "unrelated file")]
    #[test_case("207-summer-1.yaml"; "short year")]
    #[test_case("0207-summer-1.yaml"; "zero-padded year")]
    fn rejects_malformed_file_name(name: &str) {
        let path = Path::new("/archive/CT470").join(name);
        assert!(matches!(
            parse_paper_from_path(&path),
            Err(ParseError::FileName(_))
        ));
    }

    #[test]
    fn rejects_unknown_period() {
        assert!(matches!(
            parse_paper_from_path(Path::new("/archive/CT470/2007-monsoon-1.yaml")),
            Err(ParseError::Period(_))
        ));
    }

    #[test]
    fn rejects_bad_course_directory() {
        assert!(matches!(
            parse_paper_from_path(Path::new("/archive/CT-470/2007-summer-1.yaml")),
            Err(ParseError::Course(_))
        ));
    }

    #[test]
    fn course_path_uses_code_directory() {
        let code = CourseCode::new("ma101").unwrap();
        assert_eq!(
            construct_course_path(Path::new("/archive"), &code),
            PathBuf::from("/archive/MA101/course.yaml")
        );
    }
}
