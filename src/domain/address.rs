//! External addressing of papers and questions.
//!
//! Questions are deep-linked as `COURSE/YEAR/PERIOD/PATH`, for example
//! `CT470/2007/summer/2.1.3`. The path may also be preceded by a `q/`
//! segment, matching the web deep-link form `CT470/2007/summer/q/2.1.3`.

use std::{fmt, str::FromStr};

use crate::domain::{
    catalog::{CourseCode, InvalidCourseCode, InvalidPeriod, Period, YEARS},
    path::{PathError, QuestionPath},
};

/// Errors raised while parsing an address.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    /// The address did not have the expected number of segments.
    #[error("invalid address '{0}': expected COURSE/YEAR/PERIOD[/PATH]")]
    Syntax(String),

    /// The year segment was not a four-digit year.
    #[error("invalid year '{0}'")]
    Year(String),

    /// The course code was malformed.
    #[error(transparent)]
    Course(#[from] InvalidCourseCode),

    /// The period was not recognised.
    #[error(transparent)]
    Period(#[from] InvalidPeriod),

    /// The question path was malformed.
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Identifies the papers of a course set in a given year and period.
///
/// More than one paper can match when a period has several sittings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperAddress {
    /// The course code.
    pub course: CourseCode,
    /// The paper's starting year.
    pub year: i32,
    /// The examination period.
    pub period: Period,
}

/// Identifies a question by paper and materialized path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAddress {
    /// The paper the question belongs to.
    pub paper: PaperAddress,
    /// The question's integer path.
    pub path: QuestionPath,
}

impl PaperAddress {
    /// The address of the question at `path` on this paper.
    #[must_use]
    pub fn question(&self, path: QuestionPath) -> QuestionAddress {
        QuestionAddress {
            paper: self.clone(),
            path,
        }
    }

    fn parse_segments(input: &str, segments: &[&str]) -> Result<Self, AddressError> {
        let [course, year, period] = segments else {
            return Err(AddressError::Syntax(input.to_string()));
        };
        Ok(Self {
            course: course.parse()?,
            year: year
                .parse()
                .ok()
                .filter(|year| YEARS.contains(year))
                .ok_or_else(|| AddressError::Year((*year).to_string()))?,
            period: period.parse()?,
        })
    }
}

impl fmt::Display for PaperAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.course, self.year, self.period)
    }
}

impl FromStr for PaperAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.trim().trim_matches('/').split('/').collect();
        Self::parse_segments(s, &segments)
    }
}

impl fmt::Display for QuestionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.paper, self.path)
    }
}

impl FromStr for QuestionAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.trim().trim_matches('/').split('/').collect();
        let (paper, path) = match segments.as_slice() {
            [paper @ .., "q", path] | [paper @ .., path] if paper.len() == 3 => (paper, path),
            _ => return Err(AddressError::Syntax(s.to_string())),
        };
        Ok(PaperAddress::parse_segments(s, paper)?.question(path.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("CT470/2007/summer/1.2.3"; "plain")]
    #[test_case("ct470/2007/Summer/q/1.2.3"; "deep link")]
    #[test_case("/CT470/2007/summer/1.2.3/"; "surrounding slashes")]
    fn parses_question_address(input: &str) {
        let address: QuestionAddress = input.parse().unwrap();
        assert_eq!(address.paper.course.as_str(), "CT470");
        assert_eq!(address.paper.year, 2007);
        assert_eq!(address.paper.period, Period::Summer);
        assert_eq!(address.path.to_vec(), vec![1, 2, 3]);
        assert_eq!(address.to_string(), "CT470/2007/summer/1.2.3");
    }

    #[test_case("CT470/2007/summer"; "missing path")]
    #[test_case("CT470/2007/summer/x/1"; "wrong marker")]
    #[test_case("CT470/summer/1"; "missing year")]
    fn rejects_malformed_question_address(input: &str) {
        assert!(matches!(
            input.parse::<QuestionAddress>(),
            Err(AddressError::Syntax(_))
        ));
    }

    #[test_case("CT470/207/summer/1"; "three digits")]
    #[test_case("CT470/20071/summer/1"; "five digits")]
    #[test_case("CT470/-5/summer/1"; "negative")]
    fn rejects_year_outside_range(input: &str) {
        assert!(matches!(
            input.parse::<QuestionAddress>(),
            Err(AddressError::Year(_))
        ));
    }

    #[test]
    fn reports_bad_segments() {
        assert!(matches!(
            "CT470/next/summer/1".parse::<QuestionAddress>(),
            Err(AddressError::Year(_))
        ));
        assert!(matches!(
            "CT470/2007/monsoon/1".parse::<QuestionAddress>(),
            Err(AddressError::Period(_))
        ));
        assert!(matches!(
            "CT470/2007/summer/1.0".parse::<QuestionAddress>(),
            Err(AddressError::Path(_))
        ));
    }

    #[test]
    fn parses_paper_address() {
        let address: PaperAddress = "ma101/2015/winter".parse().unwrap();
        assert_eq!(address.to_string(), "MA101/2015/winter");
        assert!("MA101/2015".parse::<PaperAddress>().is_err());
    }
}
