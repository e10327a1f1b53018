//! Courses and the papers set for them.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    ops::{Deref, RangeInclusive},
    str::FromStr,
};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

/// Years a paper can be set in.
///
/// Paper files are named after their four-digit starting year.
pub const YEARS: RangeInclusive<i32> = 1000..=9999;

/// A course code, normalised to upper case (e.g. `CT470`).
///
/// Codes are compared case-insensitively by normalising at construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CourseCode(NonEmptyString);

/// Error returned when a course code is empty or not alphanumeric.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid course code '{0}': must be non-empty and contain only letters and digits")]
pub struct InvalidCourseCode(String);

impl CourseCode {
    /// Create a course code, upper-casing the input.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCourseCode`] if the code is empty or contains anything
    /// other than ASCII letters and digits.
    pub fn new(code: &str) -> Result<Self, InvalidCourseCode> {
        let upper = code.trim().to_ascii_uppercase();
        if !upper.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InvalidCourseCode(code.to_string()));
        }
        NonEmptyString::new(upper)
            .map(Self)
            .map_err(|_| InvalidCourseCode(code.to_string()))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for CourseCode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseCode {
    type Err = InvalidCourseCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The examination period a paper was sat in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Summer sitting.
    Summer,
    /// Winter sitting.
    Winter,
    /// Autumn (repeat) sitting.
    Autumn,
    /// Spring sitting.
    Spring,
}

/// Error returned for an unrecognised period name.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown period '{0}': expected one of summer, winter, autumn, spring")]
pub struct InvalidPeriod(String);

impl Period {
    /// The lower-case name of this period.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Summer => "summer",
            Self::Winter => "winter",
            Self::Autumn => "autumn",
            Self::Spring => "spring",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = InvalidPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summer" => Ok(Self::Summer),
            "winter" => Ok(Self::Winter),
            "autumn" => Ok(Self::Autumn),
            "spring" => Ok(Self::Spring),
            _ => Err(InvalidPeriod(s.to_string())),
        }
    }
}

/// A course papers are set for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub(crate) id: Uuid,
    pub(crate) code: CourseCode,
    pub(crate) name: String,
}

impl Course {
    /// The stable identifier of this course.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The course code.
    #[must_use]
    pub const fn code(&self) -> &CourseCode {
        &self.code
    }

    /// The course title.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A single exam paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paper {
    pub(crate) id: Uuid,
    pub(crate) course: Uuid,
    pub(crate) name: String,
    pub(crate) period: Period,
    pub(crate) sitting: u32,
    pub(crate) year_start: i32,
    pub(crate) year_stop: i32,
    pub(crate) link: Option<String>,
}

impl Paper {
    /// The stable identifier of this paper.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The course this paper belongs to.
    #[must_use]
    pub const fn course(&self) -> Uuid {
        self.course
    }

    /// The paper's title.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The examination period.
    #[must_use]
    pub const fn period(&self) -> Period {
        self.period
    }

    /// Which sitting of the period this is (usually 1).
    #[must_use]
    pub const fn sitting(&self) -> u32 {
        self.sitting
    }

    /// First year of the academic year the paper was set in.
    #[must_use]
    pub const fn year_start(&self) -> i32 {
        self.year_start
    }

    /// Last year of the academic year the paper was set in.
    #[must_use]
    pub const fn year_stop(&self) -> i32 {
        self.year_stop
    }

    /// Link to the original paper document.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}

/// Everything needed to register a new paper.
#[derive(Debug, Clone)]
pub struct NewPaper {
    /// Code of the course the paper belongs to.
    pub course: CourseCode,
    /// The paper's title.
    pub name: String,
    /// The examination period.
    pub period: Period,
    /// Which sitting of the period this is.
    pub sitting: u32,
    /// First year of the academic year.
    pub year_start: i32,
    /// Last year of the academic year; defaults to `year_start + 1`.
    pub year_stop: Option<i32>,
    /// Link to the original paper document.
    pub link: Option<String>,
}

/// Errors raised when registering courses or papers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    /// A course with this code already exists.
    #[error("course {0} already exists")]
    DuplicateCourse(CourseCode),

    /// No course has this code.
    #[error("course {0} not found")]
    UnknownCourse(CourseCode),

    /// No course has this identifier.
    #[error("course with id {0} not found")]
    UnknownCourseId(Uuid),

    /// The starting year is outside [`YEARS`].
    #[error("year {0} is out of range: expected a four-digit year")]
    Year(i32),

    /// The last year precedes the starting year, or cannot follow it.
    #[error("academic year {year_start}-{year_stop:?} is not valid")]
    YearStop {
        /// The starting year.
        year_start: i32,
        /// The requested last year, if any.
        year_stop: Option<i32>,
    },

    /// A paper for this course, year, period and sitting already exists.
    #[error("paper {course}/{year}/{period} (sitting {sitting}) already exists")]
    DuplicatePaper {
        /// The course code.
        course: CourseCode,
        /// The paper's starting year.
        year: i32,
        /// The examination period.
        period: Period,
        /// The sitting number.
        sitting: u32,
    },
}

/// The set of known courses and papers.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    courses: HashMap<Uuid, Course>,
    codes: BTreeMap<CourseCode, Uuid>,
    papers: HashMap<Uuid, Paper>,
}

impl Catalog {
    /// Register a new course.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateCourse`] if the code is taken.
    #[instrument(level = "debug", skip(self))]
    pub fn add_course(&mut self, code: CourseCode, name: String) -> Result<Uuid, CatalogError> {
        self.insert_course(Course {
            id: Uuid::new_v4(),
            code,
            name,
        })
    }

    pub(crate) fn insert_course(&mut self, course: Course) -> Result<Uuid, CatalogError> {
        if self.codes.contains_key(&course.code) {
            return Err(CatalogError::DuplicateCourse(course.code));
        }
        let id = course.id;
        self.codes.insert(course.code.clone(), id);
        self.courses.insert(id, course);
        Ok(id)
    }

    /// Register a new paper for an existing course.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownCourse`] if the course does not exist,
    /// [`CatalogError::Year`] or [`CatalogError::YearStop`] if the academic
    /// year is not valid, or [`CatalogError::DuplicatePaper`] if the sitting
    /// is already registered.
    #[instrument(level = "debug", skip(self))]
    pub fn add_paper(&mut self, paper: NewPaper) -> Result<Uuid, CatalogError> {
        let course = self
            .codes
            .get(&paper.course)
            .copied()
            .ok_or_else(|| CatalogError::UnknownCourse(paper.course.clone()))?;
        let year_stop = paper
            .year_stop
            .or_else(|| paper.year_start.checked_add(1))
            .filter(|stop| *stop >= paper.year_start)
            .ok_or(CatalogError::YearStop {
                year_start: paper.year_start,
                year_stop: paper.year_stop,
            })?;

        self.insert_paper(Paper {
            id: Uuid::new_v4(),
            course,
            name: paper.name,
            period: paper.period,
            sitting: paper.sitting,
            year_start: paper.year_start,
            year_stop,
            link: paper.link,
        })
    }

    pub(crate) fn insert_paper(&mut self, paper: Paper) -> Result<Uuid, CatalogError> {
        let Some(course) = self.courses.get(&paper.course) else {
            return Err(CatalogError::UnknownCourseId(paper.course));
        };
        if !YEARS.contains(&paper.year_start) {
            return Err(CatalogError::Year(paper.year_start));
        }

        let duplicate = self.papers.values().any(|existing| {
            existing.course == paper.course
                && existing.year_start == paper.year_start
                && existing.period == paper.period
                && existing.sitting == paper.sitting
        });
        if duplicate {
            return Err(CatalogError::DuplicatePaper {
                course: course.code.clone(),
                year: paper.year_start,
                period: paper.period,
                sitting: paper.sitting,
            });
        }

        let id = paper.id;
        self.papers.insert(id, paper);
        Ok(id)
    }

    /// Look up a course by identifier.
    #[must_use]
    pub fn course(&self, id: Uuid) -> Option<&Course> {
        self.courses.get(&id)
    }

    /// Look up a course by code.
    #[must_use]
    pub fn course_by_code(&self, code: &CourseCode) -> Option<&Course> {
        self.codes.get(code).and_then(|id| self.courses.get(id))
    }

    /// Look up a paper by identifier.
    #[must_use]
    pub fn paper(&self, id: Uuid) -> Option<&Paper> {
        self.papers.get(&id)
    }

    /// All courses, ordered by code.
    pub fn courses(&self) -> impl Iterator<Item = &Course> + '_ {
        self.codes.values().filter_map(|id| self.courses.get(id))
    }

    /// All papers of a course, ordered by year, period and sitting.
    #[must_use]
    pub fn papers_for(&self, course: Uuid) -> Vec<&Paper> {
        let mut papers: Vec<_> = self
            .papers
            .values()
            .filter(|paper| paper.course == course)
            .collect();
        papers.sort_by_key(|paper| (paper.year_start, paper.period, paper.sitting));
        papers
    }

    /// Every paper of `code` set in `year` during `period`, one per sitting.
    #[must_use]
    pub fn papers_matching(&self, code: &CourseCode, year: i32, period: Period) -> Vec<&Paper> {
        let Some(course) = self.course_by_code(code) else {
            return Vec::new();
        };
        self.papers_for(course.id)
            .into_iter()
            .filter(|paper| paper.year_start == year && paper.period == period)
            .collect()
    }

    /// Iterate over every paper.
    pub fn papers(&self) -> impl Iterator<Item = &Paper> + '_ {
        self.papers.values()
    }
}
