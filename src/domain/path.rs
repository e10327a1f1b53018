//! Materialized paths.
//!
//! A question's position in its paper is stored twice: as a sequence of
//! integer positions ([`QuestionPath`], used for addressing) and as the
//! parallel sequence of display labels (used for rendering). The two are
//! kept in lock-step by [`MaterializedPath`].

use std::{fmt, num::NonZeroUsize, str::FromStr};

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};

use crate::domain::index::{FormatError, IndexType};

/// Errors raised while parsing or assembling a path.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    /// The path contained no segments.
    #[error("path must contain at least one position")]
    Empty,

    /// A segment was not a positive integer.
    #[error("invalid path segment '{segment}' in '{path}': expected a positive integer")]
    Segment {
        /// The full input.
        path: String,
        /// The offending segment.
        segment: String,
    },

    /// The positions and labels have different lengths.
    #[error("path has {positions} positions but {labels} labels")]
    LengthMismatch {
        /// Number of integer positions.
        positions: usize,
        /// Number of display labels.
        labels: usize,
    },
}

/// Root-to-node sequence of 1-based sibling positions, e.g. `1.2.3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct QuestionPath(NonEmpty<NonZeroUsize>);

impl QuestionPath {
    /// The path of a root question.
    #[must_use]
    pub fn root(index: NonZeroUsize) -> Self {
        Self(NonEmpty::new(index))
    }

    /// The path of a child at `index` beneath this path.
    #[must_use]
    pub fn child(&self, index: NonZeroUsize) -> Self {
        let mut positions = self.0.clone();
        positions.push(index);
        Self(positions)
    }

    /// The path of the parent, or `None` for a root path.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let mut positions: Vec<NonZeroUsize> = self.0.clone().into();
        positions.pop();
        NonEmpty::from_vec(positions).map(Self)
    }

    /// The final position, i.e. the node's own index.
    #[must_use]
    pub fn last(&self) -> NonZeroUsize {
        *self.0.last()
    }

    /// Number of positions (the node's depth, counting roots as 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Paths are never empty; provided for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over the positions, root first.
    pub fn iter(&self) -> impl Iterator<Item = NonZeroUsize> + '_ {
        self.0.iter().copied()
    }

    /// The positions as plain integers.
    #[must_use]
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().map(NonZeroUsize::get).collect()
    }

    fn set_last(&mut self, index: NonZeroUsize) {
        *self.0.last_mut() = index;
    }
}

impl TryFrom<Vec<usize>> for QuestionPath {
    type Error = PathError;

    fn try_from(value: Vec<usize>) -> Result<Self, Self::Error> {
        let positions = value
            .iter()
            .map(|&n| {
                NonZeroUsize::new(n).ok_or_else(|| PathError::Segment {
                    path: format!("{value:?}"),
                    segment: n.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        NonEmpty::from_vec(positions)
            .map(Self)
            .ok_or(PathError::Empty)
    }
}

impl From<QuestionPath> for Vec<usize> {
    fn from(path: QuestionPath) -> Self {
        path.to_vec()
    }
}

impl FromStr for QuestionPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let positions = trimmed
            .split('.')
            .map(|segment| {
                segment
                    .parse::<usize>()
                    .ok()
                    .and_then(NonZeroUsize::new)
                    .ok_or_else(|| PathError::Segment {
                        path: s.to_string(),
                        segment: segment.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        NonEmpty::from_vec(positions)
            .map(Self)
            .ok_or(PathError::Empty)
    }
}

impl fmt::Display for QuestionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, position) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{position}")?;
        }
        Ok(())
    }
}

/// A [`QuestionPath`] paired with its display labels.
///
/// Both sequences always have the same length. The last element of each
/// reflects the node's own index; earlier elements are a snapshot of the
/// ancestors taken when the path was last generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterializedPath {
    path: QuestionPath,
    formatted: NonEmpty<String>,
}

impl MaterializedPath {
    /// Path of a root question.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` cannot be rendered under `index_type`.
    pub fn root(index_type: IndexType, index: NonZeroUsize) -> Result<Self, FormatError> {
        Ok(Self {
            path: QuestionPath::root(index),
            formatted: NonEmpty::new(index_type.format(index)?),
        })
    }

    /// Path of a child at `index` beneath `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` cannot be rendered under `index_type`.
    pub fn child(
        parent: &Self,
        index_type: IndexType,
        index: NonZeroUsize,
    ) -> Result<Self, FormatError> {
        let label = index_type.format(index)?;
        let mut formatted = parent.formatted.clone();
        formatted.push(label);
        Ok(Self {
            path: parent.path.child(index),
            formatted,
        })
    }

    /// Reassemble a path from stored parts.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::LengthMismatch`] unless there is exactly one label
    /// per position.
    pub fn from_parts(path: QuestionPath, formatted: Vec<String>) -> Result<Self, PathError> {
        if formatted.len() != path.len() {
            return Err(PathError::LengthMismatch {
                positions: path.len(),
                labels: formatted.len(),
            });
        }
        let formatted = NonEmpty::from_vec(formatted).ok_or(PathError::Empty)?;
        Ok(Self { path, formatted })
    }

    /// Replace the final segment in place, leaving the prefix untouched.
    ///
    /// The path is unchanged if formatting fails.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` cannot be rendered under `index_type`.
    pub fn set_last(
        &mut self,
        index_type: IndexType,
        index: NonZeroUsize,
    ) -> Result<(), FormatError> {
        let label = index_type.format(index)?;
        self.path.set_last(index);
        *self.formatted.last_mut() = label;
        Ok(())
    }

    /// The integer positions.
    #[must_use]
    pub const fn path(&self) -> &QuestionPath {
        &self.path
    }

    /// The display labels, parallel to [`MaterializedPath::path`].
    pub fn formatted(&self) -> impl Iterator<Item = &str> + '_ {
        self.formatted.iter().map(String::as_str)
    }

    /// The display labels as owned strings.
    #[must_use]
    pub fn formatted_vec(&self) -> Vec<String> {
        self.formatted.iter().cloned().collect()
    }

    /// The node's own display label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.formatted.last()
    }
}

impl fmt::Display for MaterializedPath {
    /// Renders the labels dot-separated, e.g. `2.b.iv`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.formatted.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn pos(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test_case("1", &[1])]
    #[test_case("1.2.3", &[1, 2, 3])]
    #[test_case(" 4.10 ", &[4, 10])]
    fn parses_dotted_path(input: &str, expected: &[usize]) {
        let path: QuestionPath = input.parse().unwrap();
        assert_eq!(path.to_vec(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("1..2"; "empty segment")]
    #[test_case("1.0"; "zero segment")]
    #[test_case("1.b"; "non numeric")]
    #[test_case("-1"; "negative")]
    fn rejects_bad_path(input: &str) {
        assert!(input.parse::<QuestionPath>().is_err());
    }

    #[test]
    fn display_matches_input() {
        let path: QuestionPath = "2.1.7".parse().unwrap();
        assert_eq!(path.to_string(), "2.1.7");
    }

    #[test]
    fn parent_of_root_is_none() {
        let root = QuestionPath::root(pos(3));
        assert_eq!(root.parent(), None);
        let child = root.child(pos(1));
        assert_eq!(child.parent(), Some(root));
    }

    #[test]
    fn child_extends_both_sequences() {
        let root = MaterializedPath::root(IndexType::Decimal, pos(2)).unwrap();
        let child = MaterializedPath::child(&root, IndexType::Alpha, pos(3)).unwrap();
        let grandchild = MaterializedPath::child(&child, IndexType::Roman, pos(4)).unwrap();

        assert_eq!(grandchild.path().to_vec(), vec![2, 3, 4]);
        assert_eq!(grandchild.formatted_vec(), vec!["2", "c", "IV"]);
        assert_eq!(grandchild.to_string(), "2.c.IV");
        assert_eq!(grandchild.label(), "IV");
    }

    #[test]
    fn set_last_only_touches_final_segment() {
        let root = MaterializedPath::root(IndexType::Decimal, pos(1)).unwrap();
        let mut child = MaterializedPath::child(&root, IndexType::Alpha, pos(2)).unwrap();

        child.set_last(IndexType::Roman, pos(5)).unwrap();

        assert_eq!(child.path().to_vec(), vec![1, 5]);
        assert_eq!(child.formatted_vec(), vec!["1", "V"]);
    }

    #[test]
    fn failed_set_last_leaves_path_intact() {
        let mut root = MaterializedPath::root(IndexType::Alpha, pos(1)).unwrap();
        assert!(root.set_last(IndexType::Alpha, pos(30)).is_err());
        assert_eq!(root.path().to_vec(), vec![1]);
        assert_eq!(root.label(), "a");
    }

    #[test]
    fn from_parts_rejects_length_mismatch() {
        let path: QuestionPath = "1.2".parse().unwrap();
        let err = MaterializedPath::from_parts(path, vec!["1".to_string()]).unwrap_err();
        assert_eq!(
            err,
            PathError::LengthMismatch {
                positions: 2,
                labels: 1
            }
        );
    }

    #[test]
    fn serializes_as_integer_sequence() {
        let path: QuestionPath = "1.2.3".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "[1,2,3]");
        let back: QuestionPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<QuestionPath>("[]").is_err());
        assert!(serde_json::from_str::<QuestionPath>("[1,0]").is_err());
    }
}
