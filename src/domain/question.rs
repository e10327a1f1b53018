use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    index::{FormatError, IndexType},
    path::{MaterializedPath, QuestionPath},
    revision::Revision,
};

/// Ways a stored question can contradict itself or its place in the tree.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Inconsistency {
    /// The final path segment is not the question's own index.
    #[error("index {index} does not match final path segment {segment}")]
    IndexMismatch {
        /// The stored index.
        index: NonZeroUsize,
        /// The final segment of the stored path.
        segment: NonZeroUsize,
    },

    /// The final label is not the index rendered under the index type.
    #[error("final label '{found}' should be '{expected}'")]
    LabelMismatch {
        /// The stored label.
        found: String,
        /// The label the index renders to.
        expected: String,
    },

    /// The index cannot be rendered under the stored index type.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The path is not exactly one segment deeper than the parent's.
    #[error("path has {found} segments, expected {expected}")]
    Depth {
        /// Segments in the stored path.
        found: usize,
        /// One more than the parent's segment count.
        expected: usize,
    },

    /// The current revision is missing from the history.
    #[error("current revision {0} is not in the revision history")]
    UnknownRevision(Uuid),
}

/// A node in a paper's question tree.
///
/// Questions are stored in a [`QuestionTree`](crate::domain::QuestionTree)
/// arena; `parent` and `children` are identifiers into that arena rather than
/// owned pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub(crate) id: Uuid,
    pub(crate) paper: Uuid,
    pub(crate) parent: Option<Uuid>,
    pub(crate) children: Vec<Uuid>,

    /// 1-based position among siblings.
    pub(crate) index: NonZeroUsize,
    /// Shared by every member of the sibling group.
    pub(crate) index_type: IndexType,
    pub(crate) path: MaterializedPath,

    /// Structural headers are not answerable.
    pub(crate) is_section: bool,
    pub(crate) marks: Option<u32>,
    pub(crate) created: DateTime<Utc>,

    /// Full revision history, oldest first.
    pub(crate) revisions: Vec<Revision>,
    /// Identifier of the current revision.
    pub(crate) revision: Option<Uuid>,
}

impl Question {
    /// Build a question whose path is derived from `parent`, or a root path if
    /// there is none.
    pub(crate) fn new(
        paper: Uuid,
        index: NonZeroUsize,
        index_type: IndexType,
        parent: Option<(Uuid, &MaterializedPath)>,
    ) -> Result<Self, FormatError> {
        let (parent, path) = match parent {
            Some((id, parent_path)) => (
                Some(id),
                MaterializedPath::child(parent_path, index_type, index)?,
            ),
            None => (None, MaterializedPath::root(index_type, index)?),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            paper,
            parent,
            children: Vec::new(),
            index,
            index_type,
            path,
            is_section: false,
            marks: None,
            created: Utc::now(),
            revisions: Vec::new(),
            revision: None,
        })
    }

    /// The stable identifier of this question.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The paper this question belongs to.
    #[must_use]
    pub const fn paper(&self) -> Uuid {
        self.paper
    }

    /// The parent question, if this is not a root.
    #[must_use]
    pub const fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    /// Child questions in their stored order.
    #[must_use]
    pub fn children(&self) -> &[Uuid] {
        &self.children
    }

    /// Position among siblings.
    #[must_use]
    pub const fn index(&self) -> NonZeroUsize {
        self.index
    }

    /// Numbering scheme of this question's sibling group.
    #[must_use]
    pub const fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Root-to-node positions.
    #[must_use]
    pub const fn path(&self) -> &QuestionPath {
        self.path.path()
    }

    /// Root-to-node positions together with their display labels.
    #[must_use]
    pub const fn materialized_path(&self) -> &MaterializedPath {
        &self.path
    }

    /// Root-to-node display labels.
    pub fn formatted_path(&self) -> impl Iterator<Item = &str> + '_ {
        self.path.formatted()
    }

    /// Whether this question is a non-answerable section header.
    #[must_use]
    pub const fn is_section(&self) -> bool {
        self.is_section
    }

    /// Point value, if known.
    #[must_use]
    pub const fn marks(&self) -> Option<u32> {
        self.marks
    }

    /// When the question was created.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Mark or unmark this question as a section header.
    pub const fn set_section(&mut self, is_section: bool) {
        self.is_section = is_section;
    }

    /// Set or clear the point value.
    pub const fn set_marks(&mut self, marks: Option<u32>) {
        self.marks = marks;
    }

    /// Attach a new revision and make it current.
    pub fn set_content(&mut self, author: String, content: String) -> &Revision {
        let revision = Revision::new(author, content);
        let position = self.revisions.len();
        self.revision = Some(revision.id);
        self.revisions.push(revision);
        &self.revisions[position]
    }

    /// The current revision.
    #[must_use]
    pub fn revision(&self) -> Option<&Revision> {
        self.revision.and_then(|id| self.revision_by_id(id))
    }

    /// The body of the current revision.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.revision().map(Revision::content)
    }

    /// Every revision, oldest first.
    #[must_use]
    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    /// Look up a historical revision.
    #[must_use]
    pub fn revision_by_id(&self, id: Uuid) -> Option<&Revision> {
        self.revisions.iter().find(|revision| revision.id == id)
    }

    /// Check that the node's own segment and current revision agree with the
    /// rest of the record. Ancestor segments are not checked.
    pub(crate) fn check_consistency(&self) -> Result<(), Inconsistency> {
        let segment = self.path.path().last();
        if segment != self.index {
            return Err(Inconsistency::IndexMismatch {
                index: self.index,
                segment,
            });
        }

        let expected = self.index_type.format(self.index)?;
        if self.path.label() != expected {
            return Err(Inconsistency::LabelMismatch {
                found: self.path.label().to_string(),
                expected,
            });
        }

        match self.revision {
            Some(id) if self.revision_by_id(id).is_none() => {
                Err(Inconsistency::UnknownRevision(id))
            }
            _ => Ok(()),
        }
    }

    /// Set the sibling position and regenerate the last path segment.
    ///
    /// Only this node's own segment changes. Descendants keep their existing
    /// path prefixes until they are regenerated explicitly.
    pub(crate) fn update_index(&mut self, index: NonZeroUsize) -> Result<(), FormatError> {
        self.path.set_last(self.index_type, index)?;
        self.index = index;
        Ok(())
    }

    /// Change the numbering scheme and re-render this node's own segment.
    pub(crate) fn update_index_type(&mut self, index_type: IndexType) -> Result<(), FormatError> {
        self.path.set_last(index_type, self.index)?;
        self.index_type = index_type;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn set_content_keeps_history() {
        let mut question = Question::new(Uuid::new_v4(), pos(1), IndexType::Decimal, None).unwrap();
        assert!(question.revision().is_none());

        let first = question
            .set_content("alice".to_string(), "Draft".to_string())
            .id();
        question.set_content("bob".to_string(), "Final".to_string());

        assert_eq!(question.content(), Some("Final"));
        assert_eq!(question.revisions().len(), 2);
        assert_eq!(
            question.revision_by_id(first).map(Revision::content),
            Some("Draft")
        );
    }

    #[test]
    fn update_index_type_rerenders_own_segment() {
        let root = MaterializedPath::root(IndexType::Decimal, pos(2)).unwrap();
        let mut question =
            Question::new(Uuid::new_v4(), pos(3), IndexType::Alpha, Some((Uuid::new_v4(), &root)))
                .unwrap();
        assert_eq!(question.formatted_path().collect::<Vec<_>>(), ["2", "c"]);

        question.update_index_type(IndexType::Roman).unwrap();

        assert_eq!(question.index_type(), IndexType::Roman);
        assert_eq!(question.formatted_path().collect::<Vec<_>>(), ["2", "III"]);
    }

    #[test]
    fn fresh_question_is_consistent() {
        let root = MaterializedPath::root(IndexType::Decimal, pos(2)).unwrap();
        let mut question =
            Question::new(Uuid::new_v4(), pos(4), IndexType::Roman, Some((Uuid::new_v4(), &root)))
                .unwrap();
        question.set_content("alice".to_string(), "Draft".to_string());
        assert_eq!(question.check_consistency(), Ok(()));
    }

    #[test]
    fn index_must_match_final_segment() {
        let mut question = Question::new(Uuid::new_v4(), pos(1), IndexType::Decimal, None).unwrap();
        question.index = pos(4);
        assert_eq!(
            question.check_consistency(),
            Err(Inconsistency::IndexMismatch {
                index: pos(4),
                segment: pos(1),
            })
        );
    }

    #[test]
    fn label_must_match_index_type() {
        let mut question = Question::new(Uuid::new_v4(), pos(3), IndexType::Decimal, None).unwrap();
        question.index_type = IndexType::Alpha;
        assert_eq!(
            question.check_consistency(),
            Err(Inconsistency::LabelMismatch {
                found: "3".to_string(),
                expected: "c".to_string(),
            })
        );
    }

    #[test]
    fn current_revision_must_exist() {
        let mut question = Question::new(Uuid::new_v4(), pos(1), IndexType::Decimal, None).unwrap();
        let missing = Uuid::new_v4();
        question.revision = Some(missing);
        assert_eq!(
            question.check_consistency(),
            Err(Inconsistency::UnknownRevision(missing))
        );
    }

    #[test]
    fn failed_retype_is_atomic() {
        let mut question =
            Question::new(Uuid::new_v4(), pos(27), IndexType::Decimal, None).unwrap();
        assert!(question.update_index_type(IndexType::Alpha).is_err());
        assert_eq!(question.index_type(), IndexType::Decimal);
        assert_eq!(question.materialized_path().label(), "27");
    }
}
