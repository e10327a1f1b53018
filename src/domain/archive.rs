//! The archive: catalog, question trees and comments together.

use std::num::NonZeroUsize;

use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    address::{PaperAddress, QuestionAddress},
    catalog::{Catalog, CourseCode, Paper, Period},
    comments::{Comment, CommentCounter, Comments},
    index::IndexType,
    path::QuestionPath,
    question::Question,
    tree::{QuestionTree, TreeError},
    view::QuestionView,
};

/// Raised when an address does not resolve to exactly one record.
///
/// Both absence (`matches == 0`) and ambiguity (`matches > 1`) are reported
/// through this one condition; callers never get an arbitrary pick.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{address} not found: expected exactly one match, found {matches}")]
pub struct NotFound {
    /// The address that was looked up.
    pub address: String,
    /// How many records matched.
    pub matches: usize,
}

impl NotFound {
    /// Whether the lookup failed because several records matched.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        self.matches > 1
    }
}

/// Errors raised when adding questions to the archive.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ArchiveError {
    /// The paper is not in the catalog.
    #[error("paper {0} not found")]
    UnknownPaper(Uuid),

    /// The tree rejected the mutation.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// An archive of exam papers and their questions.
#[derive(Debug, Default, Clone)]
pub struct Archive {
    catalog: Catalog,
    questions: QuestionTree,
    comments: Comments,
}

impl Archive {
    /// Assemble an archive from its parts.
    #[must_use]
    pub const fn from_parts(catalog: Catalog, questions: QuestionTree, comments: Comments) -> Self {
        Self {
            catalog,
            questions,
            comments,
        }
    }

    /// The courses and papers.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Mutable access to the courses and papers.
    pub const fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// The question trees of every paper.
    #[must_use]
    pub const fn questions(&self) -> &QuestionTree {
        &self.questions
    }

    /// Mutable access to the question trees.
    pub const fn questions_mut(&mut self) -> &mut QuestionTree {
        &mut self.questions
    }

    /// The comment store.
    #[must_use]
    pub const fn comments(&self) -> &Comments {
        &self.comments
    }

    /// Create a question on a catalogued paper.
    ///
    /// See [`QuestionTree::new_question`] for sibling index-type coercion.
    ///
    /// # Errors
    ///
    /// Fails if the paper is not catalogued, or if the tree rejects the
    /// question.
    pub fn new_question(
        &mut self,
        paper: Uuid,
        index: NonZeroUsize,
        index_type: Option<IndexType>,
        parent: Option<Uuid>,
    ) -> Result<Uuid, ArchiveError> {
        if self.catalog.paper(paper).is_none() {
            return Err(ArchiveError::UnknownPaper(paper));
        }
        Ok(self
            .questions
            .new_question(paper, index, index_type, parent)?)
    }

    /// Resolve the unique question at `path` on the paper of `course` set in
    /// `year` during `period`.
    ///
    /// The course code is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] unless exactly one question matches across every
    /// sitting of that paper.
    #[instrument(level = "debug", skip(self))]
    pub fn get_by_path(
        &self,
        course: &str,
        year: i32,
        period: Period,
        path: &QuestionPath,
    ) -> Result<&Question, NotFound> {
        let not_found = |matches| NotFound {
            address: format!("{}/{year}/{period}/{path}", course.to_uppercase()),
            matches,
        };
        let Ok(code) = CourseCode::new(course) else {
            return Err(not_found(0));
        };

        let matches: Vec<Uuid> = self
            .catalog
            .papers_matching(&code, year, period)
            .into_iter()
            .flat_map(|paper| self.questions.find_by_path(paper.id(), path))
            .copied()
            .collect();

        match matches.as_slice() {
            [id] => self.questions.get(*id).ok_or_else(|| not_found(0)),
            _ => Err(not_found(matches.len())),
        }
    }

    /// Resolve a question address.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] unless exactly one question matches.
    pub fn resolve(&self, address: &QuestionAddress) -> Result<&Question, NotFound> {
        self.get_by_path(
            address.paper.course.as_str(),
            address.paper.year,
            address.paper.period,
            &address.path,
        )
    }

    /// Resolve a paper address, optionally narrowed to one sitting.
    ///
    /// # Errors
    ///
    /// Returns [`NotFound`] unless exactly one paper matches.
    pub fn resolve_paper(
        &self,
        address: &PaperAddress,
        sitting: Option<u32>,
    ) -> Result<&Paper, NotFound> {
        let matches: Vec<&Paper> = self
            .catalog
            .papers_matching(&address.course, address.year, address.period)
            .into_iter()
            .filter(|paper| sitting.is_none_or(|sitting| paper.sitting() == sitting))
            .collect();

        match matches.as_slice() {
            [paper] => Ok(*paper),
            _ => Err(NotFound {
                address: address.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// Post a comment on a question.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::QuestionNotFound`] if the question is unknown.
    pub fn add_comment(
        &mut self,
        question: Uuid,
        author: String,
        content: String,
    ) -> Result<&Comment, TreeError> {
        if self.questions.get(question).is_none() {
            return Err(TreeError::QuestionNotFound(question));
        }
        Ok(self.comments.add(question, author, content))
    }

    pub(crate) fn restore_comment(&mut self, comment: Comment) {
        self.comments.insert(comment);
    }

    /// Remove a question with its subtree and every comment on the removed
    /// questions. Returns the removed questions in pre-order.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::QuestionNotFound`] if the question is unknown.
    pub fn remove_question(&mut self, id: Uuid) -> Result<Vec<Question>, TreeError> {
        let removed = self.questions.remove(id)?;
        for question in &removed {
            self.comments.remove_entity(question.id());
        }
        Ok(removed)
    }

    /// The serializable view of a question, with aggregates computed from
    /// this archive's comments.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::QuestionNotFound`] if the question is unknown.
    pub fn view(&self, id: Uuid) -> Result<QuestionView<'_>, TreeError> {
        self.view_with(id, &self.comments)
    }

    /// The serializable view of a question, counting comments through
    /// `comments`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::QuestionNotFound`] if the question is unknown.
    pub fn view_with(
        &self,
        id: Uuid,
        comments: &impl CommentCounter,
    ) -> Result<QuestionView<'_>, TreeError> {
        let question = self
            .questions
            .get(id)
            .ok_or(TreeError::QuestionNotFound(id))?;
        Ok(QuestionView::new(
            question,
            self.questions.similar(id).collect(),
            comments.comment_count(id),
        ))
    }
}
