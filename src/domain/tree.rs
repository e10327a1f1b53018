//! In-memory arena of question trees.
//!
//! The [`QuestionTree`] knows nothing about courses, comments or the
//! filesystem. It owns every [`Question`] of every paper, keyed by identifier,
//! and keeps three derived structures current under mutation:
//!
//! - the ordered sibling lists (`children` on each question, `roots` per paper)
//! - a materialized path index, `(paper, path) → questions`, for O(1) lookup
//! - the similar-question graph, a weighted directed graph keyed by question

use std::{collections::HashMap, num::NonZeroUsize};

use petgraph::graphmap::DiGraphMap;
use thiserror::Error;
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::domain::{
    index::{FormatError, IndexType},
    path::{MaterializedPath, PathError, QuestionPath},
    question::{Inconsistency, Question},
};

/// Errors raised by tree mutations.
#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    /// The question could not be found.
    #[error("question {0} not found")]
    QuestionNotFound(Uuid),

    /// The parent question could not be found.
    #[error("parent question {0} not found")]
    ParentNotFound(Uuid),

    /// A question and its parent must belong to the same paper.
    #[error("parent question {parent} does not belong to paper {paper}")]
    PaperMismatch {
        /// The intended parent.
        parent: Uuid,
        /// The paper the child belongs to.
        paper: Uuid,
    },

    /// Another member of the sibling group already has this index.
    #[error("index {index} is already taken by sibling {sibling}")]
    DuplicateIndex {
        /// The contested position.
        index: NonZeroUsize,
        /// The sibling holding it.
        sibling: Uuid,
    },

    /// Moving a question beneath itself or one of its descendants.
    #[error("moving {question} under {parent} would create a cycle")]
    Cycle {
        /// The question being moved.
        question: Uuid,
        /// The intended parent.
        parent: Uuid,
    },

    /// A question with this identifier is already present.
    #[error("question {0} already exists")]
    DuplicateId(Uuid),

    /// A question cannot be similar to itself.
    #[error("question {0} cannot be marked similar to itself")]
    SelfSimilar(Uuid),

    /// Similarity scores must be finite numbers.
    #[error("similarity score {0} is not a finite number")]
    InvalidSimilarity(f64),

    /// The index could not be rendered under the sibling group's scheme.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A stored path was inconsistent.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A restored question contradicts itself or its parent.
    #[error("question {question} is inconsistent: {source}")]
    Inconsistent {
        /// The question being restored.
        question: Uuid,
        /// What does not agree.
        source: Inconsistency,
    },
}

/// An arena of question trees, one forest per paper.
#[derive(Debug, Default, Clone)]
pub struct QuestionTree {
    /// Every question, keyed by identifier.
    questions: HashMap<Uuid, Question>,

    /// Root questions of each paper, in stored order.
    roots: HashMap<Uuid, Vec<Uuid>>,

    /// Materialized path index. Stale descendant paths can collide with
    /// fresh ones, so each key maps to every question currently holding it.
    by_path: HashMap<(Uuid, QuestionPath), Vec<Uuid>>,

    /// Similar-question links. Edges point from a question to the question
    /// it resembles, weighted by similarity score.
    similar: DiGraphMap<Uuid, f64>,
}

impl QuestionTree {
    /// Creates a new tree with pre-allocated capacity for the given number of
    /// questions.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            questions: HashMap::with_capacity(capacity),
            roots: HashMap::new(),
            by_path: HashMap::with_capacity(capacity),
            similar: DiGraphMap::new(),
        }
    }

    /// Create a question at `index` in `paper`, beneath `parent` if given.
    ///
    /// If the sibling group already has members, the requested index type is
    /// discarded in favour of the group's existing type. Otherwise the
    /// requested type is used, falling back to [`IndexType::Decimal`].
    ///
    /// # Errors
    ///
    /// Fails if the parent is unknown or belongs to another paper, if a
    /// sibling already holds `index`, or if `index` cannot be rendered under
    /// the effective index type.
    #[instrument(level = "debug", skip(self))]
    pub fn new_question(
        &mut self,
        paper: Uuid,
        index: NonZeroUsize,
        index_type: Option<IndexType>,
        parent: Option<Uuid>,
    ) -> Result<Uuid, TreeError> {
        let parent_path = match parent {
            Some(parent_id) => {
                let parent = self
                    .questions
                    .get(&parent_id)
                    .ok_or(TreeError::ParentNotFound(parent_id))?;
                if parent.paper != paper {
                    return Err(TreeError::PaperMismatch {
                        parent: parent_id,
                        paper,
                    });
                }
                Some((parent_id, &parent.path))
            }
            None => None,
        };

        let siblings = self.sibling_ids(paper, parent);
        self.check_index_free(siblings, index, None)?;

        let effective_type = match self.group_index_type(siblings, None) {
            Some(group_type) => {
                if let Some(requested) = index_type.filter(|&t| t != group_type) {
                    debug!(
                        "discarding requested index type {requested}; sibling group uses {group_type}"
                    );
                }
                group_type
            }
            None => index_type.unwrap_or_default(),
        };

        let question = Question::new(paper, index, effective_type, parent_path)?;
        let id = question.id;
        trace!("created question {id} at {}", question.path.path());

        self.attach(&question);
        self.questions.insert(id, question);
        Ok(id)
    }

    /// Insert a previously stored question verbatim.
    ///
    /// Ancestor segments of the stored path are trusted as-is, so stale
    /// prefixes survive. The question's own segment must agree with its index
    /// and index type, and the path must be one segment deeper than its
    /// parent's. Parents must be restored before their children; `children`
    /// is rebuilt from restore order.
    ///
    /// # Errors
    ///
    /// Fails if the identifier is already present, if the parent is missing
    /// or belongs to another paper, if a sibling already holds the index, or
    /// if the question is [inconsistent](TreeError::Inconsistent).
    pub fn restore(&mut self, mut question: Question) -> Result<(), TreeError> {
        if self.questions.contains_key(&question.id) {
            return Err(TreeError::DuplicateId(question.id));
        }
        let id = question.id;
        let inconsistent = move |source| TreeError::Inconsistent {
            question: id,
            source,
        };
        question.check_consistency().map_err(inconsistent)?;

        let expected_depth = match question.parent {
            Some(parent_id) => {
                let parent = self
                    .questions
                    .get(&parent_id)
                    .ok_or(TreeError::ParentNotFound(parent_id))?;
                if parent.paper != question.paper {
                    return Err(TreeError::PaperMismatch {
                        parent: parent_id,
                        paper: question.paper,
                    });
                }
                parent.path().len() + 1
            }
            None => 1,
        };
        if question.path().len() != expected_depth {
            return Err(inconsistent(Inconsistency::Depth {
                found: question.path().len(),
                expected: expected_depth,
            }));
        }

        self.check_index_free(
            self.sibling_ids(question.paper, question.parent),
            question.index,
            None,
        )?;

        question.children.clear();
        self.attach(&question);
        self.questions.insert(question.id, question);
        Ok(())
    }

    /// Retrieve a question by identifier.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Question> {
        self.questions.get(&id)
    }

    /// Retrieve a question for editing its content, marks or section flag.
    ///
    /// Structural fields (index, index type, parent) can only be changed
    /// through the tree so that the derived indexes stay consistent.
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Question> {
        self.questions.get_mut(&id)
    }

    /// Number of questions across all papers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the tree holds no questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Iterate over every question in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Question> + '_ {
        self.questions.values()
    }

    /// Root questions of a paper, in stored order.
    pub fn roots(&self, paper: Uuid) -> impl Iterator<Item = &Question> + '_ {
        self.roots
            .get(&paper)
            .into_iter()
            .flatten()
            .filter_map(|id| self.questions.get(id))
    }

    /// Direct children of a question, in stored order.
    pub fn children(&self, id: Uuid) -> impl Iterator<Item = &Question> + '_ {
        self.questions
            .get(&id)
            .into_iter()
            .flat_map(|question| question.children.iter())
            .filter_map(|child| self.questions.get(child))
    }

    /// Every question whose stored path in `paper` equals `path`.
    #[must_use]
    pub fn find_by_path(&self, paper: Uuid, path: &QuestionPath) -> &[Uuid] {
        self.by_path
            .get(&(paper, path.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Flatten the subtree rooted at `id` in pre-order: each question before
    /// its children, children in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::QuestionNotFound`] if `id` is unknown.
    pub fn flatten(&self, id: Uuid, include_self: bool) -> Result<Vec<&Question>, TreeError> {
        let root = self
            .questions
            .get(&id)
            .ok_or(TreeError::QuestionNotFound(id))?;

        let start = if include_self {
            vec![root]
        } else {
            self.children(id).collect()
        };
        Ok(self.preorder(start))
    }

    /// Flatten every tree of a paper in pre-order, roots in stored order.
    #[must_use]
    pub fn flatten_paper(&self, paper: Uuid) -> Vec<&Question> {
        self.preorder(self.roots(paper).collect())
    }

    /// Change a question's index, regenerating only its own path segment.
    ///
    /// Descendants keep their previous path prefixes; call
    /// [`QuestionTree::refresh_paths`] to regenerate them.
    ///
    /// # Errors
    ///
    /// Fails if the question is unknown, a sibling already holds `index`, or
    /// `index` cannot be rendered under the question's index type.
    #[instrument(level = "debug", skip(self))]
    pub fn update_index(&mut self, id: Uuid, index: NonZeroUsize) -> Result<(), TreeError> {
        let question = self.get(id).ok_or(TreeError::QuestionNotFound(id))?;
        if question.index == index {
            return Ok(());
        }
        let paper = question.paper;
        self.check_index_free(self.sibling_ids(paper, question.parent), index, Some(id))?;

        let question = self
            .questions
            .get_mut(&id)
            .ok_or(TreeError::QuestionNotFound(id))?;
        let old_path = question.path().clone();
        question.update_index(index)?;
        let new_path = question.path().clone();

        self.reindex(paper, &old_path, new_path, id);
        Ok(())
    }

    /// Change a question's index type, re-rendering only its own segment.
    ///
    /// Siblings and descendants are left untouched. Use
    /// [`QuestionTree::retype_sibling_group`] to keep the group homogeneous.
    ///
    /// # Errors
    ///
    /// Fails if the question is unknown or its index cannot be rendered under
    /// the new type.
    #[instrument(level = "debug", skip(self))]
    pub fn update_index_type(&mut self, id: Uuid, index_type: IndexType) -> Result<(), TreeError> {
        let question = self
            .questions
            .get_mut(&id)
            .ok_or(TreeError::QuestionNotFound(id))?;
        // Positions are unchanged, so the path index needs no update.
        question.update_index_type(index_type)?;
        Ok(())
    }

    /// Apply [`QuestionTree::update_index_type`] to every member of the
    /// question's sibling group.
    ///
    /// Either every sibling is retyped or none is. Returns the number of
    /// questions retyped.
    ///
    /// # Errors
    ///
    /// Fails if the question is unknown or any sibling's index cannot be
    /// rendered under the new type.
    #[instrument(level = "debug", skip(self))]
    pub fn retype_sibling_group(
        &mut self,
        id: Uuid,
        index_type: IndexType,
    ) -> Result<usize, TreeError> {
        let question = self.get(id).ok_or(TreeError::QuestionNotFound(id))?;
        let siblings = self.sibling_ids(question.paper, question.parent).to_vec();

        for sibling in &siblings {
            if let Some(question) = self.questions.get(sibling) {
                index_type.format(question.index)?;
            }
        }
        for sibling in &siblings {
            self.update_index_type(*sibling, index_type)?;
        }
        Ok(siblings.len())
    }

    /// Regenerate the paths of a question and all of its descendants from
    /// the current parent chain.
    ///
    /// Returns the number of questions whose path changed.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::QuestionNotFound`] if `id` is unknown.
    #[instrument(level = "debug", skip(self))]
    pub fn refresh_paths(&mut self, id: Uuid) -> Result<usize, TreeError> {
        let mut stack = vec![id];
        let mut changed = 0;

        while let Some(current) = stack.pop() {
            let question = self
                .questions
                .get(&current)
                .ok_or(TreeError::QuestionNotFound(current))?;
            let fresh = match question.parent {
                Some(parent_id) => {
                    let parent = self
                        .questions
                        .get(&parent_id)
                        .ok_or(TreeError::ParentNotFound(parent_id))?;
                    MaterializedPath::child(&parent.path, question.index_type, question.index)?
                }
                None => MaterializedPath::root(question.index_type, question.index)?,
            };
            let paper = question.paper;
            stack.extend(question.children.iter().rev().copied());

            if question.path != fresh {
                let old_path = question.path().clone();
                let new_path = fresh.path().clone();
                if let Some(question) = self.questions.get_mut(&current) {
                    question.path = fresh;
                }
                if old_path != new_path {
                    self.reindex(paper, &old_path, new_path, current);
                }
                changed += 1;
            }
        }

        debug!("regenerated {changed} paths beneath {id}");
        Ok(changed)
    }

    /// Move a question (and its subtree) to position `index` beneath
    /// `new_parent`, or to the paper's top level if `None`.
    ///
    /// The moved question adopts the target sibling group's index type, and
    /// every path in the moved subtree is regenerated.
    ///
    /// # Errors
    ///
    /// Fails if either question is unknown, the parent is in another paper,
    /// the parent is the question itself or one of its descendants, a sibling
    /// already holds `index`, or `index` cannot be rendered.
    #[instrument(level = "debug", skip(self))]
    pub fn reparent(
        &mut self,
        id: Uuid,
        new_parent: Option<Uuid>,
        index: NonZeroUsize,
    ) -> Result<(), TreeError> {
        let question = self.get(id).ok_or(TreeError::QuestionNotFound(id))?;
        let paper = question.paper;
        let old_parent = question.parent;
        let own_type = question.index_type;

        if let Some(parent_id) = new_parent {
            let parent = self
                .get(parent_id)
                .ok_or(TreeError::ParentNotFound(parent_id))?;
            if parent.paper != paper {
                return Err(TreeError::PaperMismatch {
                    parent: parent_id,
                    paper,
                });
            }
            if self.is_ancestor_or_self(id, parent_id) {
                return Err(TreeError::Cycle {
                    question: id,
                    parent: parent_id,
                });
            }
        }

        let siblings = self.sibling_ids(paper, new_parent);
        self.check_index_free(siblings, index, Some(id))?;
        let index_type = self.group_index_type(siblings, Some(id)).unwrap_or(own_type);
        index_type.format(index)?;

        self.detach(paper, old_parent, id);
        if let Some(question) = self.questions.get_mut(&id) {
            question.parent = new_parent;
            question.index = index;
            question.index_type = index_type;
        }
        self.sibling_ids_mut(paper, new_parent).push(id);

        self.refresh_paths(id)?;
        Ok(())
    }

    /// Remove a question and its whole subtree, returning the removed
    /// questions in pre-order.
    ///
    /// Similar-question links to or from any removed question are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::QuestionNotFound`] if `id` is unknown.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: Uuid) -> Result<Vec<Question>, TreeError> {
        let ids: Vec<Uuid> = self.flatten(id, true)?.iter().map(|q| q.id).collect();
        let question = self.get(id).ok_or(TreeError::QuestionNotFound(id))?;
        let (paper, parent) = (question.paper, question.parent);

        self.detach(paper, parent, id);

        let mut removed = Vec::with_capacity(ids.len());
        for current in ids {
            if let Some(question) = self.questions.remove(&current) {
                self.unindex(paper, question.path(), current);
                self.similar.remove_node(current);
                removed.push(question);
            }
        }
        if self.roots.get(&paper).is_some_and(Vec::is_empty) {
            self.roots.remove(&paper);
        }
        Ok(removed)
    }

    /// Record that `from` resembles `to` with the given score.
    ///
    /// Returns the previous score if the link already existed.
    ///
    /// # Errors
    ///
    /// Fails if either question is unknown, if `from == to`, or if the score
    /// is not finite.
    pub fn add_similar(
        &mut self,
        from: Uuid,
        to: Uuid,
        score: f64,
    ) -> Result<Option<f64>, TreeError> {
        if !self.questions.contains_key(&from) {
            return Err(TreeError::QuestionNotFound(from));
        }
        if !self.questions.contains_key(&to) {
            return Err(TreeError::QuestionNotFound(to));
        }
        if from == to {
            return Err(TreeError::SelfSimilar(from));
        }
        if !score.is_finite() {
            return Err(TreeError::InvalidSimilarity(score));
        }
        Ok(self.similar.add_edge(from, to, score))
    }

    /// Drop the similarity link from `from` to `to`, returning its score.
    pub fn remove_similar(&mut self, from: Uuid, to: Uuid) -> Option<f64> {
        self.similar.remove_edge(from, to)
    }

    /// Questions that `id` resembles, with their scores.
    pub fn similar(&self, id: Uuid) -> impl Iterator<Item = (Uuid, f64)> + '_ {
        if self.similar.contains_node(id) {
            Some(self.similar.edges(id))
        } else {
            None
        }
        .into_iter()
        .flatten()
        .map(|(_, to, score)| (to, *score))
    }

    /// Number of questions that `id` resembles.
    #[must_use]
    pub fn similar_count(&self, id: Uuid) -> usize {
        self.similar(id).count()
    }
}

impl QuestionTree {
    fn preorder<'a>(&'a self, start: Vec<&'a Question>) -> Vec<&'a Question> {
        let mut flattened = Vec::new();
        let mut stack: Vec<&Question> = start.into_iter().rev().collect();

        while let Some(question) = stack.pop() {
            flattened.push(question);
            stack.extend(
                question
                    .children
                    .iter()
                    .rev()
                    .filter_map(|child| self.questions.get(child)),
            );
        }

        flattened
    }

    fn sibling_ids(&self, paper: Uuid, parent: Option<Uuid>) -> &[Uuid] {
        let siblings = match parent {
            Some(parent) => self.questions.get(&parent).map(|q| &q.children),
            None => self.roots.get(&paper),
        };
        siblings.map(Vec::as_slice).unwrap_or_default()
    }

    /// Sibling list for `parent` (or the paper's roots).
    ///
    /// The parent must exist.
    fn sibling_ids_mut(&mut self, paper: Uuid, parent: Option<Uuid>) -> &mut Vec<Uuid> {
        match parent.and_then(|parent| self.questions.get_mut(&parent)) {
            Some(parent) => &mut parent.children,
            None => self.roots.entry(paper).or_default(),
        }
    }

    /// The index type of the first sibling other than `exclude`.
    fn group_index_type(&self, siblings: &[Uuid], exclude: Option<Uuid>) -> Option<IndexType> {
        siblings
            .iter()
            .filter(|&&sibling| Some(sibling) != exclude)
            .find_map(|sibling| self.questions.get(sibling))
            .map(|sibling| sibling.index_type)
    }

    fn check_index_free(
        &self,
        siblings: &[Uuid],
        index: NonZeroUsize,
        exclude: Option<Uuid>,
    ) -> Result<(), TreeError> {
        let taken = siblings
            .iter()
            .filter(|&&sibling| Some(sibling) != exclude)
            .filter_map(|sibling| self.questions.get(sibling))
            .find(|sibling| sibling.index == index);

        match taken {
            Some(sibling) => Err(TreeError::DuplicateIndex {
                index,
                sibling: sibling.id,
            }),
            None => Ok(()),
        }
    }

    /// Whether `ancestor` is `node` or lies on `node`'s parent chain.
    fn is_ancestor_or_self(&self, ancestor: Uuid, node: Uuid) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.questions.get(&id).and_then(|q| q.parent);
        }
        false
    }

    fn attach(&mut self, question: &Question) {
        let key = (question.paper, question.path().clone());
        self.by_path.entry(key).or_default().push(question.id);
        self.sibling_ids_mut(question.paper, question.parent)
            .push(question.id);
    }

    fn detach(&mut self, paper: Uuid, parent: Option<Uuid>, id: Uuid) {
        self.sibling_ids_mut(paper, parent)
            .retain(|&sibling| sibling != id);
    }

    fn unindex(&mut self, paper: Uuid, path: &QuestionPath, id: Uuid) {
        let key = (paper, path.clone());
        if let Some(ids) = self.by_path.get_mut(&key) {
            ids.retain(|&existing| existing != id);
            if ids.is_empty() {
                self.by_path.remove(&key);
            }
        }
    }

    fn reindex(&mut self, paper: Uuid, old: &QuestionPath, new: QuestionPath, id: Uuid) {
        self.unindex(paper, old, id);
        self.by_path.entry((paper, new)).or_default().push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn path(s: &str) -> QuestionPath {
        s.parse().unwrap()
    }

    fn labels(tree: &QuestionTree, id: Uuid) -> Vec<String> {
        tree.get(id).unwrap().materialized_path().formatted_vec()
    }

    /// R(1) → [A(1) → [A1(1)], B(2)]
    fn sample() -> (QuestionTree, Uuid, [Uuid; 4]) {
        let mut tree = QuestionTree::default();
        let paper = Uuid::new_v4();
        let r = tree.new_question(paper, pos(1), None, None).unwrap();
        let a = tree
            .new_question(paper, pos(1), Some(IndexType::Alpha), Some(r))
            .unwrap();
        let a1 = tree
            .new_question(paper, pos(1), Some(IndexType::Roman), Some(a))
            .unwrap();
        let b = tree.new_question(paper, pos(2), None, Some(r)).unwrap();
        (tree, paper, [r, a, a1, b])
    }

    #[test]
    fn child_path_extends_parent_path() {
        let (tree, _, [r, a, a1, _]) = sample();
        assert_eq!(tree.get(r).unwrap().path().to_vec(), vec![1]);
        assert_eq!(tree.get(a).unwrap().path().to_vec(), vec![1, 1]);
        assert_eq!(tree.get(a1).unwrap().path().to_vec(), vec![1, 1, 1]);
        assert_eq!(labels(&tree, a1), vec!["1", "a", "I"]);
    }

    #[test]
    fn non_first_sibling_adopts_group_index_type() {
        let mut tree = QuestionTree::default();
        let paper = Uuid::new_v4();
        let p = tree.new_question(paper, pos(1), None, None).unwrap();
        let first = tree
            .new_question(paper, pos(1), Some(IndexType::Roman), Some(p))
            .unwrap();
        let second = tree
            .new_question(paper, pos(2), Some(IndexType::Alpha), Some(p))
            .unwrap();

        assert_eq!(tree.get(first).unwrap().index_type(), IndexType::Roman);
        assert_eq!(tree.get(second).unwrap().index_type(), IndexType::Roman);
        assert_eq!(labels(&tree, second), vec!["1", "II"]);
    }

    #[test]
    fn roots_form_a_sibling_group() {
        let mut tree = QuestionTree::default();
        let paper = Uuid::new_v4();
        tree.new_question(paper, pos(1), Some(IndexType::Roman), None)
            .unwrap();
        let second = tree
            .new_question(paper, pos(2), Some(IndexType::Decimal), None)
            .unwrap();
        assert_eq!(tree.get(second).unwrap().index_type(), IndexType::Roman);

        // Another paper has its own root group.
        let other = tree
            .new_question(Uuid::new_v4(), pos(1), Some(IndexType::Alpha), None)
            .unwrap();
        assert_eq!(tree.get(other).unwrap().index_type(), IndexType::Alpha);
    }

    #[test]
    fn rejects_duplicate_sibling_index() {
        let (mut tree, paper, [r, a, _, _]) = sample();
        let err = tree.new_question(paper, pos(1), None, Some(r)).unwrap_err();
        assert_eq!(
            err,
            TreeError::DuplicateIndex {
                index: pos(1),
                sibling: a
            }
        );
    }

    #[test]
    fn rejects_parent_from_another_paper() {
        let (mut tree, _, [r, ..]) = sample();
        let err = tree
            .new_question(Uuid::new_v4(), pos(5), None, Some(r))
            .unwrap_err();
        assert!(matches!(err, TreeError::PaperMismatch { parent, .. } if parent == r));
    }

    #[test]
    fn rejects_alpha_beyond_z() {
        let mut tree = QuestionTree::default();
        let paper = Uuid::new_v4();
        let err = tree
            .new_question(paper, pos(27), Some(IndexType::Alpha), None)
            .unwrap_err();
        assert_eq!(err, TreeError::Format(FormatError::AlphaOutOfRange(27)));
        assert!(tree.is_empty());
    }

    #[test]
    fn flatten_is_preorder() {
        let (tree, paper, [r, a, a1, b]) = sample();
        let ids: Vec<Uuid> = tree.flatten(r, true).unwrap().iter().map(|q| q.id()).collect();
        assert_eq!(ids, vec![r, a, a1, b]);

        let without_self: Vec<Uuid> = tree
            .flatten(r, false)
            .unwrap()
            .iter()
            .map(|q| q.id())
            .collect();
        assert_eq!(without_self, vec![a, a1, b]);

        let whole: Vec<Uuid> = tree.flatten_paper(paper).iter().map(|q| q.id()).collect();
        assert_eq!(whole, vec![r, a, a1, b]);
    }

    #[test]
    fn flatten_unknown_question_fails() {
        let tree = QuestionTree::default();
        let id = Uuid::new_v4();
        assert_eq!(tree.flatten(id, true), Err(TreeError::QuestionNotFound(id)));
    }

    #[test]
    fn update_index_does_not_cascade() {
        let mut tree = QuestionTree::default();
        let paper = Uuid::new_v4();
        let q1 = tree.new_question(paper, pos(1), None, None).unwrap();
        let q2 = tree.new_question(paper, pos(2), None, Some(q1)).unwrap();
        let q3 = tree.new_question(paper, pos(3), None, Some(q2)).unwrap();
        let q4 = tree.new_question(paper, pos(1), None, Some(q3)).unwrap();

        tree.update_index(q3, pos(5)).unwrap();

        assert_eq!(tree.get(q3).unwrap().path().to_vec(), vec![1, 2, 5]);
        assert_eq!(tree.get(q2).unwrap().path().to_vec(), vec![1, 2]);
        // The child keeps its snapshot of the old prefix.
        assert_eq!(tree.get(q4).unwrap().path().to_vec(), vec![1, 2, 3, 1]);

        assert_eq!(tree.find_by_path(paper, &path("1.2.5")), &[q3]);
        assert!(tree.find_by_path(paper, &path("1.2.3")).is_empty());
        assert_eq!(tree.find_by_path(paper, &path("1.2.3.1")), &[q4]);
    }

    #[test]
    fn update_index_rejects_taken_index() {
        let (mut tree, _, [_, a, _, b]) = sample();
        let err = tree.update_index(b, pos(1)).unwrap_err();
        assert_eq!(
            err,
            TreeError::DuplicateIndex {
                index: pos(1),
                sibling: a
            }
        );
        assert_eq!(tree.get(b).unwrap().index(), pos(2));
    }

    #[test]
    fn refresh_paths_cascades_to_descendants() {
        let (mut tree, paper, [r, a, a1, b]) = sample();
        tree.update_index(r, pos(4)).unwrap();
        assert_eq!(tree.get(a1).unwrap().path().to_vec(), vec![1, 1, 1]);

        let changed = tree.refresh_paths(r).unwrap();

        assert_eq!(changed, 3);
        assert_eq!(tree.get(a1).unwrap().path().to_vec(), vec![4, 1, 1]);
        assert_eq!(labels(&tree, b), vec!["4", "b"]);
        assert_eq!(tree.find_by_path(paper, &path("4.1")), &[a]);
        assert!(tree.find_by_path(paper, &path("1.1")).is_empty());
        assert_eq!(tree.refresh_paths(r).unwrap(), 0);
    }

    #[test]
    fn update_index_type_touches_only_own_segment() {
        let (mut tree, _, [_, a, a1, b]) = sample();
        tree.update_index_type(a, IndexType::Roman).unwrap();

        assert_eq!(labels(&tree, a), vec!["1", "I"]);
        // Sibling and child are unchanged.
        assert_eq!(tree.get(b).unwrap().index_type(), IndexType::Alpha);
        assert_eq!(labels(&tree, a1), vec!["1", "a", "I"]);
    }

    #[test]
    fn retype_sibling_group_is_all_or_nothing() {
        let mut tree = QuestionTree::default();
        let paper = Uuid::new_v4();
        let first = tree.new_question(paper, pos(1), None, None).unwrap();
        let far = tree.new_question(paper, pos(30), None, None).unwrap();

        assert!(tree.retype_sibling_group(first, IndexType::Alpha).is_err());
        assert_eq!(tree.get(first).unwrap().index_type(), IndexType::Decimal);

        assert_eq!(tree.retype_sibling_group(first, IndexType::Roman).unwrap(), 2);
        assert_eq!(labels(&tree, far), vec!["XXX"]);
    }

    #[test]
    fn reparent_moves_subtree_and_adopts_group_type() {
        let (mut tree, paper, [r, a, a1, b]) = sample();

        // Move A1 (roman, under A) to position 3 under R, whose children are alpha.
        tree.reparent(a1, Some(r), pos(3)).unwrap();

        let moved = tree.get(a1).unwrap();
        assert_eq!(moved.parent(), Some(r));
        assert_eq!(moved.index_type(), IndexType::Alpha);
        assert_eq!(labels(&tree, a1), vec!["1", "c"]);
        assert!(tree.get(a).unwrap().children().is_empty());
        assert_eq!(tree.get(r).unwrap().children(), &[a, b, a1]);
        assert_eq!(tree.find_by_path(paper, &path("1.3")), &[a1]);
        assert!(tree.find_by_path(paper, &path("1.1.1")).is_empty());
    }

    #[test]
    fn reparent_to_top_level() {
        let (mut tree, paper, [r, a, a1, _]) = sample();
        tree.reparent(a, None, pos(2)).unwrap();

        assert_eq!(tree.get(a).unwrap().parent(), None);
        assert_eq!(tree.get(a1).unwrap().path().to_vec(), vec![2, 1]);
        let roots: Vec<Uuid> = tree.roots(paper).map(Question::id).collect();
        assert_eq!(roots, vec![r, a]);
    }

    #[test]
    fn reparent_under_descendant_is_rejected() {
        let (mut tree, _, [r, _, a1, _]) = sample();
        let err = tree.reparent(r, Some(a1), pos(1)).unwrap_err();
        assert_eq!(
            err,
            TreeError::Cycle {
                question: r,
                parent: a1
            }
        );
        let err = tree.reparent(r, Some(r), pos(1)).unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
    }

    #[test]
    fn remove_drops_subtree_and_links() {
        let (mut tree, paper, [r, a, a1, b]) = sample();
        tree.add_similar(b, a1, 0.8).unwrap();

        let removed: Vec<Uuid> = tree.remove(a).unwrap().iter().map(Question::id).collect();

        assert_eq!(removed, vec![a, a1]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(r).unwrap().children(), &[b]);
        assert_eq!(tree.similar_count(b), 0);
        assert!(tree.find_by_path(paper, &path("1.1")).is_empty());
    }

    #[test]
    fn similar_links_are_scored_and_counted() {
        let (mut tree, _, [r, a, _, b]) = sample();
        assert_eq!(tree.add_similar(a, b, 0.5).unwrap(), None);
        assert_eq!(tree.add_similar(a, r, 0.25).unwrap(), None);
        assert_eq!(tree.add_similar(a, b, 0.75).unwrap(), Some(0.5));

        let mut similar: Vec<(Uuid, f64)> = tree.similar(a).collect();
        similar.sort_by(|x, y| x.1.total_cmp(&y.1));
        assert_eq!(similar, vec![(r, 0.25), (b, 0.75)]);
        assert_eq!(tree.similar_count(a), 2);
        assert_eq!(tree.similar_count(b), 0);

        assert_eq!(tree.add_similar(a, a, 1.0), Err(TreeError::SelfSimilar(a)));
        assert!(matches!(
            tree.add_similar(a, b, f64::NAN),
            Err(TreeError::InvalidSimilarity(_))
        ));
    }

    #[test]
    fn remove_similar_drops_only_that_link() {
        let (mut tree, _, [r, a, _, b]) = sample();
        tree.add_similar(a, b, 0.5).unwrap();
        tree.add_similar(a, r, 0.25).unwrap();

        assert_eq!(tree.remove_similar(a, b), Some(0.5));
        assert_eq!(tree.remove_similar(a, b), None);
        assert_eq!(tree.similar(a).collect::<Vec<_>>(), vec![(r, 0.25)]);
    }

    #[test]
    fn restore_keeps_stale_paths() {
        let (tree, paper, _) = sample();
        let mut restored = QuestionTree::default();
        for question in tree.flatten_paper(paper) {
            restored.restore(question.clone()).unwrap();
        }
        let original: Vec<_> = tree.flatten_paper(paper).into_iter().cloned().collect();
        let copy: Vec<_> = restored.flatten_paper(paper).into_iter().cloned().collect();
        assert_eq!(original, copy);
    }

    #[test]
    fn restore_rejects_index_contradicting_path() {
        let (tree, paper, [r, ..]) = sample();
        let mut question = tree.get(r).unwrap().clone();
        question.index = pos(4);

        let mut restored = QuestionTree::default();
        let err = restored.restore(question).unwrap_err();
        assert!(matches!(
            err,
            TreeError::Inconsistent {
                source: Inconsistency::IndexMismatch { .. },
                ..
            }
        ));
        assert!(restored.roots(paper).next().is_none());
    }

    #[test]
    fn restore_rejects_path_not_one_deeper_than_parent() {
        let (tree, _, [r, a, ..]) = sample();
        let mut restored = QuestionTree::default();
        restored.restore(tree.get(r).unwrap().clone()).unwrap();

        let mut question = tree.get(a).unwrap().clone();
        question.path = MaterializedPath::root(IndexType::Alpha, pos(1)).unwrap();
        let err = restored.restore(question).unwrap_err();
        assert_eq!(
            err,
            TreeError::Inconsistent {
                question: a,
                source: Inconsistency::Depth {
                    found: 1,
                    expected: 2,
                },
            }
        );
    }

    #[test]
    fn restore_rejects_duplicate_sibling_index() {
        let (tree, paper, [r, ..]) = sample();
        let mut restored = QuestionTree::default();
        restored.restore(tree.get(r).unwrap().clone()).unwrap();

        let mut twin = tree.get(r).unwrap().clone();
        twin.id = Uuid::new_v4();
        let err = restored.restore(twin).unwrap_err();
        assert_eq!(
            err,
            TreeError::DuplicateIndex {
                index: pos(1),
                sibling: r,
            }
        );
        assert_eq!(restored.roots(paper).count(), 1);
    }

    #[test]
    fn restore_requires_parent_first() {
        let (tree, _, [_, a, ..]) = sample();
        let mut restored = QuestionTree::default();
        let err = restored.restore(tree.get(a).unwrap().clone()).unwrap_err();
        assert!(matches!(err, TreeError::ParentNotFound(_)));
    }
}
