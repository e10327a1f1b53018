//! User comments attached to questions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Read-only query interface for comment totals.
///
/// Aggregates are computed on demand through this trait rather than cached on
/// the question, so they cannot go stale.
pub trait CommentCounter {
    /// Number of comments referencing `entity`.
    fn comment_count(&self, entity: Uuid) -> usize;
}

/// A comment left on a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub(crate) id: Uuid,
    pub(crate) entity: Uuid,
    pub(crate) author: String,
    pub(crate) content: String,
    pub(crate) created: DateTime<Utc>,
}

impl Comment {
    /// The stable identifier of this comment.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The question the comment refers to.
    #[must_use]
    pub const fn entity(&self) -> Uuid {
        self.entity
    }

    /// Who wrote the comment.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// The comment text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// When the comment was posted.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

/// In-memory comment store, grouped by the entity they refer to.
#[derive(Debug, Default, Clone)]
pub struct Comments {
    by_entity: HashMap<Uuid, Vec<Comment>>,
}

impl Comments {
    /// Post a new comment on `entity`.
    pub fn add(&mut self, entity: Uuid, author: String, content: String) -> &Comment {
        self.insert(Comment {
            id: Uuid::new_v4(),
            entity,
            author,
            content,
            created: Utc::now(),
        })
    }

    pub(crate) fn insert(&mut self, comment: Comment) -> &Comment {
        let thread = self.by_entity.entry(comment.entity).or_default();
        thread.push(comment);
        thread.last().expect("a comment was just pushed")
    }

    /// Comments on `entity`, oldest first.
    #[must_use]
    pub fn for_entity(&self, entity: Uuid) -> &[Comment] {
        self.by_entity.get(&entity).map(Vec::as_slice).unwrap_or_default()
    }

    /// Drop every comment on `entity`, returning them.
    pub fn remove_entity(&mut self, entity: Uuid) -> Vec<Comment> {
        self.by_entity.remove(&entity).unwrap_or_default()
    }
}

impl CommentCounter for Comments {
    fn comment_count(&self, entity: Uuid) -> usize {
        self.for_entity(entity).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_comments_per_entity() {
        let mut comments = Comments::default();
        let question = Uuid::new_v4();
        let other = Uuid::new_v4();

        comments.add(question, "alice".to_string(), "Is (b) ambiguous?".to_string());
        comments.add(question, "bob".to_string(), "Yes.".to_string());
        comments.add(other, "carol".to_string(), "Nice one".to_string());

        assert_eq!(comments.comment_count(question), 2);
        assert_eq!(comments.comment_count(other), 1);
        assert_eq!(comments.comment_count(Uuid::new_v4()), 0);
        assert_eq!(comments.for_entity(question)[1].content(), "Yes.");
    }

    #[test]
    fn removing_entity_clears_its_thread() {
        let mut comments = Comments::default();
        let question = Uuid::new_v4();
        comments.add(question, "alice".to_string(), "?".to_string());

        assert_eq!(comments.remove_entity(question).len(), 1);
        assert_eq!(comments.comment_count(question), 0);
    }
}
