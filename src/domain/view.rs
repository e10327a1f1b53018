// QuestionView - a borrowed, serializable projection of a question.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{index::IndexType, question::Question, revision::Revision};

/// A borrowed view of a question, suitable for serialization.
///
/// Load-only fields such as the creation timestamp are omitted. Comment and
/// similar-question totals are computed when the view is built.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView<'a> {
    /// The question's identifier.
    pub id: Uuid,
    /// The paper the question belongs to.
    pub paper_id: Uuid,
    /// The parent question, if any.
    pub parent_id: Option<Uuid>,
    /// 1-based position among siblings.
    pub index: usize,
    /// Display scheme of the sibling group.
    pub index_type: IndexType,
    /// Whether this is a structural header.
    pub is_section: bool,
    /// Marks available, if recorded.
    pub marks: Option<u32>,
    /// Integer positions from the root.
    pub path: Vec<usize>,
    /// Display labels parallel to `path`.
    pub formatted_path: Vec<&'a str>,
    /// Direct children, in stored order.
    pub children: &'a [Uuid],
    /// Body of the current revision.
    pub content: Option<&'a str>,
    /// The current revision.
    pub revision: Option<RevisionView<'a>>,
    /// Questions this one resembles.
    pub similar: Vec<SimilarView>,
    /// Number of comments on the question.
    pub comment_count: usize,
    /// Number of similar questions.
    pub similar_count: usize,
}

/// The public fields of a revision.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RevisionView<'a> {
    /// Who wrote the revision.
    pub user: &'a str,
    /// The revision text.
    pub content: &'a str,
    /// When the revision was made.
    pub created_at: DateTime<Utc>,
}

/// A similarity link as exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarView {
    /// The question resembled.
    pub similar_question_id: Uuid,
    /// Similarity score.
    pub similarity: f64,
}

impl<'a> From<&'a Revision> for RevisionView<'a> {
    fn from(revision: &'a Revision) -> Self {
        Self {
            user: revision.author(),
            content: revision.content(),
            created_at: revision.created(),
        }
    }
}

impl<'a> QuestionView<'a> {
    pub(crate) fn new(
        question: &'a Question,
        similar: Vec<(Uuid, f64)>,
        comment_count: usize,
    ) -> Self {
        let similar: Vec<SimilarView> = similar
            .into_iter()
            .map(|(similar_question_id, similarity)| SimilarView {
                similar_question_id,
                similarity,
            })
            .collect();

        Self {
            id: question.id(),
            paper_id: question.paper(),
            parent_id: question.parent(),
            index: question.index().get(),
            index_type: question.index_type(),
            is_section: question.is_section(),
            marks: question.marks(),
            path: question.path().to_vec(),
            formatted_path: question.formatted_path().collect(),
            children: question.children(),
            content: question.content(),
            revision: question.revision().map(RevisionView::from),
            similar_count: similar.len(),
            similar,
            comment_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use serde_json::{Value, json};

    use crate::domain::{
        archive::Archive,
        catalog::{CourseCode, NewPaper, Period},
        comments::CommentCounter,
    };

    use super::*;

    struct FixedCount(usize);

    impl CommentCounter for FixedCount {
        fn comment_count(&self, _entity: Uuid) -> usize {
            self.0
        }
    }

    fn pos(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn setup() -> (Archive, Uuid, Uuid) {
        let mut archive = Archive::default();
        let code = CourseCode::new("CT470").unwrap();
        archive
            .catalog_mut()
            .add_course(code.clone(), "AI".to_string())
            .unwrap();
        let paper = archive
            .catalog_mut()
            .add_paper(NewPaper {
                course: code,
                name: "Summer".to_string(),
                period: Period::Summer,
                sitting: 1,
                year_start: 2007,
                year_stop: None,
                link: None,
            })
            .unwrap();
        let root = archive.new_question(paper, pos(2), None, None).unwrap();
        let child = archive
            .new_question(paper, pos(3), Some(IndexType::Roman), Some(root))
            .unwrap();
        (archive, root, child)
    }

    #[test]
    fn view_exposes_public_fields_only() {
        let (mut archive, root, child) = setup();
        archive
            .questions_mut()
            .get_mut(child)
            .unwrap()
            .set_content("alice".to_string(), "Define entropy.".to_string());
        archive.questions_mut().add_similar(child, root, 0.5).unwrap();
        archive
            .add_comment(child, "bob".to_string(), "Too easy".to_string())
            .unwrap();

        let value = serde_json::to_value(archive.view(child).unwrap()).unwrap();

        assert_eq!(value["parent_id"], json!(root.to_string()));
        assert_eq!(value["index"], json!(3));
        assert_eq!(value["index_type"], json!("roman"));
        assert_eq!(value["path"], json!([2, 3]));
        assert_eq!(value["formatted_path"], json!(["2", "III"]));
        assert_eq!(value["content"], json!("Define entropy."));
        assert_eq!(value["revision"]["user"], json!("alice"));
        assert_eq!(value["similar"][0]["similarity"], json!(0.5));
        assert_eq!(value["similar_count"], json!(1));
        assert_eq!(value["comment_count"], json!(1));

        let Value::Object(fields) = value else {
            panic!("view should serialize to an object");
        };
        assert!(!fields.contains_key("created_at"));
        assert!(!fields.contains_key("revisions"));
    }

    #[test]
    fn comment_count_uses_supplied_counter() {
        let (archive, root, _) = setup();
        let view = archive.view_with(root, &FixedCount(7)).unwrap();
        assert_eq!(view.comment_count, 7);
        assert!(view.revision.is_none());
        assert_eq!(view.similar_count, 0);
    }
}
