//! Plain-text exam paper archive
//!
//! Papers are stored as YAML files grouped by course. Each paper holds a tree
//! of questions addressed by materialized paths such as `2.b.iii`.

pub mod domain;
pub use domain::{
    Archive, Config, IndexType, NotFound, Question, QuestionAddress, QuestionPath, QuestionTree,
};

/// Filesystem storage for the archive.
pub mod storage;
pub use storage::Directory;
