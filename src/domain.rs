//! Domain models for the exam archive.
//!
//! This module holds the filesystem-agnostic model: index formatting,
//! materialized paths, the question tree arena, the course catalog, comments
//! and configuration.

/// Sibling-group numbering schemes.
pub mod index;
pub use index::{FormatError, IndexType};

/// Materialized question paths.
pub mod path;
pub use path::{MaterializedPath, PathError, QuestionPath};

mod revision;
pub use revision::Revision;

mod question;
pub use question::{Inconsistency, Question};

/// Courses and papers.
pub mod catalog;
pub use catalog::{Catalog, CatalogError, Course, CourseCode, NewPaper, Paper, Period};

mod comments;
pub use comments::{Comment, CommentCounter, Comments};

/// The question tree arena.
pub mod tree;
pub use tree::{QuestionTree, TreeError};

/// Paper and question addresses.
pub mod address;
pub use address::{AddressError, PaperAddress, QuestionAddress};

mod archive;
pub use archive::{Archive, ArchiveError, NotFound};

mod view;
pub use view::{QuestionView, RevisionView, SimilarView};

mod config;
pub use config::Config;
