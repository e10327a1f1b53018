use borsh::BorshSerialize;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A versioned snapshot of a question's text.
///
/// Revisions are append-only: editing a question creates a new revision and
/// moves the question's current pointer to it, leaving earlier ones intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub(crate) id: Uuid,
    pub(crate) author: String,
    pub(crate) content: String,
    pub(crate) created: DateTime<Utc>,
}

impl Revision {
    /// Create a new revision with a fresh identifier, timestamped now.
    #[must_use]
    pub fn new(author: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            content,
            created: Utc::now(),
        }
    }

    /// The stable identifier of this revision.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Who wrote this revision.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// The text of this revision.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// When this revision was created.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// A hash of the revision body.
    ///
    /// The fingerprint is a SHA256 hash of the Borsh-serialized content, so
    /// two revisions with identical text share a fingerprint regardless of
    /// author or timestamp.
    ///
    /// # Panics
    ///
    /// Panics if borsh serialization fails (which should never happen for a
    /// string).
    #[must_use]
    pub fn fingerprint(&self) -> String {
        #[derive(BorshSerialize)]
        struct FingerprintData<'a> {
            content: &'a str,
        }

        let encoded = borsh::to_vec(&FingerprintData {
            content: &self.content,
        })
        .expect("this should never fail");

        format!("{:x}", Sha256::digest(encoded))
    }
}
