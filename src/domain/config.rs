use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::index::IndexType;

/// Configuration for an exam archive.
///
/// Stored as TOML at `.exam/config.toml` beneath the archive root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Index type given to a new sibling group when none is requested.
    ///
    /// Groups that already have members always keep their own type.
    pub default_index_type: IndexType,

    /// Whether renumbering and retyping also regenerate the paths of every
    /// descendant.
    ///
    /// When `false` (default): descendants keep the path prefix they were
    /// created with until they are refreshed explicitly.
    ///
    /// When `true`: the command line tool refreshes the subtree after each
    /// renumber or retype.
    pub cascade_renumber: bool,
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        default_index_type: IndexType,

        #[serde(default)]
        cascade_renumber: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                default_index_type,
                cascade_renumber,
            } => Self {
                default_index_type,
                cascade_renumber,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            default_index_type: config.default_index_type,
            cascade_renumber: config.cascade_renumber,
        }
    }
}
