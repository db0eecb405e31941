use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in the history files, e.g. `2024-03-01 18:22:05 +0100`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Immutable record of a bind.
///
/// A version is like a tag in the VCS history: it points at the compiled document and
/// the commit that captured it. Its number is its position in the versions list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Version {
    /// Compiled document, relative to the project root.
    pub path: PathBuf,
    pub vcs_hash: String,
    pub comment: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
}

/// A version carrying a stage label such as "alpha" or "beta".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Draft {
    #[serde(flatten)]
    pub version: Version,
    pub stage: String,
}

/// The record produced by a bind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Bound {
    Version { number: usize, version: Version },
    Draft { number: usize, draft: Draft },
}

impl Bound {
    pub fn number(&self) -> usize {
        match self {
            Self::Version { number, .. } | Self::Draft { number, .. } => *number,
        }
    }

    pub fn version(&self) -> &Version {
        match self {
            Self::Version { version, .. } => version,
            Self::Draft { draft, .. } => &draft.version,
        }
    }
}
