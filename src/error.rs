use std::path::PathBuf;

use thiserror::Error;

use crate::config::ValueType;
use crate::models::EntityKind;

/// Errors raised by the novel model, its data files and its collaborators.
#[derive(Debug, Error)]
pub enum NovelError {
    #[error("{kind} not found: {tag}")]
    NotFound { kind: EntityKind, tag: String },

    #[error("{kind} already exists: {tag}")]
    DuplicateTag { kind: EntityKind, tag: String },

    #[error("invalid {kind} tag '{tag}': must be non-empty and contain no path separators")]
    InvalidTag { kind: EntityKind, tag: String },

    #[error("at most one of before, after and parent may be given")]
    ConflictingPlacement,

    #[error("part {tag} cannot be placed under itself or one of its descendants")]
    CyclicParent { tag: String },

    #[error("no chapter number left after {0}")]
    ChapterNumbersExhausted(u32),

    #[error("malformed row in {}:{line}: {reason}", path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// Recovered locally: the reference is loaded as absent and the error is only logged.
    #[error("{kind} row references unknown {target} '{tag}'")]
    DanglingReference {
        kind: EntityKind,
        target: EntityKind,
        tag: String,
    },

    #[error("{tool} failed: {message}")]
    ExternalToolFailure { tool: String, message: String },

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("invalid value for {key}: expected {expected}, got '{value}'")]
    InvalidValue {
        key: String,
        expected: ValueType,
        value: String,
    },

    #[error("not a novel project: no .novel directory at or above {}", .0.display())]
    NotAProject(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl NovelError {
    pub fn not_found(kind: EntityKind, tag: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            tag: tag.into(),
        }
    }

    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalToolFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = NovelError> = std::result::Result<T, E>;
