use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tag::derive_tag;
use crate::error::{NovelError, Result};

/// An ordered unit of text backed by a file on disk.
///
/// `number` is a creation sequence number: it is assigned once and never compacted when
/// other chapters are deleted, so tags may have gaps. `path` is relative to the project
/// root and is derived from the plotline and tag whenever the chapter is updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chapter {
    pub id: Uuid,
    pub number: u32,
    pub title: Option<String>,
    pub plotline_id: Option<Uuid>,
    pub part_id: Option<Uuid>,
    pub path: PathBuf,
}

impl Chapter {
    pub fn tag(&self) -> String {
        derive_tag(self.number, self.title.as_deref())
    }
}

/// Where to place a chapter in the chapter sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChapterPosition {
    /// Append on add; leave in place on update.
    #[default]
    Unchanged,
    Before(String),
    After(String),
}

impl ChapterPosition {
    pub fn from_flags(before: Option<String>, after: Option<String>) -> Result<Self> {
        match (before, after) {
            (None, None) => Ok(Self::Unchanged),
            (Some(tag), None) => Ok(Self::Before(tag)),
            (None, Some(tag)) => Ok(Self::After(tag)),
            (Some(_), Some(_)) => Err(NovelError::ConflictingPlacement),
        }
    }
}

/// Input for creating a new chapter.
#[derive(Debug, Clone, Default)]
pub struct AddChapterInput {
    pub plotline_tag: String,
    pub title: Option<String>,
    pub part_tag: Option<String>,
    pub position: ChapterPosition,
}

/// Input for updating a chapter. All fields are optional for partial updates.
///
/// `title: Some("")` clears the title and `part_tag: Some("")` takes the chapter out of
/// its part.
#[derive(Debug, Clone, Default)]
pub struct UpdateChapterInput {
    pub title: Option<String>,
    pub plotline_tag: Option<String>,
    pub part_tag: Option<String>,
    pub position: ChapterPosition,
}
