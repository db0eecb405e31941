use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NovelError, Result};

/// A node of the part hierarchy.
///
/// Parts form a tree via `parent_id`, which is the only stored edge. Children are
/// derived by predicate, and a part's position among its siblings (and so its number
/// and tag) is its order in the novel's part list relative to the other parts sharing
/// its parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub title: Option<String>,
}

impl Part {
    pub fn new(title: Option<String>, parent_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id,
            title: title.filter(|t| !t.is_empty()),
        }
    }
}

/// Where to insert or move a part.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Placement {
    /// Append at the end of the top level on add; leave in place on update.
    #[default]
    Unchanged,
    /// Sibling immediately before the anchor part.
    Before(String),
    /// Sibling immediately after the anchor part.
    After(String),
    /// Last child of the anchor part.
    Under(String),
}

impl Placement {
    /// Build a placement from the mutually exclusive `before`/`after`/`parent` flags.
    pub fn from_flags(
        before: Option<String>,
        after: Option<String>,
        parent: Option<String>,
    ) -> Result<Self> {
        match (before, after, parent) {
            (None, None, None) => Ok(Self::Unchanged),
            (Some(tag), None, None) => Ok(Self::Before(tag)),
            (None, Some(tag), None) => Ok(Self::After(tag)),
            (None, None, Some(tag)) => Ok(Self::Under(tag)),
            _ => Err(NovelError::ConflictingPlacement),
        }
    }
}

/// Input for creating a new part.
#[derive(Debug, Clone, Default)]
pub struct AddPartInput {
    pub title: Option<String>,
    pub placement: Placement,
}

/// Input for updating an existing part. `title: Some("")` clears the title.
#[derive(Debug, Clone, Default)]
pub struct UpdatePartInput {
    pub title: Option<String>,
    pub placement: Placement,
}
