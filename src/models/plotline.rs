use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A thread of the story.
///
/// Unlike parts and chapters, the tag is chosen by the author and is not derived.
/// Chapters belonging to a plotline are found by predicate and live in a directory
/// named after the tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plotline {
    pub id: Uuid,
    pub tag: String,
    /// What happens in this plotline.
    pub comment: Option<String>,
}

impl Plotline {
    pub fn new(tag: impl Into<String>, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag: tag.into(),
            comment: comment.filter(|c| !c.is_empty()),
        }
    }
}

/// Input for updating a plotline. All fields are optional for partial updates.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlotlineInput {
    /// Rename the plotline; its chapter files move to the new directory.
    pub tag: Option<String>,
    pub comment: Option<String>,
}
