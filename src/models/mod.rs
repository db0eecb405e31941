//! Domain models for makenovel.
//!
//! # Core Concepts
//!
//! ## Document tree
//!
//! - [`Plotline`]: A thread of the story. Its tag is chosen by the author and names the
//!   directory holding its chapter files.
//! - [`Part`]: A node of the part hierarchy, linked to its parent via `parent_id`.
//!   Its number and tag are positional and recomputed on every access.
//! - [`Chapter`]: An ordered unit of text backed by a file on disk, optionally placed in
//!   a part and a plotline.
//!
//! ## History
//!
//! - [`Version`]: Immutable record of a bind, correlated with a VCS commit.
//! - [`Draft`]: A version carrying a stage label such as "alpha" or "beta".
//!
//! Every entity carries an in-memory `id` that is never persisted. References between
//! entities are held by id so that they survive renames and reorders; tags are only
//! derived for display and serialization.

mod chapter;
mod part;
mod plotline;
pub mod tag;
mod version;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use chapter::*;
pub use part::*;
pub use plotline::*;
pub use tag::{derive_tag, machine_str};
pub use version::*;

/// The kinds of entity stored in a novel project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Plotline,
    Part,
    Chapter,
    Version,
    Draft,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plotline => "plotline",
            Self::Part => "part",
            Self::Chapter => "chapter",
            Self::Version => "version",
            Self::Draft => "draft",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
