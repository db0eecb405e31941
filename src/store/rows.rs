//! Row schemas of the tabular data files.
//!
//! Each kind has a fixed arity. Optional values are written as empty fields; references
//! to other entities are written as their current tag and resolved back to ids at load.

use std::path::PathBuf;

use chrono::DateTime;

use crate::models::{EntityKind, Version, TIMESTAMP_FORMAT};

/// A fixed-arity row of one tabular file.
pub trait Row: Sized {
    const KIND: EntityKind;
    const ARITY: usize;

    /// Parse a row whose arity has already been checked.
    fn from_fields(fields: &[&str]) -> Result<Self, String>;

    fn to_fields(&self) -> Vec<String>;
}

/// `title, parent_tag`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRow {
    pub title: Option<String>,
    pub parent_tag: Option<String>,
}

/// `tag, comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotlineRow {
    pub tag: String,
    pub comment: Option<String>,
}

/// `path, plotline_tag, part_tag, title`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRow {
    pub path: PathBuf,
    pub plotline_tag: Option<String>,
    pub part_tag: Option<String>,
    pub title: Option<String>,
}

/// `path, vcs_hash, comment, timestamp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRow(pub Version);

/// `path, stage, vcs_hash, comment, timestamp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRow {
    pub stage: String,
    pub version: Version,
}

fn optional(field: &str) -> Option<String> {
    (!field.is_empty()).then(|| field.to_string())
}

fn or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn parse_version(path: &str, hash: &str, comment: &str, timestamp: &str) -> Result<Version, String> {
    if path.is_empty() {
        return Err("missing output path".to_string());
    }
    let timestamp = DateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map_err(|e| format!("invalid timestamp '{}': {}", timestamp, e))?;
    Ok(Version {
        path: PathBuf::from(path),
        vcs_hash: hash.to_string(),
        comment: optional(comment),
        timestamp,
    })
}

impl Row for PartRow {
    const KIND: EntityKind = EntityKind::Part;
    const ARITY: usize = 2;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        Ok(Self {
            title: optional(fields[0]),
            parent_tag: optional(fields[1]),
        })
    }

    fn to_fields(&self) -> Vec<String> {
        vec![or_empty(&self.title), or_empty(&self.parent_tag)]
    }
}

impl Row for PlotlineRow {
    const KIND: EntityKind = EntityKind::Plotline;
    const ARITY: usize = 2;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        if fields[0].is_empty() {
            return Err("missing plotline tag".to_string());
        }
        Ok(Self {
            tag: fields[0].to_string(),
            comment: optional(fields[1]),
        })
    }

    fn to_fields(&self) -> Vec<String> {
        vec![self.tag.clone(), or_empty(&self.comment)]
    }
}

impl Row for ChapterRow {
    const KIND: EntityKind = EntityKind::Chapter;
    const ARITY: usize = 4;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        if fields[0].is_empty() {
            return Err("missing chapter path".to_string());
        }
        Ok(Self {
            path: PathBuf::from(fields[0]),
            plotline_tag: optional(fields[1]),
            part_tag: optional(fields[2]),
            title: optional(fields[3]),
        })
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.path.to_string_lossy().into_owned(),
            or_empty(&self.plotline_tag),
            or_empty(&self.part_tag),
            or_empty(&self.title),
        ]
    }
}

impl Row for VersionRow {
    const KIND: EntityKind = EntityKind::Version;
    const ARITY: usize = 4;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        parse_version(fields[0], fields[1], fields[2], fields[3]).map(Self)
    }

    fn to_fields(&self) -> Vec<String> {
        let v = &self.0;
        vec![
            v.path.to_string_lossy().into_owned(),
            v.vcs_hash.clone(),
            or_empty(&v.comment),
            v.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ]
    }
}

impl Row for DraftRow {
    const KIND: EntityKind = EntityKind::Draft;
    const ARITY: usize = 5;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        if fields[1].is_empty() {
            return Err("missing draft stage".to_string());
        }
        Ok(Self {
            stage: fields[1].to_string(),
            version: parse_version(fields[0], fields[2], fields[3], fields[4])?,
        })
    }

    fn to_fields(&self) -> Vec<String> {
        let v = &self.version;
        vec![
            v.path.to_string_lossy().into_owned(),
            self.stage.clone(),
            v.vcs_hash.clone(),
            or_empty(&v.comment),
            v.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ]
    }
}
