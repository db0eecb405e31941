use std::fs;
use std::io;

use super::{confirm_delete, Novel};
use crate::error::{NovelError, Result};
use crate::models::*;
use crate::prompt::Confirm;

/// 0-based index of the record tagged `tag` (its 1-based number) in a list of `len`.
fn record_index(kind: EntityKind, tag: &str, len: usize) -> Result<usize> {
    match tag.parse::<usize>() {
        Ok(number) if (1..=len).contains(&number) => Ok(number - 1),
        _ => Err(NovelError::not_found(kind, tag)),
    }
}

impl Novel {
    pub fn find_version(&self, tag: &str) -> Option<&Version> {
        record_index(EntityKind::Version, tag, self.versions.len())
            .ok()
            .map(|i| &self.versions[i])
    }

    pub fn find_draft(&self, tag: &str) -> Option<&Draft> {
        record_index(EntityKind::Draft, tag, self.drafts.len())
            .ok()
            .map(|i| &self.drafts[i])
    }

    pub fn next_version_number(&self) -> usize {
        self.versions.len() + 1
    }

    pub fn next_draft_number(&self) -> usize {
        self.drafts.len() + 1
    }

    /// Append a version and return its number.
    pub fn record_version(&mut self, version: Version) -> usize {
        self.versions.push(version);
        self.mark_dirty(&[EntityKind::Version]);
        self.versions.len()
    }

    /// Append a draft and return its number.
    pub fn record_draft(&mut self, draft: Draft) -> usize {
        self.drafts.push(draft);
        self.mark_dirty(&[EntityKind::Draft]);
        self.drafts.len()
    }

    /// Delete a version record and its bound document. The commit stays in the VCS
    /// history.
    pub fn delete_version(
        &mut self,
        tag: &str,
        force: bool,
        confirm: &mut dyn Confirm,
    ) -> Result<bool> {
        let index = record_index(EntityKind::Version, tag, self.versions.len())?;
        if !confirm_delete(force, confirm, EntityKind::Version, tag)? {
            return Ok(false);
        }
        self.remove_bound_document(&self.versions[index])?;
        self.versions.remove(index);
        self.mark_dirty(&[EntityKind::Version]);
        tracing::info!("Deleted version {}", tag);
        Ok(true)
    }

    /// Delete a draft record and its bound document.
    pub fn delete_draft(
        &mut self,
        tag: &str,
        force: bool,
        confirm: &mut dyn Confirm,
    ) -> Result<bool> {
        let index = record_index(EntityKind::Draft, tag, self.drafts.len())?;
        if !confirm_delete(force, confirm, EntityKind::Draft, tag)? {
            return Ok(false);
        }
        self.remove_bound_document(&self.drafts[index].version)?;
        self.drafts.remove(index);
        self.mark_dirty(&[EntityKind::Draft]);
        tracing::info!("Deleted draft {}", tag);
        Ok(true)
    }

    fn remove_bound_document(&self, version: &Version) -> Result<()> {
        match fs::remove_file(self.env.resolve(&version.path)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
