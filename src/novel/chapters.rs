use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{confirm_delete, move_file, Novel};
use crate::error::{NovelError, Result};
use crate::models::*;
use crate::prompt::Confirm;

impl Novel {
    pub fn chapter(&self, id: Uuid) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn find_chapter(&self, tag: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.tag() == tag)
    }

    /// Chapters not placed in any part.
    pub fn orphan_chapters(&self) -> Vec<&Chapter> {
        self.chapters.iter().filter(|c| c.part_id.is_none()).collect()
    }

    /// Number for the next chapter: one past the highest number in use.
    pub fn next_chapter_number(&self) -> Result<u32> {
        let max = self.chapters.iter().map(|c| c.number).max().unwrap_or(0);
        max.checked_add(1)
            .ok_or(NovelError::ChapterNumbersExhausted(max))
    }

    /// Path, relative to the project root, of the chapter file for `tag` in `plotline`.
    pub fn chapter_path(&self, plotline_id: Option<Uuid>, tag: &str) -> PathBuf {
        let plotline = plotline_id.and_then(|id| self.plotline(id));
        self.chapter_path_in(plotline.map(|p| p.tag.as_str()), tag)
    }

    pub(super) fn chapter_path_in(&self, plotline_tag: Option<&str>, tag: &str) -> PathBuf {
        let file = format!("{}.{}", tag, self.extension);
        match plotline_tag {
            Some(dir) => PathBuf::from(dir).join(file),
            None => PathBuf::from(file),
        }
    }

    fn chapter_index(&self, tag: &str) -> Result<usize> {
        self.chapters
            .iter()
            .position(|c| c.tag() == tag)
            .ok_or_else(|| NovelError::not_found(EntityKind::Chapter, tag))
    }

    fn resolve_part(&self, tag: &str) -> Result<Uuid> {
        self.find_part(tag)
            .map(|p| p.id)
            .ok_or_else(|| NovelError::not_found(EntityKind::Part, tag))
    }

    /// Id of the chapter `position` refers to, and whether to go after it.
    fn resolve_position(&self, position: &ChapterPosition) -> Result<Option<(Uuid, bool)>> {
        let (tag, after) = match position {
            ChapterPosition::Unchanged => return Ok(None),
            ChapterPosition::Before(tag) => (tag, false),
            ChapterPosition::After(tag) => (tag, true),
        };
        Ok(Some((self.chapters[self.chapter_index(tag)?].id, after)))
    }

    fn insert_chapter(&mut self, chapter: Chapter, anchor: Option<(Uuid, bool)>) {
        let at = anchor.and_then(|(id, after)| {
            self.chapters
                .iter()
                .position(|c| c.id == id)
                .map(|i| if after { i + 1 } else { i })
        });
        match at {
            Some(at) => self.chapters.insert(at, chapter),
            None => self.chapters.push(chapter),
        }
    }

    // ============================================================
    // Mutations
    // ============================================================

    /// Create a chapter and its (empty) backing file.
    pub fn add_chapter(&mut self, input: AddChapterInput) -> Result<&Chapter> {
        let plotline_id = self
            .find_plotline(&input.plotline_tag)
            .map(|p| p.id)
            .ok_or_else(|| NovelError::not_found(EntityKind::Plotline, &input.plotline_tag))?;
        let part_id = match input.part_tag.as_deref().filter(|t| !t.is_empty()) {
            Some(tag) => Some(self.resolve_part(tag)?),
            None => None,
        };
        let anchor = self.resolve_position(&input.position)?;

        let number = self.next_chapter_number()?;
        let title = input.title.filter(|t| !t.is_empty());
        let tag = derive_tag(number, title.as_deref());
        let path = self.chapter_path(Some(plotline_id), &tag);

        let file = self.env.resolve(&path);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir)?;
        }
        OpenOptions::new().create(true).append(true).open(&file)?;

        let chapter = Chapter {
            id: Uuid::new_v4(),
            number,
            title,
            plotline_id: Some(plotline_id),
            part_id,
            path,
        };
        let id = chapter.id;
        self.insert_chapter(chapter, anchor);
        self.mark_dirty(&[EntityKind::Chapter]);

        tracing::info!("Added chapter {} at {}", tag, file.display());
        self.chapter(id)
            .ok_or_else(|| NovelError::not_found(EntityKind::Chapter, tag))
    }

    /// Retitle, move or reassign a chapter.
    ///
    /// The tag and file path are derived again; if the path changed the backing file is
    /// moved with its contents.
    pub fn update_chapter(&mut self, tag: &str, input: UpdateChapterInput) -> Result<&Chapter> {
        let index = self.chapter_index(tag)?;
        let current = self.chapters[index].clone();

        let plotline_id = match input.plotline_tag.as_deref() {
            None => current.plotline_id,
            Some("") => None,
            Some(tag) => Some(
                self.find_plotline(tag)
                    .map(|p| p.id)
                    .ok_or_else(|| NovelError::not_found(EntityKind::Plotline, tag))?,
            ),
        };
        let part_id = match input.part_tag.as_deref() {
            None => current.part_id,
            Some("") => None,
            Some(tag) => Some(self.resolve_part(tag)?),
        };
        let anchor = self
            .resolve_position(&input.position)?
            .filter(|(id, _)| *id != current.id);
        let title = match input.title {
            None => current.title.clone(),
            Some(title) => Some(title).filter(|t| !t.is_empty()),
        };

        let new_tag = derive_tag(current.number, title.as_deref());
        let path = self.chapter_path(plotline_id, &new_tag);
        if path != current.path {
            self.relocate_chapter_file(&current.path, &path)?;
        }

        let updated = Chapter {
            title,
            plotline_id,
            part_id,
            path,
            ..current
        };
        match anchor {
            Some(anchor) => {
                self.chapters.remove(index);
                self.insert_chapter(updated, Some(anchor));
            }
            None => self.chapters[index] = updated,
        }
        self.mark_dirty(&[EntityKind::Chapter]);

        tracing::info!("Updated chapter {} -> {}", tag, new_tag);
        self.chapter(current.id)
            .ok_or_else(|| NovelError::not_found(EntityKind::Chapter, new_tag))
    }

    /// Delete a chapter and its backing file.
    ///
    /// Returns `false` if the deletion was not confirmed.
    pub fn delete_chapter(
        &mut self,
        tag: &str,
        force: bool,
        confirm: &mut dyn Confirm,
    ) -> Result<bool> {
        let index = self.chapter_index(tag)?;
        if !confirm_delete(force, confirm, EntityKind::Chapter, tag)? {
            return Ok(false);
        }

        let file = self.env.resolve(&self.chapters[index].path);
        match fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Chapter file {} was already gone", file.display());
            }
            Err(e) => return Err(e.into()),
        }
        self.chapters.remove(index);
        self.mark_dirty(&[EntityKind::Chapter]);

        tracing::info!("Deleted chapter {}", tag);
        Ok(true)
    }

    /// Move a chapter file between two root-relative paths, refusing to overwrite.
    pub(super) fn relocate_chapter_file(&self, from: &Path, to: &Path) -> Result<()> {
        let (from, to) = (self.env.resolve(from), self.env.resolve(to));
        if to.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("cannot move chapter to {}: file exists", to.display()),
            )
            .into());
        }
        if from.exists() {
            move_file(&from, &to)?;
        } else {
            tracing::warn!(
                "Chapter file {} is missing; creating an empty {}",
                from.display(),
                to.display()
            );
            if let Some(dir) = to.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::File::create(&to)?;
        }
        tracing::debug!("Moved {} to {}", from.display(), to.display());
        Ok(())
    }
}
