use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use super::{confirm_delete, move_file, Novel};
use crate::env::DATA_DIR;
use crate::error::{NovelError, Result};
use crate::models::*;
use crate::prompt::Confirm;

impl Novel {
    /// A plotline tag names a directory under the project root, so it may not be a
    /// path, the data directory or the directory receiving bound documents.
    fn validate_plotline_tag(&self, tag: &str) -> Result<()> {
        let bind_root = match self.bind_dir.components().next() {
            Some(Component::Normal(dir)) => Some(dir),
            _ => None,
        };
        let invalid = tag.is_empty()
            || tag.contains(|c: char| c == '/' || c == '\\')
            || tag == "."
            || tag == ".."
            || tag == DATA_DIR
            || bind_root.is_some_and(|dir| Path::new(tag) == Path::new(dir));
        if invalid {
            return Err(NovelError::InvalidTag {
                kind: EntityKind::Plotline,
                tag: tag.to_string(),
            });
        }
        Ok(())
    }

    pub fn plotline(&self, id: Uuid) -> Option<&Plotline> {
        self.plotlines.iter().find(|p| p.id == id)
    }

    pub fn find_plotline(&self, tag: &str) -> Option<&Plotline> {
        self.plotlines.iter().find(|p| p.tag == tag)
    }

    /// Chapters belonging to the plotline `id`, in chapter order.
    pub fn plotline_chapters(&self, id: Uuid) -> Vec<&Chapter> {
        self.chapters
            .iter()
            .filter(|c| c.plotline_id == Some(id))
            .collect()
    }

    fn plotline_index(&self, tag: &str) -> Result<usize> {
        self.plotlines
            .iter()
            .position(|p| p.tag == tag)
            .ok_or_else(|| NovelError::not_found(EntityKind::Plotline, tag))
    }

    pub fn add_plotline(&mut self, tag: &str, comment: Option<String>) -> Result<&Plotline> {
        self.validate_plotline_tag(tag)?;
        if self.find_plotline(tag).is_some() {
            return Err(NovelError::DuplicateTag {
                kind: EntityKind::Plotline,
                tag: tag.to_string(),
            });
        }

        fs::create_dir_all(self.env.plotline_dir(tag))?;
        self.plotlines.push(Plotline::new(tag, comment));
        self.mark_dirty(&[EntityKind::Plotline]);

        tracing::info!("Added plotline {}", tag);
        self.find_plotline(tag)
            .ok_or_else(|| NovelError::not_found(EntityKind::Plotline, tag))
    }

    /// Change a plotline's comment and/or tag. Renaming moves the plotline's chapter
    /// files into the directory of the new tag.
    pub fn update_plotline(
        &mut self,
        tag: &str,
        input: UpdatePlotlineInput,
    ) -> Result<&Plotline> {
        let index = self.plotline_index(tag)?;
        let id = self.plotlines[index].id;

        let new_tag = input.tag.filter(|t| t != tag);
        if let Some(new_tag) = &new_tag {
            self.validate_plotline_tag(new_tag)?;
            if self.find_plotline(new_tag).is_some() {
                return Err(NovelError::DuplicateTag {
                    kind: EntityKind::Plotline,
                    tag: new_tag.clone(),
                });
            }

            let moves: Vec<(usize, PathBuf)> = self
                .chapters
                .iter()
                .enumerate()
                .filter(|(_, c)| c.plotline_id == Some(id))
                .map(|(i, c)| (i, self.chapter_path_in(Some(new_tag.as_str()), &c.tag())))
                .collect();
            if let Some((_, taken)) = moves.iter().find(|(_, to)| self.env.resolve(to).exists()) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("cannot move chapter to {}: file exists", taken.display()),
                )
                .into());
            }

            self.move_plotline_files(new_tag, &moves)?;
            for (i, to) in moves {
                self.chapters[i].path = to;
            }
            let old_tag = std::mem::replace(&mut self.plotlines[index].tag, new_tag.clone());
            if let Err(e) = fs::remove_dir(self.env.plotline_dir(&old_tag)) {
                tracing::debug!("Kept plotline directory {}: {}", old_tag, e);
            }
        }
        if let Some(comment) = input.comment {
            self.plotlines[index].comment = Some(comment).filter(|c| !c.is_empty());
        }
        self.mark_dirty(&[EntityKind::Plotline, EntityKind::Chapter]);

        tracing::info!("Updated plotline {}", tag);
        self.plotline(id)
            .ok_or_else(|| NovelError::not_found(EntityKind::Plotline, tag))
    }

    /// Move the files of `moves` into the directory of `new_tag`. If any move fails, the
    /// files already moved are put back before the error is returned.
    fn move_plotline_files(&self, new_tag: &str, moves: &[(usize, PathBuf)]) -> Result<()> {
        let dir = self.env.plotline_dir(new_tag);
        fs::create_dir_all(&dir)?;

        let mut moved = Vec::with_capacity(moves.len());
        for (i, to) in moves {
            let from = &self.chapters[*i].path;
            let existed = self.env.resolve(from).exists();
            if let Err(e) = self.relocate_chapter_file(from, to) {
                self.restore_chapter_files(&moved);
                if let Err(e) = fs::remove_dir(&dir) {
                    tracing::debug!("Kept directory {}: {}", dir.display(), e);
                }
                return Err(e);
            }
            moved.push((from.as_path(), to.as_path(), existed));
        }
        Ok(())
    }

    /// Undo chapter file moves, newest first. A file created for a missing chapter is
    /// removed rather than moved back.
    fn restore_chapter_files(&self, moved: &[(&Path, &Path, bool)]) {
        for (from, to, existed) in moved.iter().rev() {
            let (from, to) = (self.env.resolve(from), self.env.resolve(to));
            let undone = if *existed {
                move_file(&to, &from)
            } else {
                fs::remove_file(&to).map_err(NovelError::from)
            };
            if let Err(e) = undone {
                tracing::error!("Could not restore {}: {}", from.display(), e);
            }
        }
    }

    /// Delete a plotline. Its chapters stay, without a plotline, and their files are
    /// left in place.
    ///
    /// Returns `false` if the deletion was not confirmed.
    pub fn delete_plotline(
        &mut self,
        tag: &str,
        force: bool,
        confirm: &mut dyn Confirm,
    ) -> Result<bool> {
        let index = self.plotline_index(tag)?;
        if !confirm_delete(force, confirm, EntityKind::Plotline, tag)? {
            return Ok(false);
        }

        let removed = self.plotlines.remove(index);
        for chapter in self
            .chapters
            .iter_mut()
            .filter(|c| c.plotline_id == Some(removed.id))
        {
            chapter.plotline_id = None;
        }
        self.mark_dirty(&[EntityKind::Plotline, EntityKind::Chapter]);

        tracing::info!("Deleted plotline {}", tag);
        Ok(true)
    }
}
