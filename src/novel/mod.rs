//! The in-memory document tree of a novel project.
//!
//! A [`Novel`] owns every plotline, part, chapter, version and draft for the lifetime of
//! a command. It is loaded from the tabular files, mutated through the operations below
//! (each of which leaves the tree consistent or fails without touching it), and written
//! back with [`Novel::save`], which rewrites every file the mutations made dirty.

mod chapters;
mod history;
mod parts;
mod plotlines;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::Config;
use crate::env::NovelEnvironment;
use crate::error::{NovelError, Result};
use crate::models::tag::tag_number;
use crate::models::*;
use crate::prompt::Confirm;
use crate::store::{self, ChapterRow, DraftRow, PartRow, PlotlineRow, VersionRow};

pub struct Novel {
    env: NovelEnvironment,
    extension: String,
    bind_dir: PathBuf,
    plotlines: Vec<Plotline>,
    parts: Vec<Part>,
    chapters: Vec<Chapter>,
    versions: Vec<Version>,
    drafts: Vec<Draft>,
    dirty: BTreeSet<EntityKind>,
}

impl Novel {
    /// Load every data file of the project.
    ///
    /// References to unknown plotline or part tags are logged and loaded as absent.
    pub fn load(env: NovelEnvironment, config: &Config) -> Result<Self> {
        let extension = config.get_str("chapter.extension")?.to_string();
        let bind_dir = config.get_path("bind.directory")?.to_path_buf();
        let mut novel = Self {
            env,
            extension,
            bind_dir,
            plotlines: Vec::new(),
            parts: Vec::new(),
            chapters: Vec::new(),
            versions: Vec::new(),
            drafts: Vec::new(),
            dirty: BTreeSet::new(),
        };

        for row in store::read_rows::<PlotlineRow>(&novel.env.plotlines_path)? {
            if novel.find_plotline(&row.tag).is_some() {
                tracing::warn!("Skipping duplicate plotline '{}'", row.tag);
                novel.dirty.insert(EntityKind::Plotline);
                continue;
            }
            novel.plotlines.push(Plotline::new(row.tag, row.comment));
        }

        // Parts are stored parents first, so every parent tag resolves against the
        // parts loaded before it.
        for row in store::read_rows::<PartRow>(&novel.env.parts_path)? {
            let parent_id = row.parent_tag.and_then(|tag| match novel.find_part(&tag) {
                Some(parent) => Some(parent.id),
                None => {
                    log_dangling(EntityKind::Part, EntityKind::Part, &tag);
                    None
                }
            });
            novel.parts.push(Part::new(row.title, parent_id));
        }

        for row in store::read_rows::<ChapterRow>(&novel.env.chapters_path)? {
            let chapter = novel.chapter_from_row(row)?;
            novel.chapters.push(chapter);
        }

        novel.versions = store::read_rows::<VersionRow>(&novel.env.versions_path)?
            .into_iter()
            .map(|row| row.0)
            .collect();
        novel.drafts = store::read_rows::<DraftRow>(&novel.env.drafts_path)?
            .into_iter()
            .map(|row| Draft {
                version: row.version,
                stage: row.stage,
            })
            .collect();

        tracing::debug!(
            "Loaded novel '{}': {} plotlines, {} parts, {} chapters, {} versions, {} drafts",
            novel.title(),
            novel.plotlines.len(),
            novel.parts.len(),
            novel.chapters.len(),
            novel.versions.len(),
            novel.drafts.len()
        );
        Ok(novel)
    }

    fn chapter_from_row(&mut self, row: ChapterRow) -> Result<Chapter> {
        let plotline_id = row
            .plotline_tag
            .and_then(|tag| match self.find_plotline(&tag) {
                Some(plotline) => Some(plotline.id),
                None => {
                    log_dangling(EntityKind::Chapter, EntityKind::Plotline, &tag);
                    None
                }
            });
        let part_id = row.part_tag.and_then(|tag| match self.find_part(&tag) {
            Some(part) => Some(part.id),
            None => {
                log_dangling(EntityKind::Chapter, EntityKind::Part, &tag);
                None
            }
        });

        let stem_number = row
            .path
            .file_stem()
            .and_then(|stem| tag_number(&stem.to_string_lossy()))
            .filter(|n| *n > 0 && !self.chapters.iter().any(|c| c.number == *n));
        let number = match stem_number {
            Some(n) => n,
            None => {
                let n = self.next_chapter_number()?;
                tracing::warn!(
                    "Chapter file {} does not carry a free chapter number; using {}",
                    row.path.display(),
                    n
                );
                self.dirty.insert(EntityKind::Chapter);
                n
            }
        };

        Ok(Chapter {
            id: Uuid::new_v4(),
            number,
            title: row.title,
            plotline_id,
            part_id,
            path: row.path,
        })
    }

    // ============================================================
    // Persistence
    // ============================================================

    /// Rewrite every data file changed since the last save.
    pub fn save(&mut self) -> Result<()> {
        while let Some(kind) = self.dirty.first().copied() {
            self.write(kind)?;
            self.dirty.remove(&kind);
        }
        Ok(())
    }

    /// Rewrite every data file.
    pub fn save_all(&mut self) -> Result<()> {
        self.dirty.extend([
            EntityKind::Plotline,
            EntityKind::Part,
            EntityKind::Chapter,
            EntityKind::Version,
            EntityKind::Draft,
        ]);
        self.save()
    }

    pub fn is_dirty(&self, kind: EntityKind) -> bool {
        self.dirty.contains(&kind)
    }

    pub(crate) fn mark_dirty(&mut self, kinds: &[EntityKind]) {
        self.dirty.extend(kinds.iter().copied());
    }

    fn write(&self, kind: EntityKind) -> Result<()> {
        match kind {
            EntityKind::Plotline => {
                let rows: Vec<PlotlineRow> = self
                    .plotlines
                    .iter()
                    .map(|p| PlotlineRow {
                        tag: p.tag.clone(),
                        comment: p.comment.clone(),
                    })
                    .collect();
                store::write_rows(&self.env.plotlines_path, &rows)
            }
            EntityKind::Part => {
                let rows: Vec<PartRow> = self
                    .parts_preorder()
                    .into_iter()
                    .map(|p| PartRow {
                        title: p.title.clone(),
                        parent_tag: p
                            .parent_id
                            .and_then(|id| self.part(id))
                            .map(|parent| self.part_tag(parent)),
                    })
                    .collect();
                store::write_rows(&self.env.parts_path, &rows)
            }
            EntityKind::Chapter => {
                let rows: Vec<ChapterRow> = self
                    .chapters
                    .iter()
                    .map(|c| ChapterRow {
                        path: c.path.clone(),
                        plotline_tag: c
                            .plotline_id
                            .and_then(|id| self.plotline(id))
                            .map(|p| p.tag.clone()),
                        part_tag: c
                            .part_id
                            .and_then(|id| self.part(id))
                            .map(|p| self.part_tag(p)),
                        title: c.title.clone(),
                    })
                    .collect();
                store::write_rows(&self.env.chapters_path, &rows)
            }
            EntityKind::Version => {
                let rows: Vec<VersionRow> =
                    self.versions.iter().cloned().map(VersionRow).collect();
                store::write_rows(&self.env.versions_path, &rows)
            }
            EntityKind::Draft => {
                let rows: Vec<DraftRow> = self
                    .drafts
                    .iter()
                    .map(|d| DraftRow {
                        stage: d.stage.clone(),
                        version: d.version.clone(),
                    })
                    .collect();
                store::write_rows(&self.env.drafts_path, &rows)
            }
        }
    }

    // ============================================================
    // Accessors
    // ============================================================

    pub fn env(&self) -> &NovelEnvironment {
        &self.env
    }

    pub fn title(&self) -> &str {
        &self.env.settings.title
    }

    pub fn author(&self) -> Option<&str> {
        self.env.settings.author.as_deref()
    }

    /// Extension of chapter files, without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn plotlines(&self) -> &[Plotline] {
        &self.plotlines
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    /// Total number of whitespace-delimited words over all chapter files.
    ///
    /// Missing or unreadable files count as zero.
    pub fn word_count(&self) -> usize {
        self.chapters
            .iter()
            .map(|c| self.chapter_word_count(c))
            .sum()
    }

    pub fn chapter_word_count(&self, chapter: &Chapter) -> usize {
        match fs::read(self.env.resolve(&chapter.path)) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).split_whitespace().count(),
            Err(e) => {
                tracing::debug!("No words for {}: {}", chapter.path.display(), e);
                0
            }
        }
    }
}

/// Ask before deleting unless `force` is set.
fn confirm_delete(
    force: bool,
    confirm: &mut dyn Confirm,
    kind: EntityKind,
    tag: &str,
) -> Result<bool> {
    if force {
        return Ok(true);
    }
    let confirmed = confirm.confirm(&format!("Delete {} {}?", kind, tag))?;
    if !confirmed {
        tracing::info!("Kept {} {}", kind, tag);
    }
    Ok(confirmed)
}

fn log_dangling(kind: EntityKind, target: EntityKind, tag: &str) {
    let err = NovelError::DanglingReference {
        kind,
        target,
        tag: tag.to_string(),
    };
    tracing::warn!("{}; loading the reference as absent", err);
}

/// Move a file, falling back to copy and remove when a rename is not possible.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}
