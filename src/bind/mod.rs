//! Binding: compile the novel into one document and record it in the VCS history.
//!
//! A bind moves through `Idle → Compiling → Staging → Committing → Recorded`, or ends
//! in `Failed` at the step that went wrong. The document is committed first and its
//! commit looked up in the VCS log; only then is the version (or draft) appended,
//! saved and committed in a second commit. A failure after the first commit leaves the
//! bound document in the history without a record, which the next bind does not reuse.

mod compile;

use std::fs;
use std::path::PathBuf;

pub use compile::{compile, format_heading};

use crate::config::Config;
use crate::error::{NovelError, Result};
use crate::models::*;
use crate::novel::Novel;
use crate::vcs::Vcs;

/// Progress of a bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindState {
    Idle,
    Compiling,
    Staging,
    Committing,
    Recorded,
    Failed(String),
}

pub struct Binder<'a, V: Vcs + ?Sized> {
    novel: &'a mut Novel,
    config: &'a Config,
    vcs: &'a V,
    state: BindState,
}

impl<'a, V: Vcs + ?Sized> Binder<'a, V> {
    pub fn new(novel: &'a mut Novel, config: &'a Config, vcs: &'a V) -> Self {
        Self {
            novel,
            config,
            vcs,
            state: BindState::Idle,
        }
    }

    pub fn state(&self) -> &BindState {
        &self.state
    }

    fn transition(&mut self, next: BindState) {
        tracing::debug!("Bind {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Bind the novel as a new version, or as a draft when `stage` is given.
    pub fn bind(&mut self, comment: Option<String>, stage: Option<String>) -> Result<Bound> {
        match self.run(comment.filter(|c| !c.is_empty()), stage.filter(|s| !s.is_empty())) {
            Ok(bound) => {
                self.transition(BindState::Recorded);
                tracing::info!(
                    "Bound {} as {}",
                    bound.number(),
                    bound.version().path.display()
                );
                Ok(bound)
            }
            Err(e) => {
                self.transition(BindState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    fn run(&mut self, comment: Option<String>, stage: Option<String>) -> Result<Bound> {
        self.transition(BindState::Compiling);
        let document = compile(self.novel, self.config)?;
        let (kind, number) = match stage {
            Some(_) => (EntityKind::Draft, self.novel.next_draft_number()),
            None => (EntityKind::Version, self.novel.next_version_number()),
        };
        let output = self.output_path(stage.as_deref(), number)?;
        let output_file = self.novel.env().resolve(&output);
        if let Some(dir) = output_file.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&output_file, document)?;

        self.transition(BindState::Staging);
        self.vcs.stage(&[output_file.clone()])?;

        self.transition(BindState::Committing);
        let message = match &comment {
            Some(comment) => format!("Bind {} {}: {}", kind, number, comment),
            None => format!("Bind {} {}", kind, number),
        };
        self.vcs.commit(&message)?;
        let commit = self
            .vcs
            .log(&output_file)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                NovelError::tool(
                    "vcs",
                    format!("no commit found for {}", output_file.display()),
                )
            })?;

        let version = Version {
            path: output,
            vcs_hash: commit.hash,
            comment,
            timestamp: commit.timestamp,
        };
        let (bound, record_file) = match stage {
            Some(stage) => {
                let draft = Draft { version, stage };
                let number = self.novel.record_draft(draft.clone());
                (
                    Bound::Draft { number, draft },
                    self.novel.env().drafts_path.clone(),
                )
            }
            None => {
                let number = self.novel.record_version(version.clone());
                (
                    Bound::Version { number, version },
                    self.novel.env().versions_path.clone(),
                )
            }
        };
        self.novel.save()?;

        self.vcs.stage(&[record_file])?;
        self.vcs
            .commit(&format!("Record {} {}", kind, bound.number()))?;
        Ok(bound)
    }

    /// `<bind.directory>/<title>_<number>.<ext>`, with the stage before the number for
    /// drafts. The number is bumped past documents left by deleted records.
    fn output_path(&self, stage: Option<&str>, number: usize) -> Result<PathBuf> {
        let dir = self.config.get_path("bind.directory")?;
        let stem = match machine_str(self.novel.title()) {
            stem if stem.is_empty() => "novel".to_string(),
            stem => stem,
        };
        let extension = self.novel.extension();

        let mut n = number;
        loop {
            let name = match stage {
                Some(stage) => format!("{}_{}_{}.{}", stem, machine_str(stage), n, extension),
                None => format!("{}_{}.{}", stem, n, extension),
            };
            let path = dir.join(name);
            if !self.novel.env().resolve(&path).exists() {
                return Ok(path);
            }
            n += 1;
        }
    }
}
