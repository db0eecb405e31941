//! Project root discovery and the paths of the project's data files.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{NovelError, Result};

/// Name of the directory holding a project's data files.
pub const DATA_DIR: &str = ".novel";

const NOVEL_FILE: &str = "novel";
const PARTS_FILE: &str = "parts.csv";
const PLOTLINES_FILE: &str = "plotlines.csv";
const CHAPTERS_FILE: &str = "chapters.csv";
const VERSIONS_FILE: &str = "versions.csv";
const DRAFTS_FILE: &str = "drafts.csv";

/// Settings read from `.novel/novel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovelSettings {
    pub title: String,
    pub author: Option<String>,
    /// User config file, relative to the project root unless absolute.
    pub config: Option<PathBuf>,
}

/// A loaded project: its root, its data files and its settings.
#[derive(Debug, Clone)]
pub struct NovelEnvironment {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub novel_path: PathBuf,
    pub parts_path: PathBuf,
    pub plotlines_path: PathBuf,
    pub chapters_path: PathBuf,
    pub versions_path: PathBuf,
    pub drafts_path: PathBuf,
    pub settings: NovelSettings,
}

impl NovelEnvironment {
    /// Find the project containing `start`, walking up to the first directory that has a
    /// `.novel` directory.
    pub fn discover(start: &Path) -> Result<Self> {
        let start = start.canonicalize()?;
        let root = start
            .ancestors()
            .find(|dir| dir.join(DATA_DIR).is_dir())
            .ok_or_else(|| NovelError::NotAProject(start.clone()))?;
        Self::load(root)
    }

    /// Load the project rooted at `root`, creating any missing data file.
    pub fn load(root: &Path) -> Result<Self> {
        let data_dir = root.join(DATA_DIR);
        if !data_dir.is_dir() {
            return Err(NovelError::NotAProject(root.to_path_buf()));
        }

        let mut env = Self {
            root: root.to_path_buf(),
            novel_path: data_dir.join(NOVEL_FILE),
            parts_path: data_dir.join(PARTS_FILE),
            plotlines_path: data_dir.join(PLOTLINES_FILE),
            chapters_path: data_dir.join(CHAPTERS_FILE),
            versions_path: data_dir.join(VERSIONS_FILE),
            drafts_path: data_dir.join(DRAFTS_FILE),
            data_dir,
            settings: NovelSettings {
                title: String::new(),
                author: None,
                config: None,
            },
        };

        env.ensure_data_files()?;
        env.settings = read_settings(&env.novel_path, root)?;
        tracing::debug!("Loaded project '{}' at {}", env.settings.title, root.display());
        Ok(env)
    }

    fn ensure_data_files(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        for path in self.data_files() {
            if !path.exists() {
                tracing::debug!("Creating missing data file {}", path.display());
                OpenOptions::new().create(true).append(true).open(path)?;
            }
        }
        Ok(())
    }

    /// Every data file, in load order.
    pub fn data_files(&self) -> [&Path; 6] {
        [
            &self.novel_path,
            &self.plotlines_path,
            &self.parts_path,
            &self.chapters_path,
            &self.versions_path,
            &self.drafts_path,
        ]
    }

    /// The user config file: the project's `config` setting, else
    /// `~/.makenovel/makenovel.cfg`.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.settings.config {
            Some(path) if path.is_absolute() => Some(path.clone()),
            Some(path) => Some(self.root.join(path)),
            None => default_config_path(),
        }
    }

    /// Directory holding the chapters of the plotline tagged `tag`.
    pub fn plotline_dir(&self, tag: &str) -> PathBuf {
        self.root.join(tag)
    }

    /// Resolve a path stored relative to the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".makenovel").join("makenovel.cfg"))
}

fn read_settings(path: &Path, root: &Path) -> Result<NovelSettings> {
    let content = fs::read_to_string(path)?;
    let mut settings = NovelSettings {
        title: String::new(),
        author: None,
        config: None,
    };

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            tracing::warn!("Ignoring line without '=' in {}: {}", path.display(), line);
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "title" => settings.title = value.to_string(),
            "author" if !value.is_empty() => settings.author = Some(value.to_string()),
            "config" if !value.is_empty() => settings.config = Some(PathBuf::from(value)),
            other => tracing::debug!("Ignoring novel setting '{}'", other),
        }
    }

    if settings.title.is_empty() {
        settings.title = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string());
    }
    Ok(settings)
}
