//! Typed user settings with a fixed reference schema.
//!
//! The user file is a list of `key=value` lines; `#` starts a comment line. Loading
//! merges the file against [`REFERENCE`]: unknown keys are dropped, invalid values fall
//! back to their default and missing keys are added. When the merge changes anything the
//! previous file is kept as `<file>.<N>.old` and the merged file is written in its place.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{NovelError, Result};

/// The type a config value is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Int,
    Bool,
    Path,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Path => "path",
        }
    }

    /// Coerce a raw string to this type.
    pub fn parse(&self, raw: &str) -> Option<ConfigValue> {
        match self {
            Self::String => Some(ConfigValue::Str(raw.to_string())),
            Self::Int => raw.parse().ok().map(ConfigValue::Int),
            Self::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(ConfigValue::Bool(true)),
                "false" | "no" | "off" | "0" => Some(ConfigValue::Bool(false)),
                _ => None,
            },
            Self::Path if raw.is_empty() => None,
            Self::Path => Some(ConfigValue::Path(PathBuf::from(raw))),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved config value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Path(PathBuf),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

/// One key of the reference schema.
#[derive(Debug)]
pub struct ConfigKey {
    pub key: &'static str,
    pub doc: &'static str,
    pub default: &'static str,
    pub kind: ValueType,
}

pub const REFERENCE: &[ConfigKey] = &[
    ConfigKey {
        key: "chapter.extension",
        doc: "File extension of chapter files and bound documents",
        default: "md",
        kind: ValueType::String,
    },
    ConfigKey {
        key: "chapter.heading",
        doc: "Heading of each chapter in a bound document. Placeholders: {number}, {title}, {tag}",
        default: "Chapter {number}: {title}",
        kind: ValueType::String,
    },
    ConfigKey {
        key: "part.heading",
        doc: "Heading of each part in a bound document. Placeholders: {number}, {title}, {tag}",
        default: "Part {number}: {title}",
        kind: ValueType::String,
    },
    ConfigKey {
        key: "bind.directory",
        doc: "Directory, relative to the project root, receiving bound documents",
        default: "versions",
        kind: ValueType::Path,
    },
    ConfigKey {
        key: "editor",
        doc: "Program used to edit chapters",
        default: "vi",
        kind: ValueType::String,
    },
    ConfigKey {
        key: "vcs.program",
        doc: "Version control program recording binds",
        default: "git",
        kind: ValueType::String,
    },
    ConfigKey {
        key: "delete.confirm",
        doc: "Ask for confirmation before deleting anything",
        default: "true",
        kind: ValueType::Bool,
    },
    ConfigKey {
        key: "list.word_counts",
        doc: "Show word counts when listing chapters",
        default: "true",
        kind: ValueType::Bool,
    },
];

/// A schema key with its default and user override.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub schema: &'static ConfigKey,
    pub default: ConfigValue,
    pub current: Option<ConfigValue>,
}

impl ConfigEntry {
    pub fn value(&self) -> &ConfigValue {
        self.current.as_ref().unwrap_or(&self.default)
    }
}

/// What merging a user file against the reference schema changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Keys (or unparsable lines) not in the schema, removed from the file.
    pub dropped: Vec<String>,
    /// Keys whose value could not be coerced and fell back to the default.
    pub reset: Vec<String>,
    /// Schema keys missing from the file, added with their default.
    pub added: Vec<String>,
    /// Where the previous file was kept, if it was rewritten.
    pub backup: Option<PathBuf>,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        !(self.dropped.is_empty() && self.reset.is_empty() && self.added.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    entries: Vec<ConfigEntry>,
    report: MergeReport,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entries: REFERENCE
                .iter()
                .map(|key| ConfigEntry {
                    schema: key,
                    default: key
                        .kind
                        .parse(key.default)
                        .unwrap_or_else(|| ConfigValue::Str(key.default.to_string())),
                    current: None,
                })
                .collect(),
            report: MergeReport::default(),
        }
    }
}

impl Config {
    /// Load the reference schema merged with the user file at `user_path`, if any.
    pub fn load(user_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        let Some(path) = user_path else {
            return Ok(config);
        };

        let existed = path.exists();
        let mut seen = HashSet::new();
        if existed {
            let content = fs::read_to_string(path)?;
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let Some((key, raw)) = line.split_once('=') else {
                    config.report.dropped.push(line.to_string());
                    continue;
                };
                let (key, raw) = (key.trim(), raw.trim());
                let Some(entry) = config.entries.iter_mut().find(|e| e.schema.key == key) else {
                    config.report.dropped.push(key.to_string());
                    continue;
                };
                seen.insert(entry.schema.key);
                match entry.schema.kind.parse(raw) {
                    Some(value) => entry.current = Some(value),
                    None => config.report.reset.push(key.to_string()),
                }
            }
        }

        config.report.added = REFERENCE
            .iter()
            .filter(|key| !seen.contains(key.key))
            .map(|key| key.key.to_string())
            .collect();

        if config.report.changed() {
            if existed {
                let backup = backup_path(path);
                fs::copy(path, &backup)?;
                tracing::warn!(
                    "Config {} was merged with the reference schema (dropped: {:?}, reset: {:?}, added: {:?}); previous file kept as {}",
                    path.display(),
                    config.report.dropped,
                    config.report.reset,
                    config.report.added,
                    backup.display()
                );
                config.report.backup = Some(backup);
            } else {
                tracing::info!("Creating config {}", path.display());
            }
            config.save(path)?;
        }

        Ok(config)
    }

    pub fn report(&self) -> &MergeReport {
        &self.report
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn entry(&self, key: &str) -> Result<&ConfigEntry> {
        self.entries
            .iter()
            .find(|e| e.schema.key == key)
            .ok_or_else(|| NovelError::UnknownKey(key.to_string()))
    }

    pub fn get(&self, key: &str) -> Result<&ConfigValue> {
        self.entry(key).map(ConfigEntry::value)
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            ConfigValue::Str(s) => Ok(s),
            other => Err(mismatch(key, ValueType::String, other)),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.get(key)? {
            ConfigValue::Int(i) => Ok(*i),
            other => Err(mismatch(key, ValueType::Int, other)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.get(key)? {
            ConfigValue::Bool(b) => Ok(*b),
            other => Err(mismatch(key, ValueType::Bool, other)),
        }
    }

    pub fn get_path(&self, key: &str) -> Result<&Path> {
        match self.get(key)? {
            ConfigValue::Path(p) => Ok(p),
            other => Err(mismatch(key, ValueType::Path, other)),
        }
    }

    /// Override `key` with `raw`, coerced to the key's type.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.schema.key == key)
            .ok_or_else(|| NovelError::UnknownKey(key.to_string()))?;
        let value = entry
            .schema
            .kind
            .parse(raw)
            .ok_or_else(|| NovelError::InvalidValue {
                key: key.to_string(),
                expected: entry.schema.kind,
                value: raw.to_string(),
            })?;
        entry.current = Some(value);
        Ok(())
    }

    /// Write every key with its effective value to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        writeln!(tmp, "# makenovel configuration")?;
        for entry in &self.entries {
            writeln!(tmp)?;
            writeln!(tmp, "# {}", entry.schema.doc)?;
            writeln!(tmp, "# type: {}, default: {}", entry.schema.kind, entry.schema.default)?;
            writeln!(tmp, "{}={}", entry.schema.key, entry.value())?;
        }
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn mismatch(key: &str, expected: ValueType, value: &ConfigValue) -> NovelError {
    NovelError::InvalidValue {
        key: key.to_string(),
        expected,
        value: value.to_string(),
    }
}

/// `<path>.<N>.old` for the smallest `N >= 1` not already taken.
fn backup_path(path: &Path) -> PathBuf {
    let mut n = 1;
    loop {
        let candidate = PathBuf::from(format!("{}.{}.old", path.display(), n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
