//! The version-control collaborator recording binds.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::{DateTime, FixedOffset};

use crate::error::{NovelError, Result};
use crate::models::TIMESTAMP_FORMAT;

/// One commit touching a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub hash: String,
    pub timestamp: DateTime<FixedOffset>,
}

/// Stage, commit and history primitives of a version-control tool.
pub trait Vcs {
    fn stage(&self, paths: &[PathBuf]) -> Result<()>;

    fn commit(&self, message: &str) -> Result<()>;

    /// Commits touching `path`, newest first.
    fn log(&self, path: &Path) -> Result<Vec<LogEntry>>;
}

/// Separator between fields of the log format.
const LOG_SEPARATOR: char = '\t';

/// Runs `git` in the project root.
#[derive(Debug, Clone)]
pub struct GitVcs {
    program: String,
    root: PathBuf,
}

impl GitVcs {
    pub fn new(program: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            root: root.into(),
        }
    }

    fn run<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    NovelError::tool(&self.program, format!("{} is not installed", self.program))
                }
                _ => NovelError::tool(&self.program, format!("could not run: {}", e)),
            })?;
        if !output.status.success() {
            return Err(NovelError::tool(
                &self.program,
                format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(output)
    }
}

impl Vcs for GitVcs {
    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let mut args: Vec<OsString> = vec!["add".into(), "--".into()];
        args.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));
        self.run(args)?;
        tracing::debug!("Staged {} paths", paths.len());
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run(["commit", "-m", message])?;
        tracing::debug!("Committed: {}", message);
        Ok(())
    }

    fn log(&self, path: &Path) -> Result<Vec<LogEntry>> {
        let format = format!("--pretty=format:%H{}%ai", LOG_SEPARATOR);
        let output = self.run([
            OsStr::new("log"),
            OsStr::new(&format),
            OsStr::new("--"),
            path.as_os_str(),
        ])?;
        parse_log(&String::from_utf8_lossy(&output.stdout))
            .map_err(|message| NovelError::tool(&self.program, message))
    }
}

/// Parse `hash<TAB>timestamp` lines, skipping blank ones.
pub fn parse_log(stdout: &str) -> Result<Vec<LogEntry>, String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| -> Result<LogEntry, String> {
            let (hash, timestamp) = line
                .split_once(LOG_SEPARATOR)
                .ok_or_else(|| format!("unexpected log line: {}", line))?;
            let timestamp = DateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT)
                .map_err(|e| format!("unexpected log timestamp '{}': {}", timestamp, e))?;
            Ok(LogEntry {
                hash: hash.trim().to_string(),
                timestamp,
            })
        })
        .collect()
}
