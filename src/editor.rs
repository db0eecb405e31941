use std::io;
use std::path::Path;
use std::process::Command;

use crate::error::{NovelError, Result};

/// Open `path` in `program` and wait for the editor to exit.
///
/// `program` may carry arguments, e.g. `code --wait`.
pub fn open_in_editor(program: &str, path: &Path) -> Result<()> {
    let mut words = program.split_whitespace();
    let Some(executable) = words.next() else {
        return Err(NovelError::tool(program, "no editor configured"));
    };

    tracing::debug!("Opening {} with {}", path.display(), program);
    let status = Command::new(executable)
        .args(words)
        .arg(path)
        .status()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                NovelError::tool(executable, format!("{} is not installed", executable))
            }
            _ => NovelError::tool(executable, format!("could not run: {}", e)),
        })?;
    if !status.success() {
        return Err(NovelError::tool(executable, format!("exited with {}", status)));
    }
    Ok(())
}
