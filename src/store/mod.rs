//! Flat CSV files, one per entity kind, where row order is entity order.

mod rows;

use std::fs;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{NovelError, Result};

pub use rows::*;

/// Read every row of `path`. A missing file reads as empty.
///
/// Fails with [`NovelError::MalformedRow`] on the first row whose arity or fields do not
/// match `R`.
pub fn read_rows<R: Row>(path: &Path) -> Result<Vec<R>> {
    if !path.exists() {
        tracing::debug!("{} file {} does not exist yet", R::KIND, path.display());
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if record.len() != R::ARITY {
            return Err(NovelError::MalformedRow {
                path: path.to_path_buf(),
                line,
                reason: format!(
                    "expected {} fields for a {} row, found {}",
                    R::ARITY,
                    R::KIND,
                    record.len()
                ),
            });
        }
        let fields: Vec<&str> = record.iter().collect();
        let row = R::from_fields(&fields).map_err(|reason| NovelError::MalformedRow {
            path: path.to_path_buf(),
            line,
            reason,
        })?;
        rows.push(row);
    }

    tracing::debug!("Loaded {} {} rows from {}", rows.len(), R::KIND, path.display());
    Ok(rows)
}

/// Replace `path` with `rows`, one row per entry in order.
///
/// The rows are written to a temporary file next to `path` which is then renamed over
/// it, so readers see either the old or the new file.
pub fn write_rows<R: Row>(path: &Path, rows: &[R]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let tmp = NamedTempFile::new_in(parent)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(tmp);
    for row in rows {
        writer.write_record(row.to_fields())?;
    }
    writer.flush()?;
    let tmp = writer.into_inner().map_err(|e| e.into_error())?;
    tmp.persist(path).map_err(|e| e.error)?;

    tracing::debug!("Saved {} {} rows to {}", rows.len(), R::KIND, path.display());
    Ok(())
}
