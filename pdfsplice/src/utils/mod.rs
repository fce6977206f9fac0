//! Input path collection: glob expansion and input list files.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::{PdfSpliceError, Result};

/// Expand glob patterns into file system paths, keeping pattern order.
///
/// Matches of one pattern come back sorted. A pattern without glob
/// metacharacters is passed through unchanged even if nothing exists there,
/// so that loading it reports a proper "file not found" later.
///
/// # Errors
///
/// `InvalidConfig` for a pattern `glob` cannot parse or for a pattern that
/// matches nothing; `FileNotAccessible` if a directory cannot be read while
/// matching.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();
    for pattern in patterns {
        resolved_paths.extend(collect_paths_for_pattern(pattern.as_ref())?);
    }
    Ok(resolved_paths)
}

fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    if !is_glob(pattern) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let entries = glob::glob(pattern).map_err(|err| {
        PdfSpliceError::invalid_config(format!("Invalid glob pattern '{pattern}': {err}"))
    })?;

    let mut resolved_paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| PdfSpliceError::FileNotAccessible {
            path: err.path().to_path_buf(),
            source: err.into(),
        })?;
        resolved_paths.push(path);
    }

    if resolved_paths.is_empty() {
        return Err(PdfSpliceError::invalid_config(format!(
            "Pattern '{pattern}' matched no files"
        )));
    }
    Ok(resolved_paths)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Read input paths from a list file, one per line.
///
/// Blank lines and lines starting with `#` are skipped; surrounding
/// whitespace is trimmed.
///
/// # Errors
///
/// `FailedToReadInputList` if the file cannot be opened or read.
pub async fn read_input_list(path: &Path) -> Result<Vec<PathBuf>> {
    let failed = |source| PdfSpliceError::FailedToReadInputList {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(failed)?;
    let mut lines = BufReader::new(file).lines();
    let mut paths = Vec::new();

    while let Some(line) = lines.next_line().await.map_err(failed)? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        paths.push(PathBuf::from(line));
    }

    Ok(paths)
}
