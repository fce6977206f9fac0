//! Saving serialized documents.
//!
//! Outputs are written to a sibling temporary file and renamed into place,
//! so an interrupted run never leaves a truncated PDF under the final name.
//!
//! # Examples
//!
//! ```no_run
//! use pdfsplice::io::writer::PdfWriter;
//! use std::path::Path;
//!
//! # async fn example(bytes: Vec<u8>) -> pdfsplice::Result<()> {
//! let stats = PdfWriter::new().save_with_stats(bytes, Path::new("out.pdf")).await?;
//! println!("wrote {}", stats.format_file_size());
//! # Ok(())
//! # }
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::task;
use tracing::debug;

use super::format_file_size;
use crate::error::{PdfSpliceError, Result};

const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// File size as a human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Writes byte buffers to files.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    buffer_size: usize,
}

impl PdfWriter {
    /// Create a writer. Every save goes through a temporary file that is
    /// renamed over the final path.
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Save `bytes` to `path`.
    ///
    /// # Errors
    ///
    /// `FailedToCreateOutput` or `FailedToWrite` if the file system refuses.
    pub async fn save(&self, bytes: Vec<u8>, path: &Path) -> Result<()> {
        self.save_with_stats(bytes, path).await.map(|_| ())
    }

    /// Save `bytes` to `path` and report how it went.
    pub async fn save_with_stats(&self, bytes: Vec<u8>, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let buffer_size = self.buffer_size;

        let stats = task::spawn_blocking(move || {
            let start = Instant::now();
            let write_path = temp_path(&path_buf);

            let written = write_file(&write_path, &bytes, buffer_size).and_then(|()| {
                std::fs::rename(&write_path, &path_buf).map_err(|source| {
                    PdfSpliceError::FailedToWrite {
                        path: path_buf.clone(),
                        source,
                    }
                })
            });
            if written.is_err() {
                // Best effort; the original error is what matters.
                let _ = std::fs::remove_file(&write_path);
            }
            written?;

            Ok::<_, PdfSpliceError>(WriteStatistics {
                write_time: start.elapsed(),
                file_size: bytes.len() as u64,
                output_path: path_buf,
            })
        })
        .await
        .map_err(|e| PdfSpliceError::other(format!("Write task failed: {e}")))??;

        debug!(
            path = %stats.output_path.display(),
            bytes = stats.file_size,
            "output written"
        );
        Ok(stats)
    }

    /// Save several outputs as one set.
    ///
    /// Every buffer is written to its temporary file first; only when all
    /// of them are on disk are they renamed into place. If anything fails,
    /// the temporary files and any outputs already renamed are removed, so
    /// either the whole set appears or none of it does.
    pub async fn save_all(
        &self,
        outputs: Vec<(PathBuf, Vec<u8>)>,
    ) -> Result<Vec<WriteStatistics>> {
        let buffer_size = self.buffer_size;

        let stats = task::spawn_blocking(move || {
            let mut staged = Vec::with_capacity(outputs.len());
            for (path, bytes) in &outputs {
                let start = Instant::now();
                let temp = temp_path(path);
                if let Err(err) = write_file(&temp, bytes, buffer_size) {
                    let _ = std::fs::remove_file(&temp);
                    discard(staged.iter().map(|(temp, _)| temp));
                    return Err(err);
                }
                staged.push((temp, start));
            }

            let mut stats = Vec::with_capacity(outputs.len());
            let pairs = staged.iter().zip(&outputs).enumerate();
            for (index, ((temp, start), (path, bytes))) in pairs {
                if let Err(source) = std::fs::rename(temp, path) {
                    discard(outputs[..index].iter().map(|(path, _)| path));
                    discard(staged[index..].iter().map(|(temp, _)| temp));
                    return Err(PdfSpliceError::FailedToWrite {
                        path: path.clone(),
                        source,
                    });
                }
                stats.push(WriteStatistics {
                    write_time: start.elapsed(),
                    file_size: bytes.len() as u64,
                    output_path: path.clone(),
                });
            }
            Ok(stats)
        })
        .await
        .map_err(|e| PdfSpliceError::other(format!("Write task failed: {e}")))??;

        debug!(outputs = stats.len(), "output set written");
        Ok(stats)
    }

    /// Check that a file could be created at `path`, without creating it.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the parent directory is missing or read-only.
    pub async fn can_write(&self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        let metadata = match tokio::fs::metadata(parent).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PdfSpliceError::invalid_config(format!(
                    "Output directory does not exist: {}",
                    parent.display()
                )));
            }
            Err(source) => {
                return Err(PdfSpliceError::FileNotAccessible {
                    path: parent.to_path_buf(),
                    source,
                });
            }
        };

        if !metadata.is_dir() {
            return Err(PdfSpliceError::invalid_config(format!(
                "Output directory is not a directory: {}",
                parent.display()
            )));
        }
        if metadata.permissions().readonly() {
            return Err(PdfSpliceError::invalid_config(format!(
                "Output directory is not writable: {}",
                parent.display()
            )));
        }
        Ok(())
    }

    /// Check if something already exists at `path`.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// `out.pdf` → `out.pdf.tmp`, in the same directory so the rename stays on
/// one file system.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Best-effort removal; the error that triggered it is what gets reported.
fn discard<'p>(paths: impl Iterator<Item = &'p PathBuf>) {
    for path in paths {
        let _ = std::fs::remove_file(path);
    }
}

fn write_file(path: &Path, bytes: &[u8], buffer_size: usize) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| {
        PdfSpliceError::FailedToCreateOutput {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let failed = |source| PdfSpliceError::FailedToWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);
    writer.write_all(bytes).map_err(failed)?;
    writer.flush().map_err(failed)?;
    Ok(())
}
