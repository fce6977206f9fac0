//! Loading PDF documents from disk.
//!
//! Files are read with `tokio::fs` and parsed on the blocking pool. Several
//! files can be loaded at once; results always come back in input order,
//! because merge order is page order.
//!
//! # Examples
//!
//! ```no_run
//! use pdfsplice::io::reader::PdfReader;
//! use std::path::PathBuf;
//!
//! # async fn example() {
//! let reader = PdfReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let (results, stats) = reader.load_all(&paths, 4).await;
//! println!("{} loaded, {} failed", stats.success_count, stats.failure_count);
//! # }
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio::{fs, task};
use tracing::debug;

use super::format_file_size;
use crate::document::Document;
use crate::error::{PdfSpliceError, Result};

/// Batches up to this size are loaded one file at a time.
const SEQUENTIAL_THRESHOLD: usize = 3;

/// A parsed document together with where it came from.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The parsed document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Time taken to read and parse the file.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

impl LoadedPdf {
    /// File name of the source, for output naming and messages.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Result of loading one file.
pub type LoadResult = Result<LoadedPdf>;

/// Aggregate figures for a batch load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStatistics {
    /// Number of files successfully loaded.
    pub success_count: usize,

    /// Number of files that failed to load.
    pub failure_count: usize,

    /// Wall-clock time for the whole batch.
    pub total_time: Duration,

    /// Average time per successful load.
    pub average_time: Duration,

    /// Total size of successfully loaded files.
    pub total_size: u64,

    /// Total number of pages loaded.
    pub total_pages: usize,
}

impl LoadStatistics {
    fn from_results(results: &[LoadResult], total_time: Duration) -> Self {
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut total_size = 0;
        let mut total_pages = 0;
        let mut total_load_time = Duration::ZERO;

        for result in results {
            match result {
                Ok(loaded) => {
                    success_count += 1;
                    total_size += loaded.file_size;
                    total_pages += loaded.page_count;
                    total_load_time += loaded.load_time;
                }
                Err(_) => failure_count += 1,
            }
        }

        let average_time = u32::try_from(success_count)
            .ok()
            .filter(|&n| n > 0)
            .map_or(Duration::ZERO, |n| total_load_time / n);

        Self {
            success_count,
            failure_count,
            total_time,
            average_time,
            total_size,
            total_pages,
        }
    }

    /// Total size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Reads and parses PDF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a reader.
    pub fn new() -> Self {
        Self
    }

    /// Load a single PDF file.
    ///
    /// # Errors
    ///
    /// - `FileNotFound`, `NotAFile` or `FileNotAccessible` if the file cannot be read
    /// - `MalformedDocument` if it is not a PDF this crate can parse
    /// - `EncryptedDocument` if it is encrypted
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfsplice::io::reader::PdfReader;
    /// # use std::path::Path;
    /// # async fn example() -> pdfsplice::Result<()> {
    /// let loaded = PdfReader::new().load(Path::new("document.pdf")).await?;
    /// println!("{} pages in {:?}", loaded.page_count, loaded.load_time);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load(&self, path: &Path) -> Result<LoadedPdf> {
        let start = Instant::now();
        let bytes = read_file(path).await?;
        let file_size = bytes.len() as u64;

        let (document, page_count) = task::spawn_blocking(move || {
            let document = Document::load_mem(&bytes)?;
            let page_count = document.page_count()?;
            Ok::<_, PdfSpliceError>((document, page_count))
        })
        .await
        .map_err(|e| PdfSpliceError::other(format!("Load task failed: {e}")))??;

        let load_time = start.elapsed();
        debug!(
            path = %path.display(),
            pages = page_count,
            bytes = file_size,
            "document loaded"
        );

        Ok(LoadedPdf {
            document,
            path: path.to_path_buf(),
            page_count,
            load_time,
            file_size,
        })
    }

    /// Load files one after another.
    pub async fn load_sequential(&self, paths: &[PathBuf]) -> Vec<LoadResult> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            results.push(self.load(path).await);
        }
        results
    }

    /// Load files concurrently, at most `workers` at a time.
    ///
    /// Results are in the same order as `paths`.
    pub async fn load_parallel(&self, paths: &[PathBuf], workers: usize) -> Vec<LoadResult> {
        let reader = *self;
        stream::iter(paths.iter().cloned())
            .map(|path| async move { reader.load(&path).await })
            .buffered(workers.max(1))
            .collect()
            .await
    }

    /// Load every file, choosing sequential or concurrent loading by batch
    /// size.
    ///
    /// Returns one result per path, in order, plus batch statistics.
    pub async fn load_all(
        &self,
        paths: &[PathBuf],
        max_workers: usize,
    ) -> (Vec<LoadResult>, LoadStatistics) {
        let start = Instant::now();

        let results = if paths.len() <= SEQUENTIAL_THRESHOLD || max_workers <= 1 {
            self.load_sequential(paths).await
        } else {
            self.load_parallel(paths, max_workers).await
        };

        let stats = LoadStatistics::from_results(&results, start.elapsed());
        (results, stats)
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    let not_accessible = |source: io::Error| match source.kind() {
        io::ErrorKind::NotFound => PdfSpliceError::file_not_found(path.to_path_buf()),
        _ => PdfSpliceError::FileNotAccessible {
            path: path.to_path_buf(),
            source,
        },
    };

    let metadata = fs::metadata(path).await.map_err(not_accessible)?;
    if !metadata.is_file() {
        return Err(PdfSpliceError::not_a_file(path.to_path_buf()));
    }
    fs::read(path).await.map_err(not_accessible)
}
