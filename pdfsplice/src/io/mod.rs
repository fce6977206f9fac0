//! File I/O around the in-memory operations.
//!
//! The core of the crate works on byte buffers. This module connects it to
//! the file system for the CLI and for callers that prefer paths:
//! - Loading documents from disk, several at a time
//! - Writing outputs atomically
//! - Load and write statistics
//!
//! Parsing and serialization are CPU-bound, so both run on tokio's blocking
//! pool.
//!
//! # Examples
//!
//! ```no_run
//! use pdfsplice::io::{PdfReader, PdfWriter};
//! use pdfsplice::{WriteOptions, Writer};
//! use std::path::Path;
//!
//! # async fn example() -> pdfsplice::Result<()> {
//! let loaded = PdfReader::new().load(Path::new("input.pdf")).await?;
//! let bytes = Writer::new(WriteOptions::default()).serialize(&loaded.document)?;
//! PdfWriter::new().save(bytes, Path::new("copy.pdf")).await?;
//! # Ok(())
//! # }
//! ```

pub mod reader;
pub mod writer;

pub use reader::{LoadResult, LoadStatistics, LoadedPdf, PdfReader};
pub use writer::{PdfWriter, WriteStatistics};

/// Format a byte count as a human-readable size.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
