//! pdfsplice - merge and split PDF documents in memory.
//!
//! This library reads PDF files from byte buffers, copies pages between
//! documents and writes new, self-contained PDFs. It supports:
//!
//! - Classic and stream cross-reference sections, incremental updates and
//!   compressed object streams
//! - Page copying with shared resources copied once
//! - Range expressions such as `"1-3, 5, 8-10"`
//! - Document metadata (`/Info`)
//! - Async file loading and atomic writes for command-line use
//!
//! Encrypted documents are rejected, not decrypted.
//!
//! # Examples
//!
//! ## Merge
//!
//! ```no_run
//! # fn example() -> pdfsplice::Result<()> {
//! let a = std::fs::read("a.pdf")?;
//! let b = std::fs::read("b.pdf")?;
//! let merged = pdfsplice::merge(&[a, b])?;
//! std::fs::write("merged.pdf", merged)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Split by ranges
//!
//! ```no_run
//! use pdfsplice::OutputNaming;
//!
//! # fn example() -> pdfsplice::Result<()> {
//! let source = std::fs::read("scan.pdf")?;
//! let meta = pdfsplice::get_metadata(&source)?;
//! println!("{} pages", meta.page_count);
//!
//! for (n, part) in pdfsplice::split(&source, "1-2, 5")?.iter().enumerate() {
//!     std::fs::write(OutputNaming::Extraction.file_name(n + 1), part)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Working with documents directly
//!
//! ```
//! use pdfsplice::{Document, copy_pages, serialize};
//!
//! let source = Document::new();
//! let mut target = Document::new();
//! copy_pages(&source, &[], &mut target).unwrap();
//! let bytes = serialize(&target).unwrap();
//! assert_eq!(Document::load_mem(&bytes).unwrap().page_count().unwrap(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod copier;
pub mod document;
pub mod error;
pub mod info;
pub mod io;
pub mod object;
pub mod ops;
pub mod output;
pub mod pages;
pub mod ranges;
pub mod utils;
pub mod writer;

mod parser;

// Re-export commonly used types
pub use config::Config;
pub use copier::copy_pages;
pub use document::Document;
pub use error::{PdfSpliceError, Result};
pub use info::Metadata;
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat};
pub use ops::{
    DocumentMetadata, Options, OutputNaming, get_metadata, merge, merge_with, split, split_pages,
    split_pages_with, split_with,
};
pub use pages::{PageHandle, PageTree};
pub use writer::{WriteOptions, Writer, serialize};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
