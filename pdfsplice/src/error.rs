//! Error types for pdfsplice.
//!
//! This module defines all error types that can occur while parsing,
//! assembling and writing PDF documents. Errors are designed to be
//! informative and actionable, giving the caller enough context to tell
//! the user what to fix.
//!
//! # Error Categories
//!
//! - **Document Errors**: malformed or encrypted input
//! - **Planning Errors**: malformed page-range expressions
//! - **Internal Errors**: page index guards and serialization invariants
//! - **File Errors**: file not found, permission denied, output exists, etc.

use std::io;
use std::path::PathBuf;

/// Result type alias for pdfsplice operations.
pub type Result<T> = std::result::Result<T, PdfSpliceError>;

/// Main error type for pdfsplice operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfSpliceError {
    /// Input bytes are not a parseable PDF structure.
    #[error("Malformed PDF document: {reason}")]
    MalformedDocument {
        /// What could not be located or decoded.
        reason: String,
    },

    /// Input declares an encryption dictionary.
    #[error(
        "PDF is encrypted and cannot be processed\n  \
         Hint: remove the password first (e.g. 'qpdf --decrypt') and try again"
    )]
    EncryptedDocument,

    /// A page index went past the end of the page tree.
    #[error("Page index {index} is out of range (document has {page_count} page(s))")]
    PageIndexOutOfRange {
        /// Requested 0-based index.
        index: usize,
        /// Number of pages in the document.
        page_count: usize,
    },

    /// A range-expression token is neither a page number nor a span.
    #[error(
        "Invalid page range '{token}'\n  \
         Use page numbers and spans separated by commas, e.g. \"1-3, 5, 8-10\""
    )]
    MalformedExpression {
        /// The offending token, trimmed.
        token: String,
    },

    /// Internal invariant violation while writing a document.
    #[error("Failed to serialize PDF: {reason}")]
    Serialization {
        /// Description of the violated invariant.
        reason: String,
    },

    /// Nothing was given to merge.
    #[error("No input documents specified for merging")]
    NoDocuments,

    /// One of several merge inputs failed.
    #[error("Input #{} could not be used: {source}", .index + 1)]
    SourceFailed {
        /// 0-based position of the failing input.
        index: usize,
        /// Underlying error.
        #[source]
        source: Box<PdfSpliceError>,
    },

    /// Input file was not found.
    #[error("File not found: {}", .path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input path is not a regular file.
    #[error("Not a file: {}", .path.display())]
    NotAFile {
        /// Path that is not a file.
        path: PathBuf,
    },

    /// Input file is not accessible (permission denied, etc.).
    #[error("Cannot access file: {}\n  Reason: {source}", .path.display())]
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  \
         Use --force to overwrite or choose a different output path",
        .path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", .path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", .path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to read input list file.
    #[error("Failed to read input list file: {}\n  Reason: {source}", .path.display())]
    FailedToReadInputList {
        /// Path to the input list file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<anyhow::Error> for PdfSpliceError {
    fn from(err: anyhow::Error) -> Self {
        Self::invalid_config(format!("{err:#}"))
    }
}

impl PdfSpliceError {
    /// Create a MalformedDocument error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }

    /// Create a MalformedExpression error.
    pub fn malformed_expression(token: impl Into<String>) -> Self {
        Self::MalformedExpression {
            token: token.into(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }

    /// Wrap the error of merge input `index`.
    pub fn source_failed(index: usize, source: PdfSpliceError) -> Self {
        Self::SourceFailed {
            index,
            source: Box::new(source),
        }
    }

    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: PathBuf) -> Self {
        Self::NotAFile { path }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// The innermost error, looking through `SourceFailed` wrappers.
    pub fn kind(&self) -> &PdfSpliceError {
        match self {
            Self::SourceFailed { source, .. } => source.kind(),
            other => other,
        }
    }

    /// Check whether the input was rejected for being encrypted.
    pub fn is_encrypted(&self) -> bool {
        matches!(self.kind(), Self::EncryptedDocument)
    }

    /// Check if this error was caused by user input rather than a defect.
    ///
    /// Returns false for `PageIndexOutOfRange` and `Serialization`, which
    /// signal a bug in page planning or copying.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self.kind(),
            Self::PageIndexOutOfRange { .. } | Self::Serialization { .. }
        )
    }

    /// Get the exit code for this error.
    ///
    /// Returns the appropriate process exit code based on error type.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            Self::FileNotFound { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::FailedToReadInputList { .. } => 2,
            Self::MalformedDocument { .. } => 3,
            Self::EncryptedDocument => 3,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::Io { .. } => 5,
            Self::PageIndexOutOfRange { .. } => 70,
            Self::Serialization { .. } => 70,
            Self::MalformedExpression { .. } => 1,
            Self::NoDocuments => 1,
            Self::InvalidConfig { .. } => 1,
            Self::Other { .. } => 1,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::SourceFailed { source, .. } => source.exit_code(),
        }
    }
}
