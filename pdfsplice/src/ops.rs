//! Whole-document operations on byte buffers.
//!
//! These are the entry points most callers need: inspect a PDF, merge
//! several PDFs into one, or split one PDF into several. Each call parses its
//! inputs, builds fresh output documents and serializes them; nothing is
//! shared between calls.

use serde::Serialize;
use tracing::{debug, info};

use crate::copier::{CopySource, copy_from, copy_pages};
use crate::document::Document;
use crate::error::{PdfSpliceError, Result};
use crate::info::{self, DocumentInfo, Metadata};
use crate::ranges::{self, PageRange};
use crate::writer::{WriteOptions, Writer};

/// Summary of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Number of pages found by walking the page tree.
    pub page_count: usize,
    /// Header version, e.g. `"1.7"`.
    pub version: String,
    /// Number of objects in the cross-reference data.
    pub object_count: usize,
    /// `/Title` from the information dictionary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `/Author`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// `/Subject`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// `/Keywords`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// `/Producer`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    /// `/Creator`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

/// Settings shared by [`merge_with`] and [`split_with`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Descriptive metadata written to every output.
    pub metadata: Metadata,
    /// Serializer settings.
    pub write: WriteOptions,
}

/// How split outputs are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNaming {
    /// `<basename>_page_<n>.pdf`, used when every page becomes its own file.
    PerPage {
        /// Input file name without its `.pdf` extension.
        basename: String,
    },
    /// `extraction_<n>.pdf`, used for range expressions.
    Extraction,
}

impl OutputNaming {
    /// Per-page naming derived from an input file name.
    pub fn per_page(file_name: &str) -> Self {
        Self::PerPage {
            basename: basename(file_name).to_string(),
        }
    }

    /// File name of output number `n` (1-based).
    pub fn file_name(&self, n: usize) -> String {
        match self {
            Self::PerPage { basename } => format!("{basename}_page_{n}.pdf"),
            Self::Extraction => format!("extraction_{n}.pdf"),
        }
    }
}

/// `file_name` with one trailing `.pdf` removed, compared case-insensitively.
pub fn basename(file_name: &str) -> &str {
    let len = file_name.len();
    if len >= 4
        && file_name.is_char_boundary(len - 4)
        && file_name[len - 4..].eq_ignore_ascii_case(".pdf")
    {
        &file_name[..len - 4]
    } else {
        file_name
    }
}

/// Parse `bytes` and summarise the document.
///
/// # Errors
///
/// `MalformedDocument` or `EncryptedDocument` from parsing.
///
/// # Examples
///
/// ```
/// use pdfsplice::{Document, get_metadata, serialize};
///
/// let bytes = serialize(&Document::new()).unwrap();
/// assert_eq!(get_metadata(&bytes).unwrap().page_count, 0);
/// ```
pub fn get_metadata(bytes: &[u8]) -> Result<DocumentMetadata> {
    let doc = Document::load_mem(bytes)?;
    describe(&doc)
}

/// Summarise an already parsed document.
pub fn describe(doc: &Document) -> Result<DocumentMetadata> {
    let info = DocumentInfo::read(doc);
    Ok(DocumentMetadata {
        page_count: doc.page_count()?,
        version: doc.version().to_string(),
        object_count: doc.object_count(),
        title: info.title,
        author: info.author,
        subject: info.subject,
        keywords: info.keywords,
        producer: info.producer,
        creator: info.creator,
    })
}

/// Concatenate all pages of every source, in order, into one document.
///
/// # Errors
///
/// - `NoDocuments` when `sources` is empty
/// - `SourceFailed` wrapping the first source that cannot be parsed
pub fn merge<S: AsRef<[u8]>>(sources: &[S]) -> Result<Vec<u8>> {
    merge_with(sources, &Options::default())
}

/// [`merge`] with explicit options.
pub fn merge_with<S: AsRef<[u8]>>(sources: &[S], options: &Options) -> Result<Vec<u8>> {
    let docs = sources
        .iter()
        .enumerate()
        .map(|(index, bytes)| {
            Document::load_mem(bytes.as_ref())
                .map_err(|err| PdfSpliceError::source_failed(index, err))
        })
        .collect::<Result<Vec<_>>>()?;
    merge_documents(&docs, options)
}

/// Merge documents that are already parsed.
pub fn merge_documents(docs: &[Document], options: &Options) -> Result<Vec<u8>> {
    if docs.is_empty() {
        return Err(PdfSpliceError::NoDocuments);
    }

    let mut target = Document::new();
    target.set_version(highest_version(docs));
    let mut total = 0;
    for (index, doc) in docs.iter().enumerate() {
        let count = doc
            .page_count()
            .map_err(|err| PdfSpliceError::source_failed(index, err))?;
        let indices: Vec<usize> = (0..count).collect();
        copy_pages(doc, &indices, &mut target)
            .map_err(|err| PdfSpliceError::source_failed(index, err))?;
        debug!(source = index + 1, pages = count, "source appended");
        total += count;
    }

    info::stamp(&mut target, &options.metadata);
    let bytes = Writer::new(options.write).serialize(&target)?;
    info!(
        sources = docs.len(),
        pages = total,
        bytes = bytes.len(),
        "merge complete"
    );
    Ok(bytes)
}

/// Split `source` into one document per non-empty range of `expression`.
///
/// Ranges that select no existing page produce no output, so the result
/// may be empty.
///
/// # Errors
///
/// - `MalformedDocument` / `EncryptedDocument` from parsing
/// - `MalformedExpression` for a bad token; no document is produced
///
/// # Examples
///
/// ```no_run
/// # fn example(pdf: &[u8]) -> pdfsplice::Result<()> {
/// let parts = pdfsplice::split(pdf, "1-3, 5")?;
/// for (n, part) in parts.iter().enumerate() {
///     std::fs::write(format!("extraction_{}.pdf", n + 1), part)?;
/// }
/// # Ok(())
/// # }
/// ```
pub fn split(source: &[u8], expression: &str) -> Result<Vec<Vec<u8>>> {
    split_with(source, expression, &Options::default())
}

/// [`split`] with explicit options.
pub fn split_with(source: &[u8], expression: &str, options: &Options) -> Result<Vec<Vec<u8>>> {
    let doc = Document::load_mem(source)?;
    let plan = ranges::plan(expression, doc.page_count()?)?;
    extract_ranges(&doc, &plan, options)
}

/// Split `source` into one document per page.
pub fn split_pages(source: &[u8]) -> Result<Vec<Vec<u8>>> {
    split_pages_with(source, &Options::default())
}

/// [`split_pages`] with explicit options.
pub fn split_pages_with(source: &[u8], options: &Options) -> Result<Vec<Vec<u8>>> {
    let doc = Document::load_mem(source)?;
    let plan = ranges::all_pages(doc.page_count()?);
    extract_ranges(&doc, &plan, options)
}

/// Build one output per non-empty range of `plan`.
pub fn extract_ranges(
    doc: &Document,
    plan: &[PageRange],
    options: &Options,
) -> Result<Vec<Vec<u8>>> {
    let writer = Writer::new(options.write);
    let source = CopySource::new(doc)?;
    let mut outputs = Vec::new();
    for range in plan.iter().filter(|range| !range.is_empty()) {
        let mut target = Document::new();
        target.set_version(doc.version());
        copy_from(&source, &range.indices(), &mut target)?;
        info::stamp(&mut target, &options.metadata);
        outputs.push(writer.serialize(&target)?);
    }
    info!(
        ranges = plan.len(),
        outputs = outputs.len(),
        "split complete"
    );
    Ok(outputs)
}

/// The highest `major.minor` version among `docs`.
fn highest_version(docs: &[Document]) -> String {
    let parse = |version: &str| {
        let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
        (parts.next().unwrap_or(1), parts.next().unwrap_or(0))
    };
    docs.iter()
        .map(Document::version)
        .max_by_key(|version| parse(*version))
        .unwrap_or(crate::document::DEFAULT_VERSION)
        .to_string()
}
