//! Page range planning.
//!
//! A range expression is a comma-separated list of tokens, each either a
//! page number (`5`) or an inclusive span (`8-10`), with 1-based page
//! numbers. Every token becomes one [`PageRange`], and every non-empty
//! range later becomes one output document.

use tracing::debug;

use crate::error::{PdfSpliceError, Result};

/// Pages selected by one token, ascending and contiguous, 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRange {
    pages: Vec<usize>,
}

impl PageRange {
    fn span(start: usize, end: usize, page_count: usize) -> Self {
        let lo = start.max(1);
        let hi = end.min(page_count);
        if start > end || lo > hi {
            return Self::default();
        }
        Self {
            pages: (lo..=hi).collect(),
        }
    }

    /// The 1-based page numbers.
    pub fn pages(&self) -> &[usize] {
        &self.pages
    }

    /// The pages as 0-based indices.
    pub fn indices(&self) -> Vec<usize> {
        self.pages.iter().map(|page| page - 1).collect()
    }

    /// Number of pages selected.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the token selected no existing page.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Turn `expression` into one [`PageRange`] per comma-separated token.
///
/// Page numbers outside `1..=page_count` are dropped, and a span whose start
/// exceeds its end selects nothing; both give empty ranges rather than
/// errors. Empty tokens (as in `"1,,2"`) give empty ranges too.
///
/// # Errors
///
/// `MalformedExpression` naming the first token that is neither a number
/// nor a `N-M` span (signs, letters, `3-`, `1-2-3`, ...). Nothing is planned
/// when any token is malformed.
///
/// # Examples
///
/// ```
/// use pdfsplice::ranges::plan;
///
/// let ranges = plan("1, 3-4, 9", 5).unwrap();
/// assert_eq!(ranges[0].pages(), &[1]);
/// assert_eq!(ranges[1].pages(), &[3, 4]);
/// assert!(ranges[2].is_empty());
/// ```
pub fn plan(expression: &str, page_count: usize) -> Result<Vec<PageRange>> {
    let ranges = expression
        .split(',')
        .map(|token| parse_token(token.trim(), page_count))
        .collect::<Result<Vec<_>>>()?;
    debug!(
        expression,
        page_count,
        ranges = ranges.len(),
        non_empty = ranges.iter().filter(|r| !r.is_empty()).count(),
        "range expression planned"
    );
    Ok(ranges)
}

/// One single-page range per page, in order.
pub fn all_pages(page_count: usize) -> Vec<PageRange> {
    (1..=page_count)
        .map(|page| PageRange { pages: vec![page] })
        .collect()
}

fn parse_token(token: &str, page_count: usize) -> Result<PageRange> {
    if token.is_empty() {
        return Ok(PageRange::default());
    }
    let malformed = || PdfSpliceError::malformed_expression(token);

    match token.split_once('-') {
        Some((start, end)) => {
            let start = page_number(start.trim()).ok_or_else(malformed)?;
            let end = page_number(end.trim()).ok_or_else(malformed)?;
            Ok(PageRange::span(start, end, page_count))
        }
        None => {
            let page = page_number(token).ok_or_else(malformed)?;
            Ok(PageRange::span(page, page, page_count))
        }
    }
}

/// ASCII digits only. Values too large for `usize` saturate, which puts them
/// past any real page count.
fn page_number(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(text.parse().unwrap_or(usize::MAX))
}
