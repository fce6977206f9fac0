//! Cross-reference reading.
//!
//! Locates the newest cross-reference section through `startxref`, then
//! walks the `/Prev` chain back through every incremental update. Both
//! classic `xref` tables and cross-reference streams are understood, as is
//! the hybrid layout where a classic trailer points at an `/XRefStm`.
//!
//! Entries are merged newest-first: once an object number has an entry, older
//! sections cannot replace it.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, trace, warn};

use super::lexer::{Token, is_whitespace};
use super::{Parser, find, rfind};
use crate::error::{PdfSpliceError, Result};
use crate::object::{Dictionary, Object, Stream};

/// How far from each end of the file the header and `startxref` may sit.
const SEARCH_WINDOW: usize = 1024;

/// Upper bound on `/Prev` hops.
const MAX_SECTIONS: usize = 4096;

/// Where an object lives, according to the cross-reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum XrefEntry {
    /// Deleted or never used.
    Free,
    /// `N G obj` at a byte offset (as written in the file).
    InUse { offset: usize, generation: u16 },
    /// Member `index` of object stream `stream`.
    Compressed { stream: u32, index: u32 },
}

/// Merged cross-reference data of a file.
#[derive(Debug, Default)]
pub(crate) struct CrossReference {
    pub entries: BTreeMap<u32, XrefEntry>,
    pub trailer: Dictionary,
}

impl CrossReference {
    fn insert(&mut self, num: u32, entry: XrefEntry) {
        self.entries.entry(num).or_insert(entry);
    }

    fn merge_trailer(&mut self, older: Dictionary) {
        for (key, value) in older.iter() {
            if !self.trailer.has(key) {
                self.trailer.set(key, value.clone());
            }
        }
    }
}

/// PDF header position and version string.
pub(crate) fn read_header(data: &[u8]) -> Result<(usize, String)> {
    let window = &data[..data.len().min(SEARCH_WINDOW)];
    let pos = find(window, b"%PDF-")
        .ok_or_else(|| PdfSpliceError::malformed("no %PDF- header in the first 1024 bytes"))?;

    let version: String = data[pos + 5..]
        .iter()
        .take_while(|&&b| b.is_ascii_digit() || b == b'.')
        .map(|&b| b as char)
        .collect();
    let version = if version.is_empty() {
        warn!("header carries no version number, assuming 1.4");
        "1.4".to_string()
    } else {
        version
    };
    Ok((pos, version))
}

/// Read and merge every cross-reference section of `data`.
///
/// `shift` is the header position: offsets that do not land on a section or
/// object as written are retried shifted by it.
pub(crate) fn read(data: &[u8], shift: usize) -> Result<CrossReference> {
    let start = find_startxref(data)?;
    let mut xref = CrossReference::default();
    let mut visited = HashSet::new();
    let mut next = Some(start);
    let mut first = true;

    while let Some(offset) = next.take() {
        if !visited.insert(offset) {
            warn!(offset, "cross-reference /Prev chain loops, stopping");
            break;
        }
        if visited.len() > MAX_SECTIONS {
            warn!("too many cross-reference sections, stopping");
            break;
        }

        let section = match read_section(data, offset, shift) {
            Ok(section) => section,
            Err(err) if first => return Err(err),
            Err(err) => {
                warn!(offset, error = %err, "ignoring unreadable older cross-reference section");
                break;
            }
        };
        first = false;

        let mut free = Vec::new();
        for (num, entry) in section.entries {
            if entry == XrefEntry::Free {
                free.push(num);
            } else {
                xref.insert(num, entry);
            }
        }
        if let Some(stm) = section.trailer.get(b"XRefStm").and_then(Object::as_i64) {
            match usize::try_from(stm)
                .map_err(|_| PdfSpliceError::malformed("negative /XRefStm"))
                .and_then(|stm| read_section(data, stm, shift))
            {
                Ok(hybrid) => {
                    for (num, entry) in hybrid.entries {
                        xref.insert(num, entry);
                    }
                }
                Err(err) => warn!(error = %err, "ignoring unreadable /XRefStm"),
            }
        }
        for num in free {
            xref.insert(num, XrefEntry::Free);
        }

        next = section
            .trailer
            .get(b"Prev")
            .and_then(Object::as_i64)
            .and_then(|prev| usize::try_from(prev).ok());
        xref.merge_trailer(section.trailer);
    }

    debug!(
        entries = xref.entries.len(),
        sections = visited.len(),
        "cross-reference loaded"
    );
    Ok(xref)
}

struct Section {
    entries: Vec<(u32, XrefEntry)>,
    trailer: Dictionary,
}

fn find_startxref(data: &[u8]) -> Result<usize> {
    let tail_start = data.len().saturating_sub(SEARCH_WINDOW);
    let pos = rfind(&data[tail_start..], b"startxref")
        .map(|p| tail_start + p)
        .or_else(|| rfind(data, b"startxref"))
        .ok_or_else(|| PdfSpliceError::malformed("startxref not found"))?;

    let mut parser = Parser::new(data, pos + b"startxref".len());
    match parser.lexer().next_token()? {
        Some(Token::Integer(offset)) if offset >= 0 => Ok(offset as usize),
        _ => Err(PdfSpliceError::malformed("startxref is not followed by an offset")),
    }
}

/// Whether something that looks like a section or an object starts at `pos`.
fn looks_like_section(data: &[u8], mut pos: usize) -> bool {
    while data.get(pos).is_some_and(|&b| is_whitespace(b)) {
        pos += 1;
    }
    match data.get(pos) {
        Some(b'x') => data[pos..].starts_with(b"xref"),
        Some(b) if b.is_ascii_digit() => {
            let mut parser = Parser::new(data, pos);
            matches!(
                (
                    parser.lexer().next_token(),
                    parser.lexer().next_token(),
                    parser.lexer().next_token(),
                ),
                (Ok(Some(Token::Integer(_))), Ok(Some(Token::Integer(_))), Ok(Some(kw)))
                    if kw.is_keyword(b"obj")
            )
        }
        _ => false,
    }
}

fn read_section(data: &[u8], offset: usize, shift: usize) -> Result<Section> {
    let pos = [offset, offset.saturating_add(shift)]
        .into_iter()
        .filter(|&p| p < data.len())
        .find(|&p| looks_like_section(data, p))
        .ok_or_else(|| {
            PdfSpliceError::malformed(format!(
                "no cross-reference section at offset {offset}"
            ))
        })?;

    let mut parser = Parser::new(data, pos);
    parser.lexer().skip_whitespace();
    if data[parser.position()..].starts_with(b"xref") {
        trace!(offset = pos, "classic cross-reference table");
        classic_section(parser)
    } else {
        trace!(offset = pos, "cross-reference stream");
        let (_, object) = parser.parse_indirect(&|_| None)?;
        let Object::Stream(stream) = object else {
            return Err(PdfSpliceError::malformed(format!(
                "object at offset {pos} is not a cross-reference stream"
            )));
        };
        Ok(Section {
            entries: stream_entries(&stream)?,
            trailer: stream.dict,
        })
    }
}

fn classic_section(mut parser: Parser<'_>) -> Result<Section> {
    let truncated = || PdfSpliceError::malformed("truncated cross-reference table");
    // "xref"
    parser.lexer().next_token()?;

    let mut entries = Vec::new();
    loop {
        match parser.lexer().next_token()? {
            Some(token) if token.is_keyword(b"trailer") => break,
            Some(Token::Integer(first)) => {
                let Some(Token::Integer(count)) = parser.lexer().next_token()? else {
                    return Err(truncated());
                };
                let first = u32::try_from(first).map_err(|_| truncated())?;
                for i in 0..count.max(0) as u32 {
                    let (offset, generation, kind) = match (
                        parser.lexer().next_token()?,
                        parser.lexer().next_token()?,
                        parser.lexer().next_token()?,
                    ) {
                        (
                            Some(Token::Integer(offset)),
                            Some(Token::Integer(generation)),
                            Some(Token::Keyword(kind)),
                        ) => (offset, generation, kind),
                        _ => return Err(truncated()),
                    };
                    let entry = match (kind.as_slice(), usize::try_from(offset)) {
                        (b"n", Ok(offset)) if offset > 0 => XrefEntry::InUse {
                            offset,
                            generation: u16::try_from(generation).unwrap_or(u16::MAX),
                        },
                        _ => XrefEntry::Free,
                    };
                    entries.push((first.saturating_add(i), entry));
                }
            }
            _ => return Err(PdfSpliceError::malformed("cross-reference table has no trailer")),
        }
    }

    match parser.parse_object()? {
        Object::Dictionary(trailer) => Ok(Section { entries, trailer }),
        other => Err(PdfSpliceError::malformed(format!(
            "trailer is a {}",
            other.type_label()
        ))),
    }
}

fn stream_entries(stream: &Stream) -> Result<Vec<(u32, XrefEntry)>> {
    let dict = &stream.dict;
    let widths: Vec<usize> = dict
        .get(b"W")
        .and_then(Object::as_array)
        .ok_or_else(|| PdfSpliceError::malformed("cross-reference stream without /W"))?
        .iter()
        .map(|w| match w.as_i64() {
            Some(w @ 0..=8) => Ok(w as usize),
            _ => Err(PdfSpliceError::malformed("bad /W entry in cross-reference stream")),
        })
        .collect::<Result<_>>()?;
    let [w0, w1, w2] = widths[..] else {
        return Err(PdfSpliceError::malformed("/W must have three entries"));
    };
    let row = w0 + w1 + w2;
    if row == 0 {
        return Err(PdfSpliceError::malformed("/W describes empty rows"));
    }

    let index: Vec<(u32, u32)> = match dict.get(b"Index").and_then(Object::as_array) {
        Some(items) => items
            .chunks_exact(2)
            .filter_map(|pair| {
                let first = u32::try_from(pair[0].as_i64()?).ok()?;
                let count = u32::try_from(pair[1].as_i64()?).ok()?;
                Some((first, count))
            })
            .collect(),
        None => {
            let size = dict
                .get(b"Size")
                .and_then(Object::as_i64)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| PdfSpliceError::malformed("cross-reference stream without /Size"))?;
            vec![(0, size)]
        }
    };

    let data = stream.decoded_content()?;
    let mut rows = data.chunks_exact(row);
    let mut entries = Vec::new();
    'subsections: for (first, count) in index {
        for i in 0..count {
            let Some(bytes) = rows.next() else {
                warn!("cross-reference stream shorter than its /Index declares");
                break 'subsections;
            };
            let kind = if w0 == 0 { 1 } else { read_field(&bytes[..w0]) };
            let f2 = read_field(&bytes[w0..w0 + w1]);
            let f3 = read_field(&bytes[w0 + w1..]);
            let entry = match kind {
                0 => XrefEntry::Free,
                1 => XrefEntry::InUse {
                    offset: f2 as usize,
                    generation: f3.min(u64::from(u16::MAX)) as u16,
                },
                2 => XrefEntry::Compressed {
                    stream: f2 as u32,
                    index: f3 as u32,
                },
                // Unknown types are to be read as references to null.
                _ => continue,
            };
            entries.push((first.saturating_add(i), entry));
        }
    }
    Ok(entries)
}

/// Big-endian unsigned field of up to eight bytes.
fn read_field(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}
