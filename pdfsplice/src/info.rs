//! Document information dictionary (`/Info`).
//!
//! Every document produced by this crate is stamped with a producer and
//! creation/modification dates, plus whatever title, author, subject and
//! keywords the caller supplies.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::object::{Dictionary, Object, StringFormat};

/// Value written to `/Producer` and `/Creator`.
pub const PRODUCER: &str = "pdfsplice";

/// Caller-supplied descriptive metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords.
    pub keywords: Option<String>,
}

impl Metadata {
    /// Create metadata, dropping fields that are blank after trimming.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        Self {
            title: non_blank(title),
            author: non_blank(author),
            subject: non_blank(subject),
            keywords: non_blank(keywords),
        }
    }

    /// Check if no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Build the `/Info` dictionary for a new document stamped at `now`.
pub fn info_dictionary<Tz: TimeZone>(metadata: &Metadata, now: &DateTime<Tz>) -> Dictionary
where
    Tz::Offset: std::fmt::Display,
{
    let mut info = Dictionary::new();
    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            info.set(key, text_string(value));
        }
    }
    info.set("Creator", text_string(PRODUCER));
    info.set("Producer", text_string(PRODUCER));
    let date = Object::string_literal(format_pdf_date(now));
    info.set("CreationDate", date.clone());
    info.set("ModDate", date);
    info
}

/// Stamp `doc` with an `/Info` dictionary dated now.
pub fn stamp(doc: &mut Document, metadata: &Metadata) {
    doc.set_info(info_dictionary(metadata, &Local::now()));
}

/// Format a timestamp as a PDF date: `D:YYYYMMDDHHmmSS+HH'mm'`.
pub fn format_pdf_date<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let offset = time.format("%z").to_string();
    let zone = match offset.as_str() {
        "+0000" => "Z".to_string(),
        z if z.len() == 5 => format!("{}'{}'", &z[..3], &z[3..]),
        _ => "Z".to_string(),
    };
    format!("D:{}{zone}", time.format("%Y%m%d%H%M%S"))
}

/// Encode text as a PDF text string: PDFDocEncoding-compatible ASCII stays
/// literal, anything else becomes UTF-16BE with a byte order mark.
pub fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xfe, 0xff];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or
/// PDFDocEncoding, read as Latin-1).
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xfe, 0xff]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xef, 0xbb, 0xbf]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Descriptive fields read back from a document's `/Info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    /// `/Title`
    pub title: Option<String>,
    /// `/Author`
    pub author: Option<String>,
    /// `/Subject`
    pub subject: Option<String>,
    /// `/Keywords`
    pub keywords: Option<String>,
    /// `/Producer`
    pub producer: Option<String>,
    /// `/Creator`
    pub creator: Option<String>,
}

impl DocumentInfo {
    /// Read the information dictionary of `doc`; missing entries are `None`.
    pub fn read(doc: &Document) -> Self {
        let Some(info) = doc.info() else {
            return Self::default();
        };
        let field = |key: &[u8]| {
            info.get(key)
                .map(|value| doc.resolve(value))
                .and_then(Object::as_str_bytes)
                .map(decode_text_string)
        };
        Self {
            title: field(b"Title"),
            author: field(b"Author"),
            subject: field(b"Subject"),
            keywords: field(b"Keywords"),
            producer: field(b"Producer"),
            creator: field(b"Creator"),
        }
    }
}
