//! Serializing a [`Document`] to PDF bytes.
//!
//! Output always uses a classic cross-reference table. Objects are renumbered
//! densely from 1 in ascending order of their current numbers, all with
//! generation 0, so the table has no gaps and no free entries beyond the
//! mandatory head.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;

use tracing::{debug, trace};

use crate::document::Document;
use crate::error::{PdfSpliceError, Result};
use crate::object::{Dictionary, Object, ObjectId, Stream, StringFormat};
use crate::parser::filters;

/// Options controlling serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Flate-compress streams that carry no `/Filter`.
    pub compress_streams: bool,
}

impl WriteOptions {
    /// Options with stream compression enabled.
    pub fn new() -> Self {
        Self {
            compress_streams: true,
        }
    }

    /// Options that write stream data exactly as stored.
    pub fn uncompressed() -> Self {
        Self {
            compress_streams: false,
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// PDF serializer.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    options: WriteOptions,
}

impl Writer {
    /// Create a writer with the given options.
    pub fn new(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Serialize `doc` into a standalone PDF file.
    ///
    /// # Errors
    ///
    /// `Serialization` if any object refers to an id that is not in the
    /// document (including a `/Root` or `/Info` that points nowhere). This
    /// signals a bug in whatever built the document.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdfsplice::{Document, Writer, WriteOptions};
    ///
    /// let bytes = Writer::new(WriteOptions::default())
    ///     .serialize(&Document::new())
    ///     .unwrap();
    /// assert!(bytes.starts_with(b"%PDF-1.7"));
    /// ```
    pub fn serialize(&self, doc: &Document) -> Result<Vec<u8>> {
        let ids: Vec<ObjectId> = doc.object_ids().collect();
        let renumber: HashMap<ObjectId, u32> = ids
            .iter()
            .zip(1u32..)
            .map(|(&id, new_num)| (id, new_num))
            .collect();

        let mut out = Vec::with_capacity(4096);
        writeln!(out, "%PDF-{}", doc.version())?;
        out.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        let mut offsets = Vec::with_capacity(ids.len());
        for (&id, new_num) in ids.iter().zip(1u32..) {
            let object = doc.get(id).unwrap_or(&Object::Null);
            offsets.push(out.len());
            writeln!(out, "{new_num} 0 obj")?;
            self.write_indirect_body(&mut out, object, &renumber)?;
            out.extend_from_slice(b"\nendobj\n");
            trace!(old = id.0, new = new_num, kind = object.type_label(), "object written");
        }

        let xref_offset = out.len();
        write!(out, "xref\n0 {}\n", ids.len() + 1)?;
        out.extend_from_slice(b"0000000000 65535 f\r\n");
        for offset in &offsets {
            write!(out, "{offset:010} 00000 n\r\n")?;
        }

        let trailer = self.trailer(doc, &renumber, &out)?;
        out.extend_from_slice(b"trailer\n");
        write_dictionary(&mut out, &trailer, &renumber)?;
        write!(out, "\nstartxref\n{xref_offset}\n%%EOF\n")?;

        debug!(objects = ids.len(), bytes = out.len(), "document serialized");
        Ok(out)
    }

    fn write_indirect_body(
        &self,
        out: &mut Vec<u8>,
        object: &Object,
        renumber: &HashMap<ObjectId, u32>,
    ) -> Result<()> {
        match object {
            Object::Stream(stream) => self.write_stream(out, stream, renumber),
            other => write_object(out, other, renumber),
        }
    }

    fn write_stream(
        &self,
        out: &mut Vec<u8>,
        stream: &Stream,
        renumber: &HashMap<ObjectId, u32>,
    ) -> Result<()> {
        let mut dict = stream.dict.clone();
        let compressed;
        let content = if self.options.compress_streams
            && !stream.is_filtered()
            && !stream.content.is_empty()
        {
            compressed = filters::deflate(&stream.content)?;
            dict.set("Filter", "FlateDecode");
            dict.remove(b"DecodeParms");
            &compressed
        } else {
            &stream.content
        };
        dict.set("Length", content.len());

        write_dictionary(out, &dict, renumber)?;
        out.extend_from_slice(b"\nstream\n");
        out.extend_from_slice(content);
        out.extend_from_slice(b"\nendstream");
        Ok(())
    }

    fn trailer(
        &self,
        doc: &Document,
        renumber: &HashMap<ObjectId, u32>,
        body: &[u8],
    ) -> Result<Dictionary> {
        let mut trailer = Dictionary::new();
        trailer.set("Size", renumber.len() + 1);

        let root = doc
            .trailer()
            .get(b"Root")
            .cloned()
            .ok_or_else(|| PdfSpliceError::serialization("document has no /Root"))?;
        trailer.set("Root", root);
        if let Some(info) = doc.trailer().get(b"Info") {
            trailer.set("Info", info.clone());
        }

        let id = document_id(body);
        trailer.set(
            "ID",
            vec![
                Object::String(id.clone(), StringFormat::Hexadecimal),
                Object::String(id, StringFormat::Hexadecimal),
            ],
        );
        Ok(trailer)
    }
}

/// Serialize `doc` with default options.
pub fn serialize(doc: &Document) -> Result<Vec<u8>> {
    Writer::default().serialize(doc)
}

/// 16-byte file identifier derived from the written body.
fn document_id(body: &[u8]) -> Vec<u8> {
    let mut id = Vec::with_capacity(16);
    for seed in [0x5044_4653u64, 0x504c_4943u64] {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        body.len().hash(&mut hasher);
        body.hash(&mut hasher);
        id.extend_from_slice(&hasher.finish().to_be_bytes());
    }
    id
}

fn write_object(
    out: &mut Vec<u8>,
    object: &Object,
    renumber: &HashMap<ObjectId, u32>,
) -> Result<()> {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(true) => out.extend_from_slice(b"true"),
        Object::Boolean(false) => out.extend_from_slice(b"false"),
        Object::Integer(n) => write!(out, "{n}")?,
        Object::Real(n) => write_real(out, *n)?,
        Object::String(bytes, StringFormat::Literal) => write_literal_string(out, bytes),
        Object::String(bytes, StringFormat::Hexadecimal) => {
            out.push(b'<');
            for byte in bytes {
                write!(out, "{byte:02X}")?;
            }
            out.push(b'>');
        }
        Object::Name(name) => write_name(out, name),
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(out, item, renumber)?;
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => write_dictionary(out, dict, renumber)?,
        Object::Stream(_) => {
            return Err(PdfSpliceError::serialization(
                "stream nested inside a direct object",
            ));
        }
        Object::Reference(id) => {
            let new_num = renumber.get(id).ok_or_else(|| {
                PdfSpliceError::serialization(format!(
                    "reference {} {} R points to no object",
                    id.0, id.1
                ))
            })?;
            write!(out, "{new_num} 0 R")?;
        }
    }
    Ok(())
}

fn write_dictionary(
    out: &mut Vec<u8>,
    dict: &Dictionary,
    renumber: &HashMap<ObjectId, u32>,
) -> Result<()> {
    out.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        write_name(out, key);
        out.push(b' ');
        write_object(out, value, renumber)?;
    }
    out.extend_from_slice(b">>");
    Ok(())
}

fn write_real(out: &mut Vec<u8>, value: f64) -> Result<()> {
    if !value.is_finite() {
        out.push(b'0');
        return Ok(());
    }
    // `Display` for f64 never uses exponent notation.
    let text = format!("{value}");
    out.extend_from_slice(text.as_bytes());
    Ok(())
}

fn write_name(out: &mut Vec<u8>, name: &[u8]) {
    out.push(b'/');
    for &byte in name {
        let regular = byte.is_ascii_graphic()
            && !matches!(
                byte,
                b'#' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
            );
        if regular {
            out.push(byte);
        } else {
            out.extend_from_slice(format!("#{byte:02X}").as_bytes());
        }
    }
}

fn write_literal_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'(');
    for &byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            b'\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(byte),
        }
    }
    out.push(b')');
}
