//! The in-memory document graph.
//!
//! A [`Document`] is a table of indirect objects plus a trailer. Parsed
//! documents keep their source buffer and only index it up front: each object
//! is parsed the first time it is asked for and memoised in its slot.
//! Objects that live in object streams are filled in bulk when their
//! container is first decoded.
//!
//! Unresolvable references read as `null`, never as an error.

use std::cell::OnceCell;
use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::error::{PdfSpliceError, Result};
use crate::object::{Dictionary, Object, ObjectId};
use crate::pages::{PageHandle, PageTree};
use crate::parser::lexer::Token;
use crate::parser::xref::{self, XrefEntry};
use crate::parser::Parser;

static NULL: Object = Object::Null;

/// Reference hops followed by [`Document::resolve`].
const MAX_REFERENCE_CHAIN: usize = 32;

/// Nested loads allowed while resolving (indirect lengths, object streams).
const MAX_LOAD_DEPTH: usize = 16;

/// PDF version written by [`Document::new`].
pub const DEFAULT_VERSION: &str = "1.7";

#[derive(Debug, Clone, Copy)]
enum Source {
    /// Created or replaced in memory; the value is always present.
    Loaded,
    /// Parsed on demand from this offset of the source buffer.
    Offset(usize),
    /// Parsed on demand from an object stream.
    Compressed { stream: u32 },
}

#[derive(Debug)]
struct Slot {
    generation: u16,
    source: Source,
    value: OnceCell<Object>,
}

impl Slot {
    fn loaded(generation: u16, object: Object) -> Self {
        Self {
            generation,
            source: Source::Loaded,
            value: OnceCell::from(object),
        }
    }

    fn lazy(generation: u16, source: Source) -> Self {
        Self {
            generation,
            source,
            value: OnceCell::new(),
        }
    }
}

/// A PDF document: object table, trailer and version.
///
/// `Document` is `Send` but not `Sync`; lazy resolution mutates slots
/// behind shared references.
#[derive(Debug)]
pub struct Document {
    version: String,
    trailer: Dictionary,
    slots: BTreeMap<u32, Slot>,
    data: Vec<u8>,
    /// Position of `%PDF-`; offsets are retried shifted by it.
    shift: usize,
    next_number: u32,
}

impl Document {
    /// Create an empty document with a catalog and an empty root page tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdfsplice::Document;
    ///
    /// let doc = Document::new();
    /// assert_eq!(doc.page_count().unwrap(), 0);
    /// ```
    pub fn new() -> Self {
        let mut doc = Self {
            version: DEFAULT_VERSION.to_string(),
            trailer: Dictionary::new(),
            slots: BTreeMap::new(),
            data: Vec::new(),
            shift: 0,
            next_number: 1,
        };
        let pages: Dictionary = [
            ("Type", Object::name("Pages")),
            ("Kids", Object::Array(Vec::new())),
            ("Count", Object::Integer(0)),
        ]
        .into_iter()
        .collect();
        let pages_id = doc.add_object(pages);
        let catalog: Dictionary = [
            ("Type", Object::name("Catalog")),
            ("Pages", Object::Reference(pages_id)),
        ]
        .into_iter()
        .collect();
        let catalog_id = doc.add_object(catalog);
        doc.set_root(catalog_id);
        doc
    }

    /// Parse a document from a byte buffer.
    ///
    /// Only the header, the cross-reference data and the catalog are read
    /// eagerly; everything else is parsed when first accessed.
    ///
    /// # Errors
    ///
    /// - `EncryptedDocument` if the trailer declares `/Encrypt`
    /// - `MalformedDocument` if the header, cross-reference data, trailer,
    ///   catalog or root page tree node cannot be found
    pub fn load_mem(bytes: &[u8]) -> Result<Self> {
        let (shift, version) = xref::read_header(bytes)?;
        let xref = xref::read(bytes, shift)?;

        let mut slots = BTreeMap::new();
        for (num, entry) in xref.entries {
            let slot = match entry {
                _ if num == 0 => continue,
                XrefEntry::Free => continue,
                XrefEntry::InUse { offset, generation } => {
                    Slot::lazy(generation, Source::Offset(offset))
                }
                XrefEntry::Compressed { stream, .. } => {
                    Slot::lazy(0, Source::Compressed { stream })
                }
            };
            slots.insert(num, slot);
        }
        let next_number = slots.keys().next_back().map_or(1, |&n| n.saturating_add(1));

        let doc = Self {
            version,
            trailer: xref.trailer,
            slots,
            data: bytes.to_vec(),
            shift,
            next_number,
        };

        if doc.trailer.has(b"Encrypt") {
            return Err(PdfSpliceError::EncryptedDocument);
        }
        doc.pages_root_id()?;

        debug!(
            version = %doc.version,
            objects = doc.slots.len(),
            header_offset = shift,
            "document loaded"
        );
        Ok(doc)
    }

    /// PDF version, e.g. `"1.7"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Replace the PDF version.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Trailer dictionary.
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Number of objects in the table.
    pub fn object_count(&self) -> usize {
        self.slots.len()
    }

    /// Ids of every object in the table, in ascending number order.
    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.slots.iter().map(|(&num, slot)| (num, slot.generation))
    }

    /// Look up an object, parsing it on first access.
    ///
    /// Returns `None` for ids that are not in the table or whose generation
    /// does not match.
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        let slot = self.slots.get(&id.0)?;
        if slot.generation != id.1 {
            trace!(num = id.0, want = id.1, have = slot.generation, "generation mismatch");
            return None;
        }
        self.load(id.0, 0)
    }

    /// Mutable access to an object, parsing it first if needed.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.get(id)?;
        self.slots.get_mut(&id.0)?.value.get_mut()
    }

    /// Dictionary of an object (or of a stream), if it is one.
    pub fn get_dict(&self, id: ObjectId) -> Option<&Dictionary> {
        self.get(id).and_then(Object::as_dict)
    }

    /// Follow references until a direct object is reached.
    ///
    /// Dangling references (and over-long chains) resolve to `null`.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        let mut current = object;
        for _ in 0..MAX_REFERENCE_CHAIN {
            match current {
                Object::Reference(id) => match self.get(*id) {
                    Some(target) => current = target,
                    None => return &NULL,
                },
                direct => return direct,
            }
        }
        warn!("reference chain too long, reading as null");
        &NULL
    }

    /// Add an object under a fresh id.
    pub fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        let id = self.new_object_id();
        self.slots.insert(id.0, Slot::loaded(id.1, object.into()));
        id
    }

    /// Reserve a fresh id without storing anything under it yet.
    pub fn new_object_id(&mut self) -> ObjectId {
        let id = (self.next_number, 0);
        self.next_number = self.next_number.saturating_add(1);
        id
    }

    /// Store `object` under `id`, replacing whatever was there.
    pub fn set_object(&mut self, id: ObjectId, object: impl Into<Object>) {
        self.slots.insert(id.0, Slot::loaded(id.1, object.into()));
        if id.0 >= self.next_number {
            self.next_number = id.0.saturating_add(1);
        }
    }

    /// Point the trailer's `/Root` at `catalog_id`.
    pub fn set_root(&mut self, catalog_id: ObjectId) {
        self.trailer.set("Root", catalog_id);
    }

    /// Store `info` as the document information dictionary.
    pub fn set_info(&mut self, info: Dictionary) -> ObjectId {
        let id = self.add_object(info);
        self.trailer.set("Info", id);
        id
    }

    /// The document information dictionary, if any.
    pub fn info(&self) -> Option<&Dictionary> {
        self.trailer
            .get(b"Info")
            .map(|info| self.resolve(info))
            .and_then(Object::as_dict)
    }

    /// Id of the catalog named by the trailer's `/Root`.
    pub fn catalog_id(&self) -> Result<ObjectId> {
        self.trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .ok_or_else(|| PdfSpliceError::malformed("trailer has no /Root reference"))
    }

    /// The catalog dictionary.
    pub fn catalog(&self) -> Result<&Dictionary> {
        let id = self.catalog_id()?;
        self.get_dict(id)
            .ok_or_else(|| PdfSpliceError::malformed("/Root is not a dictionary"))
    }

    /// Id of the root page tree node.
    pub fn pages_root_id(&self) -> Result<ObjectId> {
        let id = self
            .catalog()?
            .get(b"Pages")
            .and_then(Object::as_reference)
            .ok_or_else(|| PdfSpliceError::malformed("catalog has no /Pages reference"))?;
        match self.get_dict(id) {
            Some(_) => Ok(id),
            None => Err(PdfSpliceError::malformed("catalog /Pages is not a dictionary")),
        }
    }

    /// Append `page_id` as the last child of the root page tree node.
    ///
    /// Sets the page's `/Parent` and bumps the root's `/Count`.
    pub fn append_page(&mut self, page_id: ObjectId) -> Result<()> {
        let root = self.pages_root_id()?;
        let page = self
            .get_mut(page_id)
            .and_then(Object::as_dict_mut)
            .ok_or_else(|| {
                PdfSpliceError::serialization(format!("page object {} does not exist", page_id.0))
            })?;
        page.set("Parent", root);

        let pages = self
            .get_mut(root)
            .and_then(Object::as_dict_mut)
            .ok_or_else(|| PdfSpliceError::malformed("catalog /Pages is not a dictionary"))?;
        match pages.get_mut(b"Kids") {
            Some(Object::Array(kids)) => kids.push(Object::Reference(page_id)),
            None => pages.set("Kids", vec![Object::Reference(page_id)]),
            Some(_) => {
                return Err(PdfSpliceError::malformed(
                    "root page tree node has an indirect /Kids array",
                ));
            }
        }
        let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        pages.set("Count", count + 1);
        Ok(())
    }

    /// The page tree in traversal order.
    pub fn pages(&self) -> Result<PageTree<'_>> {
        PageTree::build(self)
    }

    /// Number of pages, counted by walking the page tree.
    pub fn page_count(&self) -> Result<usize> {
        Ok(self.pages()?.len())
    }

    /// Page at a 0-based index.
    ///
    /// # Errors
    ///
    /// `PageIndexOutOfRange` if `index >= page_count()`.
    pub fn page_at(&self, index: usize) -> Result<PageHandle<'_>> {
        self.pages()?.page(index)
    }

    fn load(&self, num: u32, depth: usize) -> Option<&Object> {
        let slot = self.slots.get(&num)?;
        if let Some(object) = slot.value.get() {
            return Some(object);
        }
        if depth > MAX_LOAD_DEPTH {
            warn!(num, "object resolution nested too deeply");
            return None;
        }

        match slot.source {
            Source::Loaded => {}
            Source::Offset(offset) => {
                let object = self.parse_at(offset, num, depth).unwrap_or_else(|err| {
                    warn!(num, offset, error = %err, "unreadable object, reading as null");
                    Object::Null
                });
                // A nested load may have filled the slot already; first value wins.
                let _ = slot.value.set(object);
            }
            Source::Compressed { stream } => {
                if let Err(err) = self.expand_object_stream(stream, depth) {
                    warn!(num, stream, error = %err, "unreadable object stream");
                }
                if slot.value.get().is_none() {
                    let _ = slot.value.set(Object::Null);
                }
            }
        }
        slot.value.get()
    }

    fn parse_at(&self, offset: usize, num: u32, depth: usize) -> Result<Object> {
        let resolve_length = |id: ObjectId| self.load(id.0, depth + 1).and_then(Object::as_i64);
        let mut candidates = vec![offset];
        if self.shift > 0 {
            candidates.push(offset.saturating_add(self.shift));
        }

        let mut last_err = PdfSpliceError::malformed(format!("offset {offset} is past the end"));
        for pos in candidates {
            if pos >= self.data.len() {
                continue;
            }
            match Parser::new(&self.data, pos).parse_indirect(&resolve_length) {
                Ok((id, object)) if id.0 == num => {
                    trace!(num, offset = pos, kind = object.type_label(), "parsed object");
                    return Ok(object);
                }
                Ok((id, _)) => {
                    last_err = PdfSpliceError::malformed(format!(
                        "expected object {num} at offset {pos}, found {}",
                        id.0
                    ));
                }
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }

    /// Decode object stream `stream_num` and fill every member slot that
    /// points into it and is still empty.
    fn expand_object_stream(&self, stream_num: u32, depth: usize) -> Result<()> {
        let container = self
            .load(stream_num, depth + 1)
            .and_then(Object::as_stream)
            .ok_or_else(|| {
                PdfSpliceError::malformed(format!("object stream {stream_num} is missing"))
            })?;
        let count = container.dict.get(b"N").and_then(Object::as_i64).unwrap_or(0);
        let first = container
            .dict
            .get(b"First")
            .and_then(Object::as_i64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                PdfSpliceError::malformed(format!("object stream {stream_num} has no /First"))
            })?;
        let decoded = container.decoded_content()?;

        let mut header = Parser::new(&decoded, 0);
        let mut members = Vec::new();
        for _ in 0..count.max(0) {
            match (header.lexer().next_token()?, header.lexer().next_token()?) {
                (Some(Token::Integer(num)), Some(Token::Integer(offset))) => {
                    if let (Ok(num), Ok(offset)) = (u32::try_from(num), usize::try_from(offset)) {
                        members.push((num, offset));
                    }
                }
                _ => {
                    warn!(stream_num, "object stream header shorter than /N");
                    break;
                }
            }
        }

        let mut filled = 0usize;
        for (num, offset) in members {
            let Some(slot) = self.slots.get(&num) else {
                continue;
            };
            let belongs = matches!(slot.source, Source::Compressed { stream } if stream == stream_num);
            if !belongs || slot.value.get().is_some() {
                continue;
            }
            let object = Parser::new(&decoded, first.saturating_add(offset))
                .parse_object()
                .unwrap_or_else(|err| {
                    warn!(num, stream_num, error = %err, "unreadable compressed object");
                    Object::Null
                });
            let _ = slot.value.set(object);
            filled += 1;
        }
        trace!(stream_num, filled, "object stream expanded");
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
