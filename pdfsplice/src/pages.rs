//! Page tree traversal.
//!
//! Pages are the leaves of the tree rooted at the catalog's `/Pages`, in
//! left-to-right depth-first order. The `/Count` entries of intermediate
//! nodes are ignored: files in the wild get them wrong often enough that
//! only an actual walk is trusted.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::document::Document;
use crate::error::{PdfSpliceError, Result};
use crate::object::{Dictionary, Object, ObjectId};

/// Page attributes a page may inherit from its ancestors.
pub const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

#[derive(Debug, Clone)]
struct PageEntry {
    id: ObjectId,
    /// Nearest ancestor first.
    ancestors: Rc<Vec<ObjectId>>,
}

/// The ordered leaves of a document's page tree.
#[derive(Debug)]
pub struct PageTree<'a> {
    doc: &'a Document,
    pages: Vec<PageEntry>,
    nodes: HashSet<ObjectId>,
}

impl<'a> PageTree<'a> {
    /// Walk the page tree of `doc`.
    ///
    /// The walk is iterative and remembers every node it has entered, so a
    /// `/Kids` cycle or a node listed twice is visited only once.
    pub fn build(doc: &'a Document) -> Result<Self> {
        let root = doc.pages_root_id()?;
        let mut pages = Vec::new();
        let mut nodes = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(root, Rc::new(Vec::new()))];

        while let Some((id, ancestors)) = stack.pop() {
            if !visited.insert(id) {
                warn!(num = id.0, "page tree node reached twice, skipping");
                continue;
            }
            let Some(dict) = doc.get_dict(id) else {
                warn!(num = id.0, "page tree entry is not a dictionary, skipping");
                continue;
            };

            let kids = match dict.get(b"Kids").map(|kids| doc.resolve(kids)) {
                Some(Object::Array(kids)) => Some(kids),
                _ => None,
            };
            match kids {
                Some(kids) => {
                    nodes.insert(id);
                    let mut chain = Vec::with_capacity(ancestors.len() + 1);
                    chain.push(id);
                    chain.extend(ancestors.iter().copied());
                    let chain = Rc::new(chain);
                    for kid in kids.iter().rev() {
                        match kid {
                            Object::Reference(kid_id) => stack.push((*kid_id, Rc::clone(&chain))),
                            other => warn!(
                                parent = id.0,
                                kind = other.type_label(),
                                "ignoring non-reference /Kids entry"
                            ),
                        }
                    }
                }
                None if dict.is_type(b"Pages") => {
                    // A Pages node without children.
                    nodes.insert(id);
                }
                None => pages.push(PageEntry { id, ancestors }),
            }
        }

        trace!(pages = pages.len(), nodes = nodes.len(), "page tree walked");
        Ok(Self { doc, pages, nodes })
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the document has no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page at a 0-based index.
    pub fn page(&self, index: usize) -> Result<PageHandle<'a>> {
        let entry = self
            .pages
            .get(index)
            .ok_or(PdfSpliceError::PageIndexOutOfRange {
                index,
                page_count: self.pages.len(),
            })?;
        self.handle(entry)
    }

    /// All pages in order.
    pub fn iter(&self) -> impl Iterator<Item = PageHandle<'a>> + '_ {
        self.pages.iter().filter_map(|entry| self.handle(entry).ok())
    }

    /// Ids of every intermediate (`Pages`) node.
    pub fn node_ids(&self) -> &HashSet<ObjectId> {
        &self.nodes
    }

    /// Ids of every page, in order.
    pub fn page_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.pages.iter().map(|entry| entry.id)
    }

    fn handle(&self, entry: &PageEntry) -> Result<PageHandle<'a>> {
        let dict = self.doc.get_dict(entry.id).ok_or_else(|| {
            PdfSpliceError::malformed(format!("page {} is not a dictionary", entry.id.0))
        })?;
        Ok(PageHandle {
            doc: self.doc,
            id: entry.id,
            dict,
            ancestors: Rc::clone(&entry.ancestors),
        })
    }
}

/// One page of a document, with access to inherited attributes.
#[derive(Debug, Clone)]
pub struct PageHandle<'a> {
    doc: &'a Document,
    id: ObjectId,
    dict: &'a Dictionary,
    ancestors: Rc<Vec<ObjectId>>,
}

impl<'a> PageHandle<'a> {
    /// Object id of the page dictionary.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The page's own dictionary, without inherited values.
    pub fn dictionary(&self) -> &'a Dictionary {
        self.dict
    }

    /// Value of `key` on the page or on its closest ancestor that has it.
    ///
    /// The value is returned as stored, so it may be a reference.
    pub fn inherited(&self, key: &[u8]) -> Option<&'a Object> {
        if let Some(value) = self.dict.get(key) {
            return Some(value);
        }
        self.ancestors
            .iter()
            .filter_map(|&id| self.doc.get_dict(id))
            .find_map(|node| node.get(key))
    }

    /// Effective `/MediaBox` as `[llx, lly, urx, ury]`.
    pub fn media_box(&self) -> Option<[f64; 4]> {
        let array = self.doc.resolve(self.inherited(b"MediaBox")?).as_array()?;
        let mut out = [0.0; 4];
        if array.len() != 4 {
            return None;
        }
        for (slot, value) in out.iter_mut().zip(array) {
            *slot = self.doc.resolve(value).as_f64()?;
        }
        Some(out)
    }

    /// Effective `/Rotate`, normalised to 0, 90, 180 or 270.
    pub fn rotation(&self) -> i64 {
        self.inherited(b"Rotate")
            .map(|value| self.doc.resolve(value))
            .and_then(Object::as_i64)
            .unwrap_or(0)
            .rem_euclid(360)
    }

    /// Effective `/Resources` dictionary.
    pub fn resources(&self) -> Option<&'a Dictionary> {
        let doc: &'a Document = self.doc;
        doc.resolve(self.inherited(b"Resources")?).as_dict()
    }
}
