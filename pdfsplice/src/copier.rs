//! Copying pages between documents.
//!
//! [`copy_pages`] moves pages of one document into another together with
//! everything they reference (content streams, resources, fonts, images,
//! annotations). Object numbers of the source mean nothing in the target, so
//! every reached object gets a new id, tracked in a session that lives
//! exactly as long as one call.
//!
//! References that would drag the source's document structure along (its
//! catalog, its page tree nodes, pages that are not being copied) are cut to
//! `null`. Without that, one annotation's `/P` or a stray `/Parent` would pull
//! every page of the source into the target.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, trace};

use crate::document::Document;
use crate::error::{PdfSpliceError, Result};
use crate::object::{Object, ObjectId};
use crate::pages::{INHERITABLE_KEYS, PageTree};

/// A source document prepared for copying: its page tree and the ids of
/// structure objects that copied objects must not pull along. Built once
/// and shared by every copy out of the same source.
pub(crate) struct CopySource<'a> {
    doc: &'a Document,
    tree: PageTree<'a>,
    blocked: HashSet<ObjectId>,
}

impl<'a> CopySource<'a> {
    pub(crate) fn new(doc: &'a Document) -> Result<Self> {
        let tree = doc.pages()?;
        let mut blocked: HashSet<ObjectId> = tree.node_ids().clone();
        blocked.extend(tree.page_ids());
        if let Ok(catalog) = doc.catalog_id() {
            blocked.insert(catalog);
        }
        Ok(Self { doc, tree, blocked })
    }
}

/// Source → target id mapping for a single copy call.
///
/// An id is reserved in the target the first time its source object is
/// reached, and the object is queued for copying; later encounters reuse the
/// reserved id, so shared objects are copied once.
#[derive(Debug)]
struct CopySession<'s> {
    map: HashMap<ObjectId, ObjectId>,
    blocked: &'s HashSet<ObjectId>,
    queue: VecDeque<(ObjectId, ObjectId)>,
}

impl<'s> CopySession<'s> {
    fn new(blocked: &'s HashSet<ObjectId>) -> Self {
        Self {
            map: HashMap::new(),
            blocked,
            queue: VecDeque::new(),
        }
    }

    /// Rewrite every reference inside `object` to its target id.
    fn rewrite(&mut self, object: &mut Object, source: &Document, target: &mut Document) {
        object.for_each_reference_mut(&mut |reference| {
            let Object::Reference(id) = *reference else {
                return;
            };
            *reference = match self.map.get(&id) {
                Some(&new_id) => Object::Reference(new_id),
                None if self.blocked.contains(&id) => Object::Null,
                None => match source.get(id) {
                    None | Some(Object::Null) => {
                        trace!(num = id.0, "dangling reference replaced by null");
                        Object::Null
                    }
                    Some(_) => {
                        let new_id = target.new_object_id();
                        self.map.insert(id, new_id);
                        self.queue.push_back((id, new_id));
                        Object::Reference(new_id)
                    }
                },
            };
        });
    }
}

/// Copy the pages at `indices` (0-based) from `source` into `target`.
///
/// Each index produces a new page appended to the target's root page tree
/// node, in the order given; an index listed twice yields two pages. The
/// new page dictionaries carry any inherited `MediaBox`, `CropBox`,
/// `Resources` and `Rotate` explicitly, since the target tree does not
/// contain the source's ancestors. `source` is not modified.
///
/// Returns the new page ids in the same order as `indices`.
///
/// # Errors
///
/// `PageIndexOutOfRange` if any index is past the end; nothing is copied
/// in that case.
pub fn copy_pages(
    source: &Document,
    indices: &[usize],
    target: &mut Document,
) -> Result<Vec<ObjectId>> {
    copy_from(&CopySource::new(source)?, indices, target)
}

/// [`copy_pages`] out of an already prepared source.
pub(crate) fn copy_from(
    prepared: &CopySource<'_>,
    indices: &[usize],
    target: &mut Document,
) -> Result<Vec<ObjectId>> {
    let source = prepared.doc;
    let handles = indices
        .iter()
        .map(|&index| prepared.tree.page(index))
        .collect::<Result<Vec<_>>>()?;

    let mut session = CopySession::new(&prepared.blocked);

    // Reserve page ids first so references between copied pages resolve.
    let new_ids: Vec<ObjectId> = handles.iter().map(|_| target.new_object_id()).collect();
    for (handle, &new_id) in handles.iter().zip(&new_ids) {
        session.map.entry(handle.id()).or_insert(new_id);
    }

    for (handle, &new_id) in handles.iter().zip(&new_ids) {
        let mut page = handle.dictionary().clone();
        page.remove(b"Parent");
        for key in INHERITABLE_KEYS {
            if !page.has(key)
                && let Some(value) = handle.inherited(key)
            {
                page.set(key, value.clone());
            }
        }
        let mut page = Object::Dictionary(page);
        session.rewrite(&mut page, source, target);
        target.set_object(new_id, page);
    }

    while let Some((source_id, new_id)) = session.queue.pop_front() {
        let mut object = source.get(source_id).cloned().ok_or_else(|| {
            PdfSpliceError::serialization(format!(
                "object {} vanished while copying",
                source_id.0
            ))
        })?;
        session.rewrite(&mut object, source, target);
        target.set_object(new_id, object);
    }

    for &new_id in &new_ids {
        target.append_page(new_id)?;
    }

    debug!(
        pages = new_ids.len(),
        objects = session.map.len(),
        "pages copied"
    );
    Ok(new_ids)
}
