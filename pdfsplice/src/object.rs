//! PDF object model.
//!
//! Objects are plain owned values. Indirect objects are never linked by
//! pointer: a [`Object::Reference`] carries the `(number, generation)` pair
//! and is looked up in the owning [`Document`](crate::Document)'s table,
//! which keeps cyclic graphs (pages pointing at their parents, annotations
//! pointing at their page) trivial to hold and to walk.

use crate::error::Result;
use crate::parser::filters;

/// Identifier of an indirect object: `(object number, generation number)`.
pub type ObjectId = (u32, u16);

/// How a string was spelled in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringFormat {
    /// `(text)`
    #[default]
    Literal,
    /// `<74657874>`
    Hexadecimal,
}

/// A PDF object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Integer number.
    Integer(i64),
    /// Real number.
    Real(f64),
    /// String bytes and their source spelling.
    String(Vec<u8>, StringFormat),
    /// Name without the leading slash, `#xx` escapes already decoded.
    Name(Vec<u8>),
    /// `[ ... ]`
    Array(Vec<Object>),
    /// `<< ... >>`
    Dictionary(Dictionary),
    /// Dictionary followed by raw stream data.
    Stream(Stream),
    /// `N G R`
    Reference(ObjectId),
}

impl Object {
    /// Build a name object.
    pub fn name(name: impl AsRef<[u8]>) -> Self {
        Object::Name(name.as_ref().to_vec())
    }

    /// Build a literal string object.
    pub fn string_literal(text: impl AsRef<[u8]>) -> Self {
        Object::String(text.as_ref().to_vec(), StringFormat::Literal)
    }

    /// Returns true for `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Integer value, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Object::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value of an integer or real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Integer(n) => Some(*n as f64),
            Object::Real(n) => Some(*n),
            _ => None,
        }
    }

    /// Name bytes, if this is a name.
    pub fn as_name(&self) -> Option<&[u8]> {
        match self {
            Object::Name(name) => Some(name),
            _ => None,
        }
    }

    /// String bytes, if this is a string.
    pub fn as_str_bytes(&self) -> Option<&[u8]> {
        match self {
            Object::String(bytes, _) => Some(bytes),
            _ => None,
        }
    }

    /// Referenced id, if this is a reference.
    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Array items, if this is an array.
    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Dictionary of a dictionary or of a stream.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    /// Mutable dictionary of a dictionary or of a stream.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&mut stream.dict),
            _ => None,
        }
    }

    /// Stream, if this is a stream.
    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    /// Short type label used in log and error messages.
    pub fn type_label(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::Real(_) => "real",
            Object::String(..) => "string",
            Object::Name(_) => "name",
            Object::Array(_) => "array",
            Object::Dictionary(_) => "dictionary",
            Object::Stream(_) => "stream",
            Object::Reference(_) => "reference",
        }
    }

    /// Call `f` on every reference nested in this object, including the
    /// values of a stream dictionary.
    pub fn for_each_reference_mut(&mut self, f: &mut impl FnMut(&mut Object)) {
        match self {
            Object::Reference(_) => f(self),
            Object::Array(items) => {
                for item in items {
                    item.for_each_reference_mut(f);
                }
            }
            Object::Dictionary(dict) => dict.for_each_reference_mut(f),
            Object::Stream(stream) => stream.dict.for_each_reference_mut(f),
            _ => {}
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Integer(value)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Object::Integer(value as i64)
    }
}

impl From<usize> for Object {
    fn from(value: usize) -> Self {
        Object::Integer(value as i64)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Real(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::name(value)
    }
}

impl From<ObjectId> for Object {
    fn from(value: ObjectId) -> Self {
        Object::Reference(value)
    }
}

impl From<Vec<Object>> for Object {
    fn from(value: Vec<Object>) -> Self {
        Object::Array(value)
    }
}

impl From<Dictionary> for Object {
    fn from(value: Dictionary) -> Self {
        Object::Dictionary(value)
    }
}

impl From<Stream> for Object {
    fn from(value: Stream) -> Self {
        Object::Stream(value)
    }
}

/// A dictionary that keeps its keys in insertion order.
///
/// Keys are unique; `set` on an existing key replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary(Vec<(Vec<u8>, Object)>);

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Look up a key.
    pub fn get(&self, key: &[u8]) -> Option<&Object> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a key for mutation.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Object> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace a value.
    pub fn set(&mut self, key: impl AsRef<[u8]>, value: impl Into<Object>) {
        let key = key.as_ref();
        let value = value.into();
        match self.get_mut(key) {
            Some(slot) => *slot = value,
            None => self.0.push((key.to_vec(), value)),
        }
    }

    /// Remove a key, returning its value.
    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        let pos = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(pos).1)
    }

    /// Whether the key is present.
    pub fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Object)> {
        self.0.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Name value of `key`, if it is a direct name.
    pub fn get_name(&self, key: &[u8]) -> Option<&[u8]> {
        self.get(key).and_then(Object::as_name)
    }

    /// Whether `/Type` is the given name.
    pub fn is_type(&self, type_name: &[u8]) -> bool {
        self.get_name(b"Type") == Some(type_name)
    }

    fn for_each_reference_mut(&mut self, f: &mut impl FnMut(&mut Object)) {
        for (_, value) in self.0.iter_mut() {
            value.for_each_reference_mut(f);
        }
    }
}

impl<K: AsRef<[u8]>, V: Into<Object>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (key, value) in iter {
            dict.set(key, value);
        }
        dict
    }
}

/// A stream: its dictionary plus the raw (still encoded) data.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    /// Stream dictionary. `/Length` is recomputed on write.
    pub dict: Dictionary,
    /// Raw bytes between `stream` and `endstream`.
    pub content: Vec<u8>,
}

impl Stream {
    /// Create a stream from a dictionary and raw content.
    pub fn new(dict: Dictionary, content: Vec<u8>) -> Self {
        Self { dict, content }
    }

    /// Whether the stream declares any `/Filter`.
    pub fn is_filtered(&self) -> bool {
        match self.dict.get(b"Filter") {
            None | Some(Object::Null) => false,
            Some(Object::Array(items)) => !items.is_empty(),
            Some(_) => true,
        }
    }

    /// Content with its filters undone.
    ///
    /// Only the filters the parser itself needs are supported; anything
    /// else yields a `MalformedDocument` error.
    pub fn decoded_content(&self) -> Result<Vec<u8>> {
        filters::decode(&self.dict, &self.content)
    }
}
