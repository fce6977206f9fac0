//! PDF syntax parsing.
//!
//! [`Parser`] turns lexer tokens into [`Object`]s, recognising indirect
//! references (`N G R`) with a two-token lookahead, and reads indirect
//! object definitions including stream data. Cross-reference handling lives
//! in [`xref`]; filters needed for structural streams live in [`filters`].

pub(crate) mod filters;
pub(crate) mod lexer;
pub(crate) mod xref;

use tracing::trace;

use crate::error::{PdfSpliceError, Result};
use crate::object::{Dictionary, Object, ObjectId, Stream, StringFormat};
use lexer::{Lexer, Token, is_whitespace};

/// Nesting limit for arrays and dictionaries.
const MAX_NESTING: usize = 256;

/// Resolves an indirect `/Length` while a stream is being read.
pub(crate) type LengthResolver<'r> = &'r dyn Fn(ObjectId) -> Option<i64>;

/// Object parser over a byte buffer.
pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            lexer: Lexer::new(data, pos),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.lexer.position()
    }

    pub(crate) fn lexer(&mut self) -> &mut Lexer<'a> {
        &mut self.lexer
    }

    /// Parse one direct object.
    pub(crate) fn parse_object(&mut self) -> Result<Object> {
        let token = self.expect_token()?;
        self.object_from(token, 0)
    }

    /// Parse `N G obj <object> [stream ... endstream] endobj` at the cursor.
    pub(crate) fn parse_indirect(
        &mut self,
        resolve_length: LengthResolver<'_>,
    ) -> Result<(ObjectId, Object)> {
        let start = self.position();
        let header = (
            self.lexer.next_token()?,
            self.lexer.next_token()?,
            self.lexer.next_token()?,
        );
        let id = match header {
            (Some(Token::Integer(num)), Some(Token::Integer(generation)), Some(kw))
                if kw.is_keyword(b"obj") =>
            {
                let num = u32::try_from(num).map_err(|_| bad_header(start))?;
                let generation = u16::try_from(generation).map_err(|_| bad_header(start))?;
                (num, generation)
            }
            _ => return Err(bad_header(start)),
        };

        let object = self.parse_object()?;
        let has_stream = matches!(object, Object::Dictionary(_))
            && self.lexer.peek_token()?.is_some_and(|t| t.is_keyword(b"stream"));
        let object = match object {
            Object::Dictionary(dict) if has_stream => {
                self.lexer.next_token()?;
                Object::Stream(self.read_stream_body(dict, resolve_length)?)
            }
            other => other,
        };

        if self.lexer.peek_token()?.is_some_and(|t| t.is_keyword(b"endobj")) {
            self.lexer.next_token()?;
        } else {
            trace!(num = id.0, "object without endobj");
        }
        Ok((id, object))
    }

    fn expect_token(&mut self) -> Result<Token> {
        self.lexer.next_token()?.ok_or_else(|| {
            PdfSpliceError::malformed(format!(
                "unexpected end of data at offset {}",
                self.lexer.position()
            ))
        })
    }

    fn object_from(&mut self, token: Token, depth: usize) -> Result<Object> {
        if depth > MAX_NESTING {
            return Err(PdfSpliceError::malformed("objects nested too deeply"));
        }
        let object = match token {
            Token::Integer(n) => match self.try_reference(n)? {
                Some(id) => Object::Reference(id),
                None => Object::Integer(n),
            },
            Token::Real(n) => Object::Real(n),
            Token::LiteralString(s) => Object::String(s, StringFormat::Literal),
            Token::HexString(s) => Object::String(s, StringFormat::Hexadecimal),
            Token::Name(name) => Object::Name(name),
            Token::ArrayStart => {
                let mut items = Vec::new();
                loop {
                    match self.expect_token()? {
                        Token::ArrayEnd => break,
                        token => items.push(self.object_from(token, depth + 1)?),
                    }
                }
                Object::Array(items)
            }
            Token::DictStart => Object::Dictionary(self.read_dictionary(depth)?),
            Token::Keyword(word) => match word.as_slice() {
                b"true" => Object::Boolean(true),
                b"false" => Object::Boolean(false),
                b"null" => Object::Null,
                other => {
                    return Err(PdfSpliceError::malformed(format!(
                        "unexpected keyword '{}' at offset {}",
                        String::from_utf8_lossy(other),
                        self.lexer.position()
                    )));
                }
            },
            Token::ArrayEnd | Token::DictEnd => {
                return Err(PdfSpliceError::malformed(format!(
                    "unbalanced delimiter at offset {}",
                    self.lexer.position()
                )));
            }
        };
        Ok(object)
    }

    fn read_dictionary(&mut self, depth: usize) -> Result<Dictionary> {
        let mut dict = Dictionary::new();
        loop {
            match self.expect_token()? {
                Token::DictEnd => break,
                Token::Name(key) => {
                    let value = match self.expect_token()? {
                        // "/Key >>" with the value missing.
                        Token::DictEnd => {
                            dict.set(key, Object::Null);
                            break;
                        }
                        token => self.object_from(token, depth + 1)?,
                    };
                    dict.set(key, value);
                }
                other => {
                    return Err(PdfSpliceError::malformed(format!(
                        "dictionary key is not a name ({other:?}) at offset {}",
                        self.lexer.position()
                    )));
                }
            }
        }
        Ok(dict)
    }

    /// After an integer, check for `G R` and consume it if present.
    fn try_reference(&mut self, num: i64) -> Result<Option<ObjectId>> {
        let Ok(num) = u32::try_from(num) else {
            return Ok(None);
        };
        let saved = self.lexer.position();
        if let Ok(Some(Token::Integer(generation))) = self.lexer.next_token()
            && let Ok(generation) = u16::try_from(generation)
            && let Ok(Some(token)) = self.lexer.next_token()
            && token.is_keyword(b"R")
        {
            return Ok(Some((num, generation)));
        }
        self.lexer.set_position(saved);
        Ok(None)
    }

    fn read_stream_body(
        &mut self,
        dict: Dictionary,
        resolve_length: LengthResolver<'_>,
    ) -> Result<Stream> {
        let data = self.lexer.data();
        let mut start = self.lexer.position();
        // The keyword is followed by CRLF or LF; a lone CR is tolerated.
        if data.get(start) == Some(&b'\r') {
            start += 1;
        }
        if data.get(start) == Some(&b'\n') {
            start += 1;
        }

        let declared = match dict.get(b"Length") {
            Some(Object::Integer(n)) => Some(*n),
            Some(Object::Reference(id)) => resolve_length(*id),
            _ => None,
        };

        if let Some(len) = declared.and_then(|n| usize::try_from(n).ok())
            && let Some(end) = start.checked_add(len)
            && end <= data.len()
            && followed_by_endstream(data, end)
        {
            self.lexer.set_position(end);
            self.lexer.next_token()?;
            return Ok(Stream::new(dict, data[start..end].to_vec()));
        }

        trace!(offset = start, ?declared, "stream /Length unusable, scanning for endstream");
        let Some(found) = find(&data[start..], b"endstream").map(|i| start + i) else {
            return Err(PdfSpliceError::malformed(format!(
                "stream at offset {start} has no endstream"
            )));
        };
        let mut end = found;
        if end > start && data[end - 1] == b'\n' {
            end -= 1;
        }
        if end > start && data[end - 1] == b'\r' {
            end -= 1;
        }
        self.lexer.set_position(found + b"endstream".len());
        Ok(Stream::new(dict, data[start..end].to_vec()))
    }
}

fn bad_header(offset: usize) -> PdfSpliceError {
    PdfSpliceError::malformed(format!("expected 'N G obj' at offset {offset}"))
}

fn followed_by_endstream(data: &[u8], mut pos: usize) -> bool {
    while data.get(pos).is_some_and(|&b| is_whitespace(b)) {
        pos += 1;
    }
    data[pos..].starts_with(b"endstream")
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Position of the last occurrence of `needle` in `haystack`.
pub(crate) fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
