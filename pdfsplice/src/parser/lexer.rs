//! Byte-level tokenizer for PDF syntax.
//!
//! The lexer works on a borrowed buffer and a cursor. It never allocates for
//! whitespace or delimiters; strings and names are returned decoded.

use crate::error::{PdfSpliceError, Result};

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Integer(i64),
    Real(f64),
    LiteralString(Vec<u8>),
    HexString(Vec<u8>),
    Name(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    /// Bare word: `true`, `null`, `obj`, `R`, `stream`, `trailer`, ...
    Keyword(Vec<u8>),
}

impl Token {
    pub(crate) fn is_keyword(&self, word: &[u8]) -> bool {
        matches!(self, Token::Keyword(k) if k == word)
    }
}

pub(crate) fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

pub(crate) fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(byte: u8) -> bool {
    !is_whitespace(byte) && !is_delimiter(byte)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Cursor over a PDF byte buffer.
pub(crate) struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos: pos.min(data.len()),
        }
    }

    pub(crate) fn data(&self) -> &'a [u8] {
        self.data
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    /// Skip whitespace and `%` comments.
    pub(crate) fn skip_whitespace(&mut self) {
        while let Some(&byte) = self.data.get(self.pos) {
            if is_whitespace(byte) {
                self.pos += 1;
            } else if byte == b'%' {
                while let Some(&c) = self.data.get(self.pos) {
                    if c == b'\r' || c == b'\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Read the next token, or `None` at end of input.
    pub(crate) fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();
        let Some(&byte) = self.data.get(self.pos) else {
            return Ok(None);
        };

        let token = match byte {
            b'[' => {
                self.pos += 1;
                Token::ArrayStart
            }
            b']' => {
                self.pos += 1;
                Token::ArrayEnd
            }
            b'<' if self.data.get(self.pos + 1) == Some(&b'<') => {
                self.pos += 2;
                Token::DictStart
            }
            b'>' if self.data.get(self.pos + 1) == Some(&b'>') => {
                self.pos += 2;
                Token::DictEnd
            }
            b'<' => self.read_hex_string()?,
            b'(' => self.read_literal_string()?,
            b'/' => self.read_name(),
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number()?,
            b'{' | b'}' => {
                // PostScript calculator braces; only seen inside function streams.
                self.pos += 1;
                Token::Keyword(vec![byte])
            }
            _ if is_regular(byte) => {
                let start = self.pos;
                while self.data.get(self.pos).is_some_and(|&c| is_regular(c)) {
                    self.pos += 1;
                }
                Token::Keyword(self.data[start..self.pos].to_vec())
            }
            _ => {
                return Err(PdfSpliceError::malformed(format!(
                    "unexpected byte 0x{byte:02x} at offset {}",
                    self.pos
                )));
            }
        };
        Ok(Some(token))
    }

    /// Peek at the next token without consuming it.
    pub(crate) fn peek_token(&mut self) -> Result<Option<Token>> {
        let saved = self.pos;
        let token = self.next_token();
        self.pos = saved;
        token
    }

    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;
        if matches!(self.data[self.pos], b'+' | b'-') {
            self.pos += 1;
        }
        let mut seen_dot = false;
        let mut seen_digit = false;
        while let Some(&c) = self.data.get(self.pos) {
            match c {
                b'0'..=b'9' => seen_digit = true,
                b'.' if !seen_dot => seen_dot = true,
                _ => break,
            }
            self.pos += 1;
        }

        let text = std::str::from_utf8(&self.data[start..self.pos]).unwrap_or("");
        if !seen_digit {
            // A lone sign or dot; some writers emit "-" for zero.
            return Ok(Token::Integer(0));
        }
        if !seen_dot && let Ok(value) = text.parse::<i64>() {
            return Ok(Token::Integer(value));
        }
        // "-3." and ".5" are legal PDF reals but not Rust floats.
        let normalized = if text.ends_with('.') {
            format!("{text}0")
        } else {
            text.to_string()
        };
        normalized
            .parse::<f64>()
            .map(Token::Real)
            .map_err(|_| PdfSpliceError::malformed(format!("bad number '{text}' at offset {start}")))
    }

    fn read_name(&mut self) -> Token {
        self.pos += 1;
        let mut name = Vec::new();
        while let Some(&c) = self.data.get(self.pos) {
            if !is_regular(c) {
                break;
            }
            if c == b'#'
                && let (Some(hi), Some(lo)) = (
                    self.data.get(self.pos + 1).copied().and_then(hex_value),
                    self.data.get(self.pos + 2).copied().and_then(hex_value),
                )
            {
                name.push(hi << 4 | lo);
                self.pos += 3;
                continue;
            }
            name.push(c);
            self.pos += 1;
        }
        Token::Name(name)
    }

    fn read_hex_string(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        let mut digits = Vec::new();
        loop {
            let Some(&c) = self.data.get(self.pos) else {
                return Err(PdfSpliceError::malformed(format!(
                    "unterminated hex string at offset {start}"
                )));
            };
            self.pos += 1;
            if c == b'>' {
                break;
            }
            if let Some(value) = hex_value(c) {
                digits.push(value);
            } else if !is_whitespace(c) {
                return Err(PdfSpliceError::malformed(format!(
                    "bad hex digit at offset {}",
                    self.pos - 1
                )));
            }
        }
        if digits.len() % 2 == 1 {
            digits.push(0);
        }
        let bytes = digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]).collect();
        Ok(Token::HexString(bytes))
    }

    fn read_literal_string(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        let mut depth = 1usize;
        let mut out = Vec::new();
        loop {
            let Some(&c) = self.data.get(self.pos) else {
                return Err(PdfSpliceError::malformed(format!(
                    "unterminated string at offset {start}"
                )));
            };
            self.pos += 1;
            match c {
                b'(' => {
                    depth += 1;
                    out.push(c);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(c);
                }
                b'\\' => self.read_escape(&mut out),
                b'\r' => {
                    // Unescaped EOL of any kind reads as a single LF.
                    if self.data.get(self.pos) == Some(&b'\n') {
                        self.pos += 1;
                    }
                    out.push(b'\n');
                }
                _ => out.push(c),
            }
        }
        Ok(Token::LiteralString(out))
    }

    fn read_escape(&mut self, out: &mut Vec<u8>) {
        let Some(&c) = self.data.get(self.pos) else {
            return;
        };
        self.pos += 1;
        match c {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'0'..=b'7' => {
                let mut value = u32::from(c - b'0');
                for _ in 0..2 {
                    match self.data.get(self.pos) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xff) as u8);
            }
            // Line continuation.
            b'\r' => {
                if self.data.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                }
            }
            b'\n' => {}
            other => out.push(other),
        }
    }
}
