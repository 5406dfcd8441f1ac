//! XML tokenizer used to materialize node trees.
//!
//! The tokenizer yields only the constructs that carry data for a node tree:
//! element boundaries, attributes and character data. Declarations,
//! processing instructions, comments and DOCTYPE blocks are consumed and
//! dropped while scanning.

use crate::error::{Error, ErrorKind, Position, Result};
use crate::escape::unescape;
use memchr::{memchr, memchr2};
use std::borrow::Cow;

/// Whitespace lookup table.
static IS_WHITESPACE: [bool; 256] = {
    let mut lut = [false; 256];
    lut[b' ' as usize] = true;
    lut[b'\t' as usize] = true;
    lut[b'\n' as usize] = true;
    lut[b'\r' as usize] = true;
    lut
};

/// Name start character lookup table.
static IS_NAME_START: [bool; 256] = {
    let mut lut = [false; 256];
    let mut i = b'A';
    while i <= b'Z' {
        lut[i as usize] = true;
        i += 1;
    }
    let mut i = b'a';
    while i <= b'z' {
        lut[i as usize] = true;
        i += 1;
    }
    lut[b'_' as usize] = true;
    lut[b':' as usize] = true;
    // non-ASCII UTF-8 bytes
    let mut i: usize = 0x80;
    while i < 256 {
        lut[i] = true;
        i += 1;
    }
    lut
};

/// Name character lookup table.
static IS_NAME_CHAR: [bool; 256] = {
    let mut lut = IS_NAME_START;
    let mut i = b'0';
    while i <= b'9' {
        lut[i as usize] = true;
        i += 1;
    }
    lut[b'-' as usize] = true;
    lut[b'.' as usize] = true;
    lut
};

/// Returns true if `name` is usable as an element or attribute name.
pub fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) => {
            IS_NAME_START[*first as usize] && rest.iter().all(|b| IS_NAME_CHAR[*b as usize])
        }
        None => false,
    }
}

/// A token produced by [`XmlReader`].
#[derive(Debug, Clone, PartialEq)]
pub enum XmlEvent<'a> {
    /// `<name attr="value">`
    Start {
        /// Element name.
        name: &'a str,
        /// Attributes in document order.
        attributes: Vec<(&'a str, Cow<'a, str>)>,
    },
    /// `<name attr="value"/>`
    Empty {
        /// Element name.
        name: &'a str,
        /// Attributes in document order.
        attributes: Vec<(&'a str, Cow<'a, str>)>,
    },
    /// `</name>`
    End {
        /// Element name.
        name: &'a str,
    },
    /// Trimmed, unescaped character data.
    Text(Cow<'a, str>),
    /// Raw CDATA content.
    CData(&'a str),
    /// End of document.
    Eof,
}

/// A zero-copy XML tokenizer over a string slice.
pub struct XmlReader<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    open: Vec<&'a str>,
}

impl<'a> XmlReader<'a> {
    /// Creates a reader over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            open: Vec::with_capacity(8),
        }
    }

    /// Returns the current position in the input.
    #[inline]
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.col,
            offset: self.pos,
        }
    }

    /// Number of currently open elements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Reads the next token.
    pub fn next_event(&mut self) -> Result<XmlEvent<'a>> {
        loop {
            self.skip_whitespace();

            if self.pos >= self.input.len() {
                if let Some(tag) = self.open.pop() {
                    return Err(Error::unclosed_tag(tag).with_position(self.position()));
                }
                return Ok(XmlEvent::Eof);
            }

            if self.input[self.pos] != b'<' {
                if let Some(text) = self.read_text()? {
                    return Ok(text);
                }
                continue;
            }

            self.advance(1);
            match self.peek() {
                None => return Err(self.eof()),
                Some(b'/') => return self.read_end(),
                Some(b'?') => {
                    self.skip_until(b"?>", "unterminated processing instruction")?;
                }
                Some(b'!') => {
                    if let Some(event) = self.read_markup_declaration()? {
                        return Ok(event);
                    }
                }
                Some(_) => return self.read_start(),
            }
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    fn eof(&self) -> Error {
        Error::unexpected_eof().with_position(self.position())
    }

    /// Moves forward `n` bytes on the current line.
    #[inline]
    fn advance(&mut self, n: usize) {
        self.pos += n;
        self.col += n;
    }

    /// Moves to `end`, tracking line breaks.
    fn advance_to(&mut self, end: usize) {
        for &b in &self.input[self.pos..end] {
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.pos = end;
    }

    fn skip_whitespace(&mut self) {
        let end = self.input[self.pos..]
            .iter()
            .position(|b| !IS_WHITESPACE[*b as usize])
            .map_or(self.input.len(), |off| self.pos + off);
        self.advance_to(end);
    }

    fn slice(&self, start: usize, end: usize) -> Result<&'a str> {
        std::str::from_utf8(&self.input[start..end]).map_err(|_| Error::new(ErrorKind::InvalidUtf8))
    }

    /// Skips past the next occurrence of `terminator`.
    fn skip_until(&mut self, terminator: &[u8], what: &str) -> Result<usize> {
        let mut search = self.pos;
        while let Some(off) = memchr(terminator[0], &self.input[search..]) {
            let at = search + off;
            if self.input[at..].starts_with(terminator) {
                self.advance_to(at + terminator.len());
                return Ok(at);
            }
            search = at + 1;
        }
        Err(Error::syntax(what).with_position(self.position()))
    }

    fn read_text(&mut self) -> Result<Option<XmlEvent<'a>>> {
        let start = self.pos;
        let end = memchr(b'<', &self.input[start..]).map_or(self.input.len(), |off| start + off);
        self.advance_to(end);

        // whitespace-only runs are formatting between elements
        let text = self.slice(start, end)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        unescape(text)
            .map(|text| Some(XmlEvent::Text(text)))
            .map_err(|e| Error::invalid_escape(e.entity).with_position(self.position()))
    }

    /// Handles `<!--`, `<![CDATA[` and `<!DOCTYPE`.
    fn read_markup_declaration(&mut self) -> Result<Option<XmlEvent<'a>>> {
        self.advance(1);
        let input = self.input;
        let rest = &input[self.pos..];

        if rest.starts_with(b"--") {
            self.advance(2);
            self.skip_until(b"-->", "unterminated comment")?;
            Ok(None)
        } else if rest.starts_with(b"[CDATA[") {
            self.advance(7);
            let start = self.pos;
            let end = self.skip_until(b"]]>", "unterminated CDATA section")?;
            Ok(Some(XmlEvent::CData(self.slice(start, end)?)))
        } else if rest.starts_with(b"DOCTYPE") {
            self.skip_doctype()?;
            Ok(None)
        } else {
            Err(Error::syntax("unknown construct after '<!'").with_position(self.position()))
        }
    }

    fn skip_doctype(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            let Some(off) = memchr2(b'<', b'>', &self.input[self.pos..]) else {
                self.advance_to(self.input.len());
                return Err(self.eof());
            };
            let at = self.pos + off;
            if self.input[at] == b'<' {
                depth += 1;
            } else {
                depth -= 1;
            }
            self.advance_to(at + 1);
        }
        Ok(())
    }

    fn read_start(&mut self) -> Result<XmlEvent<'a>> {
        let name = self.read_name()?;
        let attributes = self.read_attributes()?;
        self.skip_whitespace();

        match self.peek() {
            Some(b'/') => {
                self.advance(1);
                self.expect(b'>')?;
                Ok(XmlEvent::Empty { name, attributes })
            }
            Some(b'>') => {
                self.advance(1);
                self.open.push(name);
                Ok(XmlEvent::Start { name, attributes })
            }
            Some(_) => Err(Error::syntax("expected '>' or '/>'").with_position(self.position())),
            None => Err(self.eof()),
        }
    }

    fn read_end(&mut self) -> Result<XmlEvent<'a>> {
        self.advance(1);
        let name = self.read_name()?;
        self.skip_whitespace();
        self.expect(b'>')?;

        match self.open.pop() {
            Some(expected) if expected == name => Ok(XmlEvent::End { name }),
            Some(expected) => Err(Error::mismatched_tag(expected, name).with_position(self.position())),
            None => Err(Error::syntax(format!("unexpected closing tag: {}", name))
                .with_position(self.position())),
        }
    }

    fn read_name(&mut self) -> Result<&'a str> {
        let start = self.pos;
        match self.peek() {
            None => return Err(self.eof()),
            Some(first) if !IS_NAME_START[first as usize] => {
                return Err(Error::invalid_name(format!(
                    "invalid name start character: {:?}",
                    first as char
                ))
                .with_position(self.position()));
            }
            Some(_) => self.advance(1),
        }
        while self.peek().is_some_and(|b| IS_NAME_CHAR[b as usize]) {
            self.advance(1);
        }
        self.slice(start, self.pos)
    }

    fn read_attributes(&mut self) -> Result<Vec<(&'a str, Cow<'a, str>)>> {
        let mut attributes = Vec::with_capacity(4);
        loop {
            self.skip_whitespace();
            match self.peek() {
                None | Some(b'>') | Some(b'/') => break,
                Some(_) => {}
            }

            let name = self.read_name()?;
            self.skip_whitespace();
            self.expect(b'=')?;
            self.skip_whitespace();
            let value = self.read_attribute_value()?;

            if attributes.iter().any(|(existing, _)| *existing == name) {
                return Err(Error::syntax(format!("duplicate attribute: {}", name))
                    .with_position(self.position()));
            }
            attributes.push((name, value));
        }
        Ok(attributes)
    }

    fn read_attribute_value(&mut self) -> Result<Cow<'a, str>> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            Some(_) => return Err(Error::syntax("expected quote").with_position(self.position())),
            None => return Err(self.eof()),
        };
        self.advance(1);

        let start = self.pos;
        let Some(off) = memchr(quote, &self.input[start..]) else {
            return Err(Error::syntax("unterminated attribute value").with_position(self.position()));
        };
        let raw = self.slice(start, start + off)?;
        self.advance_to(start + off + 1);

        unescape(raw).map_err(|e| Error::invalid_escape(e.entity).with_position(self.position()))
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        match self.peek() {
            Some(b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(b) => Err(Error::syntax(format!(
                "expected '{}', found '{}'",
                expected as char, b as char
            ))
            .with_position(self.position())),
            None => Err(self.eof()),
        }
    }
}
