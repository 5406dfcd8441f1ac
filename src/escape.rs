//! XML escape and unescape utilities.
//!
//! Text content only needs `<`, `>` and `&` replaced; attribute values
//! additionally escape both quote characters.

use memchr::{memchr, memchr2, memchr3};
use std::borrow::Cow;

/// Escapes character data for use between tags.
#[inline]
pub fn escape_text(s: &str) -> Cow<'_, str> {
    if memchr3(b'<', b'>', b'&', s.as_bytes()).is_none() {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    escape_into(s, &mut out, false);
    Cow::Owned(out)
}

/// Escapes an attribute value for use inside double quotes.
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if memchr3(b'<', b'>', b'&', bytes).is_none() && memchr2(b'"', b'\'', bytes).is_none() {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    escape_into(s, &mut out, true);
    Cow::Owned(out)
}

fn escape_into(s: &str, out: &mut String, quotes: bool) {
    let mut start = 0;
    for (i, byte) in s.bytes().enumerate() {
        let escaped = match byte {
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'&' => "&amp;",
            b'"' if quotes => "&quot;",
            b'\'' if quotes => "&apos;",
            _ => continue,
        };
        // escaped bytes are ASCII, so `i` is always a char boundary
        out.push_str(&s[start..i]);
        out.push_str(escaped);
        start = i + 1;
    }
    out.push_str(&s[start..]);
}

/// Error type for unescape operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnescapeError {
    /// The invalid entity that caused the error.
    pub entity: String,
    /// Byte offset in the input where the entity starts.
    pub position: usize,
}

impl std::fmt::Display for UnescapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid XML entity '{}' at position {}", self.entity, self.position)
    }
}

impl std::error::Error for UnescapeError {}

/// Resolves predefined and numeric character references.
pub fn unescape(s: &str) -> Result<Cow<'_, str>, UnescapeError> {
    let bytes = s.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Ok(Cow::Borrowed(s));
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;

    while i < bytes.len() {
        let Some(amp) = memchr(b'&', &bytes[i..]).map(|off| i + off) else {
            out.push_str(&s[i..]);
            break;
        };
        out.push_str(&s[i..amp]);

        let len = match memchr(b';', &bytes[amp + 1..]) {
            Some(len) if len > 0 => len,
            _ => {
                return Err(UnescapeError {
                    entity: String::from("&"),
                    position: amp,
                })
            }
        };
        let entity = &s[amp + 1..amp + 1 + len];
        match decode_entity(entity).or_else(|| decode_numeric_entity(entity)) {
            Some(c) => out.push(c),
            None => {
                return Err(UnescapeError {
                    entity: format!("&{};", entity),
                    position: amp,
                })
            }
        }
        i = amp + len + 2;
    }

    Ok(Cow::Owned(out))
}

#[inline]
fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// Decodes `#NNN` or `#xHHH`.
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}
