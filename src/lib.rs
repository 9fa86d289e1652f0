//! Merges hex word programs into a flat, fixed-size instruction-memory image.

mod error;
mod image;
mod merge;

pub use error::Error;
pub use image::{Image, Layout, LoadReport, Overflow, Region, Role, CAPACITY, HANDLER_OFFSET};
pub use merge::{build, Job, Summary};

peg::parser! {
    pub grammar words() for str {
        rule ws()
            = quiet! { [' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'] };
        rule _
            = ws()*;
        rule end()
            = &ws() / ![_];

        rule word() -> u32
            = "+"? ("0x" / "0X")? d:$(['0'..='9' | 'a'..='f' | 'A'..='F']+) end()
                {? u32::from_str_radix(d, 16).map_err(|_| "32-bit word") };

        // Never fails: whatever follows the last good word is left for the caller.
        pub rule stream() -> Stream
            = _ words:(word() ** (ws()+)) _ offset:position!() [_]* { Stream { words, offset } };
    }
}

/// Words read from one source, up to the first token that isn't a hex word.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stream {
    pub words: Vec<u32>,
    /// Byte offset where parsing stopped. Equal to the source length when every token parsed.
    pub offset: usize,
}

/// Where and what the first malformed token was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Malformed {
    pub line: usize,
    pub column: usize,
    pub token: String,
}

impl Stream {
    pub fn parse(source: &str) -> Self {
        words::stream(source).unwrap_or_default()
    }

    pub fn malformed(&self, source: &str) -> Option<Malformed> {
        let rest = source.get(self.offset..)?;
        let token = rest.split(|c: char| c.is_ascii_whitespace()).next()?;
        if token.is_empty() {
            return None;
        }

        Some(Malformed::after(&source[..self.offset], token.to_string()))
    }

    /// Parses raw file contents. A token holding bytes that aren't UTF-8 is
    /// malformed like any other, and ends the stream.
    pub fn decode(bytes: &[u8]) -> (Self, Option<Malformed>) {
        let valid = match core::str::from_utf8(bytes) {
            Ok(source) => {
                let stream = Self::parse(source);
                let malformed = stream.malformed(source);
                return (stream, malformed);
            },
            Err(e) => e.valid_up_to(),
        };

        let text = core::str::from_utf8(&bytes[..valid]).unwrap_or_default();
        let cut = text.rfind(|c: char| c.is_ascii_whitespace()).map_or(0, |i| i + 1);
        let head = &text[..cut];

        let stream = Self::parse(head);
        if let Some(m) = stream.malformed(head) {
            return (stream, Some(m));
        }

        let end = bytes[cut..].iter().position(u8::is_ascii_whitespace).map_or(bytes.len(), |i| cut + i);
        let token = String::from_utf8_lossy(&bytes[cut..end]).into_owned();
        (stream, Some(Malformed::after(head, token)))
    }
}

impl Malformed {
    fn after(before: &str, token: String) -> Self {
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
            token,
        }
    }
}

impl core::fmt::Display for Malformed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "`{}` at {}:{}", self.token, self.line, self.column)
    }
}
