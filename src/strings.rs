//! UTF-8 arena for host strings.

use crate::{error::CellError, host::HostStr};

/// Growable arena holding UTF-8 copies of host strings.
///
/// Spans handed out by [`transcode`](Self::transcode) stay valid until the next
/// [`truncate`](Self::truncate) or [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct StrBuffer {
    buf: String,
}

impl StrBuffer {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(64),
        }
    }

    /// Current position, for use with [`truncate`](Self::truncate).
    pub fn tell(&self) -> usize {
        self.buf.len()
    }

    /// Drop everything written after `pos`.
    pub fn truncate(&mut self, pos: usize) {
        self.buf.truncate(pos);
    }

    /// Reset to zero length.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Borrow `s` as UTF-8, copying into the arena when it is not already UTF-8.
    pub fn transcode<'a>(&'a mut self, s: &'a HostStr) -> Result<&'a str, CellError> {
        let start = self.buf.len();
        match s {
            HostStr::Utf8(text) => return Ok(text.as_str()),
            HostStr::Ucs1(units) => {
                self.buf.reserve(2 * units.len());
                self.buf.extend(units.iter().map(|&b| char::from(b)));
            }
            HostStr::Ucs2(units) => {
                self.buf.reserve(3 * units.len());
                for &unit in units {
                    match char::from_u32(u32::from(unit)) {
                        Some(c) => self.buf.push(c),
                        None => {
                            self.buf.truncate(start);
                            return Err(CellError::Transcode(format!(
                                "invalid UCS-2 code point: {unit}"
                            )));
                        }
                    }
                }
            }
            HostStr::Ucs4(units) => {
                self.buf.reserve(4 * units.len());
                for &unit in units {
                    match char::from_u32(unit) {
                        Some(c) => self.buf.push(c),
                        None => {
                            self.buf.truncate(start);
                            return Err(CellError::Transcode(format!(
                                "invalid UCS-4 code point: {unit}"
                            )));
                        }
                    }
                }
            }
        }
        Ok(&self.buf[start..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_is_borrowed_without_copy() {
        let mut arena = StrBuffer::new();
        let s = HostStr::Utf8("héllo".to_owned());
        assert_eq!(arena.transcode(&s).unwrap(), "héllo");
        assert_eq!(arena.tell(), 0);
    }

    #[test]
    fn wide_strings_are_copied() {
        let mut arena = StrBuffer::new();
        let ucs1 = HostStr::Ucs1(vec![b'c', 0xe9]);
        assert_eq!(arena.transcode(&ucs1).unwrap(), "cé");
        let pos = arena.tell();
        let ucs2 = HostStr::Ucs2("日本".encode_utf16().collect());
        assert_eq!(arena.transcode(&ucs2).unwrap(), "日本");
        let ucs4 = HostStr::Ucs4(vec![0x1F600]);
        assert_eq!(arena.transcode(&ucs4).unwrap(), "😀");
        arena.truncate(pos);
        assert_eq!(arena.tell(), pos);
        arena.clear();
        assert_eq!(arena.tell(), 0);
    }

    #[test]
    fn surrogates_rejected() {
        let mut arena = StrBuffer::new();
        let lone = HostStr::Ucs2(vec![b'a' as u16, 0xD800]);
        match arena.transcode(&lone) {
            Err(CellError::Transcode(msg)) => assert_eq!(msg, "invalid UCS-2 code point: 55296"),
            other => panic!("expected transcode error, got {other:?}"),
        }
        assert_eq!(arena.tell(), 0);
    }
}
