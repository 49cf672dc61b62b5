//! Decoding of `\uXXXX` escape sequences.
//!
//! The [`UnicodeEscapeBuffer`] type accumulates four ASCII hexadecimal digits
//! (`0-9`, `A-F`, `a-f`) and yields the UTF-16 code unit they spell. Code
//! units rather than `char`s are produced because JSON encodes characters
//! outside the basic multilingual plane as two escapes forming a surrogate
//! pair; [`SurrogatePair`] joins them back together.
use crate::error::SyntaxError;

#[derive(Debug, Default)]
pub(crate) struct UnicodeEscapeBuffer {
    value: u16,
    len: u8,
}

impl UnicodeEscapeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.value = 0;
        self.len = 0;
    }

    /// Feeds one hexadecimal digit.
    ///
    /// Returns `Ok(Some(unit))` once the fourth digit arrived, after which the
    /// buffer is ready for the next escape.
    pub fn feed(&mut self, byte: u8) -> Result<Option<u16>, SyntaxError> {
        let digit = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ => return Err(SyntaxError::InvalidUnicodeEscapeChar(char::from(byte))),
        };

        self.value = (self.value << 4) | u16::from(digit);
        self.len += 1;

        if self.len == 4 {
            let unit = self.value;
            self.reset();
            Ok(Some(unit))
        } else {
            Ok(None)
        }
    }
}

/// Joins UTF-16 code units produced by consecutive escapes into `char`s.
#[derive(Debug, Default)]
pub(crate) struct SurrogatePair {
    high: Option<u16>,
}

impl SurrogatePair {
    /// Accepts the next code unit.
    ///
    /// A high surrogate is held back until its low half arrives; anything
    /// else must not interrupt a pending pair.
    pub fn push(&mut self, unit: u16) -> Result<Option<char>, SyntaxError> {
        match (self.high.take(), unit) {
            (None, 0xD800..=0xDBFF) => {
                self.high = Some(unit);
                Ok(None)
            }
            (None, 0xDC00..=0xDFFF) => {
                Err(SyntaxError::InvalidUnicodeEscapeSequence(u32::from(unit)))
            }
            (None, _) => Ok(char::from_u32(u32::from(unit))),
            (Some(high), 0xDC00..=0xDFFF) => {
                let code = 0x1_0000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                char::from_u32(code)
                    .map(Some)
                    .ok_or(SyntaxError::InvalidUnicodeEscapeSequence(code))
            }
            (Some(high), _) => Err(SyntaxError::InvalidUnicodeEscapeSequence(u32::from(high))),
        }
    }

    /// Fails if a high surrogate is still waiting for its low half.
    pub fn finish(&mut self) -> Result<(), SyntaxError> {
        match self.high.take() {
            Some(high) => Err(SyntaxError::InvalidUnicodeEscapeSequence(u32::from(high))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SurrogatePair, UnicodeEscapeBuffer};
    use crate::error::SyntaxError;

    fn feed_all(buf: &mut UnicodeEscapeBuffer, digits: &str) -> Option<u16> {
        let mut last = None;
        for b in digits.bytes() {
            last = buf.feed(b).unwrap();
        }
        last
    }

    #[test]
    fn basic_decoding() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert_eq!(buf.feed(b'0').unwrap(), None);
        assert_eq!(buf.feed(b'0').unwrap(), None);
        assert_eq!(buf.feed(b'4').unwrap(), None);
        assert_eq!(buf.feed(b'1').unwrap(), Some(0x41));
    }

    #[test]
    fn mixed_case_hex() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert_eq!(feed_all(&mut buf, "AbCd"), Some(0xABCD));
    }

    #[test]
    fn reset_clears_buffer() {
        let mut buf = UnicodeEscapeBuffer::new();
        assert!(buf.feed(b'F').unwrap().is_none());
        buf.reset();
        assert_eq!(feed_all(&mut buf, "0041"), Some(0x41));
    }

    #[test]
    fn invalid_hex_error() {
        let mut buf = UnicodeEscapeBuffer::new();
        let err = buf.feed(b'G').unwrap_err();
        assert!(matches!(err, SyntaxError::InvalidUnicodeEscapeChar('G')));
    }

    #[test]
    fn surrogate_pair_joins() {
        let mut pair = SurrogatePair::default();
        assert_eq!(pair.push(0xD83D).unwrap(), None);
        assert_eq!(pair.push(0xDE00).unwrap(), Some('😀'));
        pair.finish().unwrap();
    }

    #[test]
    fn lone_surrogates_are_rejected() {
        let mut pair = SurrogatePair::default();
        assert!(pair.push(0xDC00).is_err());

        let mut pair = SurrogatePair::default();
        pair.push(0xD800).unwrap();
        assert!(pair.push(0x0041).is_err());

        let mut pair = SurrogatePair::default();
        pair.push(0xD800).unwrap();
        assert!(pair.finish().is_err());
    }
}
