use crate::tokenizer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedLiteralValue {
    Null,
    True,
    False,
}

/// What happened after feeding one more byte into the literal matcher?
pub enum Step {
    /// Byte matched, but the literal is not finished yet.
    NeedMore,
    /// Byte matched *and* it was the last byte of the literal.
    Done(Token),
    /// Byte did **not** match the expected one.
    Reject,
}

/// `None`  ➜  we are **not** in the middle of a literal
/// `Some`  ➜  `(remaining_bytes, token_kind)` while matching
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExpectedLiteralBuffer(Option<(&'static [u8], ExpectedLiteralValue)>);

impl ExpectedLiteralBuffer {
    /// Start matching after the *first* byte (`n`, `t`, or `f`)
    pub fn new(first: u8) -> Self {
        match first {
            b'n' => ExpectedLiteralBuffer(Some((b"ull", ExpectedLiteralValue::Null))),
            b't' => ExpectedLiteralBuffer(Some((b"rue", ExpectedLiteralValue::True))),
            b'f' => ExpectedLiteralBuffer(Some((b"alse", ExpectedLiteralValue::False))),
            _ => ExpectedLiteralBuffer(None),
        }
    }

    /// Give the matcher the next input byte and learn what to do next.
    pub fn step(&mut self, byte: u8) -> Step {
        let Some((bytes, kind)) = self.0.take() else {
            return Step::Reject;
        };

        match bytes.split_first() {
            Some((expected, rest)) if *expected == byte => {
                if rest.is_empty() {
                    Step::Done(match kind {
                        ExpectedLiteralValue::Null => Token::Null,
                        ExpectedLiteralValue::True => Token::Boolean(true),
                        ExpectedLiteralValue::False => Token::Boolean(false),
                    })
                } else {
                    self.0 = Some((rest, kind));
                    Step::NeedMore
                }
            }
            _ => {
                // Mismatch – restore the state we took at the top
                self.0 = Some((bytes, kind));
                Step::Reject
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(first: u8, rest: &[u8]) -> Option<Token> {
        let mut buf = ExpectedLiteralBuffer::new(first);
        for &b in rest {
            match buf.step(b) {
                Step::NeedMore => {}
                Step::Done(tok) => return Some(tok),
                Step::Reject => return None,
            }
        }
        None
    }

    #[test]
    fn matches_all_literals() {
        assert!(matches!(run(b'n', b"ull"), Some(Token::Null)));
        assert!(matches!(run(b't', b"rue"), Some(Token::Boolean(true))));
        assert!(matches!(run(b'f', b"alse"), Some(Token::Boolean(false))));
    }

    #[test]
    fn rejects_misspelling() {
        assert!(run(b't', b"ru").is_none());
        assert!(run(b'n', b"ul1").is_none());
        assert!(run(b'x', b"").is_none());
    }
}
