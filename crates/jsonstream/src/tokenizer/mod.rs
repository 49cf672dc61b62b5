//! Pull tokenizer over an [`io::Read`] source.
//!
//! The tokenizer hands out one [`Token`] at a time and validates the JSON
//! grammar as it goes (commas, colons, matching delimiters), so callers only
//! ever see structurally valid token sequences. On top of the raw token
//! stream it offers:
//!
//! - one token of lookahead ([`Tokenizer::peek_token`]),
//! - [`Tokenizer::more`], which reports whether the innermost open container
//!   has another entry,
//! - [`Tokenizer::next_document`], which checks what follows a complete root
//!   value.
#![allow(clippy::enum_glob_use)]

use std::io::{self, BufRead, BufReader, Read};

use crate::{
    error::{SyntaxError, TokenError},
    escape_buffer::{SurrogatePair, UnicodeEscapeBuffer},
    literal_buffer::{ExpectedLiteralBuffer, Step},
    options::DecoderOptions,
};


#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    PropertyName(String),
    String(String),
    /// The literal text of the number, already validated against the JSON
    /// grammar.
    Number(String),
    Boolean(bool),
    Null,
}

impl Token {
    pub fn describe(&self) -> &'static str {
        match self {
            Token::BeginObject => "'{'",
            Token::EndObject => "'}'",
            Token::BeginArray => "'['",
            Token::EndArray => "']'",
            Token::PropertyName(_) => "object key",
            Token::String(_) => "string",
            Token::Number(_) => "number",
            Token::Boolean(_) => "boolean",
            Token::Null => "null",
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Grammar states
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    /// Right after `{`: a key or `}`.
    FirstPropertyName,
    /// After `,` inside an object: a key only.
    BeforePropertyName,
    AfterPropertyName,
    BeforePropertyValue,
    /// Right after `[`: a value or `]`.
    FirstArrayValue,
    /// After `,` inside an array: a value only.
    BeforeArrayValue,
    AfterPropertyValue,
    AfterArrayValue,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Array,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberState {
    Sign,
    Zero,
    DecimalInteger,
    DecimalPoint,
    DecimalFraction,
    DecimalExponent,
    DecimalExponentSign,
    DecimalExponentInteger,
}

impl NumberState {
    /// Whether the literal may end in this state.
    fn is_complete(self) -> bool {
        matches!(
            self,
            Self::Zero | Self::DecimalInteger | Self::DecimalFraction | Self::DecimalExponentInteger
        )
    }
}

pub(crate) struct Tokenizer<R> {
    reader: BufReader<R>,

    line: usize,
    column: usize,

    state: ParseState,
    frames: Vec<Frame>,
    peeked: Option<Token>,

    /// Reused for strings before they are checked for UTF-8 validity.
    scratch: Vec<u8>,

    max_depth: usize,
    multiple_values: bool,
}

impl<R: Read> Tokenizer<R> {
    pub fn new(reader: R, options: &DecoderOptions) -> Self {
        Self {
            reader: BufReader::with_capacity(options.buffer_capacity.max(1), reader),
            line: 1,
            column: 1,
            state: ParseState::Start,
            frames: Vec::with_capacity(16),
            peeked: None,
            scratch: Vec::new(),
            max_depth: options.max_depth,
            multiple_values: options.allow_multiple_json_values,
        }
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Result<Token, TokenError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lex(),
        }
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<&Token, TokenError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Reports whether the innermost open container has another entry.
    ///
    /// A separating comma is consumed; a closing delimiter is left for
    /// [`next_token`](Self::next_token) to return.
    pub fn more(&mut self) -> Result<bool, TokenError> {
        use ParseState::*;

        if let Some(token) = &self.peeked {
            return Ok(!matches!(token, Token::EndObject | Token::EndArray));
        }

        let byte = self.skip_whitespace()?;
        match (self.state, byte) {
            (_, None) if self.state != Start && self.state != End => {
                Err(self.error(SyntaxError::UnexpectedEndOfInput))
            }
            (FirstPropertyName | FirstArrayValue, Some(b'}' | b']')) => Ok(false),
            (FirstPropertyName | FirstArrayValue | BeforePropertyName | BeforeArrayValue, _) => {
                Ok(true)
            }
            (AfterPropertyValue, Some(b',')) => {
                self.advance();
                self.state = BeforePropertyName;
                Ok(true)
            }
            (AfterArrayValue, Some(b',')) => {
                self.advance();
                self.state = BeforeArrayValue;
                Ok(true)
            }
            (AfterPropertyValue, Some(b'}')) | (AfterArrayValue, Some(b']')) => Ok(false),
            (AfterPropertyValue | AfterArrayValue, Some(_)) => Err(self.invalid_char()),
            _ => Ok(false),
        }
    }

    /// Called between root values: returns `true` if another document
    /// follows.
    ///
    /// Without `allow_multiple_json_values` anything but whitespace after
    /// the first root value is an error, and so is an empty input.
    pub fn next_document(&mut self) -> Result<bool, TokenError> {
        let byte = self.skip_whitespace()?;
        match (self.state, byte) {
            (ParseState::Start, Some(_)) => Ok(true),
            (ParseState::Start, None) if self.multiple_values => Ok(false),
            (ParseState::Start, None) => Err(self.error(SyntaxError::UnexpectedEndOfInput)),
            (ParseState::End, None) => Ok(false),
            (ParseState::End, Some(_)) if self.multiple_values => {
                self.state = ParseState::Start;
                Ok(true)
            }
            (ParseState::End, Some(_)) => Err(self.error(SyntaxError::TrailingCharacters)),
            _ => Err(self.error(SyntaxError::UnexpectedToken("end of document"))),
        }
    }

    /// Consumes the value at the cursor, whatever its size.
    pub fn skip_value(&mut self) -> Result<(), TokenError> {
        let mut depth = 0usize;
        loop {
            match self.next_token()? {
                Token::BeginObject | Token::BeginArray => depth += 1,
                Token::EndObject | Token::EndArray if depth > 0 => depth -= 1,
                token @ (Token::EndObject | Token::EndArray) => {
                    return Err(self.error(SyntaxError::UnexpectedToken(token.describe())));
                }
                _ => {}
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Builds an error located at the current input position.
    pub fn error(&self, source: SyntaxError) -> TokenError {
        TokenError {
            source,
            line: self.line,
            column: self.column,
        }
    }

    // ------------------------------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------------------------------

    fn fill(&mut self) -> Result<&[u8], TokenError> {
        loop {
            match self.reader.fill_buf() {
                Ok(_) => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(self.error(SyntaxError::Io(err))),
            }
        }
        Ok(self.reader.buffer())
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, TokenError> {
        Ok(self.fill()?.first().copied())
    }

    /// Consumes one byte, updating the position counters.
    fn advance(&mut self) {
        if let Some(&byte) = self.reader.buffer().first() {
            self.reader.consume(1);
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if byte & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
    }

    /// Consumes the next byte, failing at end of input.
    fn next_byte(&mut self) -> Result<u8, TokenError> {
        match self.peek_byte()? {
            Some(byte) => {
                self.advance();
                Ok(byte)
            }
            None => Err(self.error(SyntaxError::UnexpectedEndOfInput)),
        }
    }

    fn skip_whitespace(&mut self) -> Result<Option<u8>, TokenError> {
        loop {
            match self.peek_byte()? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.advance(),
                other => return Ok(other),
            }
        }
    }

    // ------------------------------------------------------------------------------------------------
    // Lexer
    // ------------------------------------------------------------------------------------------------

    fn lex(&mut self) -> Result<Token, TokenError> {
        use ParseState::*;

        loop {
            let Some(byte) = self.skip_whitespace()? else {
                return Err(self.error(SyntaxError::UnexpectedEndOfInput));
            };

            match self.state {
                Start | BeforePropertyValue | BeforeArrayValue => return self.lex_value(byte),
                FirstArrayValue if byte == b']' => {
                    self.advance();
                    return Ok(self.close());
                }
                FirstArrayValue => return self.lex_value(byte),
                FirstPropertyName if byte == b'}' => {
                    self.advance();
                    return Ok(self.close());
                }
                FirstPropertyName | BeforePropertyName if byte == b'"' => {
                    self.advance();
                    let key = self.lex_string()?;
                    self.state = AfterPropertyName;
                    return Ok(Token::PropertyName(key));
                }
                BeforePropertyName if byte == b'}' => return Err(self.invalid_char()),
                FirstPropertyName | BeforePropertyName => {
                    return Err(self.error(SyntaxError::KeyNotString));
                }
                AfterPropertyName if byte == b':' => {
                    self.advance();
                    self.state = BeforePropertyValue;
                }
                AfterPropertyValue if byte == b',' => {
                    self.advance();
                    self.state = BeforePropertyName;
                }
                AfterArrayValue if byte == b',' => {
                    self.advance();
                    self.state = BeforeArrayValue;
                }
                AfterPropertyValue if byte == b'}' => {
                    self.advance();
                    return Ok(self.close());
                }
                AfterArrayValue if byte == b']' => {
                    self.advance();
                    return Ok(self.close());
                }
                End => return Err(self.error(SyntaxError::TrailingCharacters)),
                _ => return Err(self.invalid_char()),
            }
        }
    }

    fn lex_value(&mut self, byte: u8) -> Result<Token, TokenError> {
        let token = match byte {
            b'{' => {
                self.open(Frame::Object)?;
                self.advance();
                self.state = ParseState::FirstPropertyName;
                return Ok(Token::BeginObject);
            }
            b'[' => {
                self.open(Frame::Array)?;
                self.advance();
                self.state = ParseState::FirstArrayValue;
                return Ok(Token::BeginArray);
            }
            b'"' => {
                self.advance();
                Token::String(self.lex_string()?)
            }
            b'n' | b't' | b'f' => self.lex_literal(byte)?,
            b'-' | b'0'..=b'9' => self.lex_number()?,
            _ => return Err(self.invalid_char()),
        };

        self.state = self.after_value();
        Ok(token)
    }

    fn lex_literal(&mut self, first: u8) -> Result<Token, TokenError> {
        self.advance();
        let mut expected = ExpectedLiteralBuffer::new(first);
        loop {
            let Some(byte) = self.peek_byte()? else {
                return Err(self.error(SyntaxError::UnexpectedEndOfInput));
            };
            match expected.step(byte) {
                Step::NeedMore => self.advance(),
                Step::Done(token) => {
                    self.advance();
                    return Ok(token);
                }
                Step::Reject => return Err(self.invalid_char()),
            }
        }
    }

    fn lex_number(&mut self) -> Result<Token, TokenError> {
        use NumberState::*;

        let mut literal = String::new();
        let first = self.next_byte()?;
        // Only ASCII bytes reach the literal.
        literal.push(char::from(first));
        let mut state = match first {
            b'-' => Sign,
            b'0' => Zero,
            _ => DecimalInteger,
        };

        loop {
            let byte = self.peek_byte()?;
            let next = match (state, byte) {
                (Sign, Some(b'0')) => Zero,
                (Sign, Some(b'1'..=b'9')) | (DecimalInteger, Some(b'0'..=b'9')) => DecimalInteger,
                (Zero | DecimalInteger, Some(b'.')) => DecimalPoint,
                (DecimalPoint | DecimalFraction, Some(b'0'..=b'9')) => DecimalFraction,
                (Zero | DecimalInteger | DecimalFraction, Some(b'e' | b'E')) => DecimalExponent,
                (DecimalExponent, Some(b'+' | b'-')) => DecimalExponentSign,
                (
                    DecimalExponent | DecimalExponentSign | DecimalExponentInteger,
                    Some(b'0'..=b'9'),
                ) => DecimalExponentInteger,
                _ if state.is_complete() => return Ok(Token::Number(literal)),
                (_, None) => return Err(self.error(SyntaxError::UnexpectedEndOfInput)),
                (_, Some(_)) => return Err(self.invalid_char()),
            };
            if let Some(byte) = byte {
                literal.push(char::from(byte));
            }
            self.advance();
            state = next;
        }
    }

    /// Reads a string body; the opening quote is already consumed.
    fn lex_string(&mut self) -> Result<String, TokenError> {
        self.scratch.clear();
        let mut pair = SurrogatePair::default();

        loop {
            // Fast path: copy as many plain bytes as the buffer holds.
            self.fill()?;
            let buf = self.reader.buffer();
            let plain = buf
                .iter()
                .position(|&b| b == b'"' || b == b'\\' || b < 0x20)
                .unwrap_or(buf.len());
            if plain > 0 {
                pair.finish().map_err(|err| self.error(err))?;
                let chars = buf[..plain].iter().filter(|&&b| b & 0xC0 != 0x80).count();
                self.scratch.extend_from_slice(&buf[..plain]);
                self.reader.consume(plain);
                self.column += chars;
                continue;
            }

            match self.peek_byte()? {
                None => return Err(self.error(SyntaxError::UnexpectedEndOfInput)),
                Some(b'"') => {
                    pair.finish().map_err(|err| self.error(err))?;
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    let escaped = self.next_byte()?;
                    let ch = match escaped {
                        b'"' => '"',
                        b'\\' => '\\',
                        b'/' => '/',
                        b'b' => '\u{0008}',
                        b'f' => '\u{000C}',
                        b'n' => '\n',
                        b'r' => '\r',
                        b't' => '\t',
                        b'u' => {
                            let unit = self.lex_unicode_escape()?;
                            match pair.push(unit).map_err(|err| self.error(err))? {
                                Some(ch) => ch,
                                None => continue,
                            }
                        }
                        other => {
                            return Err(self.error(SyntaxError::InvalidCharacter(char::from(other))));
                        }
                    };
                    if escaped != b'u' {
                        pair.finish().map_err(|err| self.error(err))?;
                    }
                    let mut utf8 = [0u8; 4];
                    self.scratch.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
                }
                // JSON allows 0x20 .. 0x10FFFF unescaped.
                Some(_) => return Err(self.invalid_char()),
            }
        }

        String::from_utf8(core::mem::take(&mut self.scratch))
            .map_err(|_| self.error(SyntaxError::InvalidUtf8))
    }

    fn lex_unicode_escape(&mut self) -> Result<u16, TokenError> {
        let mut buffer = UnicodeEscapeBuffer::new();
        loop {
            let byte = self.next_byte()?;
            if let Some(unit) = buffer.feed(byte).map_err(|err| self.error(err))? {
                return Ok(unit);
            }
        }
    }

    // ------------------------------------------------------------------------------------------------
    // Container bookkeeping
    // ------------------------------------------------------------------------------------------------

    fn open(&mut self, frame: Frame) -> Result<(), TokenError> {
        if self.frames.len() >= self.max_depth {
            return Err(self.error(SyntaxError::DepthLimitExceeded(self.max_depth)));
        }
        self.frames.push(frame);
        Ok(())
    }

    fn close(&mut self) -> Token {
        let token = match self.frames.pop() {
            Some(Frame::Object) => Token::EndObject,
            _ => Token::EndArray,
        };
        self.state = self.after_value();
        token
    }

    fn after_value(&self) -> ParseState {
        match self.frames.last() {
            None => ParseState::End,
            Some(Frame::Array) => ParseState::AfterArrayValue,
            Some(Frame::Object) => ParseState::AfterPropertyValue,
        }
    }

    // ------------------------------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------------------------------

    /// Error for the byte at the cursor, decoded as a character when the
    /// buffer holds a complete UTF-8 sequence.
    fn invalid_char(&mut self) -> TokenError {
        let source = match self.fill() {
            Ok(buf) if !buf.is_empty() => match bstr::decode_utf8(buf) {
                (Some(ch), _) => SyntaxError::InvalidCharacter(ch),
                (None, _) => SyntaxError::InvalidByte(buf[0]),
            },
            Ok(_) => SyntaxError::UnexpectedEndOfInput,
            Err(err) => return err,
        };
        self.error(source)
    }
}
