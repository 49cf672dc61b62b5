use std::error::Error as StdError;

use thiserror::Error;

/// Error type a handler returns to abort the decode.
///
/// Any error implementing [`std::error::Error`] converts into it with `?`,
/// and so do plain strings (`Err("bad record".into())`).
pub type HandlerError = Box<dyn StdError + Send + Sync + 'static>;

/// Malformed input reported by the tokenizer, with the 1-based position of
/// the offending byte.
#[derive(Error, Debug)]
#[error("{source} at {line}:{column}")]
pub struct TokenError {
    pub(crate) source: SyntaxError,
    /// Line of the offending input, starting at 1.
    pub line: usize,
    /// Column of the offending input, starting at 1 and counted in characters.
    pub column: usize,
}

impl TokenError {
    /// What went wrong.
    #[must_use]
    pub fn kind(&self) -> &SyntaxError {
        &self.source
    }
}

/// The reasons a token stream can be rejected.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    #[error("invalid character '{}'", .0.escape_debug())]
    InvalidCharacter(char),
    #[error("invalid byte 0x{0:02X}")]
    InvalidByte(u8),
    #[error("invalid unicode escape sequence at character: '{}'", .0.escape_debug())]
    InvalidUnicodeEscapeChar(char),
    #[error("invalid unicode escape sequence \\u{0:04X}")]
    InvalidUnicodeEscapeSequence(u32),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("trailing characters after JSON value")]
    TrailingCharacters,
    #[error("nesting exceeds the limit of {0} levels")]
    DepthLimitExceeded(usize),
    #[error("not a string: object key expected")]
    KeyNotString,
    #[error("unexpected {0}")]
    UnexpectedToken(&'static str),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// A `pattern` passed to [`Decoder::on`](crate::Decoder::on) could not be
/// parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("pattern must start with `$`, `!` or `root`")]
    MissingRoot,
    #[error("empty key at offset {0}")]
    EmptyKey(usize),
    #[error("invalid array index at offset {0}")]
    InvalidIndex(usize),
    #[error("unterminated `[` at offset {0}")]
    UnterminatedIndex(usize),
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },
}

/// Returned by [`Decoder::on`](crate::Decoder::on).
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: PatternError,
    },
}

/// A matched value did not fit the shape its handler declared.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot decode value at {path}: {message}")]
pub struct ExtractError {
    /// Display form of the path the value was found at.
    pub path: String,
    /// The deserializer's description of the mismatch.
    pub message: String,
}

/// Why [`Decoder::decode`](crate::Decoder::decode) stopped.
///
/// Handlers invoked before the failure have already run; nothing is rolled
/// back.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("handler for {path} failed: {source}")]
    Handler {
        path: String,
        #[source]
        source: HandlerError,
    },
}

impl DecodeError {
    /// The error returned by the handler, if a handler failed.
    #[must_use]
    pub fn handler_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::Handler { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// Takes back ownership of the handler's error, e.g. to `downcast` it.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when the decode failed for another reason.
    pub fn into_handler_error(self) -> Result<HandlerError, Self> {
        match self {
            Self::Handler { source, .. } => Ok(source),
            other => Err(other),
        }
    }

    /// Position information when the input itself was malformed.
    #[must_use]
    pub fn as_token_error(&self) -> Option<&TokenError> {
        match self {
            Self::Token(err) => Some(err),
            _ => None,
        }
    }
}
