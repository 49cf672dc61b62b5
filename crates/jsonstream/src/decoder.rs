//! Pattern dispatch over a streaming walk of the document.
//!
//! The [`Decoder`] walks the token stream depth-first and keeps track of the
//! [`Path`] of the value under the cursor. Before consuming a value it looks
//! for a registered pattern matching that path:
//!
//! - on a match, the whole value is decoded into the handler's type and the
//!   handler runs; nothing inside the value is visited again;
//! - otherwise objects and arrays are entered member by member and scalars
//!   are dropped.
//!
//! Subtrees deeper than every registered pattern are skipped without
//! tracking their paths.
use core::fmt;
use std::io::Read;

use serde::de::DeserializeOwned;

use crate::{
    DecoderOptions, Path, Pattern,
    error::{DecodeError, ExtractError, HandlerError, RegistrationError, SyntaxError},
    extract::{DeError, extract},
    tokenizer::{Token, Tokenizer},
};

/// Decodes the value at the cursor and feeds it to a handler.
type Dispatch<'h, R> = Box<dyn FnMut(&str, &mut Tokenizer<R>) -> Result<(), DecodeError> + 'h>;

struct Registration<'h, R> {
    pattern: Pattern,
    dispatch: Dispatch<'h, R>,
}

/// What a successful [`Decoder::decode`] went through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Root values walked; always 1 unless
    /// [`allow_multiple_json_values`](DecoderOptions::allow_multiple_json_values)
    /// is set.
    pub documents: usize,
    pub handlers_invoked: usize,
}

/// Streaming JSON decoder dispatching matched values to typed handlers.
///
/// ```rust
/// use jsonstream::Decoder;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Item {
///     id: u32,
///     name: String,
/// }
///
/// let input = br#"{"total": 2, "items": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]}"#;
///
/// let mut total = 0;
/// let mut names = Vec::new();
/// let mut decoder = Decoder::from_slice(input);
/// decoder
///     .on("$.total", |_, n: u32| {
///         total = n;
///         Ok(())
///     })?
///     .on("$.items[*]", |path, item: Item| {
///         names.push(format!("{path} = {}:{}", item.id, item.name));
///         Ok(())
///     })?;
/// let summary = decoder.decode()?;
///
/// assert_eq!(summary.handlers_invoked, 3);
/// assert_eq!(total, 2);
/// assert_eq!(names, ["$.items[0] = 1:a", "$.items[1] = 2:b"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// Handlers may borrow from the enclosing scope for `'h`; they are dropped
/// together with the decoder when [`decode`](Self::decode) returns.
pub struct Decoder<'h, R> {
    tokens: Tokenizer<R>,
    registry: Vec<Registration<'h, R>>,
    /// Longest registered pattern, in segments.
    reach: Option<usize>,
}

impl<'a: 'h, 'h> Decoder<'h, &'a [u8]> {
    /// Decodes an in-memory document.
    #[must_use]
    pub fn from_slice(input: &'a [u8]) -> Self {
        Self::new(input)
    }
}

impl<'h, R: Read + 'h> Decoder<'h, R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecoderOptions::default())
    }

    #[must_use]
    pub fn with_options(reader: R, options: DecoderOptions) -> Self {
        Self {
            tokens: Tokenizer::new(reader, &options),
            registry: Vec::new(),
            reach: None,
        }
    }

    /// Registers `handler` for every value whose path matches `pattern`.
    ///
    /// The value is decoded into `T` before the handler sees it; see the
    /// [crate documentation](crate) for how `null` and missing members are
    /// treated. Registering the same pattern again replaces its handler.
    /// When several patterns match one path, the one with the fewest
    /// wildcards wins, then the one registered first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidPattern`] if `pattern` does not
    /// parse.
    pub fn on<T, F>(&mut self, pattern: &str, mut handler: F) -> Result<&mut Self, RegistrationError>
    where
        T: DeserializeOwned + 'h,
        F: FnMut(&str, T) -> Result<(), HandlerError> + 'h,
    {
        let parsed = Pattern::parse(pattern).map_err(|source| RegistrationError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;

        let dispatch: Dispatch<'h, R> = Box::new(move |path: &str, tokens: &mut Tokenizer<R>| {
            let value = extract::<T, R>(tokens).map_err(|err| match err {
                DeError::Token(err) => DecodeError::Token(err),
                DeError::Custom(message) => ExtractError {
                    path: path.to_owned(),
                    message,
                }
                .into(),
            })?;
            handler(path, value).map_err(|source| DecodeError::Handler {
                path: path.to_owned(),
                source,
            })
        });

        let depth = parsed.segments().len();
        self.reach = Some(self.reach.map_or(depth, |reach| reach.max(depth)));

        if let Some(existing) = self.registry.iter_mut().find(|r| r.pattern == parsed) {
            tracing::debug!(pattern = %parsed, "replacing handler");
            existing.dispatch = dispatch;
        } else {
            tracing::debug!(
                pattern = %parsed,
                handlers = self.registry.len() + 1,
                "registered handler"
            );
            self.registry.push(Registration {
                pattern: parsed,
                dispatch,
            });
        }
        Ok(self)
    }

    /// Walks the input to its end, invoking handlers in document order.
    ///
    /// # Errors
    ///
    /// Stops at the first malformed token, value that does not fit its
    /// handler's type, or handler failure. Input after a complete root value
    /// must be whitespace unless multiple values are allowed.
    pub fn decode(mut self) -> Result<DecodeSummary, DecodeError> {
        let mut summary = DecodeSummary::default();
        if let Err(err) = self.walk(&mut summary) {
            tracing::debug!(
                error = %err,
                documents = summary.documents,
                handlers_invoked = summary.handlers_invoked,
                "decode failed"
            );
            return Err(err);
        }
        tracing::debug!(
            documents = summary.documents,
            handlers_invoked = summary.handlers_invoked,
            "decode finished"
        );
        Ok(summary)
    }

    fn walk(&mut self, summary: &mut DecodeSummary) -> Result<(), DecodeError> {
        let mut path = Path::root();
        while self.tokens.next_document()? {
            self.visit(&mut path, summary)?;
            summary.documents += 1;
        }
        Ok(())
    }

    /// Most specific registration matching `path`.
    fn lookup(&self, path: &Path) -> Option<usize> {
        self.registry
            .iter()
            .enumerate()
            .filter(|(_, r)| r.pattern.matches(path))
            .min_by_key(|(_, r)| r.pattern.wildcards())
            .map(|(index, _)| index)
    }

    fn visit(&mut self, path: &mut Path, summary: &mut DecodeSummary) -> Result<(), DecodeError> {
        if let Some(index) = self.lookup(path) {
            let shown = path.to_string();
            let registration = &mut self.registry[index];
            tracing::trace!(path = %shown, pattern = %registration.pattern, "dispatching");
            (registration.dispatch)(&shown, &mut self.tokens)?;
            summary.handlers_invoked += 1;
            return Ok(());
        }

        // Paths only grow going down, so nothing below can match.
        if self.reach.is_none_or(|reach| path.len() > reach) {
            return Ok(self.tokens.skip_value()?);
        }

        match self.tokens.next_token()? {
            Token::BeginObject => {
                while self.tokens.more()? {
                    let key = match self.tokens.next_token()? {
                        Token::PropertyName(key) => key,
                        token => {
                            return Err(self
                                .tokens
                                .error(SyntaxError::UnexpectedToken(token.describe()))
                                .into());
                        }
                    };
                    path.push_key(key);
                    self.visit(path, summary)?;
                    path.pop();
                }
                self.tokens.next_token()?;
            }
            Token::BeginArray => {
                let mut index = 0;
                while self.tokens.more()? {
                    path.push_index(index);
                    self.visit(path, summary)?;
                    path.pop();
                    index += 1;
                }
                self.tokens.next_token()?;
            }
            token @ (Token::EndObject | Token::EndArray | Token::PropertyName(_)) => {
                return Err(self
                    .tokens
                    .error(SyntaxError::UnexpectedToken(token.describe()))
                    .into());
            }
            _ => {}
        }
        Ok(())
    }
}

impl<R> fmt::Debug for Decoder<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field(
                "patterns",
                &self
                    .registry
                    .iter()
                    .map(|r| r.pattern.to_string())
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
