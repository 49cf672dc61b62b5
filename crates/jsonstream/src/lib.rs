//! Streaming JSON decoding with path-pattern callbacks.
//!
//! Register a handler per path pattern, then let [`Decoder::decode`] walk the
//! input once. Each value whose path matches a pattern is decoded with
//! `serde` into the type the handler asks for and handed over immediately;
//! everything else is validated and dropped, so a large array of records can
//! be processed one record at a time.
//!
//! ```rust
//! use std::cell::RefCell;
//!
//! use jsonstream::{Decoder, Value};
//!
//! let input = r#"{"one": 1, "two": ["a", "b"], "three": {"nested": true}}"#;
//!
//! let seen = RefCell::new(Vec::new());
//! let mut decoder = Decoder::from_slice(input.as_bytes());
//! decoder
//!     .on("$.one", |path, n: i64| {
//!         seen.borrow_mut().push(format!("{path} -> {n}"));
//!         Ok(())
//!     })?
//!     .on("$.two[*]", |path, s: String| {
//!         seen.borrow_mut().push(format!("{path} -> {s}"));
//!         Ok(())
//!     })?
//!     .on("$.three", |path, v: Value| {
//!         seen.borrow_mut().push(format!("{path} -> {v}"));
//!         Ok(())
//!     })?;
//! decoder.decode()?;
//!
//! assert_eq!(
//!     seen.into_inner(),
//!     [
//!         "$.one -> 1",
//!         "$.two[0] -> a",
//!         "$.two[1] -> b",
//!         r#"$.three -> {"nested":true}"#,
//!     ]
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Patterns
//!
//! A pattern starts at the root (`$`, `!` or `root`) and descends with
//! `.key` and `[index]`; `*` in either position matches anything. Matching
//! is exact-depth, see [`Pattern`].
//!
//! # Null handling
//!
//! A `null` decoded into a non-optional type yields that type's zero value:
//! `0`, `false`, `""`, an empty collection, a tuple of zeros, the first
//! variant of an enum, or a struct whose fields are all zero. Into an
//! `Option` it yields `None`. Object members are matched to struct fields by
//! their exact serde names; unknown members are skipped and fields the
//! object does not mention get their zero value, so no field is required.
//!
//! # Errors
//!
//! Bad patterns are rejected by [`Decoder::on`]. Decoding stops at the first
//! [`DecodeError`]: malformed input ([`TokenError`], with line and column), a
//! value that does not fit its handler's type ([`ExtractError`]), or an error
//! returned by a handler, which is kept as is and can be downcast.
#![allow(missing_docs)]

mod decoder;
mod error;
mod escape_buffer;
mod extract;
mod literal_buffer;
mod options;
mod path;
mod path_component;
mod pattern;
mod tokenizer;
mod value;

#[cfg(test)]
mod chunk_utils;
#[cfg(test)]
mod tests;

pub use decoder::{DecodeSummary, Decoder};
pub use error::{
    DecodeError, ExtractError, HandlerError, PatternError, RegistrationError, SyntaxError,
    TokenError,
};
pub use options::DecoderOptions;
pub use path::{Path, Segment};
pub use path_component::{Index, IntoPathComponent, Key, PathComponent};
pub use pattern::{IndexSelector, KeySelector, Pattern, PatternSegment};
pub use value::{Array, Map, Value};

/// Macro to build a [`Path`] from a heterogeneous list of keys and indices.
///
/// ```rust
/// # use jsonstream::{path, Path};
/// let p = path!["foo", 0, 2, "bar"];
/// assert_eq!(p.to_string(), "$.foo[0][2].bar");
/// assert_eq!(path![], Path::root());
/// ```
#[macro_export]
macro_rules! path {
    ( $( $elem:expr ),* $(,)? ) => {{
        #[allow(unused_mut)]
        let mut path = $crate::Path::root();
        $( path.push($crate::IntoPathComponent::into_path_component($elem)); )*
        path
    }};
}
