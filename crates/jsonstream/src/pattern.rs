//! Path patterns that select values for handlers.
//!
//! A pattern has the same shape as a [`Path`] but each key and index may be
//! a wildcard:
//!
//! ```text
//! $                    the whole document
//! $.user.name          key "name" of the object under key "user"
//! $.items[*]           every element of the array under key "items"
//! $.*[0]               the first element of any array-valued member
//! $[*].id              key "id" of every element of a root array
//! ```
//!
//! Matching is exact-depth: `$.items[*]` never matches `$.items[0].tags[1]`.
use core::{fmt, str::FromStr};

use crate::{Index, Key, Path, error::PatternError, path::ROOT, path::Segment};

const ROOT_ALIASES: [&str; 3] = [ROOT, "!", "root"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySelector {
    Name(Key),
    Wildcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexSelector {
    Exact(Index),
    Wildcard,
}

/// Pattern counterpart of [`Segment`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternSegment {
    key: Option<KeySelector>,
    index: Option<IndexSelector>,
}

impl PatternSegment {
    #[must_use]
    pub fn key(&self) -> Option<&KeySelector> {
        self.key.as_ref()
    }

    #[must_use]
    pub fn index(&self) -> Option<IndexSelector> {
        self.index
    }

    fn matches(&self, segment: &Segment) -> bool {
        let key = match (&self.key, segment.key()) {
            (None, None) | (Some(KeySelector::Wildcard), Some(_)) => true,
            (Some(KeySelector::Name(name)), Some(key)) => name == key,
            _ => false,
        };
        let index = match (self.index, segment.index()) {
            (None, None) | (Some(IndexSelector::Wildcard), Some(_)) => true,
            (Some(IndexSelector::Exact(expected)), Some(index)) => expected == index,
            _ => false,
        };
        key && index
    }

    fn wildcards(&self) -> usize {
        usize::from(matches!(self.key, Some(KeySelector::Wildcard)))
            + usize::from(matches!(self.index, Some(IndexSelector::Wildcard)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    segments: Vec<PatternSegment>,
}

impl Pattern {
    /// Parses the textual form shown in the module documentation.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] pointing at the offending byte offset.
    pub fn parse(input: &str) -> Result<Self, PatternError> {
        if input.is_empty() {
            return Err(PatternError::Empty);
        }
        let rest = ROOT_ALIASES
            .iter()
            .find_map(|root| input.strip_prefix(root))
            .ok_or(PatternError::MissingRoot)?;
        let base = input.len() - rest.len();

        let mut segments: Vec<PatternSegment> = Vec::new();
        let mut pos = 0;
        while let Some(ch) = rest[pos..].chars().next() {
            match ch {
                '.' => {
                    pos += 1;
                    let end = rest[pos..]
                        .find(['.', '[', ']'])
                        .map_or(rest.len(), |i| pos + i);
                    let key = match &rest[pos..end] {
                        "" => return Err(PatternError::EmptyKey(base + pos)),
                        "*" => KeySelector::Wildcard,
                        name => KeySelector::Name(name.to_owned()),
                    };
                    segments.push(PatternSegment {
                        key: Some(key),
                        index: None,
                    });
                    pos = end;
                }
                '[' => {
                    let close = rest[pos + 1..]
                        .find(']')
                        .map(|i| pos + 1 + i)
                        .ok_or(PatternError::UnterminatedIndex(base + pos))?;
                    let index = parse_index(&rest[pos + 1..close])
                        .ok_or(PatternError::InvalidIndex(base + pos + 1))?;
                    match segments.last_mut() {
                        Some(last) if last.key.is_some() && last.index.is_none() => {
                            last.index = Some(index);
                        }
                        _ => segments.push(PatternSegment {
                            key: None,
                            index: Some(index),
                        }),
                    }
                    pos = close + 1;
                }
                ch => {
                    return Err(PatternError::UnexpectedCharacter {
                        ch,
                        offset: base + pos,
                    });
                }
            }
        }

        Ok(Self { segments })
    }

    #[must_use]
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Whether `path` is selected by this pattern.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        self.segments.len() == path.len()
            && self
                .segments
                .iter()
                .zip(path.segments())
                .all(|(pattern, segment)| pattern.matches(segment))
    }

    /// Number of wildcard selectors. Among patterns matching the same path,
    /// the one with fewer wildcards is the more specific.
    #[must_use]
    pub fn wildcards(&self) -> usize {
        self.segments.iter().map(PatternSegment::wildcards).sum()
    }
}

fn parse_index(inner: &str) -> Option<IndexSelector> {
    if inner == "*" {
        return Some(IndexSelector::Wildcard);
    }
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok().map(IndexSelector::Exact)
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ROOT)?;
        for segment in &self.segments {
            match &segment.key {
                Some(KeySelector::Name(name)) => write!(f, ".{name}")?,
                Some(KeySelector::Wildcard) => f.write_str(".*")?,
                None => {}
            }
            match segment.index {
                Some(IndexSelector::Exact(index)) => write!(f, "[{index}]")?,
                Some(IndexSelector::Wildcard) => f.write_str("[*]")?,
                None => {}
            }
        }
        Ok(())
    }
}
