use core::fmt;

use crate::{Index, Key, PathComponent};

/// The display form of the root path and the sentinel every pattern starts
/// with.
pub const ROOT: &str = "$";

/// One step of a [`Path`]: an object key, optionally followed by the index of
/// an element of the array stored under that key.
///
/// Array elements that have no key of their own, the elements of a root
/// array or of a nested array, get a segment without key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Segment {
    key: Option<Key>,
    index: Option<Index>,
}

impl Segment {
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use]
    pub fn index(&self) -> Option<Index> {
        self.index
    }
}

/// Position of a value inside a JSON document.
///
/// The traversal builds the path incrementally: a key is pushed when an
/// object member is entered and popped when it is left, likewise for array
/// indices.
///
/// ```rust
/// use jsonstream::path;
///
/// let p = path!["items", 2, "tags", 0, 1];
/// assert_eq!(p.to_string(), "$.items[2].tags[0][1]");
/// assert_eq!(p.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The path of the document root.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments; the root has none.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn push_key(&mut self, key: impl Into<Key>) {
        self.segments.push(Segment {
            key: Some(key.into()),
            index: None,
        });
    }

    /// Appends an array index, attaching it to the last segment when that
    /// segment is a key that has no index yet.
    pub fn push_index(&mut self, index: Index) {
        match self.segments.last_mut() {
            Some(last) if last.key.is_some() && last.index.is_none() => last.index = Some(index),
            _ => self.segments.push(Segment {
                key: None,
                index: Some(index),
            }),
        }
    }

    pub fn push(&mut self, component: PathComponent) {
        match component {
            PathComponent::Key(key) => self.push_key(key),
            PathComponent::Index(index) => self.push_index(index),
        }
    }

    /// Undoes the most recent `push`.
    pub fn pop(&mut self) {
        match self.segments.last_mut() {
            Some(last) if last.key.is_some() && last.index.is_some() => last.index = None,
            _ => {
                self.segments.pop();
            }
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ROOT)?;
        for segment in &self.segments {
            if let Some(key) = &segment.key {
                write!(f, ".{key}")?;
            }
            if let Some(index) = segment.index {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}

impl<C: Into<PathComponent>> FromIterator<C> for Path {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let mut path = Path::root();
        for component in iter {
            path.push(component.into());
        }
        path
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path;

    #[test]
    fn root_displays_sentinel() {
        assert_eq!(Path::root().to_string(), "$");
        assert!(Path::root().is_root());
    }

    #[test]
    fn index_attaches_to_key() {
        let p = path!["two", 1];
        assert_eq!(p.len(), 1);
        assert_eq!(p.segments()[0].key(), Some("two"));
        assert_eq!(p.segments()[0].index(), Some(1));
        assert_eq!(p.to_string(), "$.two[1]");
    }

    #[test]
    fn keyless_segments_for_root_and_nested_arrays() {
        assert_eq!(path![0].to_string(), "$[0]");
        assert_eq!(path![0, "a"].to_string(), "$[0].a");
        assert_eq!(path!["m", 0, 1].to_string(), "$.m[0][1]");
        assert_eq!(path!["m", 0, 1].len(), 2);
    }

    #[test]
    fn pop_undoes_push() {
        let mut p = Path::root();
        p.push_key("a");
        p.push_index(3);
        p.push_index(4);
        p.push_key("b");
        assert_eq!(p.to_string(), "$.a[3][4].b");

        let mut seen = Vec::new();
        while !p.is_root() {
            p.pop();
            seen.push(p.to_string());
        }
        assert_eq!(seen, ["$.a[3][4]", "$.a[3]", "$.a", "$"]);
    }

    #[test]
    fn collects_from_components() {
        let p: Path = ["a", "b"].into_iter().collect();
        assert_eq!(p, path!["a", "b"]);
    }
}
