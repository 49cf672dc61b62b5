use core::fmt;

pub type Key = String;
pub type Index = usize;

/// One step from a value to one of its children.
///
/// [`Path::push`](crate::Path::push) folds steps into segments: an index
/// following a key lands in the same segment, as in `.items[3]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    /// Member of an object.
    Key(Key),
    /// Element of an array.
    Index(Index),
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, ".{key}"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for PathComponent {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathComponent {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<Index> for PathComponent {
    fn from(index: Index) -> Self {
        Self::Index(index)
    }
}

/// Conversion used by [`path!`](crate::path).
///
/// Unsuffixed integer literals in the macro are `i32`, so every integer type
/// converts; a negative value panics, since no array has one.
#[doc(hidden)]
pub trait IntoPathComponent {
    fn into_path_component(self) -> PathComponent;
}

macro_rules! index_steps {
    ($($t:ty),+) => {
        $(
            impl IntoPathComponent for $t {
                fn into_path_component(self) -> PathComponent {
                    match Index::try_from(self) {
                        Ok(index) => PathComponent::Index(index),
                        Err(_) => panic!("path! index out of range: {self}"),
                    }
                }
            }
        )+
    };
}
index_steps!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl IntoPathComponent for &str {
    fn into_path_component(self) -> PathComponent {
        PathComponent::Key(self.to_owned())
    }
}

impl IntoPathComponent for String {
    fn into_path_component(self) -> PathComponent {
        PathComponent::Key(self)
    }
}

impl IntoPathComponent for PathComponent {
    fn into_path_component(self) -> PathComponent {
        self
    }
}
