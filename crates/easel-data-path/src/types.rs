//! Type definitions for data paths.

use std::fmt;

/// A step in a data path.
///
/// Either a field name (object key) or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl PathSegment {
    /// Key used when the segment addresses an object member.
    ///
    /// Index segments are stringified, so `[2]` and `"2"` address the same key.
    pub fn as_key(&self) -> String {
        match self {
            PathSegment::Field(name) => name.clone(),
            PathSegment::Index(i) => i.to_string(),
        }
    }

    /// Returns the index if this segment is an array index.
    pub fn index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Field(_) => None,
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PathSegment::Index(_))
    }
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        PathSegment::Field(s.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        PathSegment::Field(s)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A data path: the segments leading from the data root to a value.
pub type DataPath = Vec<PathSegment>;

/// A path declared by an observer.
///
/// When `wildcard` is set the path matches its own value and every value below it.
/// The bare `**` descriptor is a wildcard path with no segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObserverPath {
    pub segments: DataPath,
    pub wildcard: bool,
}

impl ObserverPath {
    pub fn new(segments: DataPath) -> Self {
        Self {
            segments,
            wildcard: false,
        }
    }

    pub fn with_wildcard(segments: DataPath) -> Self {
        Self {
            segments,
            wildcard: true,
        }
    }

    /// The `**` path.
    pub fn any() -> Self {
        Self::with_wildcard(Vec::new())
    }
}

impl fmt::Display for ObserverPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = crate::format_path(&self.segments);
        match (self.wildcard, base.is_empty()) {
            (true, true) => f.write_str("**"),
            (true, false) => write!(f, "{base}.**"),
            (false, _) => f.write_str(&base),
        }
    }
}

/// A list of observer paths, as declared by one observer.
pub type MultiPaths = Vec<ObserverPath>;
