//! Hierarchical blob paths.
//!
//! Swift has a flat key space. A [`BlobPath`] is the hierarchical address the
//! snapshot layer works with; [`BlobPath::key_prefix`] flattens it into the
//! string that is prepended to every blob name stored under that path.
//!
//! ```
//! use swiftrepo_types::BlobPath;
//!
//! let path = BlobPath::clean().add("indices").unwrap().add("idx-0").unwrap();
//! assert_eq!(path.key_prefix(), "indices/idx-0/");
//! assert_eq!(BlobPath::clean().key_prefix(), "");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Separator used between path segments in object keys.
pub const KEY_SEPARATOR: char = '/';

/// An immutable, hierarchical blob path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobPath {
    segments: Vec<String>,
}

impl BlobPath {
    /// The empty (root) path.
    pub fn clean() -> Self {
        Self::default()
    }

    /// Build a path from individual segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        segments
            .into_iter()
            .try_fold(Self::clean(), |path, segment| path.add(segment.as_ref()))
    }

    /// Parse a `/`-separated path. Leading, trailing and repeated separators
    /// are ignored.
    pub fn parse(s: &str) -> Self {
        Self {
            segments: s
                .split(KEY_SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Return a new path with `segment` appended.
    ///
    /// Segments must be non-empty and must not contain `/`.
    pub fn add(&self, segment: &str) -> Result<Self, TypeError> {
        if segment.is_empty() || segment.contains(KEY_SEPARATOR) {
            return Err(TypeError::InvalidPathSegment(segment.to_string()));
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Join all segments with `separator`.
    pub fn build_as_string(&self, separator: &str) -> String {
        self.segments.join(separator)
    }

    /// The flat key prefix for this path: segments joined with `/`, plus a
    /// trailing `/` unless the path is empty.
    pub fn key_prefix(&self) -> String {
        let mut prefix = self.build_as_string("/");
        if !prefix.is_empty() {
            prefix.push(KEY_SEPARATOR);
        }
        prefix
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.build_as_string("]["))
    }
}
