//! Facilities for working with paths within schemas or validated instances.
use std::fmt;

/// One component of a JSON Pointer: either a mapping key or a sequence index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum PathChunk {
    Name(String),
    Index(usize),
}

impl From<String> for PathChunk {
    #[inline]
    fn from(value: String) -> Self {
        PathChunk::Name(value)
    }
}
impl From<&str> for PathChunk {
    #[inline]
    fn from(value: &str) -> Self {
        PathChunk::Name(value.to_string())
    }
}
impl From<usize> for PathChunk {
    #[inline]
    fn from(value: usize) -> Self {
        PathChunk::Index(value)
    }
}

/// A JSON Pointer (RFC 6901) as a wrapper around individual path components.
///
/// Escaping is applied on render: `~` becomes `~0` and `/` becomes `~1`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct JSONPointer(Vec<PathChunk>);

impl std::hash::Hash for PathChunk {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            PathChunk::Name(s) => s.hash(state),
            PathChunk::Index(i) => i.hash(state),
        }
    }
}

impl JSONPointer {
    pub(crate) fn push(&mut self, chunk: impl Into<PathChunk>) {
        self.0.push(chunk.into());
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }

    pub(crate) fn with_pushed(&self, chunk: impl Into<PathChunk>) -> Self {
        let mut cloned = self.clone();
        cloned.push(chunk);
        cloned
    }

    /// The pointer as a vector of strings, one per path component.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
            .into_iter()
            .map(|chunk| match chunk {
                PathChunk::Name(value) => value,
                PathChunk::Index(idx) => idx.to_string(),
            })
            .collect()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for ch in value.chars() {
        match ch {
            '~' => f.write_str("~0")?,
            '/' => f.write_str("~1")?,
            other => f.write_char(other)?,
        }
    }
    Ok(())
}

impl fmt::Display for JSONPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for chunk in &self.0 {
            f.write_str("/")?;
            match chunk {
                PathChunk::Name(value) => write_escaped(f, value)?,
                PathChunk::Index(idx) => write!(f, "{}", idx)?,
            }
        }
        Ok(())
    }
}

use std::fmt::Write as _;
