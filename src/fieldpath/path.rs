//! Property path type.

use std::fmt;

/// Path names a property by the keys leading to it from the root of a
/// property tree, e.g. `caching.rows_per_partition`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    elements: Vec<String>,
}

impl Path {
    /// Creates a new empty path.
    pub fn new() -> Self {
        Path {
            elements: Vec::new(),
        }
    }

    /// Creates a single-element path naming a top-level property.
    pub fn property(name: impl Into<String>) -> Self {
        Path {
            elements: vec![name.into()],
        }
    }

    /// Creates a path from a vector of keys.
    pub fn from_elements(elements: Vec<String>) -> Self {
        Path { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.elements.iter()
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.elements.push(key.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.elements.pop()
    }

    /// Returns the top-level property this path falls under.
    pub fn root(&self) -> Option<&str> {
        self.elements.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.elements.last().map(String::as_str)
    }

    /// Creates a new path with the given key appended.
    pub fn with(&self, key: impl Into<String>) -> Self {
        let mut new_path = self.clone();
        new_path.push(key);
        new_path
    }

    pub fn as_slice(&self) -> &[String] {
        &self.elements
    }
}

impl From<&str> for Path {
    /// Parses a dotted path. Keys containing dots cannot be expressed this way.
    fn from(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Path::new();
        }
        Path {
            elements: dotted.split('.').map(str::to_string).collect(),
        }
    }
}

impl FromIterator<String> for Path {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Path {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            return write!(f, "<root>");
        }
        write!(f, "{}", self.elements.join("."))
    }
}

impl serde::Serialize for Path {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_operations() {
        let mut path = Path::new();
        assert!(path.is_empty());

        path.push("compaction");
        path.push("class");
        assert_eq!(path.len(), 2);
        assert_eq!(path.root(), Some("compaction"));
        assert_eq!(path.last(), Some("class"));

        assert_eq!(path.pop(), Some("class".to_string()));
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_path_display() {
        assert_eq!(Path::from("caching.keys").to_string(), "caching.keys");
        assert_eq!(Path::new().to_string(), "<root>");
    }

    #[test]
    fn test_path_with_does_not_mutate() {
        let base = Path::property("compression");
        let child = base.with("chunk_length_in_kb");
        assert_eq!(base.len(), 1);
        assert_eq!(child, Path::from("compression.chunk_length_in_kb"));
    }

    #[test]
    fn test_path_ordering() {
        assert!(Path::from("caching") < Path::from("comment"));
        assert!(Path::from("caching") < Path::from("caching.keys"));
    }
}
