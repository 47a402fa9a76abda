//! Insertion-ordered string-keyed map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::Value;

/// Map is a string-keyed map that remembers insertion order.
///
/// Order is kept so exported documents read the same way they were written,
/// but it plays no part in equality: two maps are equal when they hold the
/// same keys bound to equal values. Setting an existing key overwrites it in
/// place, so of duplicate document keys the last one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Map<V = Value> {
    entries: IndexMap<String, V>,
}

impl<V> Default for Map<V> {
    fn default() -> Self {
        Map {
            entries: IndexMap::new(),
        }
    }
}

impl<V> Map<V> {
    /// Creates a new empty Map.
    pub fn new() -> Self {
        Map::default()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Sets `key` to `value`, returning the previous value if there was one.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn delete(&mut self, key: &str) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }
}

impl<V> FromIterator<(String, V)> for Map<V> {
    fn from_iter<T: IntoIterator<Item = (String, V)>>(iter: T) -> Self {
        Map {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<V> IntoIterator for Map<V> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_in_place() {
        let mut map: Map<i64> = Map::new();
        map.set("b", 1);
        map.set("a", 2);
        assert_eq!(map.set("b", 3), Some(1));

        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&3));
    }

    #[test]
    fn test_equality_ignores_order() {
        let lhs: Map<i64> = vec![("a".to_string(), 1), ("b".to_string(), 2)]
            .into_iter()
            .collect();
        let rhs: Map<i64> = vec![("b".to_string(), 2), ("a".to_string(), 1)]
            .into_iter()
            .collect();
        assert_eq!(lhs, rhs);

        let mut other = rhs.clone();
        other.set("c", 3);
        assert_ne!(lhs, other);
    }

    #[test]
    fn test_delete_keeps_order() {
        let mut map: Map<i64> = vec![
            ("x".to_string(), 1),
            ("y".to_string(), 2),
            ("z".to_string(), 3),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.delete("x"), Some(1));
        assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec!["y", "z"]);
        assert_eq!(map.delete("x"), None);
    }

    #[test]
    fn test_yaml_preserves_order() {
        let map: Map<i64> = serde_yaml::from_str("z: 1\na: 2\nm: 3\n").unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);

        let out = serde_yaml::to_string(&map).unwrap();
        assert_eq!(out, "z: 1\na: 2\nm: 3\n");
    }

    #[test]
    fn test_yaml_duplicate_key_last_wins() {
        let map: Map = serde_yaml::from_str("comment: a\nttl: 1\ncomment: b\n").unwrap();
        assert_eq!(map.get("comment"), Some(&Value::from("b")));
        assert_eq!(map.len(), 2);
    }
}
