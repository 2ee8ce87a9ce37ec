use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::value::Value;

/// Splits a path in either the dotted (`a.b.c`) or bracketed (`[a][b][c]`)
/// addressing syntax into its segments. Both syntaxes must resolve to the
/// same path; this is the single place that decides how.
pub fn split_path(path: &str) -> Vec<String> {
    if path.starts_with('[') {
        path.trim_start_matches('[')
            .trim_end_matches(']')
            .split("][")
            .map(|s| s.to_string())
            .collect()
    } else {
        path.split('.').map(|s| s.to_string()).collect()
    }
}

/// A nested string-keyed map addressable by dotted or bracketed path.
///
/// All intermediate levels are themselves `InterfaceMap`s; `set` auto-creates
/// missing levels, `get` fails cleanly (returns `None`) on a missing level,
/// and deleting a leaf leaves its parents in place. `BTreeMap` gives
/// deterministic iteration order, which matters for codecs that serialize
/// the whole map (`json_pretty` output should not jitter between runs).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceMap(BTreeMap<String, Value>);

impl InterfaceMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.get_segments(&split_path(path))
    }

    fn get_segments(&self, segments: &[String]) -> Option<&Value> {
        let (head, rest) = segments.split_first()?;
        let value = self.0.get(head)?;
        if rest.is_empty() {
            Some(value)
        } else {
            value.as_map()?.get_segments(rest)
        }
    }

    pub fn set(&mut self, path: &str, value: Value) {
        self.set_segments(&split_path(path), value);
    }

    fn set_segments(&mut self, segments: &[String], value: Value) {
        let (head, rest) = match segments.split_first() {
            Some(pair) => pair,
            None => return,
        };
        if rest.is_empty() {
            self.0.insert(head.clone(), value);
            return;
        }
        let entry = self
            .0
            .entry(head.clone())
            .or_insert_with(|| Value::Map(InterfaceMap::new()));
        if entry.as_map().is_none() {
            *entry = Value::Map(InterfaceMap::new());
        }
        entry.as_map_mut().expect("just ensured Map").set_segments(rest, value);
    }

    pub fn delete(&mut self, path: &str) {
        self.delete_segments(&split_path(path));
    }

    fn delete_segments(&mut self, segments: &[String]) {
        let (head, rest) = match segments.split_first() {
            Some(pair) => pair,
            None => return,
        };
        if rest.is_empty() {
            self.0.remove(head);
            return;
        }
        if let Some(child) = self.0.get_mut(head).and_then(Value::as_map_mut) {
            child.delete_segments(rest);
        }
    }

    pub fn has_field(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A deep copy, matching `Event::Data()`'s contract of returning a
    /// detached snapshot callers may mutate freely.
    pub fn deep_clone(&self) -> Self {
        self.clone()
    }
}

impl From<BTreeMap<String, Value>> for InterfaceMap {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Self(m)
    }
}

impl Serialize for InterfaceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_and_bracketed_paths_agree() {
        let mut m = InterfaceMap::new();
        m.set("a.b.c", Value::Int(1));
        assert_eq!(m.get("[a][b][c]"), Some(&Value::Int(1)));
    }

    #[test]
    fn set_then_get_then_delete() {
        let mut m = InterfaceMap::new();
        m.set("a.b", Value::from("v"));
        assert!(m.has_field("a.b"));
        assert_eq!(m.get("a.b"), Some(&Value::from("v")));
        m.delete("a.b");
        assert!(!m.has_field("a.b"));
    }

    #[test]
    fn deleting_leaf_keeps_parent() {
        let mut m = InterfaceMap::new();
        m.set("a.b", Value::from("v"));
        m.set("a.c", Value::from("w"));
        m.delete("a.b");
        assert!(m.has_field("a.c"));
        assert!(!m.has_field("a.b"));
    }

    #[test]
    fn get_fails_cleanly_on_missing_level() {
        let m = InterfaceMap::new();
        assert_eq!(m.get("missing.deeper"), None);
    }
}
