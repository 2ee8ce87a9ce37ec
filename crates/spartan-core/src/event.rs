use chrono::{DateTime, Utc};

use crate::interface_map::InterfaceMap;
use crate::template::TemplateCache;
use crate::value::Value;

pub const TIMESTAMP_FIELD: &str = "@timestamp";
pub const TYPE_FIELD: &str = "type";
pub const MESSAGE_FIELD: &str = "message";
pub const TAGS_FIELD: &str = "tags";

/// A log record: a canonical timestamp, a free-form nested field map, a
/// `type` set once and immutable, a `message` text field, and an ordered
/// `tags` set. `@timestamp`/`type`/`message`/`tags` are reserved names
/// always reachable through both `get`/`set` and their typed accessors.
#[derive(Debug, Clone)]
pub struct Event {
    data: InterfaceMap,
    template_cache: TemplateCache,
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TemplateCache {
    fn clone(&self) -> Self {
        // Each clone starts with a cold cache; the cache is an optimization,
        // not part of event identity or equality.
        TemplateCache::new()
    }
}

impl std::fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TemplateCache")
    }
}

impl Event {
    /// A fresh event stamped with the current time and no fields.
    pub fn new() -> Self {
        let mut data = InterfaceMap::new();
        data.set(TIMESTAMP_FIELD, Value::Timestamp(Utc::now()));
        data.set(TAGS_FIELD, Value::Array(Vec::new()));
        Self {
            data,
            template_cache: TemplateCache::new(),
        }
    }

    /// Builds an event around an existing message, as inputs typically do.
    pub fn with_message(message: impl Into<String>) -> Self {
        let mut event = Self::new();
        event.set_message(message.into());
        event
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.data.get(path)
    }

    pub fn has_field(&self, path: &str) -> bool {
        self.data.has_field(path)
    }

    /// Generic setter; reserved names are routed to their typed setter
    /// (silently dropping the write on a type mismatch rather than
    /// corrupting the reserved field).
    pub fn set(&mut self, path: &str, value: Value) {
        match path {
            TYPE_FIELD => {
                if let Value::String(s) = value {
                    self.set_type(s);
                }
            }
            MESSAGE_FIELD => {
                if let Value::String(s) = value {
                    self.set_message(s);
                }
            }
            TIMESTAMP_FIELD => {
                if let Value::Timestamp(t) = value {
                    self.set_timestamp(t);
                }
            }
            TAGS_FIELD => {
                if let Value::Array(items) = value {
                    let tags = items
                        .into_iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect();
                    self.set_tags(tags);
                }
            }
            _ => self.data.set(path, value),
        }
    }

    /// `@timestamp` and `type` are reserved and undeletable; deleting them
    /// is a no-op, grounded on the explicit reserved-field protection this
    /// engine requires.
    pub fn delete(&mut self, path: &str) {
        if path == TIMESTAMP_FIELD || path == TYPE_FIELD {
            return;
        }
        if path == MESSAGE_FIELD {
            self.set_message(String::new());
            return;
        }
        if path == TAGS_FIELD {
            self.reset_tags();
            return;
        }
        self.data.delete(path);
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.data
            .get(TIMESTAMP_FIELD)
            .and_then(Value::as_timestamp)
            .unwrap_or_else(Utc::now)
    }

    pub fn set_timestamp(&mut self, ts: DateTime<Utc>) {
        self.data.set(TIMESTAMP_FIELD, Value::Timestamp(ts));
    }

    pub fn get_type(&self) -> Option<&str> {
        self.data.get(TYPE_FIELD).and_then(Value::as_str)
    }

    /// `type` may only be set while empty; subsequent sets are silently
    /// ignored.
    pub fn set_type(&mut self, type_name: String) {
        if self.get_type().unwrap_or("").is_empty() {
            self.data.set(TYPE_FIELD, Value::String(type_name));
        }
    }

    /// Returns `None` when the message has been cleared to the empty
    /// string, hiding it from codec serialization.
    pub fn message(&self) -> Option<&str> {
        match self.data.get(MESSAGE_FIELD).and_then(Value::as_str) {
            Some(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn set_message(&mut self, message: String) {
        self.data.set(MESSAGE_FIELD, Value::String(message));
    }

    pub fn tags(&self) -> Vec<String> {
        self.data
            .get(TAGS_FIELD)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|t| t == tag)
    }

    /// Deduplicates on add; adding an already-present tag is a no-op.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        let mut tags = self.tags();
        if !tags.contains(&tag) {
            tags.push(tag);
            self.set_tags(tags);
        }
    }

    /// Removing an absent tag is a no-op.
    pub fn delete_tag(&mut self, tag: &str) {
        let mut tags = self.tags();
        tags.retain(|t| t != tag);
        self.set_tags(tags);
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.data
            .set(TAGS_FIELD, Value::Array(tags.into_iter().map(Value::String).collect()));
    }

    pub fn reset_tags(&mut self) {
        self.set_tags(Vec::new());
    }

    /// A deep copy of the full field map, including reserved fields.
    pub fn data(&self) -> InterfaceMap {
        self.data.deep_clone()
    }

    /// Evaluates a `sprintf`-style format string against this event, using
    /// the event's own compile-once-then-cache template cache.
    pub fn sprintf(&self, format: &str) -> String {
        self.template_cache.evaluate(format, self)
    }
}

impl std::fmt::Display for Event {
    /// `"<rfc3339 timestamp>: <message>"` — the line-oriented rendering
    /// used by the `plain`/`line` codecs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.timestamp().to_rfc3339(), self.message().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_set_once() {
        let mut e = Event::new();
        e.set_type("a".into());
        e.set_type("b".into());
        assert_eq!(e.get_type(), Some("a"));
    }

    #[test]
    fn timestamp_and_type_undeletable() {
        let mut e = Event::new();
        e.set_type("a".into());
        let ts = e.timestamp();
        e.delete(TIMESTAMP_FIELD);
        e.delete(TYPE_FIELD);
        assert_eq!(e.timestamp(), ts);
        assert_eq!(e.get_type(), Some("a"));
    }

    #[test]
    fn message_empty_hides_from_message_accessor() {
        let mut e = Event::new();
        e.set_message("hi".into());
        assert_eq!(e.message(), Some("hi"));
        e.set_message(String::new());
        assert_eq!(e.message(), None);
    }

    #[test]
    fn tags_dedupe_and_absent_remove_is_noop() {
        let mut e = Event::new();
        e.add_tag("x");
        e.add_tag("x");
        assert_eq!(e.tags(), vec!["x".to_string()]);
        e.delete_tag("nonexistent");
        assert_eq!(e.tags(), vec!["x".to_string()]);
    }

    #[test]
    fn nested_map_roundtrip() {
        let mut e = Event::new();
        e.set("a.b.c", Value::Int(42));
        assert_eq!(e.get("a.b.c"), Some(&Value::Int(42)));
        assert!(e.has_field("a.b.c"));
        e.delete("a.b.c");
        assert!(!e.has_field("a.b.c"));
    }
}
