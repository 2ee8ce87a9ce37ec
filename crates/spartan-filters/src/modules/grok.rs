use std::sync::Arc;

use regex::Regex;
use spartan_config::grok::{interpolate, PatternRegistry};
use spartan_config::verify::{verify, Setting, SettingType};
use spartan_core::event::Event;
use spartan_core::interface_map::InterfaceMap;
use spartan_core::traits::Filter;
use spartan_core::value::Value;

const TAG_GROKPARSEFAILURE: &str = "_grokparsefailure";

fn schema() -> Vec<Setting> {
    vec![
        Setting::new("field", SettingType::String).default(Value::String("message".into())),
        Setting::new("patterns", SettingType::Array)
            .elements(SettingType::String)
            .required(),
        Setting::new("ignore_missing", SettingType::Bool).default(Value::Bool(false)),
    ]
}

/// Tries each compiled pattern in order; the first regex match wins, sets
/// every named capture as a field, and the match callback fires. No match
/// (or a missing/non-string field) tags `_grokparsefailure`, unless
/// `ignore_missing` covers the missing-field case.
pub struct GrokFilter {
    field: String,
    patterns: Vec<Regex>,
    ignore_missing: bool,
}

impl GrokFilter {
    pub fn new(options: &mut InterfaceMap, patterns_registry: &PatternRegistry) -> anyhow::Result<Self> {
        verify(options, &schema())?;
        let field = options.get("field").and_then(Value::as_str).unwrap_or("message").to_string();
        let ignore_missing = options.get("ignore_missing").and_then(Value::as_bool).unwrap_or(false);
        let raw_patterns: Vec<String> = options
            .get("patterns")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let mut patterns = Vec::with_capacity(raw_patterns.len());
        for raw in &raw_patterns {
            let interpolated = interpolate(raw, patterns_registry)?;
            patterns.push(Regex::new(&interpolated)?);
        }

        Ok(Self {
            field,
            patterns,
            ignore_missing,
        })
    }
}

impl Filter for GrokFilter {
    fn filter(&self, batch: Vec<Event>, matched: &dyn Fn(&Event)) -> Vec<Event> {
        batch
            .into_iter()
            .map(|mut event| {
                let Some(text) = event.get(&self.field).and_then(Value::as_str).map(str::to_string) else {
                    if !self.ignore_missing {
                        event.add_tag(TAG_GROKPARSEFAILURE);
                    }
                    return event;
                };

                for pattern in &self.patterns {
                    if let Some(caps) = pattern.captures(&text) {
                        for name in pattern.capture_names().flatten() {
                            if let Some(m) = caps.name(name) {
                                event.set(name, Value::String(m.as_str().to_string()));
                            }
                        }
                        matched(&event);
                        return event;
                    }
                }

                event.add_tag(TAG_GROKPARSEFAILURE);
                event
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(patterns: Vec<&str>) -> GrokFilter {
        let registry = Arc::new(PatternRegistry::with_builtins());
        let mut opts = InterfaceMap::new();
        opts.set(
            "patterns",
            Value::Array(patterns.into_iter().map(|p| Value::String(p.to_string())).collect()),
        );
        GrokFilter::new(&mut opts, &registry).unwrap()
    }

    #[test]
    fn matching_pattern_sets_captures_without_failure_tag() {
        let f = filter(vec!["^%{POSINT:n} %{GREEDYDATA:rest}$"]);
        let batch = vec![Event::with_message("09 foo")];
        let out = f.filter(batch, &|_| {});
        assert_eq!(out[0].get("n").and_then(Value::as_str), Some("09"));
        assert_eq!(out[0].get("rest").and_then(Value::as_str), Some("foo"));
        assert!(!out[0].has_tag(TAG_GROKPARSEFAILURE));
    }

    #[test]
    fn non_matching_input_is_tagged() {
        let f = filter(vec!["^%{POSINT:n} %{GREEDYDATA:rest}$"]);
        let batch = vec![Event::with_message("abc")];
        let out = f.filter(batch, &|_| {});
        assert!(out[0].has_tag(TAG_GROKPARSEFAILURE));
    }
}
