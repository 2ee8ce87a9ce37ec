use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use regex::Regex;
use thiserror::Error;

const MAX_PASSES: usize = 32;

#[derive(Debug, Error, PartialEq)]
pub enum GrokError {
    #[error("pattern name '{0}' is not a valid UPPERCASE_UNDERSCORE identifier")]
    InvalidName(String),
    #[error("pattern '{0}' is already defined")]
    AlreadyDefined(String),
    #[error("pattern interpolation did not converge after {0} passes (cyclic dictionary?)")]
    Cyclic(usize),
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_uppercase() || c == '_' || c.is_ascii_digit())
}

/// A name → regex-fragment dictionary. Populated once during startup
/// (`load_patterns_dir`/`register`) and read-only thereafter; the read path
/// takes no lock beyond the one guarding the underlying map.
#[derive(Default)]
pub struct PatternRegistry {
    patterns: RwLock<HashMap<String, String>>,
}

/// A small reference set of named patterns, just enough to exercise the
/// `grok` filter adapter end to end. The catalogue of named patterns
/// proper is data, intentionally out of this crate's scope; callers load
/// their own via `load_patterns_dir`.
pub const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("MONTHDAY", r"(?:3[0-1]|[1-2][0-9]|0?[1-9])"),
    ("MONTH", r"\b(?:[Jj]an(?:uary)?|[Ff]eb(?:ruary)?|[Mm]ar(?:ch)?|[Aa]pr(?:il)?|[Mm]ay|[Jj]un(?:e)?|[Jj]ul(?:y)?|[Aa]ug(?:ust)?|[Ss]ep(?:tember)?|[Oo]ct(?:ober)?|[Nn]ov(?:ember)?|[Dd]ec(?:ember)?)\b"),
    ("YEAR", r"(?:\d\d){1,2}"),
    ("HOUR", r"(?:2[0-3]|[0-1][0-9])"),
    ("MINUTE", r"(?:[0-5][0-9])"),
    ("SECOND", r"(?:[0-5][0-9]|60)"),
    ("TIME", r"%{HOUR}:%{MINUTE}:%{SECOND}"),
    ("IP", r"(?:\d{1,3}\.){3}\d{1,3}"),
    ("POSINT", r"\b[0-9]+\b"),
    ("GREEDYDATA", r".*"),
];

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with [`BUILTIN_PATTERNS`].
    pub fn with_builtins() -> Self {
        let registry = Self::default();
        for (name, fragment) in BUILTIN_PATTERNS {
            registry
                .register(*name, *fragment)
                .expect("builtin pattern names are valid and unique");
        }
        registry
    }

    pub fn register(&self, name: impl Into<String>, fragment: impl Into<String>) -> Result<(), GrokError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(GrokError::InvalidName(name));
        }
        let mut guard = self.patterns.write().expect("pattern registry lock poisoned");
        if guard.contains_key(&name) {
            return Err(GrokError::AlreadyDefined(name));
        }
        guard.insert(name, fragment.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.patterns.read().expect("pattern registry lock poisoned").get(name).cloned()
    }
}

fn pattern_ref_re() -> Regex {
    Regex::new(r"%\{([A-Za-z_][A-Za-z0-9_]*)(?::([A-Za-z_][A-Za-z0-9_]*))?\}").expect("static regex")
}

/// Fixed-point substitution of `%{NAME}` / `%{NAME:capture}` references
/// against `registry`. Re-interpolates until no `%{…}` remains or a pass
/// makes no substitution. Unlike the unguarded version this is grounded on,
/// a cyclic dictionary cannot spin forever: after `MAX_PASSES` passes with
/// unresolved references still present, this returns `GrokError::Cyclic`.
pub fn interpolate(pattern: &str, registry: &PatternRegistry) -> Result<String, GrokError> {
    let re = pattern_ref_re();
    let mut current = pattern.to_string();
    for _ in 0..MAX_PASSES {
        if !re.is_match(&current) {
            return Ok(current);
        }
        let mut changed = false;
        let next = re.replace_all(&current, |caps: &regex::Captures| {
            let name = &caps[1];
            let fragment = registry.get(name).unwrap_or_else(|| format!("%{{{}}}", name));
            changed = true;
            match caps.get(2) {
                Some(capture) => format!("(?P<{}>{})", capture.as_str(), fragment),
                None => fragment,
            }
        });
        if !changed {
            return Ok(next.to_string());
        }
        current = next.to_string();
    }
    Err(GrokError::Cyclic(MAX_PASSES))
}

/// Walks a directory tree, loading pattern files whose extension matches
/// `extension`. Blank lines and `#`-prefixed comment lines are skipped;
/// every remaining line is `NAME regex`.
pub fn load_patterns_dir(registry: &PatternRegistry, dir: &Path, extension: &str) -> Result<(), GrokError> {
    let mut stack = vec![dir.to_path_buf()];
    while let Some(path) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&path) else { continue };
        for entry in entries.flatten() {
            let entry_path = entry.path();
            if entry_path.is_dir() {
                stack.push(entry_path);
                continue;
            }
            if entry_path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let Ok(contents) = std::fs::read_to_string(&entry_path) else { continue };
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let Some((name, fragment)) = line.split_once(' ') else { continue };
                registry.register(name, fragment)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_named_reference() {
        let registry = PatternRegistry::new();
        registry.register("POSINT", r"\b[1-9][0-9]*\b").unwrap();
        let result = interpolate("%{POSINT}", &registry).unwrap();
        assert_eq!(result, r"\b[1-9][0-9]*\b");
    }

    #[test]
    fn capture_wraps_named_group() {
        let registry = PatternRegistry::new();
        registry.register("POSINT", r"[0-9]+").unwrap();
        let result = interpolate("%{POSINT:n}", &registry).unwrap();
        assert_eq!(result, "(?P<n>[0-9]+)");
    }

    #[test]
    fn fixed_point_resolves_nested_references() {
        let registry = PatternRegistry::new();
        registry.register("YEAR", r"[0-9]{4}").unwrap();
        registry.register("DATE", "%{YEAR}-[0-9]{2}").unwrap();
        let result = interpolate("%{DATE}", &registry).unwrap();
        assert_eq!(result, "[0-9]{4}-[0-9]{2}");
    }

    #[test]
    fn cyclic_dictionary_errors_instead_of_looping_forever() {
        let registry = PatternRegistry::new();
        registry.register("A", "%{B}").unwrap();
        registry.register("B", "%{A}").unwrap();
        assert_eq!(interpolate("%{A}", &registry), Err(GrokError::Cyclic(MAX_PASSES)));
    }

    #[test]
    fn duplicate_registration_is_refused() {
        let registry = PatternRegistry::new();
        registry.register("POSINT", "a").unwrap();
        assert_eq!(
            registry.register("POSINT", "b"),
            Err(GrokError::AlreadyDefined("POSINT".into()))
        );
    }

    #[test]
    fn lowercase_name_is_rejected() {
        let registry = PatternRegistry::new();
        assert!(matches!(registry.register("posint", "a"), Err(GrokError::InvalidName(_))));
    }
}
