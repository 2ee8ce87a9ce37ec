use std::collections::HashMap;
use std::sync::Mutex;

use crate::event::Event;

/// One compiled unit of a format string.
#[derive(Debug, Clone)]
enum Node {
    Static(String),
    /// `%{path}` — rendered from the event's field map; a missing field
    /// renders back out as the literal `%{path}` token.
    Key(String),
    /// `%{+LAYOUT}` — the event timestamp formatted with `LAYOUT`, UTC.
    Date(String),
    /// `%{+%s}` — epoch seconds.
    Epoch,
}

/// A compiled `sprintf`-style format string, ready to be evaluated
/// repeatedly against different events without re-parsing.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn evaluate(&self, event: &Event) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Static(s) => out.push_str(s),
                Node::Key(path) => match event.get(path) {
                    Some(value) => out.push_str(&value.render()),
                    None => {
                        out.push_str("%{");
                        out.push_str(path);
                        out.push('}');
                    }
                },
                Node::Date(layout) => out.push_str(&event.timestamp().format(layout).to_string()),
                Node::Epoch => out.push_str(&event.timestamp().timestamp().to_string()),
            }
        }
        out
    }
}

/// Compiles a format string into a [`Template`]. Pure and side-effect-free:
/// compiling the same format string twice yields equal `Template`s, which is
/// what makes racing two compiles of the same cache key harmless.
pub fn compile(format: &str) -> Template {
    let mut nodes = Vec::new();
    let mut rest = format;
    while let Some(start) = rest.find("%{") {
        if start > 0 {
            nodes.push(Node::Static(rest[..start].to_string()));
        }
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find('}') else {
            // Unterminated `%{`; treat the remainder as literal text.
            nodes.push(Node::Static(rest[start..].to_string()));
            rest = "";
            break;
        };
        let body = &after_open[..end];
        nodes.push(compile_body(body));
        rest = &after_open[end + 1..];
    }
    if !rest.is_empty() {
        nodes.push(Node::Static(rest.to_string()));
    }
    Template { nodes }
}

fn compile_body(body: &str) -> Node {
    if body == "+%s" {
        Node::Epoch
    } else if let Some(layout) = body.strip_prefix('+') {
        Node::Date(layout.to_string())
    } else if body.starts_with('[') {
        let path = body
            .trim_start_matches('[')
            .trim_end_matches(']')
            .replace("][", ".");
        Node::Key(path)
    } else {
        Node::Key(body.to_string())
    }
}

/// A compile-once-then-cache table keyed by format string, guarded by a
/// single mutex around a lookup-then-compile-then-store sequence. Multiple
/// threads racing the same key simply recompile and overwrite; `compile` is
/// pure so the result is identical either way.
#[derive(Default)]
pub struct TemplateCache {
    inner: Mutex<HashMap<String, Template>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&self, format: &str, event: &Event) -> String {
        let mut guard = self.inner.lock().expect("template cache mutex poisoned");
        if let Some(template) = guard.get(format) {
            return template.evaluate(event);
        }
        let template = compile(format);
        let rendered = template.evaluate(event);
        guard.insert(format.to_string(), template);
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    #[test]
    fn literal_format_round_trips() {
        let event = Event::new();
        let cache = TemplateCache::new();
        assert_eq!(cache.evaluate("no substitutions here", &event), "no substitutions here");
    }

    #[test]
    fn missing_field_renders_as_literal_token() {
        let event = Event::new();
        let cache = TemplateCache::new();
        assert_eq!(cache.evaluate("%{missing}", &event), "%{missing}");
    }

    #[test]
    fn repeated_evaluation_is_stable() {
        let mut event = Event::new();
        event.set_message("hi".into());
        let cache = TemplateCache::new();
        let a = cache.evaluate("%{message}", &event);
        let b = cache.evaluate("%{message}", &event);
        assert_eq!(a, b);
    }

    #[test]
    fn bracketed_path_rewrites_to_dotted() {
        let mut event = Event::new();
        event.set("a.b", "v".into());
        let cache = TemplateCache::new();
        assert_eq!(cache.evaluate("%{[a][b]}", &event), "v");
    }
}
