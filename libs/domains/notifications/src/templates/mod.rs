//! `{{name}}` interpolation for trigger and notification text, plus the
//! handlebars email layout in [`email`].

pub mod email;

pub use email::{EmailLayout, RenderedEmail};

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Variable values by name. Nested JSON objects are flattened to dot paths.
pub type Variables = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Name plus the exact source text, which is emitted when no value exists.
    Placeholder { name: String, raw: String },
}

/// A parsed `{{name}}` template.
///
/// Whitespace inside the braces is ignored. Anything that is not a valid
/// placeholder (empty name, illegal characters, no closing braces) stays literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

impl Template {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                break;
            };

            let name = after_open[..end].trim();
            literal.push_str(&rest[..start]);

            if !name.is_empty() && name.chars().all(is_name_char) {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder {
                    name: name.to_string(),
                    raw: rest[start..start + 2 + end + 2].to_string(),
                });
                rest = &after_open[end + 2..];
            } else {
                // Only the opening braces are literal; a valid placeholder may start inside.
                literal.push_str("{{");
                rest = after_open;
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Self { segments }
    }

    /// Every placeholder name, deduplicated.
    pub fn variables(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder { name, .. } => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Placeholders with no value in `vars`.
    pub fn missing<'a>(&'a self, vars: &Variables) -> BTreeSet<&'a str> {
        self.variables()
            .into_iter()
            .filter(|name| !vars.contains_key(*name))
            .collect()
    }

    /// Substitutes known names; unknown placeholders are emitted unchanged.
    pub fn render(&self, vars: &Variables) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { name, raw } => match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(raw),
                },
            }
        }
        out
    }
}

/// Parse and render in one step.
pub fn render(source: &str, vars: &Variables) -> String {
    if vars.is_empty() {
        return source.to_string();
    }
    Template::parse(source).render(vars)
}

/// Flattens a JSON object into [`Variables`]. Strings are used verbatim, other
/// scalars in their JSON form, nested objects as `parent.child`. Nulls are skipped.
pub fn variables_from_json(value: &Value) -> Variables {
    let mut vars = Variables::new();
    if let Value::Object(map) = value {
        flatten_into(&mut vars, "", map);
    }
    vars
}

fn flatten_into(vars: &mut Variables, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Null => {}
            Value::String(s) => {
                vars.insert(name, s.clone());
            }
            Value::Object(inner) => flatten_into(vars, &name, inner),
            other => {
                vars.insert(name, other.to_string());
            }
        }
    }
}
