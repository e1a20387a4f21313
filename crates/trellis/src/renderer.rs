// File: src/renderer.rs
// Purpose: Default template renderer with prop interpolation and partial includes

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::PathBuf;
use trellis_router::SourceId;

/// Nested `{> partial}` levels expanded before giving up
const MAX_INCLUDE_DEPTH: usize = 16;

/// A loaded page (or error page) template
#[derive(Debug, Clone)]
pub struct Template {
    pub source: SourceId,
    pub path: PathBuf,
    pub content: String,
}

/// Render pipeline: template plus props in, markup out
pub trait Render: Send + Sync {
    fn render(&self, template: &Template, props: &JsonValue) -> Result<String>;
}

/// Default renderer with variable interpolation and helper includes
///
/// - `{name}` and `{user.name}` are replaced by the HTML-escaped prop value;
///   unknown names are left as written.
/// - `{> _partials/header.html}` is replaced by that helper file's content
///   before interpolation. Unknown helpers fail the render.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    partials: HashMap<String, String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partials(partials: HashMap<String, String>) -> Self {
        Self { partials }
    }

    pub fn add_partial(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.partials.insert(name.into(), content.into());
    }

    /// Renders raw template text
    pub fn render_str(&self, content: &str, props: &JsonValue) -> Result<String> {
        let expanded = self.expand_includes(content, 0)?;
        Ok(interpolate(&expanded, props))
    }

    fn partial(&self, name: &str) -> Option<&String> {
        self.partials
            .get(name)
            .or_else(|| self.partials.get(&format!("{}.html", name)))
    }

    fn expand_includes(&self, content: &str, depth: usize) -> Result<String> {
        static INCLUDE_REGEX: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\{>\s*([^{}\s]+)\s*\}").unwrap());

        if !INCLUDE_REGEX.is_match(content) {
            return Ok(content.to_string());
        }
        if depth >= MAX_INCLUDE_DEPTH {
            bail!("partials nested deeper than {} levels", MAX_INCLUDE_DEPTH);
        }

        let mut out = String::with_capacity(content.len());
        let mut last = 0;
        for caps in INCLUDE_REGEX.captures_iter(content) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let name = &caps[1];
            let Some(partial) = self.partial(name) else {
                bail!("unknown partial `{}`", name);
            };
            out.push_str(&content[last..whole.start]);
            out.push_str(&self.expand_includes(partial, depth + 1)?);
            last = whole.end;
        }
        out.push_str(&content[last..]);
        Ok(out)
    }
}

impl Render for Renderer {
    fn render(&self, template: &Template, props: &JsonValue) -> Result<String> {
        self.render_str(&template.content, props)
    }
}

fn interpolate(content: &str, props: &JsonValue) -> String {
    static VAR_REGEX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_\.]*)\}").unwrap());

    VAR_REGEX
        .replace_all(content, |caps: &regex::Captures| {
            let name = &caps[1];
            lookup(props, name)
                .map(|v| escape(&display(v)))
                .unwrap_or_else(|| format!("{{{}}}", name))
        })
        .into_owned()
}

fn lookup<'a>(props: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.').try_fold(props, |current, part| match current {
        JsonValue::Object(map) => map.get(part),
        JsonValue::Array(items) => items.get(part.parse::<usize>().ok()?),
        _ => None,
    })
}

fn display(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    maud::html! { (text) }.into_string()
}
