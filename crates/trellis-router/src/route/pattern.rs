/// Path tokenizing for route sources
///
/// Pure functional parsing of route source paths (`blog/[slug].html`) into
/// typed segments. All functions are **pure**: same input → same output, no side effects.
use crate::{MountKind, ParameterConstraint, RouteError};

/// Extensions that mark a source as a page template
pub const PAGE_EXTENSIONS: &[&str] = &["html", "htm"];

/// Extensions that mark a source as a server-route script
pub const SCRIPT_EXTENSIONS: &[&str] = &["rs"];

/// Classification of one source segment
///
/// Functional sum type for pattern matching route segments.
/// Parameter-bearing variants carry the parameter name and, for
/// constrained segments, the compiled constraint.
///
/// # Examples
///
/// ```
/// use trellis_router::route::pattern::{classify_segment, SegmentKind};
///
/// let seg = classify_segment("about", "about.html").unwrap();
/// assert!(matches!(seg, SegmentKind::Static(_)));
///
/// let seg = classify_segment("[id]", "users/[id].html").unwrap();
/// assert!(matches!(seg, SegmentKind::Dynamic(_)));
///
/// let seg = classify_segment("[id([0-9]+)]", "items/[id([0-9]+)].html").unwrap();
/// assert!(matches!(seg, SegmentKind::DynamicConstrained(_, _)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    /// Literal text, extension already stripped
    Static(String),
    /// `[name]`
    Dynamic(String),
    /// `[name(constraint)]`
    DynamicConstrained(String, ParameterConstraint),
    /// `index` as the final segment: the directory's own path
    IndexMarker,
    /// `_error` as the final segment
    ErrorMarker,
    /// `_`-prefixed segment, or anything nested under one
    Ignored,
}

/// One component of a route source path
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Text as written in the source path
    pub raw: String,
    pub kind: SegmentKind,
}

impl Segment {
    /// Parameter name for dynamic segments
    pub fn param_name(&self) -> Option<&str> {
        match &self.kind {
            SegmentKind::Dynamic(name) | SegmentKind::DynamicConstrained(name, _) => Some(name),
            _ => None,
        }
    }
}

/// Determines the mount kind implied by a source file's extension
///
/// ```
/// use trellis_router::route::pattern::source_mount_kind;
/// use trellis_router::MountKind;
///
/// assert_eq!(source_mount_kind("blog/[slug].html"), Some(MountKind::Page));
/// assert_eq!(source_mount_kind("_error.html"), Some(MountKind::ErrorPage));
/// assert_eq!(source_mount_kind("api/items.rs"), Some(MountKind::ServerRoute));
/// assert_eq!(source_mount_kind("logo.png"), None);
/// ```
pub fn source_mount_kind(path: &str) -> Option<MountKind> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let (stem, ext) = file_name.rsplit_once('.')?;

    if PAGE_EXTENSIONS.contains(&ext) {
        if stem == "_error" {
            Some(MountKind::ErrorPage)
        } else {
            Some(MountKind::Page)
        }
    } else if SCRIPT_EXTENSIONS.contains(&ext) {
        Some(MountKind::ServerRoute)
    } else {
        None
    }
}

/// Strips a known page/script extension from a file name
///
/// Unknown extensions are part of the literal (`posts.json` stays `posts.json`).
pub fn strip_source_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (PAGE_EXTENSIONS.contains(&ext) || SCRIPT_EXTENSIONS.contains(&ext)) =>
        {
            stem
        }
        _ => file_name,
    }
}

/// Classifies an ordinary segment (pure function)
///
/// Special names (`index`, `_error`, `_`-prefixed) are handled by [`tokenize`];
/// this only distinguishes static text from parameter segments.
///
/// # Parsing Rules (evaluated in order)
///
/// 1. **Constrained param**: `[name(constraint)]`
/// 2. **Param**: `[name]`
/// 3. **Static**: text without brackets
///
/// `path` is only used for error reporting.
pub fn classify_segment(segment: &str, path: &str) -> Result<SegmentKind, RouteError> {
    match segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => match inner.split_once('(') {
            Some((name, rest)) => {
                let name = validate_param_name(name, path)?;
                let constraint = rest.strip_suffix(')').ok_or_else(|| {
                    RouteError::invalid_constraint(segment, "constraint is not closed with `)`")
                })?;
                let constraint = ParameterConstraint::parse(constraint, segment)?;
                Ok(SegmentKind::DynamicConstrained(name, constraint))
            }
            None => Ok(SegmentKind::Dynamic(validate_param_name(inner, path)?)),
        },
        None if segment.contains(['[', ']']) => Err(RouteError::invalid_name(
            path,
            format!("brackets must enclose the whole segment in `{}`", segment),
        )),
        None => Ok(SegmentKind::Static(segment.to_string())),
    }
}

/// Parameter names are identifiers: `[A-Za-z_][A-Za-z0-9_]*`
fn validate_param_name(name: &str, path: &str) -> Result<String, RouteError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(name.to_string())
    } else {
        Err(RouteError::invalid_name(
            path,
            format!("`{}` is not a valid parameter name", name),
        ))
    }
}

/// Splits a relative source path into classified segments
///
/// Separators may be `/` or `\`; empty and `.` components are dropped.
/// The final segment has its page/script extension stripped before
/// classification. Once a `_`-prefixed segment is seen, it and every
/// segment after it are [`SegmentKind::Ignored`] without further parsing.
///
/// # Examples
///
/// ```
/// use trellis_router::route::pattern::{tokenize, SegmentKind};
///
/// let segments = tokenize("blog/index.html").unwrap();
/// assert_eq!(segments[0].kind, SegmentKind::Static("blog".into()));
/// assert_eq!(segments[1].kind, SegmentKind::IndexMarker);
///
/// let segments = tokenize("_components/[weird].html").unwrap();
/// assert!(segments.iter().all(|s| s.kind == SegmentKind::Ignored));
/// ```
pub fn tokenize(relative_path: &str) -> Result<Vec<Segment>, RouteError> {
    let parts: Vec<&str> = relative_path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    let last_idx = match parts.len() {
        0 => return Err(RouteError::invalid_name(relative_path, "path has no segments")),
        n => n - 1,
    };

    let mut ignoring = false;
    parts
        .iter()
        .copied()
        .enumerate()
        .map(|(idx, raw)| {
            let is_last = idx == last_idx;
            let name = if is_last { strip_source_extension(raw) } else { raw };

            let kind = if ignoring {
                SegmentKind::Ignored
            } else if name == ".." {
                return Err(RouteError::invalid_name(
                    relative_path,
                    "`..` is not allowed in route paths",
                ));
            } else if is_last && name == "_error" {
                SegmentKind::ErrorMarker
            } else if name.starts_with('_') {
                ignoring = true;
                SegmentKind::Ignored
            } else if is_last && name == "index" {
                SegmentKind::IndexMarker
            } else {
                classify_segment(name, relative_path)?
            };

            Ok(Segment {
                raw: raw.to_string(),
                kind,
            })
        })
        .collect()
}

/// Whether any segment excludes the path from route generation
pub fn is_ignored(segments: &[Segment]) -> bool {
    segments.iter().any(|s| s.kind == SegmentKind::Ignored)
}

/// Whether the path designates the error page
pub fn is_error_page(segments: &[Segment]) -> bool {
    !is_ignored(segments)
        && segments
            .last()
            .map_or(false, |s| s.kind == SegmentKind::ErrorMarker)
}
