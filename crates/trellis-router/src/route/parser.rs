/// Pattern compilation and specificity scoring
///
/// Pure functional compiler that turns classified segments into route patterns.
/// All functions are **pure**: same input → same output, no side effects.
use std::fmt;
use std::sync::Arc;

use super::pattern::{is_ignored, Segment, SegmentKind};
use crate::path::encode_segment;
use crate::{MountKind, ParamBindings, ParameterConstraint, RouteError};

/// Weight of a static segment
pub const STATIC_WEIGHT: u32 = 100;
/// Weight of a `[name(constraint)]` segment
pub const CONSTRAINED_WEIGHT: u32 = 10;
/// Weight of a plain `[name]` segment
pub const DYNAMIC_WEIGHT: u32 = 1;
/// Bonus for sources ending in `index`
pub const INDEX_BONUS: u32 = 1;

/// Opaque handle to the source a pattern was compiled from
///
/// Holds the relative source path (`blog/[slug].html`); the dispatcher uses it
/// to look up the template, preload, or handler set for a matched pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(Arc<str>);

impl SourceId {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(Arc::from(path.as_ref().replace('\\', "/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for SourceId {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// One step of a compiled pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Requires exact literal equality with the request segment
    Literal(String),
    /// Consumes one request segment, binding it to `name`
    Param {
        name: String,
        constraint: Option<ParameterConstraint>,
    },
}

impl Matcher {
    pub fn is_param(&self) -> bool {
        matches!(self, Matcher::Param { .. })
    }

    fn weight(&self) -> u32 {
        match self {
            Matcher::Literal(_) => STATIC_WEIGHT,
            Matcher::Param {
                constraint: Some(_),
                ..
            } => CONSTRAINED_WEIGHT,
            Matcher::Param { constraint: None, .. } => DYNAMIC_WEIGHT,
        }
    }
}

/// A compiled, immutable route pattern
#[derive(Debug, Clone)]
pub struct RoutePattern {
    matchers: Vec<Matcher>,
    mount: MountKind,
    specificity: u32,
    source: SourceId,
    index: bool,
}

/// Internal state accumulator for fold-based compilation
#[derive(Default)]
struct CompileState {
    matchers: Vec<Matcher>,
    index: bool,
}

impl CompileState {
    fn with_segment(mut self, segment: &Segment) -> Self {
        match &segment.kind {
            SegmentKind::Static(literal) => self.matchers.push(Matcher::Literal(literal.clone())),
            SegmentKind::Dynamic(name) => self.matchers.push(Matcher::Param {
                name: name.clone(),
                constraint: None,
            }),
            SegmentKind::DynamicConstrained(name, constraint) => {
                self.matchers.push(Matcher::Param {
                    name: name.clone(),
                    constraint: Some(constraint.clone()),
                })
            }
            SegmentKind::IndexMarker => self.index = true,
            SegmentKind::ErrorMarker | SegmentKind::Ignored => {}
        }
        self
    }
}

/// Compiles classified segments into a route pattern (pure function)
///
/// `ErrorPage` patterns never take part in matching, so they compile to an
/// empty matcher sequence.
///
/// # Examples
///
/// ```
/// use trellis_router::route::{compile, tokenize};
/// use trellis_router::MountKind;
///
/// let segments = tokenize("blog/[slug].html").unwrap();
/// let pattern = compile(&segments, MountKind::Page, "blog/[slug].html".into()).unwrap();
/// assert_eq!(pattern.template(), "/blog/[slug]");
/// ```
///
/// # Errors
///
/// - `InvalidRouteName` when the segments belong to an ignored subtree or
///   when a parameter name is used twice.
pub fn compile(
    segments: &[Segment],
    mount: MountKind,
    source: SourceId,
) -> Result<RoutePattern, RouteError> {
    if is_ignored(segments) {
        return Err(RouteError::invalid_name(
            source.as_str(),
            "sources under `_`-prefixed names do not produce routes",
        ));
    }

    if mount == MountKind::ErrorPage {
        return Ok(RoutePattern {
            matchers: Vec::new(),
            mount,
            specificity: 0,
            source,
            index: false,
        });
    }

    let state = segments
        .iter()
        .fold(CompileState::default(), CompileState::with_segment);

    let mut seen: Vec<&str> = Vec::new();
    for matcher in &state.matchers {
        if let Matcher::Param { name, .. } = matcher {
            if seen.contains(&name.as_str()) {
                return Err(RouteError::invalid_name(
                    source.as_str(),
                    format!("parameter `{}` appears more than once", name),
                ));
            }
            seen.push(name.as_str());
        }
    }

    let specificity = calculate_specificity(&state.matchers, state.index);

    Ok(RoutePattern {
        matchers: state.matchers,
        mount,
        specificity,
        source,
        index: state.index,
    })
}

/// Calculates pattern specificity (pure function)
///
/// Higher = matched first. Sum of per-matcher weights, plus
/// [`INDEX_BONUS`] for index sources, plus one per matcher for depth.
///
/// ```
/// use trellis_router::route::parser::{calculate_specificity, Matcher};
///
/// let about = vec![Matcher::Literal("about".into())];
/// let page = vec![Matcher::Param { name: "page".into(), constraint: None }];
/// assert!(calculate_specificity(&about, false) > calculate_specificity(&page, false));
/// ```
pub fn calculate_specificity(matchers: &[Matcher], index: bool) -> u32 {
    let weights: u32 = matchers.iter().map(Matcher::weight).sum();
    let bonus = if index { INDEX_BONUS } else { 0 };
    weights + bonus + matchers.len() as u32
}

impl RoutePattern {
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn mount(&self) -> MountKind {
        self.mount
    }

    pub fn specificity(&self) -> u32 {
        self.specificity
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Whether the source ended in `index`
    pub fn is_index(&self) -> bool {
        self.index
    }

    /// Names of all parameters in order
    pub fn param_names(&self) -> Vec<&str> {
        self.matchers
            .iter()
            .filter_map(|m| match m {
                Matcher::Param { name, .. } => Some(name.as_str()),
                Matcher::Literal(_) => None,
            })
            .collect()
    }

    /// Whether the pattern may match one segment short of its length
    ///
    /// True when the final matcher is a parameter and the pattern has a
    /// preceding literal prefix to anchor on (`settings/[submenu]`).
    pub fn allows_absent_trailing_param(&self) -> bool {
        self.matchers.len() >= 2 && self.matchers.last().map_or(false, Matcher::is_param)
    }

    /// Renders the path template (`/blog/[slug]`, `/items/[id([0-9]+)]`)
    pub fn template(&self) -> String {
        if self.matchers.is_empty() {
            return "/".to_string();
        }

        self.matchers
            .iter()
            .map(|m| match m {
                Matcher::Literal(literal) => format!("/{}", literal),
                Matcher::Param {
                    name,
                    constraint: Some(c),
                } => format!("/[{}({})]", name, c),
                Matcher::Param {
                    name,
                    constraint: None,
                } => format!("/[{}]", name),
            })
            .collect()
    }

    /// Reconstructs a request path by substituting bound parameters
    ///
    /// Values are percent-encoded as path segments, so characters legal in
    /// a segment (`,`, `@`, `'`) come back unchanged. A missing *trailing*
    /// parameter is omitted (the short form matched by the ambiguous-subroute rule);
    /// any other missing parameter, or a value violating its constraint,
    /// yields `None`.
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use trellis_router::route::{compile, tokenize};
    /// use trellis_router::MountKind;
    ///
    /// let pattern = compile(
    ///     &tokenize("blog/[slug].html").unwrap(),
    ///     MountKind::Page,
    ///     "blog/[slug].html".into(),
    /// ).unwrap();
    ///
    /// let mut params = HashMap::new();
    /// params.insert("slug".to_string(), "hello world".to_string());
    /// assert_eq!(pattern.to_path(&params).as_deref(), Some("/blog/hello%20world"));
    /// ```
    pub fn to_path(&self, params: &ParamBindings) -> Option<String> {
        let mut path = String::new();
        let last = self.matchers.len().saturating_sub(1);

        for (idx, matcher) in self.matchers.iter().enumerate() {
            match matcher {
                Matcher::Literal(literal) => {
                    path.push('/');
                    path.push_str(literal);
                }
                Matcher::Param { name, constraint } => match params.get(name) {
                    Some(value) => {
                        if constraint.as_ref().map_or(false, |c| !c.is_match(value)) {
                            return None;
                        }
                        path.push('/');
                        path.push_str(&encode_segment(value));
                    }
                    None if idx == last && self.allows_absent_trailing_param() => break,
                    None => return None,
                },
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        Some(path)
    }

    /// Whether two patterns cannot be told apart at match time
    ///
    /// Both must have the same length with equal literals and parameters at
    /// the same positions. They then collide when their parameters carry the
    /// same constrainedness slot by slot, or when they score the same
    /// (`[x]/[y(..)]` against `[x(..)]/[y]`). Constraints are never compared:
    /// two constrained parameters in one slot collide even when their
    /// patterns differ.
    pub fn conflicts_with(&self, other: &RoutePattern, case_insensitive: bool) -> bool {
        if self.matchers.len() != other.matchers.len() {
            return false;
        }

        let pairs = || self.matchers.iter().zip(&other.matchers);

        let aligned = pairs().all(|pair| match pair {
            (Matcher::Literal(a), Matcher::Literal(b)) => {
                if case_insensitive {
                    a.eq_ignore_ascii_case(b)
                } else {
                    a == b
                }
            }
            (Matcher::Param { .. }, Matcher::Param { .. }) => true,
            _ => false,
        });
        if !aligned {
            return false;
        }

        let same_slots = pairs().all(|pair| match pair {
            (Matcher::Param { constraint: a, .. }, Matcher::Param { constraint: b, .. }) => {
                a.is_some() == b.is_some()
            }
            _ => true,
        });

        same_slots || self.specificity == other.specificity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::pattern::tokenize;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn page(path: &str) -> RoutePattern {
        compile(&tokenize(path).unwrap(), MountKind::Page, SourceId::new(path)).unwrap()
    }

    #[test]
    fn test_compile_static() {
        let p = page("about.html");
        assert_eq!(p.matchers(), &[Matcher::Literal("about".into())]);
        assert_eq!(p.template(), "/about");
        assert_eq!(p.specificity(), STATIC_WEIGHT + 1);
    }

    #[test]
    fn test_compile_root_index() {
        let p = page("index.html");
        assert!(p.matchers().is_empty());
        assert!(p.is_index());
        assert_eq!(p.template(), "/");
        assert_eq!(p.specificity(), INDEX_BONUS);
    }

    #[test]
    fn test_compile_index_collapses_to_directory() {
        let a = page("about/index.html");
        let b = page("about.html");
        assert_eq!(a.matchers(), b.matchers());
        assert!(a.conflicts_with(&b, false));
    }

    #[test]
    fn test_compile_params() {
        let p = page("users/[id]/posts/[post([0-9]+)].html");
        assert_eq!(p.param_names(), vec!["id", "post"]);
        assert_eq!(p.template(), "/users/[id]/posts/[post([0-9]+)]");
    }

    #[test]
    fn test_compile_rejects_duplicate_params() {
        let segments = tokenize("[id]/[id].html").unwrap();
        let err = compile(&segments, MountKind::Page, "[id]/[id].html".into()).unwrap_err();
        assert!(matches!(err, RouteError::InvalidRouteName { .. }));
    }

    #[test]
    fn test_compile_rejects_ignored() {
        let segments = tokenize("_lib/helpers.html").unwrap();
        assert!(compile(&segments, MountKind::Page, "_lib/helpers.html".into()).is_err());
    }

    #[test]
    fn test_compile_error_page() {
        let segments = tokenize("_error.html").unwrap();
        let p = compile(&segments, MountKind::ErrorPage, "_error.html".into()).unwrap();
        assert_eq!(p.mount(), MountKind::ErrorPage);
        assert!(p.matchers().is_empty());
    }

    #[test]
    fn test_specificity_ordering() {
        let literal = page("items/new.html");
        let constrained = page("items/[id([0-9]+)].html");
        let dynamic = page("items/[slug].html");
        assert!(literal.specificity() > constrained.specificity());
        assert!(constrained.specificity() > dynamic.specificity());
    }

    #[test]
    fn test_conflicts_ignore_param_names() {
        assert!(page("a/[x].html").conflicts_with(&page("a/[y].html"), false));
        assert!(!page("a/[x].html").conflicts_with(&page("a/[y([0-9]+)].html"), false));
        assert!(page("a/[x([0-9]+)].html").conflicts_with(&page("a/[y([a-z]+)].html"), false));
        assert!(!page("a/b.html").conflicts_with(&page("a/B.html"), false));
        assert!(page("a/b.html").conflicts_with(&page("a/B.html"), true));
    }

    #[test]
    fn test_conflicts_on_equal_score_with_shifted_constraints() {
        let a = page("[x]/[y([0-9]+)].html");
        let b = page("[x([0-9]+)]/[y].html");
        assert_eq!(a.specificity(), b.specificity());
        assert!(a.conflicts_with(&b, false));
        assert!(b.conflicts_with(&a, false));

        // One more constrained slot scores higher, so the order is decided
        assert!(!a.conflicts_with(&page("[x([0-9]+)]/[y([0-9]+)].html"), false));
        assert!(!a.conflicts_with(&page("[x]/y.html"), false));
    }

    #[test]
    fn test_to_path_keeps_segment_safe_characters() {
        let p = page("blog/[slug].html");
        let mut params = HashMap::new();
        params.insert("slug".to_string(), "a,b@c's".to_string());
        assert_eq!(p.to_path(&params).as_deref(), Some("/blog/a,b@c's"));
        params.insert("slug".to_string(), "a/b?".to_string());
        assert_eq!(p.to_path(&params).as_deref(), Some("/blog/a%2Fb%3F"));
    }

    #[test]
    fn test_to_path() {
        let p = page("settings/[submenu].html");
        let mut params = HashMap::new();
        assert_eq!(p.to_path(&params).as_deref(), Some("/settings"));
        params.insert("submenu".to_string(), "profile".to_string());
        assert_eq!(p.to_path(&params).as_deref(), Some("/settings/profile"));
    }

    #[test]
    fn test_to_path_checks_constraints_and_required() {
        let p = page("items/[id([0-9]+)]/edit.html");
        let mut params = HashMap::new();
        assert_eq!(p.to_path(&params), None);
        params.insert("id".to_string(), "abc".to_string());
        assert_eq!(p.to_path(&params), None);
        params.insert("id".to_string(), "7".to_string());
        assert_eq!(p.to_path(&params).as_deref(), Some("/items/7/edit"));
    }
}
