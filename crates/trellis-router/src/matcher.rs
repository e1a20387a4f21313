/// Request-time matching against a finalized [`RouteTable`]
use std::collections::HashMap;

use crate::path::request_segments;
use crate::route::{Matcher, RoutePattern};
use crate::{MountKind, RouteTable};

/// Parameter name → value, fresh per request
///
/// A parameter whose segment is absent from the request (ambiguous-subroute
/// match) has no entry at all.
pub type ParamBindings = HashMap<String, String>;

/// Result of matching a request path
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// The matched pattern
    pub pattern: &'a RoutePattern,
    /// Extracted parameters
    pub params: ParamBindings,
    /// False when matched one segment short (trailing parameter absent)
    pub exact: bool,
}

impl RoutePattern {
    /// Matches decoded request segments consuming all of them
    pub fn match_exact(&self, segments: &[String], case_insensitive: bool) -> Option<ParamBindings> {
        match_segments(self.matchers(), segments, ParamBindings::new(), case_insensitive)
    }

    /// Matches request segments one short of the pattern
    ///
    /// Only applies when [`allows_absent_trailing_param`](RoutePattern::allows_absent_trailing_param):
    /// `settings/[submenu]` matches `/settings` with `submenu` unbound.
    pub fn match_short(&self, segments: &[String], case_insensitive: bool) -> Option<ParamBindings> {
        let matchers = self.matchers();
        if !self.allows_absent_trailing_param() || segments.len() + 1 != matchers.len() {
            return None;
        }
        match_segments(
            &matchers[..matchers.len() - 1],
            segments,
            ParamBindings::new(),
            case_insensitive,
        )
    }

    /// Matches a raw request path (case-sensitive, exact only)
    ///
    /// ```
    /// use trellis_router::route::{compile, tokenize};
    /// use trellis_router::MountKind;
    ///
    /// let p = compile(&tokenize("users/[id].html").unwrap(), MountKind::Page, "u".into()).unwrap();
    /// assert_eq!(p.matches("/users/42").unwrap().get("id").map(String::as_str), Some("42"));
    /// assert!(p.matches("/users").is_none());
    /// ```
    pub fn matches(&self, path: &str) -> Option<ParamBindings> {
        self.match_exact(&request_segments(path), false)
    }
}

/// Tail-recursive segment walk
///
/// Literals need equality, parameters consume one segment (subject to their
/// constraint). Succeeds only when both sequences are exhausted together.
fn match_segments(
    matchers: &[Matcher],
    segments: &[String],
    mut params: ParamBindings,
    case_insensitive: bool,
) -> Option<ParamBindings> {
    let (matcher, segment, matchers_rest, segments_rest) =
        match (matchers.split_first(), segments.split_first()) {
            (None, None) => return Some(params),
            (Some((m, m_rest)), Some((s, s_rest))) => (m, s, m_rest, s_rest),
            _ => return None,
        };

    match matcher {
        Matcher::Literal(literal) => {
            let equal = if case_insensitive {
                literal.eq_ignore_ascii_case(segment)
            } else {
                literal == segment
            };
            if !equal {
                return None;
            }
        }
        Matcher::Param { name, constraint } => {
            if constraint.as_ref().map_or(false, |c| !c.is_match(segment)) {
                return None;
            }
            params.insert(name.clone(), segment.clone());
        }
    }

    match_segments(matchers_rest, segments_rest, params, case_insensitive)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Exact,
    Short,
}

/// Lazy iterator over every match for a path, in match order
///
/// All exact matches come first in specificity order; for pages, the
/// one-segment-short matches follow. The first item is what
/// [`RouteTable::match_path`] returns; later items are the fallthrough
/// candidates a handler reaches by declining a request.
pub struct Matches<'a> {
    patterns: &'a [RoutePattern],
    segments: Vec<String>,
    case_insensitive: bool,
    allow_short: bool,
    pass: Pass,
    idx: usize,
}

impl<'a> Iterator for Matches<'a> {
    type Item = RouteMatch<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(pattern) = self.patterns.get(self.idx) else {
                if self.pass == Pass::Exact && self.allow_short {
                    self.pass = Pass::Short;
                    self.idx = 0;
                    continue;
                }
                return None;
            };
            self.idx += 1;

            let params = match self.pass {
                Pass::Exact => pattern.match_exact(&self.segments, self.case_insensitive),
                Pass::Short => pattern.match_short(&self.segments, self.case_insensitive),
            };

            if let Some(params) = params {
                return Some(RouteMatch {
                    pattern,
                    params,
                    exact: self.pass == Pass::Exact,
                });
            }
        }
    }
}

impl RouteTable {
    /// Every match for `path` under `kind`, best first
    ///
    /// The error page never matches. The table must be finalized first.
    pub fn matches(&self, kind: MountKind, path: &str) -> Matches<'_> {
        debug_assert!(
            self.is_finalized(),
            "RouteTable::finalize must run before matching"
        );

        let patterns: &[RoutePattern] = match kind {
            MountKind::ErrorPage => &[],
            _ => self.patterns(kind),
        };

        Matches {
            patterns,
            segments: request_segments(path),
            case_insensitive: self.is_case_insensitive(),
            allow_short: kind == MountKind::Page,
            pass: Pass::Exact,
            idx: 0,
        }
    }

    /// Matches a path against one namespace and returns the first match
    ///
    /// Patterns are tried in specificity order; first match wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use trellis_router::{MountKind, RouteTable};
    ///
    /// let mut table = RouteTable::new();
    /// table.register_source("users/[id].html").unwrap();
    /// table.finalize();
    ///
    /// let m = table.match_path(MountKind::Page, "/users/123").unwrap();
    /// assert_eq!(m.params.get("id"), Some(&"123".to_string()));
    /// ```
    pub fn match_path(&self, kind: MountKind, path: &str) -> Option<RouteMatch<'_>> {
        self.matches(kind, path).next()
    }
}
