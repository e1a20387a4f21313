/// Route table: compiled patterns per mount kind, ordered by specificity
use crate::route::{compile, is_ignored, tokenize, RoutePattern, SourceId};
use crate::route::pattern::source_mount_kind;
use crate::RouteError;

/// What a compiled pattern mounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountKind {
    /// Rendered template with optional preload
    Page,
    /// Handler set keyed by HTTP method
    ServerRoute,
    /// The single error page
    ErrorPage,
}

/// Ordered collection of compiled patterns
///
/// The table maintains separate namespaces:
/// - Pages (Vec, ordered by specificity)
/// - Server routes (Vec, ordered by specificity)
/// - A singleton error page slot (absent is legal)
///
/// Patterns are registered during the build phase, then [`finalize`](Self::finalize)
/// sorts each namespace by specificity descending; ties keep registration order.
/// After that the table is only read.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    pages: Vec<RoutePattern>,
    server_routes: Vec<RoutePattern>,
    error_page: Option<RoutePattern>,
    case_insensitive: bool,
    finalized: bool,
}

impl RouteTable {
    /// Creates an empty table with case-sensitive literal matching
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures case sensitivity (functional builder)
    ///
    /// ```
    /// use trellis_router::RouteTable;
    ///
    /// let table = RouteTable::new().with_case_insensitive(true);
    /// assert!(table.is_case_insensitive());
    /// ```
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Registers a compiled pattern
    ///
    /// # Errors
    ///
    /// - `DuplicateErrorPage` for a second `ErrorPage` pattern
    /// - `RouteCollision` when the pattern is indistinguishable from one
    ///   already registered under the same mount kind
    pub fn register(&mut self, pattern: RoutePattern) -> Result<(), RouteError> {
        let case_insensitive = self.case_insensitive;
        let routes = match pattern.mount() {
            MountKind::ErrorPage => {
                if let Some(existing) = &self.error_page {
                    return Err(RouteError::DuplicateErrorPage {
                        first: existing.source().to_string(),
                        second: pattern.source().to_string(),
                    });
                }
                self.error_page = Some(pattern);
                return Ok(());
            }
            MountKind::Page => &mut self.pages,
            MountKind::ServerRoute => &mut self.server_routes,
        };

        if let Some(existing) = routes
            .iter()
            .find(|r| r.conflicts_with(&pattern, case_insensitive))
        {
            return Err(RouteError::RouteCollision {
                kind: pattern.mount(),
                existing: existing.source().to_string(),
                incoming: pattern.source().to_string(),
            });
        }

        routes.push(pattern);
        self.finalized = false;
        Ok(())
    }

    /// Tokenizes, compiles and registers a source path
    ///
    /// The mount kind comes from the file extension (see
    /// [`source_mount_kind`]). Returns `Ok(None)` for sources that produce no
    /// route: ignored subtrees and unrecognized extensions.
    ///
    /// ```
    /// use trellis_router::{MountKind, RouteTable};
    ///
    /// let mut table = RouteTable::new();
    /// assert_eq!(table.register_source("about.html").unwrap(), Some(MountKind::Page));
    /// assert_eq!(table.register_source("_partials/nav.html").unwrap(), None);
    /// ```
    pub fn register_source(&mut self, path: &str) -> Result<Option<MountKind>, RouteError> {
        let Some(kind) = source_mount_kind(path) else {
            return Ok(None);
        };
        self.register_source_as(path, kind)
    }

    /// Like [`register_source`](Self::register_source) with an explicit mount kind
    ///
    /// Used for server routes registered from code, whose source names need
    /// not carry a script extension.
    pub fn register_source_as(
        &mut self,
        path: &str,
        kind: MountKind,
    ) -> Result<Option<MountKind>, RouteError> {
        let segments = tokenize(path)?;
        if is_ignored(&segments) {
            return Ok(None);
        }

        let kind = if crate::route::is_error_page(&segments) {
            MountKind::ErrorPage
        } else {
            kind
        };

        let pattern = compile(&segments, kind, SourceId::new(path))?;
        self.register(pattern)?;
        Ok(Some(kind))
    }

    /// Sorts every namespace by specificity (descending, stable)
    pub fn finalize(&mut self) {
        for routes in [&mut self.pages, &mut self.server_routes] {
            routes.sort_by(|a, b| b.specificity().cmp(&a.specificity()));
        }
        self.finalized = true;
    }

    /// Finalizes and returns the table (functional builder)
    pub fn finalized(mut self) -> Self {
        self.finalize();
        self
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Patterns of one mount kind in match order
    pub fn patterns(&self, kind: MountKind) -> &[RoutePattern] {
        match kind {
            MountKind::Page => &self.pages,
            MountKind::ServerRoute => &self.server_routes,
            MountKind::ErrorPage => self.error_page.as_slice(),
        }
    }

    pub fn error_page(&self) -> Option<&RoutePattern> {
        self.error_page.as_ref()
    }

    /// Total number of registered patterns, error page included
    pub fn len(&self) -> usize {
        self.pages.len() + self.server_routes.len() + usize::from(self.error_page.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_separates_namespaces() {
        let mut table = RouteTable::new();
        table.register_source("items.html").unwrap();
        table.register_source_as("items", MountKind::ServerRoute).unwrap();
        table.register_source("_error.html").unwrap();

        assert_eq!(table.patterns(MountKind::Page).len(), 1);
        assert_eq!(table.patterns(MountKind::ServerRoute).len(), 1);
        assert!(table.error_page().is_some());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_duplicate_error_page() {
        let mut table = RouteTable::new();
        table.register_source("_error.html").unwrap();
        let err = table.register_source("blog/_error.html").unwrap_err();
        assert_eq!(
            err,
            RouteError::DuplicateErrorPage {
                first: "_error.html".into(),
                second: "blog/_error.html".into(),
            }
        );
    }

    #[test]
    fn test_finalize_orders_by_specificity_then_registration() {
        let mut table = RouteTable::new();
        table.register_source("[page].html").unwrap();
        table.register_source("[a]/x.html").unwrap();
        table.register_source("x/[b].html").unwrap();
        table.register_source("about.html").unwrap();
        table.finalize();

        let order: Vec<&str> = table
            .patterns(MountKind::Page)
            .iter()
            .map(|p| p.source().as_str())
            .collect();
        assert_eq!(order, vec!["[a]/x.html", "x/[b].html", "about.html", "[page].html"]);
    }

    #[test]
    fn test_register_after_finalize_clears_flag() {
        let mut table = RouteTable::new().finalized();
        assert!(table.is_finalized());
        table.register_source("about.html").unwrap();
        assert!(!table.is_finalized());
    }
}
