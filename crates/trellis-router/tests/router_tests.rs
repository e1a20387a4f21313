//! Integration tests for trellis-router
//!
//! Tests are organized by feature area and cover:
//! - Static vs dynamic precedence
//! - Index collapsing and collisions
//! - Ambiguous subroutes (`settings` vs `settings/[submenu]`)
//! - Constrained parameters
//! - Ignored subtrees and the error page
//! - Reverse routing round-trips

use pretty_assertions::assert_eq;
use rstest::rstest;
use trellis_router::*;

fn pages(sources: &[&str]) -> RouteTable {
    let mut table = RouteTable::new();
    for source in sources {
        table.register_source(source).unwrap();
    }
    table.finalized()
}

fn matched_source(table: &RouteTable, path: &str) -> Option<String> {
    table
        .match_path(MountKind::Page, path)
        .map(|m| m.pattern.source().to_string())
}

#[test]
fn test_static_outranks_dynamic_regardless_of_registration_order() {
    for sources in [["about.html", "[page].html"], ["[page].html", "about.html"]] {
        let table = pages(&sources);
        assert_eq!(matched_source(&table, "/about").as_deref(), Some("about.html"));
        assert_eq!(matched_source(&table, "/pricing").as_deref(), Some("[page].html"));
    }
}

#[test]
fn test_blog_slug() {
    let table = pages(&["index.html", "blog/index.html", "blog/[slug].html"]);

    let m = table.match_path(MountKind::Page, "/blog/first-post").unwrap();
    assert_eq!(m.pattern.source().as_str(), "blog/[slug].html");
    assert_eq!(m.params.get("slug").map(String::as_str), Some("first-post"));

    assert_eq!(matched_source(&table, "/blog").as_deref(), Some("blog/index.html"));
    assert_eq!(matched_source(&table, "/blog/").as_deref(), Some("blog/index.html"));
    assert_eq!(matched_source(&table, "/").as_deref(), Some("index.html"));
    assert_eq!(matched_source(&table, "/blog/a/b"), None);
}

#[rstest]
#[case("about/index.html", "about.html")]
#[case("index.html", "index.htm")]
#[case("users/[id].html", "users/[user].html")]
#[case("items/[id([0-9]+)].html", "items/[n([0-9]+)]/index.html")]
#[case("[x]/[y([0-9]+)].html", "[x([0-9]+)]/[y].html")]
fn test_collisions(#[case] first: &str, #[case] second: &str) {
    let mut table = RouteTable::new();
    table.register_source(first).unwrap();
    let err = table.register_source(second).unwrap_err();
    assert_eq!(
        err,
        RouteError::RouteCollision {
            kind: MountKind::Page,
            existing: first.to_string(),
            incoming: second.to_string(),
        }
    );
}

#[test]
fn test_collisions_are_scoped_per_namespace() {
    let mut table = RouteTable::new();
    table.register_source("items/[id].html").unwrap();
    table
        .register_source_as("items/[id]", MountKind::ServerRoute)
        .unwrap();

    let err = table.register_source("items/[id].rs").unwrap_err();
    assert!(matches!(
        err,
        RouteError::RouteCollision {
            kind: MountKind::ServerRoute,
            ..
        }
    ));
}

#[test]
fn test_ambiguous_subroute() {
    let table = pages(&["settings/[submenu].html"]);

    let m = table.match_path(MountKind::Page, "/settings").unwrap();
    assert_eq!(m.pattern.source().as_str(), "settings/[submenu].html");
    assert!(!m.exact);
    assert!(!m.params.contains_key("submenu"));

    let m = table.match_path(MountKind::Page, "/settings/profile").unwrap();
    assert!(m.exact);
    assert_eq!(m.params.get("submenu").map(String::as_str), Some("profile"));
}

#[test]
fn test_explicit_page_outranks_ambiguous_subroute() {
    for sources in [
        ["settings/[submenu].html", "settings.html"],
        ["settings/[submenu].html", "settings/index.html"],
    ] {
        let table = pages(&sources);
        assert_eq!(matched_source(&table, "/settings").as_deref(), Some(sources[1]));
        assert_eq!(
            matched_source(&table, "/settings/x").as_deref(),
            Some("settings/[submenu].html")
        );
    }
}

#[test]
fn test_constrained_parameter() {
    let table = pages(&["items/[id([0-9]+)].html"]);

    let m = table.match_path(MountKind::Page, "/items/123").unwrap();
    assert_eq!(m.params.get("id").map(String::as_str), Some("123"));
    assert!(table.match_path(MountKind::Page, "/items/xyz").is_none());
}

#[test]
fn test_constrained_falls_through_to_unconstrained() {
    let table = pages(&["items/[slug].html", "items/[id([0-9]+)].html"]);

    assert_eq!(
        matched_source(&table, "/items/42").as_deref(),
        Some("items/[id([0-9]+)].html")
    );
    assert_eq!(
        matched_source(&table, "/items/widget").as_deref(),
        Some("items/[slug].html")
    );
}

#[rstest]
#[case("_partials/header.html")]
#[case("blog/_drafts/[slug].html")]
#[case("_helpers.html")]
#[case("_lib/_error.html")]
fn test_ignored_subtree_never_reachable(#[case] source: &str) {
    let mut table = RouteTable::new();
    assert_eq!(table.register_source(source).unwrap(), None);
    table.finalize();

    assert!(table.is_empty());
    for path in ["/_partials/header", "/blog/_drafts/x", "/_helpers", "/_lib/_error"] {
        assert!(table.match_path(MountKind::Page, path).is_none());
    }
}

#[test]
fn test_error_page_is_a_singleton_slot() {
    let mut table = RouteTable::new();
    assert_eq!(
        table.register_source("_error.html").unwrap(),
        Some(MountKind::ErrorPage)
    );
    table.finalize();

    assert_eq!(table.error_page().unwrap().source().as_str(), "_error.html");
    assert!(table.patterns(MountKind::Page).is_empty());
}

#[rstest]
#[case("blog/[slug.html")]
#[case("[a-b].html")]
#[case("x/[id(a/b)].html")]
#[case("x/[id(a?)].html")]
#[case("[id]/[id].html")]
fn test_invalid_sources(#[case] source: &str) {
    let mut table = RouteTable::new();
    let err = table.register_source(source).unwrap_err();
    assert!(
        matches!(
            err,
            RouteError::InvalidRouteName { .. } | RouteError::InvalidConstraint { .. }
        ),
        "{:?}",
        err
    );
}

#[rstest]
#[case("blog/[slug].html", "/blog/hello-world")]
#[case("users/[id]/posts/[post([0-9]+)].html", "/users/ann/posts/7")]
#[case("settings/[submenu].html", "/settings")]
#[case("settings/[submenu].html", "/settings/profile")]
#[case("docs/[page].html", "/docs/a%20b")]
#[case("blog/[slug].html", "/blog/a,b")]
#[case("blog/[slug].html", "/blog/me@example")]
#[case("blog/[slug].html", "/blog/it's")]
#[case("blog/[slug].html", "/blog/a;b=c+d")]
#[case("index.html", "/")]
fn test_round_trip(#[case] source: &str, #[case] path: &str) {
    let table = pages(&[source]);
    let m = table.match_path(MountKind::Page, path).unwrap();
    assert_eq!(m.pattern.to_path(&m.params).as_deref(), Some(path));
}

#[test]
fn test_round_trip_across_whole_table() {
    let sources = [
        "index.html",
        "about.html",
        "blog/index.html",
        "blog/[slug].html",
        "items/[id([0-9]+)].html",
        "items/[id([0-9]+)]/edit.html",
        "[user]/[repo].html",
    ];
    let table = pages(&sources);

    let values = ["x1", "42", "hello"];
    for pattern in table.patterns(MountKind::Page) {
        for value in values {
            let params: ParamBindings = pattern
                .param_names()
                .into_iter()
                .map(|name| (name.to_string(), value.to_string()))
                .collect();
            let Some(path) = pattern.to_path(&params) else {
                continue;
            };

            let m = table.match_path(MountKind::Page, &path).unwrap();
            assert_eq!(m.pattern.source(), pattern.source(), "path {}", path);
            assert_eq!(m.params, params);
        }
    }
}

#[test]
fn test_match_order_is_deterministic_on_ties() {
    let table = pages(&["[a]/x.html", "x/[b].html"]);
    assert_eq!(matched_source(&table, "/x/x").as_deref(), Some("[a]/x.html"));

    let table = pages(&["x/[b].html", "[a]/x.html"]);
    assert_eq!(matched_source(&table, "/x/x").as_deref(), Some("x/[b].html"));
}
