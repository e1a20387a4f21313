/// Path utilities for validation and normalization
///
/// All functions are **pure**: given same input, always produce same output with no side effects.
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;

/// Bytes escaped inside one path segment
///
/// Everything outside the RFC 3986 `pchar` set, plus `%`, `/` and `\`.
/// Sub-delimiters, `:` and `@` stay literal.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Validates if a path is in canonical form
///
/// **Pure function**: No side effects, deterministic output.
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not end with `/` (except root `/`)
/// - Must not be empty
///
/// # Examples
///
/// ```
/// use trellis_router::path::is_valid_path;
///
/// assert!(is_valid_path("/"));
/// assert!(is_valid_path("/about"));
/// assert!(is_valid_path("/users/123"));
///
/// assert!(!is_valid_path(""));
/// assert!(!is_valid_path("about")); // Missing leading /
/// assert!(!is_valid_path("/about/")); // Trailing /
/// assert!(!is_valid_path("/about//page")); // Double //
/// assert!(!is_valid_path("/about\\page")); // Backslash
/// ```
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }

    if path.contains("//") || path.contains('\\') {
        return false;
    }

    path == "/" || !path.ends_with('/')
}

/// Normalize a path to canonical form
///
/// Returns `Cow::Borrowed` when input is already valid (zero allocations).
/// Returns `Cow::Owned` when normalization needed (single allocation).
///
/// # Handles All User Mistakes
///
/// - Trailing slashes: `/path/` → `/path`
/// - Double slashes: `/path//to` → `/path/to`
/// - Backslashes: `\path\to` → `/path/to`
/// - Empty segments: `/path///to` → `/path/to`
///
/// # Examples
///
/// ```
/// use trellis_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// let path = normalize_path("/about");
/// assert!(matches!(path, Cow::Borrowed("/about")));
///
/// assert_eq!(normalize_path("/about/"), "/about");
/// assert_eq!(normalize_path("\\users\\123"), "/users/123");
/// assert_eq!(normalize_path("/path//to///page"), "/path/to/page");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_valid_path(path) {
        return Cow::Borrowed(path);
    }

    let normalized = path
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        Cow::Borrowed("/")
    } else {
        Cow::Owned(format!("/{}", normalized))
    }
}

/// Splits a request path into percent-decoded segments
///
/// The query string and fragment, if present, are dropped. Segments that do
/// not decode to UTF-8 are kept verbatim.
///
/// ```
/// use trellis_router::path::request_segments;
///
/// assert_eq!(request_segments("/blog/hello%20world/?x=1"), vec!["blog", "hello world"]);
/// assert!(request_segments("/").is_empty());
/// ```
pub fn request_segments(path: &str) -> Vec<String> {
    let path = path.split(['?', '#']).next().unwrap_or("");

    normalize_path(path)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| s.to_string())
        })
        .collect()
}

/// Percent-encodes a value for use as a single path segment
///
/// Inverse of the decoding done by [`request_segments`]: characters that are
/// legal in a segment are kept as they are.
///
/// ```
/// use trellis_router::path::encode_segment;
///
/// assert_eq!(encode_segment("a,b@c"), "a,b@c");
/// assert_eq!(encode_segment("a b/c"), "a%20b%2Fc");
/// ```
pub fn encode_segment(value: &str) -> Cow<'_, str> {
    utf8_percent_encode(value, SEGMENT).into()
}

/// Strips a mount prefix from a request path
///
/// Returns `None` when the path lies outside `base`. The result always
/// starts with `/`.
///
/// ```
/// use trellis_router::path::strip_base_path;
///
/// assert_eq!(strip_base_path("/app/blog", "/app"), Some("/blog"));
/// assert_eq!(strip_base_path("/app", "/app/"), Some("/"));
/// assert_eq!(strip_base_path("/application", "/app"), None);
/// assert_eq!(strip_base_path("/blog", "/"), Some("/blog"));
/// ```
pub fn strip_base_path<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return Some(path);
    }

    match path.strip_prefix(base)? {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_path() {
        assert!(is_valid_path("/"));
        assert!(is_valid_path("/about"));
        assert!(is_valid_path("/blog/posts/hello-world"));

        assert!(!is_valid_path(""));
        assert!(!is_valid_path("about"));
        assert!(!is_valid_path("/about/"));
        assert!(!is_valid_path("/about//page"));
        assert!(!is_valid_path("/about\\page"));
    }

    #[test]
    fn test_normalize_path_valid() {
        let path = normalize_path("/about");
        assert!(matches!(path, Cow::Borrowed("/about")));

        let path = normalize_path("/");
        assert!(matches!(path, Cow::Borrowed("/")));
    }

    #[test]
    fn test_normalize_path_mistakes() {
        assert_eq!(normalize_path("/users/123/"), "/users/123");
        assert_eq!(normalize_path("/path///to////page"), "/path/to/page");
        assert_eq!(normalize_path("/about\\page"), "/about/page");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_request_segments_decoding() {
        assert_eq!(request_segments("/a%2Fb/c"), vec!["a/b", "c"]);
        assert_eq!(request_segments("/caf%C3%A9"), vec!["café"]);
        assert_eq!(request_segments("/bad%FF"), vec!["bad%FF"]);
        assert_eq!(request_segments("/x#frag"), vec!["x"]);
    }

    #[test]
    fn test_encode_segment_keeps_pchars() {
        assert_eq!(encode_segment("it's;x=1+y&z!$*(a):b"), "it's;x=1+y&z!$*(a):b");
        assert_eq!(encode_segment("50%"), "50%25");
        assert_eq!(encode_segment("q?#"), "q%3F%23");
        assert_eq!(encode_segment("café"), "caf%C3%A9");

        for value in ["a,b", "x@y", "a b", "a/b", "café", "100%"] {
            let path = format!("/{}", encode_segment(value));
            assert_eq!(request_segments(&path), vec![value.to_string()]);
        }
    }

    #[test]
    fn test_strip_base_path() {
        assert_eq!(strip_base_path("/app/", "/app"), Some("/"));
        assert_eq!(strip_base_path("/other", "/app"), None);
        assert_eq!(strip_base_path("/x", ""), Some("/x"));
    }
}
