// File: src/request_context.rs
// Purpose: Request context with query params, headers, cookies and route params

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{header, HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use trellis_router::ParamBindings;

/// Request context passed to server-route handlers
#[derive(Clone)]
pub struct RequestContext {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: Method,

    /// Request path as received, base path included
    pub path: String,

    /// Query parameters from URL (?key=value)
    pub query: QueryParams,

    /// Request headers
    pub headers: HeaderMap,

    /// Parsed cookies
    pub cookies: HashMap<String, String>,

    /// Raw request body
    pub body: Bytes,

    /// Parameters bound by the matched route
    pub params: ParamBindings,

    /// Nesting level of in-process preload fetches
    pub(crate) fetch_depth: u8,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .finish()
    }
}

impl RequestContext {
    /// Create a new request context
    pub fn new(method: Method, path: String, query: QueryParams, headers: HeaderMap, body: Bytes) -> Self {
        let cookies = Self::parse_cookies(&headers);

        Self {
            method,
            path,
            query,
            headers,
            cookies,
            body,
            params: ParamBindings::new(),
            fetch_depth: 0,
        }
    }

    /// Build from a full URI, as in-process fetches do
    ///
    /// The query string is decoded the way axum's [`Query`] extractor does;
    /// an undecodable query yields no parameters.
    pub fn from_parts(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes) -> Self {
        let query = Query::<HashMap<String, String>>::try_from_uri(uri)
            .map(|Query(params)| params)
            .unwrap_or_default();

        Self::new(method, uri.path().to_string(), QueryParams::new(query), headers, body)
    }

    /// Parse cookies from Cookie header
    fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
        let mut cookies = HashMap::new();

        if let Some(cookie_header) = headers.get(header::COOKIE) {
            if let Ok(cookie_str) = cookie_header.to_str() {
                for cookie in cookie_str.split(';') {
                    let cookie = cookie.trim();
                    if let Some((key, value)) = cookie.split_once('=') {
                        cookies.insert(key.to_string(), value.to_string());
                    }
                }
            }
        }

        cookies
    }

    /// Get a route parameter
    ///
    /// Absent when the request omitted the segment that would supply it.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Get a cookie value
    pub fn get_cookie(&self, name: &str) -> Option<&String> {
        self.cookies.get(name)
    }

    /// Get a header value
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// `scheme://host` of this request, when a Host header is present
    pub fn origin(&self) -> Option<String> {
        let host = self.get_header("host")?;
        let scheme = self.get_header("x-forwarded-proto").unwrap_or("http");
        Some(format!("{}://{}", scheme, host))
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decode an `application/x-www-form-urlencoded` body
    pub fn form(&self) -> HashMap<String, String> {
        url::form_urlencoded::parse(&self.body).into_owned().collect()
    }
}

/// Query parameters from URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    /// Create from HashMap
    pub fn new(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Get a query parameter value
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    /// Get a query parameter as a specific type
    pub fn get_as<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.params.get(key)?.parse().ok()
    }

    /// Check if a parameter exists
    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Get as HashMap
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_of(uri: &str) -> QueryParams {
        let uri: Uri = uri.parse().unwrap();
        RequestContext::from_parts(Method::GET, &uri, HeaderMap::new(), Bytes::new()).query
    }

    #[test]
    fn test_query_params_from_uri() {
        let query = query_of("/search?page=2&q=hello+world&tag=a%26b&flag");

        assert_eq!(query.get("q"), Some(&"hello world".to_string()));
        assert_eq!(query.get("tag"), Some(&"a&b".to_string()));
        assert_eq!(query.get("flag"), Some(&String::new()));
        assert_eq!(query.get_as::<i32>("page"), Some(2));
        assert!(!query.has("sort"));
    }

    #[test]
    fn test_query_params_empty() {
        assert!(query_of("/search").as_map().is_empty());
        assert!(query_of("/search?").as_map().is_empty());
    }

    #[test]
    fn test_request_context_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", "session=abc123; user=john".parse().unwrap());

        let cookies = RequestContext::parse_cookies(&headers);

        assert_eq!(cookies.get("session"), Some(&"abc123".to_string()));
        assert_eq!(cookies.get("user"), Some(&"john".to_string()));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn test_from_parts() {
        let uri: Uri = "/blog/x?draft=1".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("host", "example.test:3000".parse().unwrap());

        let ctx = RequestContext::from_parts(Method::GET, &uri, headers, Bytes::new());

        assert_eq!(ctx.path, "/blog/x");
        assert_eq!(ctx.query.get("draft"), Some(&"1".to_string()));
        assert_eq!(ctx.origin().as_deref(), Some("http://example.test:3000"));
        assert!(ctx.param("slug").is_none());
    }

    #[test]
    fn test_body_helpers() {
        let ctx = RequestContext::new(
            Method::POST,
            "/api/items".into(),
            QueryParams::default(),
            HeaderMap::new(),
            Bytes::from_static(br#"{"name":"widget"}"#),
        );
        let value: serde_json::Value = ctx.json().unwrap();
        assert_eq!(value["name"], "widget");

        let ctx = RequestContext {
            body: Bytes::from_static(b"name=big+widget&qty=2"),
            ..ctx
        };
        let form = ctx.form();
        assert_eq!(form.get("name").map(String::as_str), Some("big widget"));
        assert_eq!(form.get("qty").map(String::as_str), Some("2"));
    }
}
