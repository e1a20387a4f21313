// File: src/fetch.rs
// Purpose: Request-scoped HTTP fetch handed to preloads

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::preload::PreloadError;
use crate::{dispatcher, App, RequestContext};

/// Nested in-process fetches allowed before giving up
pub const MAX_FETCH_DEPTH: u8 = 8;

/// Largest in-process response body read back
const MAX_LOCAL_BODY: usize = 16 * 1024 * 1024;

/// Fetch capability injected into preloads
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

pub type Fetcher = Arc<dyn Fetch>;

/// A buffered response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).context("response body is not the expected JSON")
    }

    /// Turns a non-2xx response into a preload rejection carrying its status
    pub fn error_for_status(self) -> Result<Self, PreloadError> {
        if self.is_success() {
            Ok(self)
        } else {
            let reason = self.status.canonical_reason().unwrap_or("request failed");
            Err(PreloadError::with_status(self.status.as_u16(), reason))
        }
    }
}

/// Where a preload URL is served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// Path and query dispatched through this application
    Local(String),
    /// Absolute URL on another origin
    Remote(String),
}

/// Resolves `url` against the current request
///
/// Relative URLs and absolute URLs on the request's own origin stay local.
///
/// ```
/// use trellis::fetch::{resolve_url, FetchTarget};
///
/// let origin = Some("http://localhost:3000");
/// assert_eq!(resolve_url("/api/posts", origin, "/blog/x"), FetchTarget::Local("/api/posts".into()));
/// assert_eq!(resolve_url("data.json", origin, "/blog/x"), FetchTarget::Local("/blog/data.json".into()));
/// assert_eq!(
///     resolve_url("http://localhost:3000/api/posts?page=2", origin, "/"),
///     FetchTarget::Local("/api/posts?page=2".into())
/// );
/// assert_eq!(
///     resolve_url("https://example.com/feed", origin, "/"),
///     FetchTarget::Remote("https://example.com/feed".into())
/// );
/// ```
pub fn resolve_url(url: &str, origin: Option<&str>, request_path: &str) -> FetchTarget {
    if url.starts_with("//") {
        return FetchTarget::Remote(format!("http:{}", url));
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        let local = origin
            .and_then(|origin| url.strip_prefix(origin))
            .and_then(|rest| match rest.chars().next() {
                None => Some("/".to_string()),
                Some('/') => Some(rest.to_string()),
                Some('?') => Some(format!("/{}", rest)),
                Some(_) => None,
            });
        return match local {
            Some(path) => FetchTarget::Local(path),
            None => FetchTarget::Remote(url.to_string()),
        };
    }

    if url.starts_with('/') {
        return FetchTarget::Local(url.to_string());
    }

    let dir = request_path.rsplit_once('/').map_or("", |(dir, _)| dir);
    FetchTarget::Local(format!("{}/{}", dir, url.trim_start_matches("./")))
}

/// Fetch bound to one request and one application snapshot
///
/// Local targets are dispatched in-process against the same snapshot with the
/// request's `Cookie` and `Host` headers; remote targets go through the shared
/// HTTP client.
pub struct SameOriginFetch {
    app: Arc<App>,
    origin: Option<String>,
    request_path: String,
    forwarded: HeaderMap,
    depth: u8,
}

impl SameOriginFetch {
    pub fn for_request(app: Arc<App>, ctx: &RequestContext) -> Self {
        let forwarded = [header::COOKIE, header::HOST]
            .into_iter()
            .filter_map(|name| {
                let value: HeaderValue = ctx.headers.get(&name)?.clone();
                Some((name, value))
            })
            .collect();

        Self {
            app,
            origin: ctx.origin(),
            request_path: ctx.path.clone(),
            forwarded,
            depth: ctx.fetch_depth,
        }
    }

    async fn fetch_local(&self, path_and_query: &str) -> Result<FetchResponse> {
        if self.depth >= MAX_FETCH_DEPTH {
            bail!(
                "fetch of {} exceeds {} nested in-process requests",
                path_and_query,
                MAX_FETCH_DEPTH
            );
        }

        let uri: Uri = path_and_query
            .parse()
            .with_context(|| format!("invalid fetch path {:?}", path_and_query))?;

        let mut ctx = RequestContext::from_parts(Method::GET, &uri, self.forwarded.clone(), Bytes::new());
        ctx.fetch_depth = self.depth + 1;

        let response = dispatcher::dispatch(self.app.clone(), ctx).await;
        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(body, MAX_LOCAL_BODY)
            .await
            .with_context(|| format!("failed to read response of {}", path_and_query))?;

        Ok(FetchResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    async fn fetch_remote(&self, url: &str) -> Result<FetchResponse> {
        let response = self
            .app
            .http_client()
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetch {} failed", url))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("failed to read response of {}", url))?;

        Ok(FetchResponse { status, headers, body })
    }
}

#[async_trait]
impl Fetch for SameOriginFetch {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let target = resolve_url(url, self.origin.as_deref(), &self.request_path);
        debug!(url, ?target, "preload fetch");

        match target {
            FetchTarget::Local(path) => self.fetch_local(&path).await,
            FetchTarget::Remote(url) => self.fetch_remote(&url).await,
        }
    }
}
