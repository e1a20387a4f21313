// File: src/server_route.rs
// Purpose: Method-keyed handler sets mounted on server routes

use anyhow::{bail, Result};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::RequestContext;

/// Boxed future returned by handlers and preloads
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler did with the request
pub enum HandlerOutcome {
    /// Send this response
    Respond(Response),
    /// Not handled here; try the next matching route
    Next,
}

impl HandlerOutcome {
    pub fn respond(response: impl IntoResponse) -> Self {
        Self::Respond(response.into_response())
    }
}

impl std::fmt::Debug for HandlerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Respond(r) => f.debug_tuple("Respond").field(&r.status()).finish(),
            Self::Next => f.write_str("Next"),
        }
    }
}

/// Type-erased server-route handler
pub type HandlerFn =
    Arc<dyn Fn(RequestContext) -> BoxFuture<'static, Result<HandlerOutcome>> + Send + Sync>;

/// HTTP methods a server route can export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerMethod {
    Get,
    Post,
    Put,
    Patch,
    Head,
    Delete,
}

/// Exported handler names; `del` stands in for the reserved `delete`
const METHOD_TOKENS: &[(&str, HandlerMethod)] = &[
    ("get", HandlerMethod::Get),
    ("post", HandlerMethod::Post),
    ("put", HandlerMethod::Put),
    ("patch", HandlerMethod::Patch),
    ("head", HandlerMethod::Head),
    ("del", HandlerMethod::Delete),
    ("delete", HandlerMethod::Delete),
];

impl HandlerMethod {
    /// Resolves an exported handler name (case-insensitive)
    ///
    /// ```
    /// use trellis::HandlerMethod;
    ///
    /// assert_eq!(HandlerMethod::from_token("del"), Some(HandlerMethod::Delete));
    /// assert_eq!(HandlerMethod::from_token("GET"), Some(HandlerMethod::Get));
    /// assert_eq!(HandlerMethod::from_token("options"), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        METHOD_TOKENS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token))
            .map(|(_, method)| *method)
    }

    /// Maps a request method; unsupported methods have no handler slot
    pub fn from_http(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Self::Get),
            Method::POST => Some(Self::Post),
            Method::PUT => Some(Self::Put),
            Method::PATCH => Some(Self::Patch),
            Method::HEAD => Some(Self::Head),
            Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }

    /// Canonical export name
    pub fn token(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
            Self::Head => "head",
            Self::Delete => "del",
        }
    }
}

/// Handlers of one server route, keyed by method
#[derive(Clone, Default)]
pub struct ServerHandlerSet {
    handlers: HashMap<HandlerMethod, HandlerFn>,
}

impl ServerHandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a handler to a method, replacing any previous one
    pub fn on<F, Fut>(mut self, method: HandlerMethod, handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerOutcome>> + Send + 'static,
    {
        let handler: HandlerFn = Arc::new(move |ctx| Box::pin(handler(ctx)));
        self.handlers.insert(method, handler);
        self
    }

    /// Binds a handler under its exported name (`get`, `post`, ..., `del`)
    pub fn export<F, Fut>(self, token: &str, handler: F) -> Result<Self>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerOutcome>> + Send + 'static,
    {
        match HandlerMethod::from_token(token) {
            Some(method) => Ok(self.on(method, handler)),
            None => bail!("`{}` is not an HTTP method handler name", token),
        }
    }

    pub fn get<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerOutcome>> + Send + 'static,
    {
        self.on(HandlerMethod::Get, handler)
    }

    pub fn post<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerOutcome>> + Send + 'static,
    {
        self.on(HandlerMethod::Post, handler)
    }

    pub fn put<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerOutcome>> + Send + 'static,
    {
        self.on(HandlerMethod::Put, handler)
    }

    pub fn patch<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerOutcome>> + Send + 'static,
    {
        self.on(HandlerMethod::Patch, handler)
    }

    pub fn head<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerOutcome>> + Send + 'static,
    {
        self.on(HandlerMethod::Head, handler)
    }

    /// DELETE handler
    pub fn del<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HandlerOutcome>> + Send + 'static,
    {
        self.on(HandlerMethod::Delete, handler)
    }

    /// Handler for a request method, if this set exports one
    pub fn handler_for(&self, method: &Method) -> Option<&HandlerFn> {
        self.handlers.get(&HandlerMethod::from_http(method)?)
    }

    /// Exported names, sorted
    pub fn tokens(&self) -> Vec<&'static str> {
        let mut tokens: Vec<_> = self.handlers.keys().map(|m| m.token()).collect();
        tokens.sort_unstable();
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn ok(_ctx: RequestContext) -> Result<HandlerOutcome> {
        Ok(HandlerOutcome::respond(StatusCode::NO_CONTENT))
    }

    #[test]
    fn test_method_tokens() {
        for (token, method) in METHOD_TOKENS {
            assert_eq!(HandlerMethod::from_token(token), Some(*method));
        }
        assert_eq!(HandlerMethod::Delete.token(), "del");
        assert_eq!(HandlerMethod::from_http(&Method::OPTIONS), None);
    }

    #[test]
    fn test_del_export_serves_delete() {
        let set = ServerHandlerSet::new().export("del", ok).unwrap();

        assert!(set.handler_for(&Method::DELETE).is_some());
        assert!(set.handler_for(&Method::GET).is_none());
        assert_eq!(set.tokens(), vec!["del"]);
    }

    #[test]
    fn test_unknown_export_rejected() {
        assert!(ServerHandlerSet::new().export("options", ok).is_err());
    }

    #[test]
    fn test_builder_methods() {
        let set = ServerHandlerSet::new().get(ok).post(ok).head(ok);
        assert_eq!(set.tokens(), vec!["get", "head", "post"]);
        assert!(set.handler_for(&Method::PUT).is_none());
    }
}
