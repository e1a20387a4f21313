// File: src/preload.rs
// Purpose: Per-page data loading run before render

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use trellis_router::ParamBindings;

use crate::fetch::Fetcher;
use crate::server_route::BoxFuture;

/// What a preload receives about the request
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreloadInput {
    /// Route parameters; an omitted trailing parameter has no entry
    pub params: ParamBindings,
    /// Parsed query string
    pub query: HashMap<String, String>,
    /// Request path with the base path removed
    pub path: String,
}

/// A rejected preload
///
/// The status defaults to 500 when the preload does not name one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PreloadError {
    pub status: Option<u16>,
    pub message: String,
}

impl PreloadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(404, message)
    }

    /// Response status; unset or out-of-range codes become 500
    pub fn status_code(&self) -> StatusCode {
        self.status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<anyhow::Error> for PreloadError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{:#}", err))
    }
}

/// Props object (or null) produced by a preload
pub type PreloadResult = Result<JsonValue, PreloadError>;

/// Type-erased preload function
pub type PreloadFn = Arc<dyn Fn(PreloadInput, Fetcher) -> BoxFuture<'static, PreloadResult> + Send + Sync>;

pub(crate) fn boxed<F, Fut>(preload: F) -> PreloadFn
where
    F: Fn(PreloadInput, Fetcher) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PreloadResult> + Send + 'static,
{
    Arc::new(move |input, fetch| Box::pin(preload(input, fetch)))
}

/// Builds the render props: `{params, query, path}` overlaid with the preload's object
///
/// A `null` preload result adds nothing; anything other than an object is rejected.
pub fn merge_props(input: &PreloadInput, preloaded: JsonValue) -> Result<JsonValue, PreloadError> {
    let mut props = match serde_json::to_value(input) {
        Ok(JsonValue::Object(map)) => map,
        _ => serde_json::Map::new(),
    };

    match preloaded {
        JsonValue::Null => {}
        JsonValue::Object(extra) => props.extend(extra),
        other => {
            return Err(PreloadError::new(format!(
                "preload must return an object, got {}",
                json_kind(&other)
            )))
        }
    }

    Ok(JsonValue::Object(props))
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn input() -> PreloadInput {
        PreloadInput {
            params: [("slug".to_string(), "hello".to_string())].into(),
            query: HashMap::new(),
            path: "/blog/hello".into(),
        }
    }

    #[test]
    fn test_merge_props_overlays_object() {
        let props = merge_props(&input(), json!({"title": "Hello", "path": "/override"})).unwrap();
        assert_eq!(
            props,
            json!({
                "params": {"slug": "hello"},
                "query": {},
                "path": "/override",
                "title": "Hello",
            })
        );
    }

    #[test]
    fn test_merge_props_null_keeps_base() {
        let props = merge_props(&input(), JsonValue::Null).unwrap();
        assert_eq!(props["params"]["slug"], "hello");
    }

    #[test]
    fn test_merge_props_rejects_non_object() {
        let err = merge_props(&input(), json!([1, 2])).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("an array"));
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(PreloadError::new("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(PreloadError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(PreloadError::with_status(200, "x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(PreloadError::with_status(9999, "x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
