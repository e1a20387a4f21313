// File: src/serve.rs
// Purpose: axum glue: every request goes through the dispatcher

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;
use axum::Router;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{dispatcher, QueryParams, RequestContext, SharedApp};

/// Builds the axum router serving a [`SharedApp`]
///
/// Route resolution happens in the dispatcher, so the router is a single
/// fallback handler. Each request runs against the snapshot current when it
/// arrived.
pub fn router(shared: Arc<SharedApp>) -> Router {
    Router::new()
        .fallback(handle)
        .with_state(shared)
        .layer(TraceLayer::new_for_http())
}

async fn handle(
    State(shared): State<Arc<SharedApp>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::new(method, uri.path().to_string(), QueryParams::new(query), headers, body);
    dispatcher::dispatch(shared.load(), ctx).await
}

/// Binds the configured address and serves until `shutdown` resolves
pub async fn serve(shared: Arc<SharedApp>, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
    let addr = shared.config().bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running at http://{}", addr);
    axum::serve(listener, router(shared))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")
}
