// File: src/dispatcher.rs
// Purpose: Resolves one request to a page render, a server-route response or the error page

use axum::response::{Html, IntoResponse, Response};
use futures_util::FutureExt;
use serde_json::{json, Value as JsonValue};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};
use trellis_router::{MountKind, SourceId};

use crate::fetch::{Fetcher, SameOriginFetch};
use crate::preload::{merge_props, PreloadInput};
use crate::response::{fallback_error_page, Failure};
use crate::server_route::HandlerOutcome;
use crate::{App, RequestContext};

/// Handles one request against one application snapshot
///
/// Always produces a response: failures, panics included, end on the error
/// page with their status.
pub async fn dispatch(app: Arc<App>, ctx: RequestContext) -> Response {
    let method = ctx.method.clone();
    let request_path = ctx.path.clone();

    match route(&app, ctx).await {
        Ok(response) => response,
        Err(failure) => {
            if failure.status.is_server_error() {
                error!("{} {} -> {}", method, request_path, failure);
            } else {
                debug!("{} {} -> {}", method, request_path, failure);
            }
            error_response(&app, &failure)
        }
    }
}

async fn route(app: &Arc<App>, ctx: RequestContext) -> Result<Response, Failure> {
    let Some(path) = app.route_path(&ctx.path).map(str::to_string) else {
        return Err(Failure::not_found(&ctx.path));
    };

    match app.classify(&ctx.method, &path) {
        MountKind::ServerRoute => serve_route(app, ctx, &path).await,
        _ => serve_page(app, &ctx, &path).await,
    }
}

async fn serve_page(app: &Arc<App>, ctx: &RequestContext, path: &str) -> Result<Response, Failure> {
    let Some(matched) = app.table().match_path(MountKind::Page, path) else {
        return Err(Failure::not_found(path));
    };

    let source = matched.pattern.source().clone();
    debug!(%source, exact = matched.exact, "page matched {}", path);

    let input = PreloadInput {
        params: matched.params,
        query: ctx.query.as_map().clone(),
        path: path.to_string(),
    };

    let preloaded = match app.preload(&source) {
        Some(preload) => {
            let fetch: Fetcher = Arc::new(SameOriginFetch::for_request(app.clone(), ctx));
            AssertUnwindSafe(preload(input.clone(), fetch))
                .catch_unwind()
                .await
                .map_err(|panic| {
                    Failure::internal(format!(
                        "preload for {} panicked: {}",
                        source,
                        panic_message(panic.as_ref())
                    ))
                })?
                .map_err(|rejected| {
                    warn!(%source, "preload rejected: {}", rejected);
                    Failure::new(rejected.status_code(), rejected.message)
                })?
        }
        None => JsonValue::Null,
    };

    let props = merge_props(&input, preloaded)
        .map_err(|e| Failure::new(e.status_code(), format!("preload for {}: {}", source, e)))?;

    let html = render(app, &source, &props)?;
    Ok(Html(html).into_response())
}

/// Walks every server route matching `path` until one responds
///
/// A candidate without a handler for the request method, or whose handler
/// returns [`HandlerOutcome::Next`], passes the request on. Running out of
/// candidates is a 404.
async fn serve_route(app: &Arc<App>, ctx: RequestContext, path: &str) -> Result<Response, Failure> {
    for candidate in app.table().matches(MountKind::ServerRoute, path) {
        let source = candidate.pattern.source();
        let Some(handler) = app
            .handlers(source)
            .and_then(|set| set.handler_for(&ctx.method))
        else {
            debug!(%source, "no {} handler, trying next match", ctx.method);
            continue;
        };

        let mut request = ctx.clone();
        request.params = candidate.params;

        match AssertUnwindSafe(handler(request)).catch_unwind().await {
            Ok(Ok(HandlerOutcome::Respond(response))) => return Ok(response),
            Ok(Ok(HandlerOutcome::Next)) => {
                debug!(%source, "handler passed, trying next match");
            }
            Ok(Err(e)) => {
                return Err(Failure::internal(format!(
                    "{} handler for {} failed: {:#}",
                    ctx.method, source, e
                )))
            }
            Err(panic) => {
                return Err(Failure::internal(format!(
                    "{} handler for {} panicked: {}",
                    ctx.method,
                    source,
                    panic_message(panic.as_ref())
                )))
            }
        }
    }

    Err(Failure::not_found(path))
}

fn render(app: &App, source: &SourceId, props: &JsonValue) -> Result<String, Failure> {
    let template = app
        .template(source)
        .ok_or_else(|| Failure::internal(format!("no template loaded for {}", source)))?;

    match std::panic::catch_unwind(AssertUnwindSafe(|| app.renderer().render(template, props))) {
        Ok(Ok(html)) => Ok(html),
        Ok(Err(e)) => Err(Failure::internal(format!("render of {} failed: {:#}", source, e))),
        Err(panic) => Err(Failure::internal(format!(
            "render of {} panicked: {}",
            source,
            panic_message(panic.as_ref())
        ))),
    }
}

/// Renders the `_error` page with `{error, status}`, or the built-in page
fn error_response(app: &App, failure: &Failure) -> Response {
    if let Some(pattern) = app.table().error_page() {
        let props = json!({
            "error": failure.message,
            "status": failure.status.as_u16(),
        });
        match render(app, pattern.source(), &props) {
            Ok(html) => return (failure.status, Html(html)).into_response(),
            Err(e) => error!("Error page failed, using built-in page: {}", e),
        }
    }
    fallback_error_page(failure)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
