// File: src/registry.rs
// Purpose: Code-supplied server routes and page preloads, keyed by source path

use std::future::Future;

use crate::fetch::Fetcher;
use crate::preload::{self, PreloadFn, PreloadInput, PreloadResult};
use crate::server_route::ServerHandlerSet;

/// Everything the routes directory cannot carry as files
///
/// Server routes are named like route files (`api/items/[id].rs`; the
/// extension is optional) and follow the same naming grammar. Preloads are
/// keyed by the source path of the page they feed (`blog/[slug].html`).
/// Entries keep their insertion order, which is the registration order used
/// to break specificity ties.
#[derive(Clone, Default)]
pub struct Registry {
    server_routes: Vec<(String, ServerHandlerSet)>,
    preloads: Vec<(String, PreloadFn)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_route(mut self, source: impl Into<String>, handlers: ServerHandlerSet) -> Self {
        self.server_routes.push((source.into(), handlers));
        self
    }

    pub fn preload<F, Fut>(mut self, page_source: impl Into<String>, preload: F) -> Self
    where
        F: Fn(PreloadInput, Fetcher) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PreloadResult> + Send + 'static,
    {
        self.preloads.push((page_source.into(), preload::boxed(preload)));
        self
    }

    pub fn server_routes(&self) -> &[(String, ServerHandlerSet)] {
        &self.server_routes
    }

    pub fn preloads(&self) -> &[(String, PreloadFn)] {
        &self.preloads
    }
}
