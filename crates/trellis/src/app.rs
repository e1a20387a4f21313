// File: src/app.rs
// Purpose: Immutable application snapshot and its atomically swapped holder

use anyhow::{bail, Context, Result};
use arc_swap::ArcSwap;
use axum::http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use trellis_router::route::{is_error_page, tokenize};
use trellis_router::{normalize_path, strip_base_path, MountKind, RouteTable, SourceId};

use crate::config::{Config, RoutingConfig};
use crate::preload::PreloadFn;
use crate::renderer::{Render, Renderer, Template};
use crate::route_loader::RouteLoader;
use crate::server_route::ServerHandlerSet;
use crate::Registry;

/// Everything a request needs, built once and then only read
pub struct App {
    table: RouteTable,
    templates: HashMap<SourceId, Template>,
    preloads: HashMap<SourceId, PreloadFn>,
    handlers: HashMap<SourceId, ServerHandlerSet>,
    renderer: Arc<dyn Render>,
    routing: RoutingConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("table", &self.table)
            .field("preloads", &self.preloads.len())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl App {
    /// Scans the routes directory, registers the registry's entries and
    /// finalizes the table
    ///
    /// Any naming error or collision fails the whole build.
    pub fn build(config: &Config, registry: &Registry) -> Result<Self> {
        let routing = config.routing.clone();
        let mut table = RouteTable::new().with_case_insensitive(routing.case_insensitive);

        let loaded = RouteLoader::new(&routing.routes_dir).load_into(&mut table)?;

        let mut handlers = HashMap::new();
        for (source, set) in registry.server_routes() {
            let segments = tokenize(source)
                .with_context(|| format!("Invalid server route name {:?}", source))?;
            if is_error_page(&segments) {
                bail!("Server route {:?} cannot be the error page", source);
            }

            let mounted = table
                .register_source_as(source, MountKind::ServerRoute)
                .with_context(|| format!("Failed to register server route {:?}", source))?;
            if mounted.is_none() {
                warn!("Server route {} is under an ignored segment and is never reachable", source);
                continue;
            }

            debug!("Server route {} [{}]", source, set.tokens().join(", "));
            handlers.insert(SourceId::new(source), set.clone());
        }

        let error_source = table.error_page().map(|p| p.source().clone());
        let mut preloads = HashMap::new();
        for (source, preload) in registry.preloads() {
            let id = SourceId::new(source);
            if !loaded.templates.contains_key(&id) || error_source.as_ref() == Some(&id) {
                warn!("Preload registered for {} but no such page exists", source);
                continue;
            }
            if preloads.insert(id, preload.clone()).is_some() {
                bail!("Preload for {:?} registered twice", source);
            }
        }

        table.finalize();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.preload.fetch_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        info!(
            "Route table ready: {} pages, {} server routes, error page: {}",
            table.patterns(MountKind::Page).len(),
            table.patterns(MountKind::ServerRoute).len(),
            error_source.as_ref().map_or("built-in", SourceId::as_str)
        );

        Ok(Self {
            table,
            templates: loaded.templates,
            preloads,
            handlers,
            renderer: Arc::new(Renderer::with_partials(loaded.partials)),
            routing,
            http,
        })
    }

    /// Replaces the default renderer (functional builder)
    pub fn with_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn template(&self, source: &SourceId) -> Option<&Template> {
        self.templates.get(source)
    }

    pub fn preload(&self, source: &SourceId) -> Option<&PreloadFn> {
        self.preloads.get(source)
    }

    pub fn handlers(&self, source: &SourceId) -> Option<&ServerHandlerSet> {
        self.handlers.get(source)
    }

    pub fn renderer(&self) -> &dyn Render {
        self.renderer.as_ref()
    }

    pub fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Strips the configured base path; `None` when the path lies outside it
    pub fn route_path<'a>(&self, request_path: &'a str) -> Option<&'a str> {
        match &self.routing.base_path {
            Some(base) => strip_base_path(request_path, base),
            None => Some(request_path),
        }
    }

    /// Which namespace serves a request
    ///
    /// Anything but GET/HEAD, anything under an API prefix, and anything whose
    /// last segment carries an API suffix goes to server routes; the rest is
    /// page navigation. The path is normalized first, and compared without
    /// case when routing is case-insensitive.
    pub fn classify(&self, method: &Method, path: &str) -> MountKind {
        if *method != Method::GET && *method != Method::HEAD {
            return MountKind::ServerRoute;
        }

        let fold = |s: &str| -> String {
            if self.routing.case_insensitive {
                s.to_ascii_lowercase()
            } else {
                s.to_string()
            }
        };
        let path = fold(&normalize_path(path));

        let under_prefix = self
            .routing
            .api_prefixes
            .iter()
            .any(|prefix| strip_base_path(&path, &fold(prefix)).is_some());

        let last = path.rsplit('/').next().unwrap_or("");
        let has_suffix = self
            .routing
            .api_suffixes
            .iter()
            .any(|suffix| !suffix.is_empty() && last.ends_with(&fold(suffix)));

        if under_prefix || has_suffix {
            MountKind::ServerRoute
        } else {
            MountKind::Page
        }
    }
}

/// Current [`App`] snapshot behind an atomic pointer
///
/// Requests take one snapshot with [`load`](Self::load) and keep it until they
/// finish; [`reload`](Self::reload) builds a fresh app and swaps it in only
/// when the build succeeds.
pub struct SharedApp {
    current: ArcSwap<App>,
    config: Config,
    registry: Registry,
}

impl std::fmt::Debug for SharedApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedApp")
            .field("current", &self.current.load())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SharedApp {
    pub fn new(config: Config, registry: Registry) -> Result<Self> {
        let app = App::build(&config, &registry)?;
        Ok(Self {
            current: ArcSwap::from_pointee(app),
            config,
            registry,
        })
    }

    pub fn load(&self) -> Arc<App> {
        self.current.load_full()
    }

    /// Rebuilds from disk; on failure the previous snapshot stays live
    pub fn reload(&self) -> Result<()> {
        let app = App::build(&self.config, &self.registry).context("Reload failed")?;
        self.current.store(Arc::new(app));
        info!("Route table reloaded");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn app(base_path: Option<&str>) -> App {
        let mut config = Config::default();
        config.routing.routes_dir = "no/such/dir".into();
        config.routing.base_path = base_path.map(String::from);
        App::build(&config, &Registry::new()).unwrap()
    }

    #[rstest]
    #[case(Method::GET, "/blog/post", MountKind::Page)]
    #[case(Method::HEAD, "/", MountKind::Page)]
    #[case(Method::POST, "/blog/post", MountKind::ServerRoute)]
    #[case(Method::DELETE, "/items/1", MountKind::ServerRoute)]
    #[case(Method::GET, "/api", MountKind::ServerRoute)]
    #[case(Method::GET, "/api/items", MountKind::ServerRoute)]
    #[case(Method::GET, "/apiary", MountKind::Page)]
    #[case(Method::GET, "/feed.json", MountKind::ServerRoute)]
    #[case(Method::GET, "//api/posts", MountKind::ServerRoute)]
    #[case(Method::GET, "/feed.json/", MountKind::ServerRoute)]
    #[case(Method::GET, "/API/x", MountKind::Page)]
    fn test_classify(#[case] method: Method, #[case] path: &str, #[case] expected: MountKind) {
        assert_eq!(app(None).classify(&method, path), expected);
    }

    #[rstest]
    #[case("/API/x", MountKind::ServerRoute)]
    #[case("/Feed.JSON", MountKind::ServerRoute)]
    #[case("/about", MountKind::Page)]
    fn test_classify_case_insensitive(#[case] path: &str, #[case] expected: MountKind) {
        let mut config = Config::default();
        config.routing.routes_dir = "no/such/dir".into();
        config.routing.case_insensitive = true;
        let app = App::build(&config, &Registry::new()).unwrap();
        assert_eq!(app.classify(&Method::GET, path), expected);
    }

    #[test]
    fn test_route_path() {
        let app = app(Some("/app"));
        assert_eq!(app.route_path("/app/blog"), Some("/blog"));
        assert_eq!(app.route_path("/blog"), None);
    }

    #[test]
    fn test_server_route_cannot_be_error_page() {
        let mut config = Config::default();
        config.routing.routes_dir = "no/such/dir".into();
        let registry = Registry::new().server_route("_error.rs", ServerHandlerSet::new());
        assert!(App::build(&config, &registry).is_err());
    }
}
