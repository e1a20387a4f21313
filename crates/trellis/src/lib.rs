// Trellis - file-path routed pages and server routes on axum
// Pages come from the routes directory, server routes and preloads from a Registry

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod fetch;
pub mod preload;
pub mod registry;
pub mod renderer;
pub mod request_context;
pub mod response;
pub mod route_loader;
pub mod serve;
pub mod server_route;

// Re-export framework types
pub use app::{App, SharedApp};
pub use config::Config;
pub use dispatcher::dispatch;
pub use fetch::{Fetch, FetchResponse, Fetcher, SameOriginFetch};
pub use preload::{PreloadError, PreloadInput, PreloadResult};
pub use registry::Registry;
pub use renderer::{Render, Renderer, Template};
pub use request_context::{QueryParams, RequestContext};
pub use response::Failure;
pub use route_loader::RouteLoader;
pub use serve::{router, serve};
pub use server_route::{BoxFuture, HandlerFn, HandlerMethod, HandlerOutcome, ServerHandlerSet};

// Re-export the router crate and commonly used dependencies
pub use trellis_router::{self as routing, MountKind, ParamBindings, RouteError, RouteTable};
pub use axum;
pub use axum::http::StatusCode;
