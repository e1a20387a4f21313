//! # Trellis Router
//!
//! File-path-driven route compilation and matching:
//! - Static segments (`about.html` → `/about`)
//! - Dynamic parameters (`users/[id].html` → `/users/[id]`)
//! - Constrained parameters (`items/[id([0-9]+)].html`)
//! - Index collapsing (`blog/index.html` → `/blog`)
//! - Ignored helper subtrees (`_partials/...`) and a single `_error` page
//!
//! Source paths are tokenized into classified segments, compiled into
//! matcher sequences with a specificity score, and registered in a
//! [`RouteTable`] that keeps pages and server routes in separate namespaces.
//! After [`RouteTable::finalize`] the table is read-only; matching walks each
//! namespace in specificity order and the first match wins.
//!
//! ## Path Normalization
//!
//! Request paths are normalized before matching:
//! - Trailing slashes: `/path/` → `/path`
//! - Double slashes: `/path//to` → `/path/to`
//! - Backslashes: `\path\to` → `/path/to`
//! - Percent-encoded segments are decoded before comparison and binding
//!
//! ## Example
//!
//! ```
//! use trellis_router::{MountKind, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.register_source("about.html").unwrap();
//! table.register_source("[page].html").unwrap();
//! table.register_source("settings/[submenu].html").unwrap();
//! table.finalize();
//!
//! let m = table.match_path(MountKind::Page, "/about").unwrap();
//! assert_eq!(m.pattern.source().as_str(), "about.html");
//!
//! let m = table.match_path(MountKind::Page, "/settings/profile").unwrap();
//! assert_eq!(m.params.get("submenu"), Some(&"profile".to_string()));
//! ```

mod constraint;
mod error;
mod matcher;
pub mod path;
pub mod route;
mod table;

pub use constraint::{ParameterConstraint, FORBIDDEN_CONSTRAINT_CHARS};
pub use error::RouteError;
pub use matcher::{Matches, ParamBindings, RouteMatch};
pub use path::{encode_segment, is_valid_path, normalize_path, request_segments, strip_base_path};
pub use route::{compile, tokenize, Matcher, RoutePattern, Segment, SegmentKind, SourceId};
pub use table::MountKind;
pub use table::RouteTable;
