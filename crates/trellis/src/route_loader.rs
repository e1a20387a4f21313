// File: src/route_loader.rs
// Purpose: Scans the routes directory into page templates and helper partials

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use trellis_router::route::pattern::PAGE_EXTENSIONS;
use trellis_router::{MountKind, RouteTable, SourceId};
use walkdir::WalkDir;

use crate::renderer::Template;

/// Result of one directory scan
#[derive(Debug, Default)]
pub struct LoadedRoutes {
    /// Page and error-page templates by source
    pub templates: HashMap<SourceId, Template>,
    /// Helper files under `_`-prefixed names, by relative path
    pub partials: HashMap<String, String>,
}

/// Reads page definitions from a routes directory
#[derive(Debug, Clone)]
pub struct RouteLoader {
    routes_dir: PathBuf,
}

impl RouteLoader {
    pub fn new(routes_dir: impl Into<PathBuf>) -> Self {
        Self {
            routes_dir: routes_dir.into(),
        }
    }

    pub fn routes_dir(&self) -> &Path {
        &self.routes_dir
    }

    /// Registers every page under the routes directory into `table`
    ///
    /// Files are visited in sorted order so registration order (and with it
    /// tie-breaking) does not depend on the file system. A missing directory
    /// loads nothing.
    pub fn load_into(&self, table: &mut RouteTable) -> Result<LoadedRoutes> {
        let mut loaded = LoadedRoutes::default();

        if !self.routes_dir.exists() {
            warn!("Routes directory {:?} does not exist", self.routes_dir);
            return Ok(loaded);
        }

        for entry in WalkDir::new(&self.routes_dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to scan {:?}", self.routes_dir))?;
            if !entry.file_type().is_file() || !is_page_file(entry.path()) {
                continue;
            }
            self.load_file(entry.path(), table, &mut loaded)?;
        }

        info!(
            "Loaded {} templates and {} partials from {:?}",
            loaded.templates.len(),
            loaded.partials.len(),
            self.routes_dir
        );
        Ok(loaded)
    }

    fn load_file(&self, path: &Path, table: &mut RouteTable, loaded: &mut LoadedRoutes) -> Result<()> {
        let relative = self.relative_source(path)?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read template: {:?}", path))?;

        let kind = table
            .register_source(&relative)
            .with_context(|| format!("Failed to register route for {:?}", path))?;

        match kind {
            Some(kind @ (MountKind::Page | MountKind::ErrorPage)) => {
                debug!("{:?} {} -> {:?}", kind, relative, path);
                let source = SourceId::new(&relative);
                loaded.templates.insert(
                    source.clone(),
                    Template {
                        source,
                        path: path.to_path_buf(),
                        content,
                    },
                );
            }
            Some(MountKind::ServerRoute) => {}
            None => {
                debug!("Partial {}", relative);
                loaded.partials.insert(relative, content);
            }
        }

        Ok(())
    }

    /// Path relative to the routes directory, `/`-separated
    fn relative_source(&self, path: &Path) -> Result<String> {
        let relative = path
            .strip_prefix(&self.routes_dir)
            .with_context(|| format!("{:?} is outside {:?}", path, self.routes_dir))?;

        Ok(relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }
}

fn is_page_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| PAGE_EXTENSIONS.contains(&ext))
}
