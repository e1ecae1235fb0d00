//! Route cache persistence.
//!
//! # Responsibilities
//! - Snapshot a [`RouteTable`] to a JSON file
//! - Rebuild a table from a snapshot, recompiling matchers and validating
//!   handlers and middleware against the live registries
//!
//! # Design Decisions
//! - Writes go to a temp file in the target directory and are renamed into
//!   place, so readers never see a partial snapshot
//! - No schema version and no source-change check: a present snapshot is
//!   authoritative over registration code
//! - Inline handlers and middleware cannot be serialized; saving a table that
//!   contains them fails instead of silently dropping routes

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::handler::{ActionRef, ControllerRegistry, Handler};
use crate::middleware::{MiddlewareRef, MiddlewareRegistry};
use crate::routing::pattern::CompiledPattern;
use crate::routing::route::{Route, RouteTable};
use crate::routing::{CacheError, ConfigurationError, Method};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRoute {
    pub path: String,
    pub pattern: String,
    pub handler: ActionRef,
    pub middleware: Vec<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
}

/// On-disk form of a route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub routes: BTreeMap<Method, Vec<CachedRoute>>,
    pub named: BTreeMap<String, String>,
    /// Unix seconds at creation.
    pub timestamp: u64,
}

impl CacheSnapshot {
    pub fn from_table(table: &RouteTable) -> Result<Self, CacheError> {
        let mut routes: BTreeMap<Method, Vec<CachedRoute>> = BTreeMap::new();

        for route in table.iter() {
            let uncacheable = |what: &'static str| CacheError::Uncacheable {
                method: route.method(),
                path: route.path().to_string(),
                what,
            };

            let handler = route
                .handler()
                .as_action()
                .cloned()
                .ok_or_else(|| uncacheable("handler"))?;

            let middleware = route
                .middleware()
                .iter()
                .map(|m| m.name().map(str::to_string).ok_or_else(|| uncacheable("middleware")))
                .collect::<Result<Vec<_>, _>>()?;

            routes.entry(route.method()).or_default().push(CachedRoute {
                path: route.path().to_string(),
                pattern: route.pattern().source().to_string(),
                handler,
                middleware,
                name: route.name().map(str::to_string),
                constraints: route.constraints().clone(),
            });
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Ok(Self {
            routes,
            named: table.named().clone(),
            timestamp,
        })
    }

    /// Rebuild a live table. Fails if the snapshot references a controller,
    /// action or middleware the application no longer has.
    pub fn into_table(
        self,
        controllers: &ControllerRegistry,
        middleware: &MiddlewareRegistry,
    ) -> Result<RouteTable, CacheError> {
        let mut table = RouteTable::new();

        for (method, routes) in self.routes {
            for cached in routes {
                controllers.validate(&cached.handler)?;

                let refs: Vec<MiddlewareRef> = cached.middleware.into_iter().map(MiddlewareRef::Named).collect();
                for m in &refs {
                    middleware.validate(m)?;
                }

                let pattern = CompiledPattern::from_source(&cached.pattern).map_err(|source| {
                    ConfigurationError::InvalidPattern {
                        method,
                        path: cached.path.clone(),
                        source,
                    }
                })?;

                table.push(Route {
                    method,
                    path: cached.path,
                    pattern,
                    handler: Handler::Action(cached.handler),
                    middleware: refs,
                    name: cached.name,
                    constraints: cached.constraints,
                })?;
            }
        }

        Ok(table)
    }

    /// Read a snapshot. A missing file is `Ok(None)`.
    pub fn read(path: &Path) -> Result<Option<Self>, CacheError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let snapshot = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(snapshot))
    }

    /// Atomically replace the file at `path` with this snapshot.
    pub fn write(&self, path: &Path) -> Result<(), CacheError> {
        let io_err = |source: std::io::Error| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush().map_err(io_err)?;
        }
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Delete the cache file. Returns whether a file was removed.
    pub fn remove(path: &Path) -> Result<bool, CacheError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
