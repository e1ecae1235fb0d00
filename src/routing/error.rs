//! Error types for route registration, URL generation and the route cache.

use std::path::PathBuf;

use crate::routing::Method;

/// Fatal mistakes in the route definitions.
///
/// Raised synchronously while routes are registered; the application is
/// expected to abort startup rather than recover.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("route name '{0}' is already in use")]
    DuplicateRouteName(String),

    #[error("unknown middleware '{0}'")]
    UnknownMiddleware(String),

    #[error("malformed handler '{0}', expected 'Controller@action'")]
    MalformedHandler(String),

    #[error("controller '{0}' is not registered")]
    UnknownController(String),

    #[error("controller '{controller}' has no action '{action}'")]
    UnknownAction { controller: String, action: String },

    #[error("invalid pattern for {method} {path}: {source}")]
    InvalidPattern {
        method: Method,
        path: String,
        #[source]
        source: regex::Error,
    },

    #[error("no route has been registered to attach middleware to")]
    NoRouteForMiddleware,
}

/// Errors from reverse routing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("route '{0}' not found")]
    RouteNotFound(String),

    #[error("missing parameter '{param}' for route '{route}'")]
    MissingParameter { route: String, param: String },
}

/// Errors from reading or writing the route cache file.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("route cache I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("route cache is not valid JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{method} {path} uses an inline {what} and cannot be cached")]
    Uncacheable {
        method: Method,
        path: String,
        what: &'static str,
    },

    #[error("route cache does not match the registered application: {0}")]
    Invalid(#[from] ConfigurationError),
}
