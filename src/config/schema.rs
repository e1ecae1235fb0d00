//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! application. All types derive Serde traits for deserialization from
//! config files, and every section can be omitted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::security::csrf::{DEFAULT_FIELD_NAME, DEFAULT_HEADER_NAME, DEFAULT_TOKEN_BYTES};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Application identity and mode.
    pub app: ApplicationConfig,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Route cache location.
    pub cache: CacheConfig,

    /// Redirect targets for the `auth` and `guest` middleware.
    pub auth: AuthConfig,

    pub csrf: CsrfConfig,

    pub session: SessionConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: String,

    /// Debug mode: detailed error pages and no route cache.
    pub debug: bool,

    /// Sub-directory the application is mounted under, e.g. `/blog`.
    pub base_path: String,

    /// HTML file served for unmatched requests.
    pub not_found_page: Option<PathBuf>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "BrickRouter".to_string(),
            debug: false,
            base_path: String::new(),
            not_found_page: None,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Route cache file. Only used outside debug mode.
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("storage/cache/routes.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Where `auth` sends anonymous visitors.
    pub login_redirect: String,
    /// Where `guest` sends logged-in visitors.
    pub home_redirect: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_redirect: "/login".to_string(),
            home_redirect: "/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Form field carrying the token.
    pub field_name: String,
    /// Header carrying the token for AJAX clients.
    pub header_name: String,
    /// Random bytes per token (hex doubles the length).
    pub token_bytes: usize,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            field_name: DEFAULT_FIELD_NAME.to_string(),
            header_name: DEFAULT_HEADER_NAME.to_string(),
            token_bytes: DEFAULT_TOKEN_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Mark the cookie `Secure`.
    pub secure: bool,
    /// Sessions unseen for this long are discarded.
    pub idle_timeout_secs: u64,
    /// Upper bound on stored sessions.
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "brick_session".to_string(),
            secure: false,
            idle_timeout_secs: 30 * 60,
            max_sessions: 10_000,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "brick_router=debug,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
