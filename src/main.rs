//! Brick Router demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum: request id, trace, timeout, limits)
//!                        │  session cookie → MemorySessionStore
//!                        ▼
//!                     routing::Router::dispatch
//!                        │  method override, base path, percent-decode
//!                        │  route table (or cache snapshot) → first match
//!                        │  middleware chain: auth / guest / csrf / custom
//!                        ▼
//!                     handler (controller action or closure)
//!     Client Response   │
//!     ◀──────────────────┘  security headers, Set-Cookie
//! ```
//!
//! Usage: `brick-router [config.toml]`

use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;

use brick_router::config::{load_config, AppConfig};
use brick_router::http::HttpServer;
use brick_router::lifecycle::Shutdown;
use brick_router::observability;
use brick_router::routing::RouterSettings;
use brick_router::session::MemorySessionStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => AppConfig::default(),
    };

    observability::logging::init_logging(&config.observability.log_level);

    tracing::info!("brick-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        debug = config.app.debug,
        base_path = %config.app.base_path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let router = brick_router::app::build(RouterSettings::from_config(&config))?;
    match router.save_cache() {
        Ok(true) => tracing::info!(path = %config.cache.path.display(), "Route cache written"),
        Ok(false) => tracing::debug!("Route cache skipped"),
        Err(e) => tracing::warn!(error = %e, "Failed to write route cache"),
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let sessions = MemorySessionStore::from_config(&config.session);
    let server = HttpServer::new(Arc::new(router), sessions, config);
    server.run(listener, shutdown.signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
