//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that funnels every request into the route table
//! - Wire up middleware (request ID, tracing, timeout, body limit, security headers)
//! - Load or create the session; persist a new one only once it holds state
//! - Bind server to listener and shut down gracefully

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::any,
};
use cookie::{Cookie, SameSite};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::SessionConfig;
use crate::config::AppConfig;
use crate::http::Request;
use crate::routing::Router;
use crate::security::headers::SECURITY_HEADERS;
use crate::session::{MemorySessionStore, SessionData};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into the front controller.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub sessions: MemorySessionStore,
    pub session: SessionConfig,
    pub max_body_size: usize,
}

/// Front controller: an axum server in front of a [`Router`].
pub struct HttpServer {
    app: axum::Router,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(router: Arc<Router>, sessions: MemorySessionStore, config: AppConfig) -> Self {
        let state = AppState {
            router,
            sessions,
            session: config.session.clone(),
            max_body_size: config.security.max_body_size,
        };
        let app = Self::build_router(&config, state);
        Self { app, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> axum::Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        let mut app = axum::Router::new()
            .route("/{*path}", any(front_controller))
            .route("/", any(front_controller))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        if config.security.enable_headers {
            for (name, value) in SECURITY_HEADERS {
                app = app.layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                ));
            }
        }

        app.layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// The configured axum router, for in-process use.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    /// Serve until `shutdown` resolves, typically `Shutdown::signal()`.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            app = %self.config.app.name,
            debug = self.config.app.debug,
            "HTTP server starting"
        );

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Turns one HTTP request into a router dispatch.
async fn front_controller(State(state): State<AppState>, request: axum::extract::Request) -> axum::response::Response {
    let (parts, body) = request.into_parts();
    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let request = Request::from_parts(parts.method, &parts.uri, parts.headers, &body);
    let cookie_id = session_id(request.headers(), &state.session.cookie_name);
    let (id, mut session, created) = state.sessions.load(cookie_id.as_deref());

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
        new_session = created,
        "Dispatching request"
    );

    let response = state.router.dispatch(&request, &mut session);

    // A new session nothing wrote to gets neither an entry nor a cookie.
    let keep = !created || session != SessionData::default();
    if keep {
        state.sessions.save(&id, session);
    }

    let mut response = response.into_axum();
    if created && keep {
        match HeaderValue::from_str(&session_cookie(&state.session, &id)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "Session cookie is not a valid header value"),
        }
    }
    response
}

/// Session id from the request's `Cookie` headers.
pub fn session_id(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == cookie_name)
        .map(|c| c.value().to_string())
}

/// `Set-Cookie` value for a new session.
pub fn session_cookie(config: &SessionConfig, id: &str) -> String {
    Cookie::build((config.cookie_name.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure)
        .build()
        .to_string()
}
