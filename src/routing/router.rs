//! Route registration, lookup and dispatch.
//!
//! # Responsibilities
//! - Register routes, groups and resources; reject bad definitions early
//! - Match `(method, path)` to a route and its parameters
//! - Run the middleware chain and the handler for a request
//! - Generate URLs from route names
//! - Persist and restore the route table through the route cache
//!
//! # Design Decisions
//! - An explicit value, not a process-wide singleton; `reset()` gives tests a
//!   clean table without rebuilding registries
//! - Registration takes `&mut self`, dispatch takes `&self`: once registration
//!   is over the router is shared immutably behind an `Arc`
//! - The cache snapshot is loaded lazily, once, on first lookup. When present
//!   it replaces the registered table entirely, even if stale
//! - One catch boundary: handler errors and panics become a 500 here and
//!   nowhere else

use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use axum::http::StatusCode;
use percent_encoding::percent_decode_str;

use crate::config::AppConfig;
use crate::handler::{Controller, ControllerRegistry, Handler, RequestContext};
use crate::http::response::escape_html;
use crate::http::{Request, Response};
use crate::middleware::{Middleware, MiddlewareRef, MiddlewareRegistry, Outcome};
use crate::observability::metrics;
use crate::routing::cache::CacheSnapshot;
use crate::routing::group::{GroupOptions, GroupStack};
use crate::routing::pattern::{normalize_path, template_placeholders, CompiledPattern};
use crate::routing::route::{Route, RouteDef, RouteMatch, RouteTable};
use crate::routing::{CacheError, ConfigurationError, Method, UrlError};
use crate::session::Session;

/// Knobs the router reads at construction.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Debug mode: detailed 500 pages, route cache disabled.
    pub debug: bool,
    /// Prefix stripped from request paths before matching.
    pub base_path: String,
    pub cache_path: PathBuf,
    pub not_found_page: Option<PathBuf>,
    pub login_redirect: String,
    pub home_redirect: String,
    pub csrf_field: String,
    pub csrf_header: String,
    /// Random bytes in tokens generated for new sessions.
    pub csrf_token_bytes: usize,
}

impl RouterSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            debug: config.app.debug,
            base_path: config.app.base_path.clone(),
            cache_path: config.cache.path.clone(),
            not_found_page: config.app.not_found_page.clone(),
            login_redirect: config.auth.login_redirect.clone(),
            home_redirect: config.auth.home_redirect.clone(),
            csrf_field: config.csrf.field_name.clone(),
            csrf_header: config.csrf.header_name.clone(),
            csrf_token_bytes: config.csrf.token_bytes,
        }
    }

    /// Development settings: debug on, so the cache is never touched.
    pub fn development() -> Self {
        Self {
            debug: true,
            ..Self::default()
        }
    }
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

pub struct Router {
    settings: RouterSettings,
    table: RouteTable,
    groups: GroupStack,
    last_route: Option<(Method, usize)>,
    controllers: ControllerRegistry,
    middleware: MiddlewareRegistry,
    cached: OnceLock<Option<RouteTable>>,
}

impl Router {
    pub fn new(settings: RouterSettings) -> Self {
        let middleware = MiddlewareRegistry::with_builtins(
            &settings.login_redirect,
            &settings.home_redirect,
            &settings.csrf_field,
            &settings.csrf_header,
        );
        Self {
            settings,
            table: RouteTable::new(),
            groups: GroupStack::default(),
            last_route: None,
            controllers: ControllerRegistry::new(),
            middleware,
            cached: OnceLock::new(),
        }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn cache_enabled(&self) -> bool {
        !self.settings.debug
    }

    pub fn register_controller(
        &mut self,
        key: impl Into<String>,
        controller: impl Controller + 'static,
    ) -> &mut Self {
        self.controllers.register(key, Arc::new(controller));
        self
    }

    /// Add a named middleware, or replace a built-in.
    pub fn register_middleware(
        &mut self,
        name: impl Into<String>,
        middleware: impl Middleware + 'static,
    ) -> &mut Self {
        self.middleware.register(name, Arc::new(middleware));
        self
    }

    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    pub fn middleware_registry(&self) -> &MiddlewareRegistry {
        &self.middleware
    }

    // Registration

    pub fn get(&mut self, def: RouteDef) -> Result<&mut Self, ConfigurationError> {
        self.add(Method::Get, def)
    }

    pub fn post(&mut self, def: RouteDef) -> Result<&mut Self, ConfigurationError> {
        self.add(Method::Post, def)
    }

    pub fn put(&mut self, def: RouteDef) -> Result<&mut Self, ConfigurationError> {
        self.add(Method::Put, def)
    }

    pub fn patch(&mut self, def: RouteDef) -> Result<&mut Self, ConfigurationError> {
        self.add(Method::Patch, def)
    }

    pub fn delete(&mut self, def: RouteDef) -> Result<&mut Self, ConfigurationError> {
        self.add(Method::Delete, def)
    }

    pub fn options(&mut self, def: RouteDef) -> Result<&mut Self, ConfigurationError> {
        self.add(Method::Options, def)
    }

    /// Register `def` for GET and POST. The POST route is named `<name>.post`.
    pub fn any(&mut self, def: RouteDef) -> Result<&mut Self, ConfigurationError> {
        let mut post = def.clone();
        post.name = post.name.map(|name| format!("{name}.post"));
        self.add(Method::Get, def)?;
        self.add(Method::Post, post)
    }

    /// Register a route for `method`.
    pub fn add(&mut self, method: Method, def: RouteDef) -> Result<&mut Self, ConfigurationError> {
        let RouteDef {
            path,
            handler,
            name,
            constraints,
            middleware: own_middleware,
        } = def;

        if let Handler::Action(action) = &handler {
            self.controllers.validate(action)?;
        }
        for m in &own_middleware {
            self.middleware.validate(m)?;
        }

        let full_path = normalize_path(self.groups.prefixes().chain(std::iter::once(path.as_str())));
        let pattern = CompiledPattern::compile(&full_path, &constraints).map_err(|source| {
            ConfigurationError::InvalidPattern {
                method,
                path: full_path.clone(),
                source,
            }
        })?;

        let mut middleware = self.groups.middleware();
        middleware.extend(own_middleware);

        let route = Route {
            method,
            path: full_path,
            pattern,
            handler,
            middleware,
            name: name.filter(|n| !n.is_empty()),
            constraints,
        };

        tracing::debug!(
            method = %method,
            path = %route.path,
            name = ?route.name,
            handler = %route.handler,
            "Route registered"
        );

        let index = self.table.push(route)?;
        self.last_route = Some((method, index));
        Ok(self)
    }

    /// Register routes under a shared prefix and middleware list.
    ///
    /// The group frame is popped on every exit path, including an error or
    /// panic from `routes`.
    pub fn group<F>(&mut self, options: GroupOptions, routes: F) -> Result<&mut Self, ConfigurationError>
    where
        F: FnOnce(&mut Router) -> Result<(), ConfigurationError>,
    {
        for m in &options.middleware {
            self.middleware.validate(m)?;
        }

        self.groups.push(options);
        let result = panic::catch_unwind(AssertUnwindSafe(|| routes(&mut *self)));
        self.groups.pop();

        match result {
            Ok(outcome) => outcome.map(|()| self),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Append middleware to the most recently registered route.
    pub fn middleware(&mut self, middleware: impl Into<MiddlewareRef>) -> Result<&mut Self, ConfigurationError> {
        let middleware = middleware.into();
        self.middleware.validate(&middleware)?;

        let (method, index) = self.last_route.ok_or(ConfigurationError::NoRouteForMiddleware)?;
        let route = self
            .table
            .get_mut(method, index)
            .ok_or(ConfigurationError::NoRouteForMiddleware)?;
        route.middleware.push(middleware);
        Ok(self)
    }

    /// Register the seven REST routes for `name`, handled by `controller`.
    pub fn resource(&mut self, name: &str, controller: &str) -> Result<&mut Self, ConfigurationError> {
        let base = normalize_path([name]);
        let prefix = base.trim_start_matches('/').replace('/', ".");

        const ACTIONS: [(Method, &str, &str); 7] = [
            (Method::Get, "", "index"),
            (Method::Get, "/create", "create"),
            (Method::Post, "", "store"),
            (Method::Get, "/{id}", "show"),
            (Method::Get, "/{id}/edit", "edit"),
            (Method::Put, "/{id}", "update"),
            (Method::Delete, "/{id}", "destroy"),
        ];

        for (method, suffix, action) in ACTIONS {
            let def = RouteDef::new(format!("{base}{suffix}"), Handler::action(controller, action))
                .name(format!("{prefix}.{action}"));
            self.add(method, def)?;
        }
        Ok(self)
    }

    /// Forget every route, name, group frame and loaded cache snapshot.
    /// Controllers and middleware stay registered.
    pub fn reset(&mut self) {
        self.table = RouteTable::new();
        self.groups.clear();
        self.last_route = None;
        self.cached = OnceLock::new();
    }

    // Lookup

    /// The table requests are served from: the cache snapshot if one was
    /// loaded, otherwise the registered routes.
    pub fn routes(&self) -> &RouteTable {
        self.cached
            .get_or_init(|| self.read_cache_lazily())
            .as_ref()
            .unwrap_or(&self.table)
    }

    /// Routes added through registration calls, ignoring any cache.
    pub fn registered_routes(&self) -> &RouteTable {
        &self.table
    }

    pub fn match_route(&self, method: Method, path: &str) -> Option<RouteMatch<'_>> {
        let matched = self.routes().find(method, path)?;
        tracing::debug!(method = %method, path = %path, route = %matched.route.path, "Route matched");
        Some(matched)
    }

    /// Build the path for the route named `name`.
    ///
    /// Every `{placeholder}` in the template must be supplied; values are
    /// substituted as text and not checked against the route's constraints.
    pub fn url(&self, name: &str, params: &[(&str, &dyn fmt::Display)]) -> Result<String, UrlError> {
        let template = self
            .routes()
            .named_path(name)
            .ok_or_else(|| UrlError::RouteNotFound(name.to_string()))?;

        let mut url = template.to_string();
        for placeholder in template_placeholders(template) {
            let value = params
                .iter()
                .find(|(key, _)| *key == placeholder)
                .map(|(_, value)| value.to_string())
                .ok_or_else(|| UrlError::MissingParameter {
                    route: name.to_string(),
                    param: placeholder.to_string(),
                })?;
            url = url.replace(&format!("{{{placeholder}}}"), &value);
        }
        Ok(url)
    }

    /// Whether `path` is served by the route named `name`.
    pub fn is_current_route(&self, name: &str, path: &str) -> bool {
        let path = normalize_path([path]);
        self.routes()
            .route_named(name)
            .map(|route| route.pattern.is_match(&path))
            .unwrap_or(false)
    }

    // Dispatch

    /// Serve one request.
    pub fn dispatch(&self, request: &Request, session: &mut dyn Session) -> Response {
        let started = Instant::now();
        let path = self.request_path(request.path());
        let method = self.effective_method(request);

        let matched = method.and_then(|m| self.match_route(m, &path).map(|matched| (m, matched)));

        let (response, route_label) = match matched {
            Some((method, matched)) => {
                let label = matched.route.path.clone();
                (self.run(method, request, session, matched), label)
            }
            None => {
                tracing::warn!(
                    method = %request.method(),
                    path = %path,
                    "No route matched"
                );
                (self.not_found(), "none".to_string())
            }
        };

        let method_label = method.map(|m| m.as_str()).unwrap_or("UNKNOWN");
        metrics::record_request(method_label, response.status().as_u16(), &route_label, started);
        response
    }

    fn run(&self, method: Method, request: &Request, session: &mut dyn Session, matched: RouteMatch<'_>) -> Response {
        let RouteMatch { route, params } = matched;
        let args = params.values();
        let mut ctx = RequestContext {
            request,
            session,
            router: self,
            params: &params,
            method,
        };

        for m in route.middleware() {
            let Some(middleware) = self.middleware.resolve(m) else {
                return self.failure(route, &format!("middleware '{m}' is not registered"), &[]);
            };
            if let Outcome::Respond(response) = middleware.handle(&mut ctx) {
                tracing::debug!(
                    route = %route.path,
                    middleware = %m,
                    status = response.status().as_u16(),
                    "Middleware short-circuited"
                );
                return response;
            }
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            route.handler.invoke(&self.controllers, &mut ctx, &args)
        }));

        match result {
            Ok(Ok(reply)) => reply.into_response(),
            Ok(Err(err)) => {
                let mut chain = Vec::new();
                let mut source = err.source();
                while let Some(cause) = source {
                    chain.push(cause.to_string());
                    source = cause.source();
                }
                self.failure(route, &err.to_string(), &chain)
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                self.failure(route, &message, &[])
            }
        }
    }

    fn failure(&self, route: &Route, message: &str, chain: &[String]) -> Response {
        tracing::error!(
            method = %route.method,
            route = %route.path,
            handler = %route.handler,
            error = %message,
            "Handler failed"
        );

        if !self.settings.debug {
            return Response::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }

        let mut body = format!("<h1>Error: {}</h1>", escape_html(message));
        if !chain.is_empty() {
            body.push_str("<h2>Caused by</h2><ol>");
            for cause in chain {
                body.push_str(&format!("<li>{}</li>", escape_html(cause)));
            }
            body.push_str("</ol>");
        }
        body.push_str(&format!(
            "<p>Route: {} {} ({})</p>",
            route.method,
            escape_html(&route.path),
            escape_html(&route.handler.to_string())
        ));
        Response::html(body).with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn not_found(&self) -> Response {
        if let Some(page) = &self.settings.not_found_page {
            if let Ok(content) = fs::read_to_string(page) {
                return Response::html(content).with_status(StatusCode::NOT_FOUND);
            }
        }
        Response::not_found()
    }

    /// Declared method, or the override for POST requests. `None` when the
    /// result is outside the supported set.
    fn effective_method(&self, request: &Request) -> Option<Method> {
        match request.method_override() {
            Some(overridden) => overridden.parse().ok(),
            None => Method::try_from(request.method()).ok(),
        }
    }

    /// Strip the base path and percent-decode.
    fn request_path(&self, raw: &str) -> String {
        let base = self.settings.base_path.trim_end_matches('/');
        let mut path = raw;
        if !base.is_empty() {
            if let Some(rest) = raw.strip_prefix(base) {
                if rest.is_empty() || rest.starts_with('/') {
                    path = rest;
                }
            }
        }

        let decoded = percent_decode_str(path).decode_utf8_lossy();
        if decoded.is_empty() {
            "/".to_string()
        } else {
            decoded.into_owned()
        }
    }

    // Cache

    fn read_cache_lazily(&self) -> Option<RouteTable> {
        if !self.cache_enabled() {
            return None;
        }

        let path = &self.settings.cache_path;
        let loaded = CacheSnapshot::read(path)
            .and_then(|snapshot| snapshot.map(|s| s.into_table(&self.controllers, &self.middleware)).transpose());

        match loaded {
            Ok(Some(table)) => {
                tracing::info!(path = %path.display(), routes = table.len(), "Route cache loaded");
                metrics::record_cache_load("hit");
                Some(table)
            }
            Ok(None) => {
                metrics::record_cache_load("miss");
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unusable route cache");
                metrics::record_cache_load("error");
                None
            }
        }
    }

    /// Write the registered routes to the cache file.
    ///
    /// Returns `Ok(false)` without touching the disk in debug mode.
    pub fn save_cache(&self) -> Result<bool, CacheError> {
        if !self.cache_enabled() {
            tracing::debug!("Route cache disabled in debug mode, not saving");
            return Ok(false);
        }

        let snapshot = CacheSnapshot::from_table(&self.table)?;
        snapshot.write(&self.settings.cache_path)?;
        tracing::info!(
            path = %self.settings.cache_path.display(),
            routes = self.table.len(),
            "Route cache saved"
        );
        Ok(true)
    }

    /// Load the cache file now, replacing the active table if it exists.
    ///
    /// Returns whether a snapshot was loaded. Unlike the lazy load on first
    /// lookup, a malformed cache is reported as an error.
    pub fn load_cache(&mut self) -> Result<bool, CacheError> {
        if !self.cache_enabled() {
            return Ok(false);
        }

        match CacheSnapshot::read(&self.settings.cache_path)? {
            Some(snapshot) => {
                let table = snapshot.into_table(&self.controllers, &self.middleware)?;
                tracing::info!(
                    path = %self.settings.cache_path.display(),
                    routes = table.len(),
                    "Route cache loaded"
                );
                self.cached = OnceLock::from(Some(table));
                Ok(true)
            }
            None => {
                self.cached = OnceLock::from(None);
                Ok(false)
            }
        }
    }

    /// Delete the cache file and forget any loaded snapshot.
    pub fn clear_cache(&mut self) -> Result<(), CacheError> {
        let removed = CacheSnapshot::remove(&self.settings.cache_path)?;
        self.cached = OnceLock::new();
        tracing::info!(path = %self.settings.cache_path.display(), removed, "Route cache cleared");
        Ok(())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("settings", &self.settings)
            .field("routes", &self.table.len())
            .field("cache_loaded", &self.cached.get().map(Option::is_some))
            .finish()
    }
}
