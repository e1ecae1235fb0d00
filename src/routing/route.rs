//! Routes and the per-method route table.
//!
//! # Responsibilities
//! - Describe a route before registration ([`RouteDef`])
//! - Store registered routes per method in priority order ([`RouteTable`])
//! - Keep the name → template index used for URL generation
//!
//! # Design Decisions
//! - Insertion order is priority; the first matching route wins
//! - Names are unique across all methods
//! - No 405 inference: a path registered only for GET simply does not match POST

use std::collections::BTreeMap;

use crate::handler::Handler;
use crate::middleware::MiddlewareRef;
use crate::routing::pattern::{CompiledPattern, Params};
use crate::routing::{ConfigurationError, Method};

/// A route as written in a route file.
#[derive(Debug, Clone)]
pub struct RouteDef {
    pub(crate) path: String,
    pub(crate) handler: Handler,
    pub(crate) name: Option<String>,
    pub(crate) constraints: BTreeMap<String, String>,
    pub(crate) middleware: Vec<MiddlewareRef>,
}

/// Start a route definition.
pub fn route(path: impl Into<String>, handler: Handler) -> RouteDef {
    RouteDef::new(path, handler)
}

impl RouteDef {
    pub fn new(path: impl Into<String>, handler: Handler) -> Self {
        Self {
            path: path.into(),
            handler,
            name: None,
            constraints: BTreeMap::new(),
            middleware: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restrict `param` to the regex fragment `pattern`.
    pub fn constraint(mut self, param: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.constraints.insert(param.into(), pattern.into());
        self
    }

    /// Route-level middleware, run after any inherited from groups.
    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middleware.push(middleware.into());
        self
    }
}

/// A registered endpoint.
#[derive(Debug, Clone)]
pub struct Route {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) pattern: CompiledPattern,
    pub(crate) handler: Handler,
    pub(crate) middleware: Vec<MiddlewareRef>,
    pub(crate) name: Option<String>,
    pub(crate) constraints: BTreeMap<String, String>,
}

impl Route {
    pub fn method(&self) -> Method {
        self.method
    }

    /// Normalized template, e.g. `/users/{id}`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn middleware(&self) -> &[MiddlewareRef] {
        &self.middleware
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn constraints(&self) -> &BTreeMap<String, String> {
        &self.constraints
    }
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'r> {
    pub route: &'r Route,
    pub params: Params,
}

impl<'r> RouteMatch<'r> {
    pub fn handler(&self) -> &'r Handler {
        &self.route.handler
    }

    pub fn middleware(&self) -> &'r [MiddlewareRef] {
        &self.route.middleware
    }
}

/// Registered routes keyed by method, plus the named-route index.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<Method, Vec<Route>>,
    named: BTreeMap<String, String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route, returning its index within its method's list.
    pub(crate) fn push(&mut self, route: Route) -> Result<usize, ConfigurationError> {
        if let Some(name) = &route.name {
            if self.named.contains_key(name) {
                return Err(ConfigurationError::DuplicateRouteName(name.clone()));
            }
            self.named.insert(name.clone(), route.path.clone());
        }
        let routes = self.routes.entry(route.method).or_default();
        routes.push(route);
        Ok(routes.len() - 1)
    }

    pub(crate) fn get_mut(&mut self, method: Method, index: usize) -> Option<&mut Route> {
        self.routes.get_mut(&method).and_then(|routes| routes.get_mut(index))
    }

    /// Routes for `method` in priority order.
    pub fn routes_for(&self, method: Method) -> &[Route] {
        self.routes.get(&method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All routes, grouped by method in `Method` order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values().flatten()
    }

    /// First route for `method` whose matcher accepts `path`.
    pub fn find(&self, method: Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes_for(method).iter().find_map(|route| {
            route
                .pattern
                .captures(path)
                .map(|params| RouteMatch { route, params })
        })
    }

    /// Template registered under `name`.
    pub fn named_path(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    pub fn route_named(&self, name: &str) -> Option<&Route> {
        self.iter().find(|route| route.name() == Some(name))
    }

    pub fn named(&self) -> &BTreeMap<String, String> {
        &self.named
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(method: Method, path: &str, name: Option<&str>) -> Route {
        Route {
            method,
            path: path.to_string(),
            pattern: CompiledPattern::compile(path, &BTreeMap::new()).unwrap(),
            handler: Handler::action("Pages", path),
            middleware: Vec::new(),
            name: name.map(str::to_string),
            constraints: BTreeMap::new(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = RouteTable::new();
        table.push(make(Method::Get, "/posts/{slug}", None)).unwrap();
        table.push(make(Method::Get, "/posts/latest", None)).unwrap();

        let matched = table.find(Method::Get, "/posts/latest").unwrap();
        assert_eq!(matched.route.path(), "/posts/{slug}");
        assert_eq!(matched.params.get("slug").and_then(|v| v.as_str()), Some("latest"));
    }

    #[test]
    fn test_methods_are_separate() {
        let mut table = RouteTable::new();
        table.push(make(Method::Get, "/about", None)).unwrap();
        assert!(table.find(Method::Get, "/about").is_some());
        assert!(table.find(Method::Post, "/about").is_none());
    }

    #[test]
    fn test_duplicate_name_across_methods() {
        let mut table = RouteTable::new();
        table.push(make(Method::Get, "/home", Some("home"))).unwrap();
        let err = table.push(make(Method::Post, "/homepage", Some("home"))).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateRouteName(name) if name == "home"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.named_path("home"), Some("/home"));
    }
}
