//! Route middleware.
//!
//! # Responsibilities
//! - Define the [`Middleware`] contract: inspect the request, then continue
//!   or short-circuit with a response
//! - Hold the named registry (`auth`, `guest`, `csrf` plus user additions)
//! - Validate middleware references when routes are registered
//!
//! # Design Decisions
//! - Middleware is resolved by name at registration; an unknown name is a
//!   configuration error, never a silent pass-through
//! - Chains run in order: group frames outermost first, then the route's own,
//!   then anything appended with `Router::middleware`

pub mod auth;
pub mod csrf;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::handler::RequestContext;
use crate::http::Response;
use crate::routing::ConfigurationError;

pub use auth::{AuthMiddleware, GuestMiddleware};
pub use csrf::CsrfMiddleware;

/// Result of running one middleware.
#[derive(Debug)]
pub enum Outcome {
    Continue,
    Respond(Response),
}

pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: &mut RequestContext<'_>) -> Outcome;
}

/// Middleware built from a closure. See [`from_fn`].
pub struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut RequestContext<'_>) -> Outcome + Send + Sync,
{
    fn handle(&self, ctx: &mut RequestContext<'_>) -> Outcome {
        (self.0)(ctx)
    }
}

pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(&mut RequestContext<'_>) -> Outcome + Send + Sync,
{
    FnMiddleware(f)
}

/// A middleware attached to a route or group.
#[derive(Clone)]
pub enum MiddlewareRef {
    Named(String),
    Inline(Arc<dyn Middleware>),
}

impl MiddlewareRef {
    pub fn inline(middleware: impl Middleware + 'static) -> Self {
        MiddlewareRef::Inline(Arc::new(middleware))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            MiddlewareRef::Named(name) => Some(name),
            MiddlewareRef::Inline(_) => None,
        }
    }
}

impl From<&str> for MiddlewareRef {
    fn from(name: &str) -> Self {
        MiddlewareRef::Named(name.to_string())
    }
}

impl From<String> for MiddlewareRef {
    fn from(name: String) -> Self {
        MiddlewareRef::Named(name)
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareRef {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        MiddlewareRef::Inline(middleware)
    }
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Named(name) => write!(f, "Named({name})"),
            MiddlewareRef::Inline(_) => f.write_str("Inline(<middleware>)"),
        }
    }
}

impl fmt::Display for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Named(name) => f.write_str(name),
            MiddlewareRef::Inline(_) => f.write_str("<inline>"),
        }
    }
}

/// Named middleware known to a router.
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    entries: HashMap<String, Arc<dyn Middleware>>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with `auth`, `guest` and `csrf`.
    pub fn with_builtins(
        login_redirect: &str,
        home_redirect: &str,
        csrf_field: &str,
        csrf_header: &str,
    ) -> Self {
        let mut registry = Self::new();
        registry.register("auth", Arc::new(AuthMiddleware::new(login_redirect)));
        registry.register("guest", Arc::new(GuestMiddleware::new(home_redirect)));
        registry.register("csrf", Arc::new(CsrfMiddleware::new(csrf_field, csrf_header)));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.entries.insert(name.into(), middleware);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Middleware>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn validate(&self, middleware: &MiddlewareRef) -> Result<(), ConfigurationError> {
        match middleware {
            MiddlewareRef::Named(name) if !self.contains(name) => {
                Err(ConfigurationError::UnknownMiddleware(name.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Look up the implementation behind a reference.
    pub fn resolve<'a>(&'a self, middleware: &'a MiddlewareRef) -> Option<&'a dyn Middleware> {
        match middleware {
            MiddlewareRef::Named(name) => self.get(name).map(|m| m.as_ref()),
            MiddlewareRef::Inline(m) => Some(m.as_ref()),
        }
    }
}
