//! Route handlers.
//!
//! # Data Flow
//! ```text
//! RouteMatch (handler, params)
//!     → Handler::Inline      → closure(ctx, args)
//!     → Handler::Action      → ControllerRegistry lookup → Controller::call(action, ctx, args)
//!     → Reply                → Response (plain bodies become text/html)
//! ```
//!
//! # Design Decisions
//! - Handlers are a closed enum; controller references are validated against
//!   the registry when the route is registered, not on first dispatch
//! - Only `Action` handlers can be written to the route cache
//! - Positional arguments are the path parameters in declaration order

pub mod context;
pub mod controller;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http::Response;
use crate::routing::{ConfigurationError, ParamValue};

pub use context::RequestContext;
pub use controller::{Controller, ControllerRegistry};

/// Error type handlers may return. Rendered as a 500 at the dispatch boundary.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = Result<Reply, HandlerError>;

/// Signature of an inline handler.
pub type InlineHandler =
    dyn Fn(&mut RequestContext<'_>, &[ParamValue]) -> HandlerResult + Send + Sync;

/// What a handler hands back.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A fully formed response, returned as is.
    Response(Response),
    /// A bare body, sent as a 200 HTML page.
    Body(String),
}

impl Reply {
    pub fn into_response(self) -> Response {
        match self {
            Reply::Response(response) => response,
            Reply::Body(body) => Response::html(body),
        }
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

impl From<String> for Reply {
    fn from(body: String) -> Self {
        Reply::Body(body)
    }
}

impl From<&str> for Reply {
    fn from(body: &str) -> Self {
        Reply::Body(body.to_string())
    }
}

/// A `Controller@action` reference resolved through the [`ControllerRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRef {
    pub controller: String,
    pub action: String,
}

impl ActionRef {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }

    /// Parse the `Controller@action` shorthand.
    pub fn parse(spec: &str) -> Result<Self, ConfigurationError> {
        match spec.split_once('@') {
            Some((controller, action))
                if !controller.is_empty() && !action.is_empty() && !action.contains('@') =>
            {
                Ok(Self::new(controller, action))
            }
            _ => Err(ConfigurationError::MalformedHandler(spec.to_string())),
        }
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.controller, self.action)
    }
}

/// The target of a route.
#[derive(Clone)]
pub enum Handler {
    Action(ActionRef),
    Inline(Arc<InlineHandler>),
}

impl Handler {
    pub fn action(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Handler::Action(ActionRef::new(controller, action))
    }

    /// Parse `Controller@action`.
    pub fn parse(spec: &str) -> Result<Self, ConfigurationError> {
        ActionRef::parse(spec).map(Handler::Action)
    }

    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(&mut RequestContext<'_>, &[ParamValue]) -> HandlerResult + Send + Sync + 'static,
    {
        Handler::Inline(Arc::new(f))
    }

    pub fn as_action(&self) -> Option<&ActionRef> {
        match self {
            Handler::Action(action) => Some(action),
            Handler::Inline(_) => None,
        }
    }

    pub(crate) fn invoke(
        &self,
        controllers: &ControllerRegistry,
        ctx: &mut RequestContext<'_>,
        args: &[ParamValue],
    ) -> HandlerResult {
        match self {
            Handler::Inline(f) => f(ctx, args),
            Handler::Action(action) => {
                let controller = controllers
                    .get(&action.controller)
                    .ok_or_else(|| format!("controller '{}' is not registered", action.controller))?;
                controller.call(&action.action, ctx, args)
            }
        }
    }
}

impl From<ActionRef> for Handler {
    fn from(action: ActionRef) -> Self {
        Handler::Action(action)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Action(action) => write!(f, "Action({})", action),
            Handler::Inline(_) => f.write_str("Inline(<fn>)"),
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Action(action) => write!(f, "{}", action),
            Handler::Inline(_) => f.write_str("<inline>"),
        }
    }
}
