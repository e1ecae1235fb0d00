//! Brick Router Library
//!
//! A standalone HTTP router: per-method route tables with regex-compiled
//! path templates, nested groups, named routes and URL generation, a
//! registry-resolved middleware chain (`auth`, `guest`, `csrf`), controller
//! dispatch, and an on-disk route cache. An axum front controller and a demo
//! application sit on top.

pub mod app;
pub mod config;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routing;
pub mod security;
pub mod session;

pub use config::schema::AppConfig;
pub use handler::{Controller, Handler, Reply, RequestContext};
pub use http::{HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use middleware::{Middleware, Outcome};
pub use routing::{route, GroupOptions, Method, ParamValue, Router, RouterSettings};
pub use session::{MemorySessionStore, Session, SessionData};
