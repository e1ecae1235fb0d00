//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     RouteDef + active group frames
//!     → pattern.rs (normalize path, compile matcher)
//!     → route.rs (append to per-method table, index the name)
//!     → cache.rs (optional JSON snapshot)
//!
//! Incoming Request (method, path, headers, form)
//!     → router.rs (effective method, base-path strip, decode)
//!     → route.rs (first matching route for the method)
//!     → middleware chain → handler
//!     → Response, or 404 on no match
//! ```
//!
//! # Design Decisions
//! - Matchers compiled once at registration, never in the hot path
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by registration)

pub mod cache;
pub mod error;
pub mod group;
pub mod method;
pub mod pattern;
pub mod route;
pub mod router;

pub use cache::{CacheSnapshot, CachedRoute};
pub use error::{CacheError, ConfigurationError, UrlError};
pub use group::GroupOptions;
pub use method::{Method, UnsupportedMethod};
pub use pattern::{normalize_path, CompiledPattern, ParamValue, Params};
pub use route::{route, Route, RouteDef, RouteMatch, RouteTable};
pub use router::{Router, RouterSettings};
