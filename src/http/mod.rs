//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, limits, session cookie)
//!     → request.rs (method, URI, headers, form fields)
//!     → [routing layer dispatches]
//!     → response.rs (status, headers, body → axum response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::Request;
pub use response::Response;
pub use server::{AppState, HttpServer, X_REQUEST_ID};
