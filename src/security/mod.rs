//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Front controller:
//!     → csrf.rs (ensure the session carries a token)
//!     → router dispatch (csrf middleware compares tokens)
//!     → headers.rs (default security headers on every response)
//! ```
//!
//! # Design Decisions
//! - Token comparison is constant time
//! - Empty or missing tokens fail closed

pub mod csrf;
pub mod headers;
