//! Demo application.
//!
//! A small site wired through every router feature: public pages, a
//! guest-only login/registration group, an auth-only logout and posts
//! resource behind CSRF checks, and a JSON API group with a constrained
//! parameter.

pub mod controllers;
pub mod routes;

pub use routes::{build, register};
