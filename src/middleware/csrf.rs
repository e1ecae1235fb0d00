//! `csrf` middleware.
//!
//! Checks state-mutating requests (POST, PUT, PATCH, DELETE by the method the
//! client actually sent) for a token matching the session's.

use axum::http::StatusCode;

use crate::handler::RequestContext;
use crate::http::Response;
use crate::middleware::{Middleware, Outcome};
use crate::routing::Method;
use crate::security::csrf::tokens_match;

pub const INVALID_TOKEN: &str = "Invalid CSRF token";

#[derive(Debug, Clone)]
pub struct CsrfMiddleware {
    field_name: String,
    header_name: String,
}

impl CsrfMiddleware {
    pub fn new(field_name: impl Into<String>, header_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            header_name: header_name.into(),
        }
    }

    fn submitted<'r>(&self, ctx: &'r RequestContext<'_>) -> Option<&'r str> {
        ctx.request
            .form_field(&self.field_name)
            .or_else(|| ctx.request.header(&self.header_name))
    }
}

impl Middleware for CsrfMiddleware {
    fn handle(&self, ctx: &mut RequestContext<'_>) -> Outcome {
        let mutating = Method::try_from(ctx.request.method())
            .map(|m| m.is_state_mutating())
            .unwrap_or(false);
        if !mutating {
            return Outcome::Continue;
        }

        let valid = match (ctx.session.csrf_token(), self.submitted(ctx)) {
            (Some(expected), Some(submitted)) => tokens_match(expected, submitted),
            _ => false,
        };
        if valid {
            return Outcome::Continue;
        }

        tracing::warn!(path = %ctx.request.path(), "CSRF token mismatch");

        if ctx.is_ajax() {
            return Outcome::Respond(Response::json_error(StatusCode::FORBIDDEN, INVALID_TOKEN));
        }

        Outcome::Respond(Response::text(StatusCode::FORBIDDEN, INVALID_TOKEN))
    }
}
