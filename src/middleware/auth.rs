//! `auth` and `guest` middleware.

use serde_json::json;

use crate::handler::RequestContext;
use crate::http::Response;
use crate::middleware::{Middleware, Outcome};
use crate::session::{Flash, FlashKind};

pub const UNAUTHENTICATED: &str = "Authentication required";
pub const ALREADY_AUTHENTICATED: &str = "Already authenticated";

const LOGIN_REQUIRED_FLASH: &str = "Please log in to access this page";
const ALREADY_LOGGED_IN_FLASH: &str = "You are already logged in";

/// Lets only authenticated sessions through.
///
/// AJAX requests get `401 {"success":false,"error":...}`; everything else is
/// redirected to the login page with an error flash.
#[derive(Debug, Clone)]
pub struct AuthMiddleware {
    login_redirect: String,
}

impl AuthMiddleware {
    pub fn new(login_redirect: impl Into<String>) -> Self {
        Self {
            login_redirect: login_redirect.into(),
        }
    }
}

impl Middleware for AuthMiddleware {
    fn handle(&self, ctx: &mut RequestContext<'_>) -> Outcome {
        if ctx.session.user().is_some() {
            return Outcome::Continue;
        }

        tracing::debug!(path = %ctx.request.path(), "Rejected unauthenticated request");

        if ctx.is_ajax() {
            return Outcome::Respond(Response::json_error(
                axum::http::StatusCode::UNAUTHORIZED,
                UNAUTHENTICATED,
            ));
        }

        ctx.session
            .set_flash(Flash::new(FlashKind::Error, LOGIN_REQUIRED_FLASH));
        Outcome::Respond(Response::redirect(&self.login_redirect))
    }
}

/// Lets only anonymous sessions through.
#[derive(Debug, Clone)]
pub struct GuestMiddleware {
    home_redirect: String,
}

impl GuestMiddleware {
    pub fn new(home_redirect: impl Into<String>) -> Self {
        Self {
            home_redirect: home_redirect.into(),
        }
    }
}

impl Middleware for GuestMiddleware {
    fn handle(&self, ctx: &mut RequestContext<'_>) -> Outcome {
        if ctx.session.user().is_none() {
            return Outcome::Continue;
        }

        if ctx.is_ajax() {
            return Outcome::Respond(Response::json(
                axum::http::StatusCode::FORBIDDEN,
                &json!({ "success": false, "error": ALREADY_AUTHENTICATED }),
            ));
        }

        ctx.session
            .set_flash(Flash::new(FlashKind::Info, ALREADY_LOGGED_IN_FLASH));
        Outcome::Respond(Response::redirect(&self.home_redirect))
    }
}
