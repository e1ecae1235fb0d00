//! Per-request state handed to middleware and handlers.

use std::fmt;

use crate::http::Request;
use crate::routing::{Method, ParamValue, Params, Router, UrlError};
use crate::security::csrf;
use crate::session::Session;

/// Everything a middleware or handler may look at while a request runs.
///
/// The session is an explicit capability; nothing reaches ambient state.
pub struct RequestContext<'a> {
    pub request: &'a Request,
    pub session: &'a mut dyn Session,
    pub router: &'a Router,
    pub params: &'a Params,
    /// Effective method after any form/header override.
    pub method: Method,
}

impl<'a> RequestContext<'a> {
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Shorthand for [`Router::url`].
    pub fn url(&self, name: &str, params: &[(&str, &dyn fmt::Display)]) -> Result<String, UrlError> {
        self.router.url(name, params)
    }

    pub fn is_ajax(&self) -> bool {
        self.request.is_ajax()
    }

    /// The session's CSRF token, generated on first use.
    pub fn csrf_token(&mut self) -> String {
        csrf::ensure_token(&mut *self.session, self.router.settings().csrf_token_bytes)
    }

    /// Hidden form input under the configured field name.
    pub fn csrf_field(&mut self) -> String {
        let token = self.csrf_token();
        csrf::hidden_field(&self.router.settings().csrf_field, &token)
    }
}
