//! Router-level request value.
//!
//! # Responsibilities
//! - Hold what dispatch reads: declared method, URI, headers, form fields
//! - Detect AJAX/JSON clients
//! - Expose the `_method` / `X-HTTP-Method-Override` override
//!
//! # Design Decisions
//! - Decoupled from axum's body type so dispatch stays synchronous and the
//!   router is testable without a server
//! - Form fields are decoded only for `application/x-www-form-urlencoded`

use std::collections::HashMap;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};

pub const METHOD_OVERRIDE_FIELD: &str = "_method";
pub const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: String,
    headers: HeaderMap,
    form: HashMap<String, String>,
}

impl Request {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: HeaderMap::new(),
            form: HashMap::new(),
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Build from the parts of an HTTP request and its buffered body.
    pub fn from_parts(method: Method, uri: &axum::http::Uri, headers: HeaderMap, body: &[u8]) -> Self {
        let is_form = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        let form = if is_form {
            url::form_urlencoded::parse(body).into_owned().collect()
        } else {
            HashMap::new()
        };

        let uri = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        Self {
            method,
            uri,
            headers,
            form,
        }
    }

    /// Add a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.insert(name.into(), value.into());
        self
    }

    /// Method the client sent, before any override.
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// URI path with the query string removed.
    pub fn path(&self) -> &str {
        match self.uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.uri,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn form_field(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }

    /// True when the client asked for or sent JSON, or identifies as XHR.
    pub fn is_ajax(&self) -> bool {
        let mentions_json = |name: header::HeaderName| {
            self.headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .any(|v| v.contains("application/json"))
        };

        mentions_json(header::CONTENT_TYPE)
            || mentions_json(header::ACCEPT)
            || self
                .header("x-requested-with")
                .map(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
                .unwrap_or(false)
    }

    /// Upper-cased override for a POST request. The form field wins over the header.
    pub fn method_override(&self) -> Option<String> {
        if self.method != Method::POST {
            return None;
        }
        self.form_field(METHOD_OVERRIDE_FIELD)
            .or_else(|| self.header(METHOD_OVERRIDE_HEADER))
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_ascii_uppercase)
    }
}
