//! Router-level response value.
//!
//! # Responsibilities
//! - Carry status, headers and a fully buffered body out of dispatch
//! - Provide the handful of shapes handlers and middleware need
//!   (HTML page, plain text, JSON, redirect)
//! - Convert into an axum response at the front controller
//!
//! # Design Decisions
//! - Bodies are `String`; every response the router produces is small and
//!   textual, so there is no streaming path

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::json;

const HTML: &str = "text/html; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";
const JSON: &str = "application/json";

/// Body the router sends when nothing matched and no custom page is configured.
pub const NOT_FOUND_BODY: &str = "<h1>404 - Page Not Found</h1>";

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Response {
    pub fn new(status: StatusCode, content_type: &'static str, body: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// 200 `text/html`.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, HTML, body)
    }

    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status, TEXT, body)
    }

    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status, JSON, value.to_string())
    }

    /// `{"success":false,"error":message}` with the given status.
    pub fn json_error(status: StatusCode, message: &str) -> Self {
        Self::json(status, &json!({ "success": false, "error": message }))
    }

    /// 302 to `location`. A location that is not a valid header value falls back to `/`.
    pub fn redirect(location: &str) -> Self {
        let mut response = Self::new(StatusCode::FOUND, HTML, String::new());
        let value = HeaderValue::from_str(location).unwrap_or_else(|_| HeaderValue::from_static("/"));
        response.headers.insert(header::LOCATION, value);
        response
    }

    pub fn not_found() -> Self {
        Self::html(NOT_FOUND_BODY).with_status(StatusCode::NOT_FOUND)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    pub fn into_axum(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl axum::response::IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        self.into_axum()
    }
}

/// Escape text for inclusion in an HTML page.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_shape() {
        let response = Response::json_error(StatusCode::FORBIDDEN, "Invalid CSRF token");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: serde_json::Value = serde_json::from_str(response.body()).unwrap();
        assert_eq!(body, json!({ "success": false, "error": "Invalid CSRF token" }));
    }

    #[test]
    fn test_redirect() {
        let response = Response::redirect("/login");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.location(), Some("/login"));

        let response = Response::redirect("/bad\nplace");
        assert_eq!(response.location(), Some("/"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }
}
