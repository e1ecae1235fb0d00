//! CSRF tokens.
//!
//! # Responsibilities
//! - Generate per-session tokens (random bytes, hex encoded)
//! - Compare submitted tokens in constant time
//! - Render the hidden form field and meta tag templates embed
//!
//! Handlers normally go through `RequestContext::csrf_field`, which applies
//! the configured field name and token size.

use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::http::response::escape_html;
use crate::session::Session;

pub const DEFAULT_TOKEN_BYTES: usize = 32;
pub const DEFAULT_FIELD_NAME: &str = "csrf_token";
pub const DEFAULT_HEADER_NAME: &str = "X-CSRF-Token";

pub fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Return the session's token, creating one of `bytes` random bytes if absent.
pub fn ensure_token(session: &mut dyn Session, bytes: usize) -> String {
    if let Some(token) = session.csrf_token().filter(|t| !t.is_empty()) {
        return token.to_string();
    }
    let token = generate_token(bytes);
    session.set_csrf_token(token.clone());
    token
}

/// Constant-time equality. Empty tokens never match.
pub fn tokens_match(expected: &str, submitted: &str) -> bool {
    if expected.is_empty() || submitted.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}

pub fn hidden_field(field_name: &str, token: &str) -> String {
    format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        escape_html(field_name),
        escape_html(token)
    )
}

pub fn meta_tag(token: &str) -> String {
    format!(r#"<meta name="csrf-token" content="{}">"#, escape_html(token))
}
