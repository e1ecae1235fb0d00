//! Session capability.
//!
//! Middleware and handlers read and write session state only through the
//! [`Session`] trait handed to them in the request context. The front
//! controller owns storage ([`MemorySessionStore`]); the router never does.

pub mod store;

use serde::{Deserialize, Serialize};

pub use store::MemorySessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

/// One-shot message shown on the next page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn new(kind: FlashKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub trait Session {
    /// Authenticated-user marker.
    fn user(&self) -> Option<&str>;

    fn set_user(&mut self, user: Option<String>);

    fn csrf_token(&self) -> Option<&str>;

    fn set_csrf_token(&mut self, token: String);

    fn set_flash(&mut self, flash: Flash);

    /// Read and clear the flash message.
    fn take_flash(&mut self) -> Option<Flash>;
}

/// Plain session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user: Option<String>,
    pub csrf_token: Option<String>,
    pub flash: Option<Flash>,
}

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authenticated(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ..Self::default()
        }
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }
}

impl Session for SessionData {
    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn set_user(&mut self, user: Option<String>) {
        self.user = user;
    }

    fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    fn set_csrf_token(&mut self, token: String) {
        self.csrf_token = Some(token);
    }

    fn set_flash(&mut self, flash: Flash) {
        self.flash = Some(flash);
    }

    fn take_flash(&mut self) -> Option<Flash> {
        self.flash.take()
    }
}
