//! Route groups.
//!
//! Groups exist only while routes are being registered. Each frame carries a
//! path prefix and a middleware list; a route registered inside nested groups
//! inherits every prefix and every middleware, outer to inner.

use crate::middleware::MiddlewareRef;

/// Options for [`Router::group`](crate::routing::Router::group).
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    pub(crate) prefix: String,
    pub(crate) middleware: Vec<MiddlewareRef>,
}

impl GroupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middleware.push(middleware.into());
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct GroupStack {
    frames: Vec<GroupOptions>,
}

impl GroupStack {
    pub(crate) fn push(&mut self, frame: GroupOptions) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn clear(&mut self) {
        self.frames.clear();
    }

    /// Active prefixes, outermost first.
    pub(crate) fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|frame| frame.prefix.as_str())
    }

    /// Concatenated middleware of every active frame, outermost first.
    pub(crate) fn middleware(&self) -> Vec<MiddlewareRef> {
        self.frames
            .iter()
            .flat_map(|frame| frame.middleware.iter().cloned())
            .collect()
    }
}
