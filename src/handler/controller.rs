//! Controllers and the registry that resolves `Controller@action` references.

use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{ActionRef, HandlerResult, RequestContext};
use crate::routing::{ConfigurationError, ParamValue};

/// A named group of actions.
///
/// `actions` must list every action `call` accepts so that routes can be
/// checked when they are registered.
pub trait Controller: Send + Sync {
    fn actions(&self) -> &[&'static str];

    fn call(&self, action: &str, ctx: &mut RequestContext<'_>, args: &[ParamValue]) -> HandlerResult;
}

/// Service-locator for controllers, keyed by the name used in routes.
#[derive(Default, Clone)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a controller under `key`.
    pub fn register(&mut self, key: impl Into<String>, controller: Arc<dyn Controller>) {
        self.controllers.insert(key.into(), controller);
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn Controller>> {
        self.controllers.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.controllers.contains_key(key)
    }

    /// Fail if `action` does not name a registered controller action.
    pub fn validate(&self, action: &ActionRef) -> Result<(), ConfigurationError> {
        let controller = self
            .controllers
            .get(&action.controller)
            .ok_or_else(|| ConfigurationError::UnknownController(action.controller.clone()))?;

        if controller.actions().contains(&action.action.as_str()) {
            Ok(())
        } else {
            Err(ConfigurationError::UnknownAction {
                controller: action.controller.clone(),
                action: action.action.clone(),
            })
        }
    }
}
