//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::path::Path;

use brick_router::handler::{Controller, Handler, HandlerResult, RequestContext};
use brick_router::routing::{ParamValue, Router, RouterSettings};

/// Development settings: cache disabled, detailed errors.
pub fn dev_router() -> Router {
    Router::new(RouterSettings::development())
}

/// Production-mode settings with the cache file inside `dir`.
pub fn cached_settings(dir: &Path) -> RouterSettings {
    RouterSettings {
        debug: false,
        cache_path: dir.join("cache/routes.json"),
        ..RouterSettings::development()
    }
}

/// Inline handler answering `<label>:<arg>,<arg>`.
pub fn echo(label: &'static str) -> Handler {
    Handler::inline(move |_ctx, args| {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        Ok(format!("{label}:{}", args.join(",")).into())
    })
}

/// Controller whose actions answer `<Controller>@<action>:<args>`.
pub struct Echo(pub &'static str);

impl Controller for Echo {
    fn actions(&self) -> &[&'static str] {
        &["index", "create", "store", "show", "edit", "update", "destroy", "dashboard", "contact"]
    }

    fn call(&self, action: &str, _ctx: &mut RequestContext<'_>, args: &[ParamValue]) -> HandlerResult {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        Ok(format!("{}@{}:{}", self.0, action, args.join(",")).into())
    }
}

/// Router with an `Echo` controller registered as `Pages`.
pub fn router_with_pages(settings: RouterSettings) -> Router {
    let mut router = Router::new(settings);
    router.register_controller("Pages", Echo("Pages"));
    router
}
