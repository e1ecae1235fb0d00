//! Demo route file.

use crate::handler::Handler;
use crate::routing::{route, ConfigurationError, GroupOptions, Router};

use super::controllers::{ApiController, AuthController, HomeController, PostController};

/// Register the demo controllers and routes on `router`.
pub fn register(router: &mut Router) -> Result<(), ConfigurationError> {
    router
        .register_controller("HomeController", HomeController)
        .register_controller("AuthController", AuthController::new())
        .register_controller("PostController", PostController)
        .register_controller("ApiController", ApiController);

    // Public pages
    router.get(route("/", Handler::parse("HomeController@index")?).name("home"))?;
    router.get(route("/home", Handler::parse("HomeController@index")?))?;

    // Guests only
    router.group(GroupOptions::new().middleware("guest"), |r| {
        r.get(route("/login", Handler::action("AuthController", "login_form")).name("login"))?;
        r.post(route("/login", Handler::action("AuthController", "login")).name("login.submit"))?
            .middleware("csrf")?;
        r.get(route("/register", Handler::action("AuthController", "register_form")).name("register"))?;
        r.post(
            route("/register", Handler::action("AuthController", "register"))
                .name("register.submit")
                .middleware("csrf"),
        )?;
        Ok(())
    })?;

    // Signed-in users only
    router.group(GroupOptions::new().middleware("auth"), |r| {
        r.post(
            route("/logout", Handler::action("AuthController", "logout"))
                .name("logout")
                .middleware("csrf"),
        )?;
        r.group(GroupOptions::new().middleware("csrf"), |r| {
            r.resource("posts", "PostController")?;
            Ok(())
        })?;
        Ok(())
    })?;

    // JSON API
    router.group(GroupOptions::new().prefix("/api"), |r| {
        r.get(route("/status", Handler::action("ApiController", "status")).name("api.status"))?;
        r.get(
            route("/posts/{id}", Handler::action("ApiController", "post"))
                .name("api.posts.show")
                .constraint("id", r"\d+"),
        )?;
        Ok(())
    })?;

    tracing::info!(routes = router.registered_routes().len(), "Demo routes registered");
    Ok(())
}

/// Build a router with the demo application registered.
pub fn build(settings: crate::routing::RouterSettings) -> Result<Router, ConfigurationError> {
    let mut router = Router::new(settings);
    register(&mut router)?;
    Ok(router)
}
