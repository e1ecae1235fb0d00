//! Route registration: groups, names, any, resources, validation.

use brick_router::handler::Handler;
use brick_router::middleware::{from_fn, MiddlewareRef, Outcome};
use brick_router::routing::{route, ConfigurationError, GroupOptions, Method, ParamValue, UrlError};

mod common;

use common::{dev_router, echo, router_with_pages};

fn middleware_names(refs: &[MiddlewareRef]) -> Vec<String> {
    refs.iter().map(ToString::to_string).collect()
}

#[test]
fn test_constrained_route_url_and_match() {
    let mut router = dev_router();
    router
        .get(route("/users/{id}", echo("user")).name("user.show").constraint("id", r"\d+"))
        .unwrap();

    assert_eq!(router.url("user.show", &[("id", &123)]).unwrap(), "/users/123");

    let matched = router.match_route(Method::Get, "/users/42").unwrap();
    assert_eq!(matched.params.get("id"), Some(&ParamValue::Int(42)));
    assert!(router.match_route(Method::Get, "/users/abc").is_none());
}

#[test]
fn test_admin_group_scenario() {
    let mut router = router_with_pages(brick_router::RouterSettings::development());
    router
        .group(GroupOptions::new().prefix("/admin").middleware("auth"), |r| {
            r.get(route("/dashboard", Handler::action("Pages", "dashboard")).name("admin.dashboard"))?;
            Ok(())
        })
        .unwrap();

    assert_eq!(router.url("admin.dashboard", &[]).unwrap(), "/admin/dashboard");
    let matched = router.match_route(Method::Get, "/admin/dashboard").unwrap();
    assert_eq!(middleware_names(matched.middleware()), vec!["auth"]);
}

#[test]
fn test_nested_groups_compose() {
    let mut router = dev_router();
    router.register_middleware("outer", from_fn(|_| Outcome::Continue));
    router.register_middleware("inner", from_fn(|_| Outcome::Continue));

    router
        .group(GroupOptions::new().prefix("/api").middleware("outer"), |r| {
            r.group(GroupOptions::new().prefix("/v1").middleware("inner"), |r| {
                r.get(route("/users", echo("users")).name("api.users").middleware("csrf"))?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    let matched = router.match_route(Method::Get, "/api/v1/users").unwrap();
    assert_eq!(matched.route.path(), "/api/v1/users");
    assert_eq!(middleware_names(matched.middleware()), vec!["outer", "inner", "csrf"]);
}

#[test]
fn test_routes_outside_groups_are_isolated() {
    let mut router = dev_router();
    router
        .group(GroupOptions::new().prefix("/admin").middleware("auth"), |r| {
            r.get(route("/inside", echo("inside")))?;
            Ok(())
        })
        .unwrap();
    router.get(route("/outside", echo("outside"))).unwrap();

    let matched = router.match_route(Method::Get, "/outside").unwrap();
    assert_eq!(matched.route.path(), "/outside");
    assert!(matched.middleware().is_empty());
    assert!(router.match_route(Method::Get, "/admin/outside").is_none());
}

#[test]
fn test_any_registers_get_and_post() {
    let mut router = dev_router();
    router.any(route("/contact", echo("contact")).name("contact")).unwrap();

    assert_eq!(router.url("contact", &[]).unwrap(), "/contact");
    assert_eq!(router.url("contact.post", &[]).unwrap(), "/contact");
    assert!(router.match_route(Method::Get, "/contact").is_some());
    assert!(router.match_route(Method::Post, "/contact").is_some());
    assert!(router.match_route(Method::Put, "/contact").is_none());
}

#[test]
fn test_duplicate_name_rejected_on_second_registration() {
    let mut router = dev_router();
    router.get(route("/home", echo("home")).name("home")).unwrap();
    let err = router.get(route("/homepage", echo("homepage")).name("home")).unwrap_err();

    assert!(matches!(err, ConfigurationError::DuplicateRouteName(name) if name == "home"));
    assert!(router.match_route(Method::Get, "/homepage").is_none());
}

#[test]
fn test_empty_names_are_not_indexed() {
    let mut router = dev_router();
    router.get(route("/a", echo("a")).name("")).unwrap();
    router.get(route("/b", echo("b")).name("")).unwrap();
    assert!(router.routes().named().is_empty());
}

#[test]
fn test_missing_parameter_names_the_placeholder() {
    let mut router = dev_router();
    router.get(route("/users/{id}", echo("user")).name("user.show")).unwrap();

    assert_eq!(
        router.url("user.show", &[]),
        Err(UrlError::MissingParameter {
            route: "user.show".into(),
            param: "id".into()
        })
    );
    assert_eq!(
        router.url("nope", &[]),
        Err(UrlError::RouteNotFound("nope".into()))
    );
}

#[test]
fn test_url_does_not_revalidate_constraints() {
    let mut router = dev_router();
    router
        .get(route("/users/{id}", echo("user")).name("user.show").constraint("id", r"\d+"))
        .unwrap();
    assert_eq!(router.url("user.show", &[("id", &"abc")]).unwrap(), "/users/abc");
}

#[test]
fn test_trailing_slash_tolerance() {
    let mut router = dev_router();
    router.get(route("/about", echo("about"))).unwrap();

    assert!(router.match_route(Method::Get, "/about").is_some());
    assert!(router.match_route(Method::Get, "/about/").is_some());
    assert!(router.match_route(Method::Get, "/aboutX").is_none());
}

#[test]
fn test_paths_are_normalized() {
    let mut router = dev_router();
    router
        .group(GroupOptions::new().prefix("api/"), |r| {
            r.get(route("//users///{id}/", echo("user")).name("user"))?;
            Ok(())
        })
        .unwrap();
    router.get(route("", echo("root")).name("root")).unwrap();

    assert_eq!(router.url("user", &[("id", &7)]).unwrap(), "/api/users/7");
    assert_eq!(router.url("root", &[]).unwrap(), "/");
    assert!(router.match_route(Method::Get, "/").is_some());
}

#[test]
fn test_first_match_wins() {
    let mut router = dev_router();
    router.get(route("/posts/{slug}", echo("a"))).unwrap();
    router.get(route("/posts/featured", echo("b"))).unwrap();

    let matched = router.match_route(Method::Get, "/posts/featured").unwrap();
    assert_eq!(matched.route.path(), "/posts/{slug}");
}

#[test]
fn test_params_in_declaration_order() {
    let mut router = dev_router();
    router.get(route("/users/{id}/{slug}", echo("user"))).unwrap();

    let matched = router.match_route(Method::Get, "/users/5/hello-world").unwrap();
    let names: Vec<&str> = matched.params.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["id", "slug"]);
    assert_eq!(
        matched.params.values(),
        vec![ParamValue::Int(5), ParamValue::Str("hello-world".into())]
    );
}

#[test]
fn test_resource_routes() {
    let mut router = router_with_pages(brick_router::RouterSettings::development());
    router.resource("photos", "Pages").unwrap();

    let expected = [
        ("photos.index", Method::Get, "/photos"),
        ("photos.create", Method::Get, "/photos/create"),
        ("photos.store", Method::Post, "/photos"),
        ("photos.show", Method::Get, "/photos/{id}"),
        ("photos.edit", Method::Get, "/photos/{id}/edit"),
        ("photos.update", Method::Put, "/photos/{id}"),
        ("photos.destroy", Method::Delete, "/photos/{id}"),
    ];
    for (name, method, path) in expected {
        let route = router.routes().route_named(name).unwrap();
        assert_eq!(route.method(), method, "{name}");
        assert_eq!(route.path(), path, "{name}");
    }

    let create = router.match_route(Method::Get, "/photos/create").unwrap();
    assert_eq!(create.route.name(), Some("photos.create"));
    assert_eq!(router.url("photos.edit", &[("id", &9)]).unwrap(), "/photos/9/edit");
}

#[test]
fn test_unknown_controller_and_action_rejected() {
    let mut router = router_with_pages(brick_router::RouterSettings::development());

    let err = router.get(route("/x", Handler::action("Missing", "index"))).unwrap_err();
    assert!(matches!(err, ConfigurationError::UnknownController(name) if name == "Missing"));

    let err = router.get(route("/y", Handler::action("Pages", "explode"))).unwrap_err();
    assert!(matches!(err, ConfigurationError::UnknownAction { .. }));

    assert!(matches!(
        Handler::parse("PagesIndex"),
        Err(ConfigurationError::MalformedHandler(_))
    ));
    assert!(router.routes().is_empty());
}

#[test]
fn test_unknown_route_middleware_rejected() {
    let mut router = dev_router();
    let err = router
        .get(route("/x", echo("x")).middleware("throttle"))
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::UnknownMiddleware(name) if name == "throttle"));
}

#[test]
fn test_invalid_constraint_is_a_configuration_error() {
    let mut router = dev_router();
    let err = router
        .get(route("/users/{id}", echo("user")).constraint("id", "(unclosed"))
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::InvalidPattern { method: Method::Get, .. }));
}

#[test]
fn test_is_current_route() {
    let mut router = dev_router();
    router
        .get(route("/users/{id}", echo("user")).name("user.show").constraint("id", r"\d+"))
        .unwrap();

    assert!(router.is_current_route("user.show", "/users/5"));
    assert!(router.is_current_route("user.show", "/users/5/"));
    assert!(!router.is_current_route("user.show", "/users/abc"));
    assert!(!router.is_current_route("missing", "/users/5"));
}

#[test]
fn test_reset_clears_routes_but_keeps_registries() {
    let mut router = router_with_pages(brick_router::RouterSettings::development());
    router.get(route("/", Handler::action("Pages", "index")).name("home")).unwrap();

    router.reset();
    assert!(router.routes().is_empty());
    assert!(router.url("home", &[]).is_err());

    router.get(route("/", Handler::action("Pages", "index")).name("home")).unwrap();
    assert_eq!(router.url("home", &[]).unwrap(), "/");
}
