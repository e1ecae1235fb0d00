//! Dispatch: method override, built-in middleware, custom middleware, errors.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use brick_router::handler::Handler;
use brick_router::http::{Request, Response};
use brick_router::middleware::{from_fn, MiddlewareRef, Outcome};
use brick_router::routing::{route, GroupOptions, RouterSettings};
use brick_router::session::{FlashKind, Session, SessionData};

mod common;

use common::{dev_router, echo, router_with_pages};

fn json(response: &Response) -> serde_json::Value {
    serde_json::from_str(response.body()).unwrap()
}

#[test]
fn test_dispatch_passes_params_to_handler() {
    let mut router = dev_router();
    router
        .get(route("/users/{id}/{slug}", echo("user")).constraint("id", r"\d+"))
        .unwrap();

    let mut session = SessionData::new();
    let response = router.dispatch(&Request::get("/users/12/intro?tab=1"), &mut session);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), "user:12,intro");
}

#[test]
fn test_controller_actions_dispatch() {
    let mut router = router_with_pages(RouterSettings::development());
    router.get(route("/", Handler::parse("Pages@index").unwrap())).unwrap();

    let mut session = SessionData::new();
    let response = router.dispatch(&Request::get("/"), &mut session);
    assert_eq!(response.body(), "Pages@index:");
}

#[test]
fn test_method_override_routes_to_put() {
    let mut router = dev_router();
    router.post(route("/items/{id}", echo("post"))).unwrap();
    router.put(route("/items/{id}", echo("put"))).unwrap();
    router.delete(route("/items/{id}", echo("delete"))).unwrap();

    let mut session = SessionData::new();

    let request = Request::post("/items/3").with_form_field("_method", "PUT");
    assert_eq!(router.dispatch(&request, &mut session).body(), "put:3");

    let request = Request::post("/items/3").with_header("X-HTTP-Method-Override", "delete");
    assert_eq!(router.dispatch(&request, &mut session).body(), "delete:3");

    let request = Request::post("/items/3");
    assert_eq!(router.dispatch(&request, &mut session).body(), "post:3");
}

#[test]
fn test_unknown_override_is_not_found() {
    let mut router = dev_router();
    router.post(route("/items", echo("post"))).unwrap();

    let mut session = SessionData::new();
    let request = Request::post("/items").with_form_field("_method", "BREW");
    assert_eq!(router.dispatch(&request, &mut session).status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_no_match_is_404() {
    let router = dev_router();
    let mut session = SessionData::new();
    let response = router.dispatch(&Request::get("/nowhere"), &mut session);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.body(), "<h1>404 - Page Not Found</h1>");
}

#[test]
fn test_head_requests_match_nothing() {
    let mut router = dev_router();
    router.get(route("/", echo("home"))).unwrap();
    let mut session = SessionData::new();
    let request = Request::new(axum::http::Method::HEAD, "/");
    assert_eq!(router.dispatch(&request, &mut session).status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_custom_not_found_page() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("404.html");
    std::fs::write(&page, "<p>lost</p>").unwrap();

    let settings = RouterSettings {
        not_found_page: Some(page),
        ..RouterSettings::development()
    };
    let router = brick_router::Router::new(settings);
    let mut session = SessionData::new();
    let response = router.dispatch(&Request::get("/missing"), &mut session);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.body(), "<p>lost</p>");
}

#[test]
fn test_base_path_and_percent_decoding() {
    let settings = RouterSettings {
        base_path: "/blog/".into(),
        ..RouterSettings::development()
    };
    let mut router = brick_router::Router::new(settings);
    router.get(route("/posts/{title}", echo("post"))).unwrap();
    router.get(route("/", echo("root"))).unwrap();

    let mut session = SessionData::new();
    assert_eq!(
        router.dispatch(&Request::get("/blog/posts/caf%C3%A9%20au%20lait"), &mut session).body(),
        "post:café au lait"
    );
    assert_eq!(router.dispatch(&Request::get("/blog"), &mut session).body(), "root:");
}

#[test]
fn test_auth_redirects_browsers_and_rejects_ajax() {
    let mut router = dev_router();
    router
        .group(GroupOptions::new().middleware("auth"), |r| {
            r.get(route("/account", echo("account")))?;
            Ok(())
        })
        .unwrap();

    let mut session = SessionData::new();
    let response = router.dispatch(&Request::get("/account"), &mut session);
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.location(), Some("/login"));
    assert_eq!(session.take_flash().map(|f| f.kind), Some(FlashKind::Error));

    let ajax = Request::get("/account").with_header("X-Requested-With", "XMLHttpRequest");
    let response = router.dispatch(&ajax, &mut session);
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(&response)["success"], false);

    let mut signed_in = SessionData::authenticated("alice");
    let response = router.dispatch(&Request::get("/account"), &mut signed_in);
    assert_eq!(response.body(), "account:");
}

#[test]
fn test_guest_redirects_signed_in_users() {
    let mut router = dev_router();
    router.get(route("/login", echo("login")).middleware("guest")).unwrap();

    let mut anonymous = SessionData::new();
    assert_eq!(router.dispatch(&Request::get("/login"), &mut anonymous).body(), "login:");

    let mut signed_in = SessionData::authenticated("alice");
    let response = router.dispatch(&Request::get("/login"), &mut signed_in);
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));

    let ajax = Request::get("/login").with_header("Accept", "application/json");
    let response = router.dispatch(&ajax, &mut signed_in);
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json(&response)["error"], "Already authenticated");
}

fn csrf_router() -> brick_router::Router {
    let mut router = dev_router();
    router
        .group(GroupOptions::new().middleware("csrf"), |r| {
            r.get(route("/form", echo("form")))?;
            r.post(route("/form", echo("submitted")))?;
            r.put(route("/form", echo("replaced")))?;
            Ok(())
        })
        .unwrap();
    router
}

#[test]
fn test_csrf_matching_token_passes() {
    let router = csrf_router();
    let mut session = SessionData::new().with_csrf_token("t0ken");

    let request = Request::post("/form").with_form_field("csrf_token", "t0ken");
    assert_eq!(router.dispatch(&request, &mut session).body(), "submitted:");

    let request = Request::post("/form").with_header("X-CSRF-Token", "t0ken");
    assert_eq!(router.dispatch(&request, &mut session).body(), "submitted:");
}

#[test]
fn test_csrf_mismatch_is_plain_403() {
    let router = csrf_router();
    let mut session = SessionData::new().with_csrf_token("t0ken");

    let request = Request::post("/form").with_form_field("csrf_token", "wrong");
    let response = router.dispatch(&request, &mut session);
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.body(), "Invalid CSRF token");
}

#[test]
fn test_csrf_missing_token_with_ajax_is_json_403() {
    let router = csrf_router();
    let mut session = SessionData::new().with_csrf_token("t0ken");

    let request = Request::post("/form").with_header("Content-Type", "application/json");
    let response = router.dispatch(&request, &mut session);
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json(&response),
        serde_json::json!({ "success": false, "error": "Invalid CSRF token" })
    );
}

#[test]
fn test_csrf_without_session_token_fails_closed() {
    let router = csrf_router();
    let mut session = SessionData::new();
    let request = Request::post("/form").with_form_field("csrf_token", "");
    assert_eq!(router.dispatch(&request, &mut session).status(), StatusCode::FORBIDDEN);
}

#[test]
fn test_csrf_ignores_safe_methods() {
    let router = csrf_router();
    let mut session = SessionData::new();
    assert_eq!(router.dispatch(&Request::get("/form"), &mut session).body(), "form:");
}

#[test]
fn test_csrf_checks_overridden_requests() {
    let router = csrf_router();
    let mut session = SessionData::new().with_csrf_token("t0ken");

    let request = Request::post("/form").with_form_field("_method", "PUT");
    assert_eq!(router.dispatch(&request, &mut session).status(), StatusCode::FORBIDDEN);

    let request = Request::post("/form")
        .with_form_field("_method", "PUT")
        .with_form_field("csrf_token", "t0ken");
    assert_eq!(router.dispatch(&request, &mut session).body(), "replaced:");
}

#[test]
fn test_middleware_runs_in_order_and_short_circuits() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut router = dev_router();

    let first = calls.clone();
    router.register_middleware(
        "count",
        from_fn(move |_ctx| {
            first.fetch_add(1, Ordering::SeqCst);
            Outcome::Continue
        }),
    );
    let block = MiddlewareRef::inline(from_fn(|ctx| {
        if ctx.request.header("x-block").is_some() {
            Outcome::Respond(Response::text(StatusCode::IM_A_TEAPOT, "blocked"))
        } else {
            Outcome::Continue
        }
    }));

    router
        .get(route("/guarded", echo("guarded")).middleware("count").middleware(block))
        .unwrap();

    let mut session = SessionData::new();
    assert_eq!(router.dispatch(&Request::get("/guarded"), &mut session).body(), "guarded:");

    let response = router.dispatch(&Request::get("/guarded").with_header("x-block", "1"), &mut session);
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_middleware_sees_route_params_and_router() {
    let mut router = dev_router();
    router.get(route("/", echo("home")).name("home")).unwrap();
    router
        .get(
            route("/legacy/{id}", echo("legacy")).middleware(MiddlewareRef::inline(from_fn(|ctx| {
                let home = ctx.url("home", &[]).unwrap_or_default();
                match ctx.param("id").and_then(|id| id.as_int()) {
                    Some(0) => Outcome::Respond(Response::redirect(&home)),
                    _ => Outcome::Continue,
                }
            }))),
        )
        .unwrap();

    let mut session = SessionData::new();
    assert_eq!(router.dispatch(&Request::get("/legacy/0"), &mut session).location(), Some("/"));
    assert_eq!(router.dispatch(&Request::get("/legacy/4"), &mut session).body(), "legacy:4");
}

#[test]
fn test_handlers_can_use_the_session() {
    let mut router = dev_router();
    router
        .post(route(
            "/login",
            Handler::inline(|ctx, _| {
                ctx.session.set_user(Some("bob".into()));
                Ok("ok".into())
            }),
        ))
        .unwrap();

    let mut session = SessionData::new();
    router.dispatch(&Request::post("/login"), &mut session);
    assert_eq!(session.user(), Some("bob"));
}

#[test]
fn test_handler_error_page_depends_on_debug() {
    let failing = || {
        Handler::inline(|_, _| {
            Err(std::io::Error::other("disk <full>").into())
        })
    };

    let mut debug = dev_router();
    debug.get(route("/boom", failing())).unwrap();
    let mut session = SessionData::new();
    let response = debug.dispatch(&Request::get("/boom"), &mut session);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body().contains("disk &lt;full&gt;"));
    assert!(response.body().contains("GET /boom"));

    let dir = tempfile::tempdir().unwrap();
    let mut production = brick_router::Router::new(common::cached_settings(dir.path()));
    production.get(route("/boom", failing())).unwrap();
    let response = production.dispatch(&Request::get("/boom"), &mut session);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body(), "Internal Server Error");
}

#[test]
fn test_handler_panic_is_500() {
    let mut router = dev_router();
    router
        .get(route("/panic", Handler::inline(|_, _| panic!("handler exploded"))))
        .unwrap();

    let mut session = SessionData::new();
    let response = router.dispatch(&Request::get("/panic"), &mut session);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body().contains("handler exploded"));
}

#[test]
fn test_rendered_csrf_field_uses_configured_name() {
    let settings = RouterSettings {
        csrf_field: "_token".into(),
        csrf_token_bytes: 16,
        ..RouterSettings::development()
    };
    let mut router = brick_router::Router::new(settings);
    router
        .get(route("/form", Handler::inline(|ctx, _| Ok(ctx.csrf_field().into()))))
        .unwrap();
    router.post(route("/form", echo("saved")).middleware("csrf")).unwrap();

    let mut session = SessionData::new();
    let html = router.dispatch(&Request::get("/form"), &mut session).body().to_string();
    let token = session.csrf_token().unwrap().to_string();
    assert_eq!(token.len(), 32);
    assert_eq!(html, format!(r#"<input type="hidden" name="_token" value="{token}">"#));

    let request = Request::post("/form").with_form_field("_token", token.as_str());
    assert_eq!(router.dispatch(&request, &mut session).body(), "saved:");
}
