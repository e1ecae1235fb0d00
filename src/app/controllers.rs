//! Demo controllers.

use axum::http::StatusCode;
use dashmap::DashMap;
use serde_json::json;

use crate::handler::{Controller, HandlerResult, RequestContext};
use crate::http::response::escape_html;
use crate::http::Response;
use crate::routing::ParamValue;
use crate::security::csrf;
use crate::session::{Flash, FlashKind};

fn unknown_action(controller: &str, action: &str) -> HandlerResult {
    Err(format!("{controller} has no action '{action}'").into())
}

fn layout(ctx: &mut RequestContext<'_>, title: &str, content: &str) -> String {
    let flash = ctx
        .session
        .take_flash()
        .map(|f| {
            let kind = match f.kind {
                FlashKind::Success => "success",
                FlashKind::Error => "error",
                FlashKind::Info => "info",
            };
            format!(r#"<div class="flash flash-{kind}">{}</div>"#, escape_html(&f.message))
        })
        .unwrap_or_default();

    // Advertise the token only once the page has used one.
    let meta = ctx.session.csrf_token().map(csrf::meta_tag).unwrap_or_default();

    format!(
        "<!DOCTYPE html><html><head><title>{title}</title>{meta}</head><body>{flash}{content}</body></html>",
        title = escape_html(title),
    )
}

fn redirect_to(ctx: &RequestContext<'_>, name: &str) -> Response {
    let location = ctx.url(name, &[]).unwrap_or_else(|_| "/".to_string());
    Response::redirect(&location)
}

pub struct HomeController;

impl Controller for HomeController {
    fn actions(&self) -> &[&'static str] {
        &["index"]
    }

    fn call(&self, action: &str, ctx: &mut RequestContext<'_>, _args: &[ParamValue]) -> HandlerResult {
        match action {
            "index" => {
                let greeting = match ctx.session.user().map(escape_html) {
                    Some(user) => {
                        let logout = ctx.url("logout", &[]).unwrap_or_else(|_| "/logout".to_string());
                        format!(
                            r#"<p>Signed in as {user}</p><form method="post" action="{logout}">{}<button type="submit">Log out</button></form>"#,
                            ctx.csrf_field()
                        )
                    }
                    None => "<p>Not signed in</p>".to_string(),
                };
                let content = format!("<h1>Brick Router</h1>{greeting}");
                Ok(layout(ctx, "Home", &content).into())
            }
            other => unknown_action("HomeController", other),
        }
    }
}

/// Login, registration and logout against an in-memory account list.
pub struct AuthController {
    accounts: DashMap<String, String>,
}

impl AuthController {
    pub fn new() -> Self {
        let accounts = DashMap::new();
        accounts.insert("demo@example.com".to_string(), "secret".to_string());
        Self { accounts }
    }

    fn credentials<'r>(ctx: &'r RequestContext<'_>) -> Option<(&'r str, &'r str)> {
        let email = ctx.request.form_field("email").map(str::trim).filter(|e| !e.is_empty())?;
        let password = ctx.request.form_field("password").filter(|p| !p.is_empty())?;
        Some((email, password))
    }

    fn form(ctx: &mut RequestContext<'_>, title: &str, action: &str) -> String {
        let field = ctx.csrf_field();
        let content = format!(
            r#"<h1>{title}</h1><form method="post" action="{action}">{field}<input name="email" type="email"><input name="password" type="password"><button type="submit">{title}</button></form>"#
        );
        layout(ctx, title, &content)
    }
}

impl Default for AuthController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for AuthController {
    fn actions(&self) -> &[&'static str] {
        &["login_form", "login", "register_form", "register", "logout"]
    }

    fn call(&self, action: &str, ctx: &mut RequestContext<'_>, _args: &[ParamValue]) -> HandlerResult {
        match action {
            "login_form" => Ok(Self::form(ctx, "Login", "/login").into()),
            "register_form" => Ok(Self::form(ctx, "Register", "/register").into()),
            "login" => {
                let user = Self::credentials(ctx).and_then(|(email, password)| {
                    self.accounts
                        .get(email)
                        .filter(|stored| stored.value() == password)
                        .map(|_| email.to_string())
                });
                match user {
                    Some(email) => {
                        tracing::info!(user = %email, "User logged in");
                        ctx.session.set_user(Some(email));
                        ctx.session.set_flash(Flash::new(FlashKind::Success, "Logged in"));
                        Ok(redirect_to(ctx, "home").into())
                    }
                    None => {
                        ctx.session
                            .set_flash(Flash::new(FlashKind::Error, "Invalid email or password"));
                        Ok(redirect_to(ctx, "login").into())
                    }
                }
            }
            "register" => {
                let Some((email, password)) = Self::credentials(ctx).map(|(e, p)| (e.to_string(), p.to_string())) else {
                    ctx.session.set_flash(Flash::new(FlashKind::Error, "All fields are required"));
                    return Ok(redirect_to(ctx, "register").into());
                };
                if self.accounts.contains_key(&email) {
                    ctx.session.set_flash(Flash::new(FlashKind::Error, "Email already registered"));
                    return Ok(redirect_to(ctx, "register").into());
                }
                self.accounts.insert(email.clone(), password);
                ctx.session.set_user(Some(email));
                ctx.session.set_flash(Flash::new(FlashKind::Success, "Account created"));
                Ok(redirect_to(ctx, "home").into())
            }
            "logout" => {
                ctx.session.set_user(None);
                ctx.session.set_flash(Flash::new(FlashKind::Info, "Logged out"));
                Ok(redirect_to(ctx, "login").into())
            }
            other => unknown_action("AuthController", other),
        }
    }
}

/// REST resource over a fixed list of posts.
pub struct PostController;

const POSTS: [&str; 3] = ["Hello router", "Groups and prefixes", "Caching routes"];

impl PostController {
    fn find(args: &[ParamValue]) -> Option<(i64, &'static str)> {
        let id = args.first()?.as_int()?;
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        POSTS.get(index).map(|title| (id, *title))
    }
}

impl Controller for PostController {
    fn actions(&self) -> &[&'static str] {
        &["index", "create", "store", "show", "edit", "update", "destroy"]
    }

    fn call(&self, action: &str, ctx: &mut RequestContext<'_>, args: &[ParamValue]) -> HandlerResult {
        match action {
            "index" => {
                let items: String = (1..=POSTS.len())
                    .zip(POSTS)
                    .map(|(id, title)| {
                        let href = ctx.url("posts.show", &[("id", &id)]).unwrap_or_default();
                        format!(r#"<li><a href="{href}">{}</a></li>"#, escape_html(title))
                    })
                    .collect();
                Ok(layout(ctx, "Posts", &format!("<h1>Posts</h1><ul>{items}</ul>")).into())
            }
            "show" | "edit" => match Self::find(args) {
                Some((id, title)) => {
                    let content = format!("<h1>{}</h1><p>Post #{id}</p>", escape_html(title));
                    Ok(layout(ctx, title, &content).into())
                }
                None => Ok(Response::not_found().into()),
            },
            "create" => Ok(layout(ctx, "New post", "<h1>New post</h1>").into()),
            "store" => Ok(Response::redirect("/posts").with_status(StatusCode::SEE_OTHER).into()),
            "update" | "destroy" => match Self::find(args) {
                Some((id, _)) => Ok(Response::json(StatusCode::OK, &json!({ "success": true, "id": id })).into()),
                None => Ok(Response::json_error(StatusCode::NOT_FOUND, "Post not found").into()),
            },
            other => unknown_action("PostController", other),
        }
    }
}

/// JSON endpoints mounted under `/api`.
pub struct ApiController;

impl Controller for ApiController {
    fn actions(&self) -> &[&'static str] {
        &["status", "post"]
    }

    fn call(&self, action: &str, ctx: &mut RequestContext<'_>, args: &[ParamValue]) -> HandlerResult {
        match action {
            "status" => Ok(Response::json(
                StatusCode::OK,
                &json!({ "success": true, "authenticated": ctx.session.user().is_some() }),
            )
            .into()),
            "post" => match PostController::find(args) {
                Some((id, title)) => Ok(Response::json(
                    StatusCode::OK,
                    &json!({ "success": true, "data": { "id": id, "title": title } }),
                )
                .into()),
                None => Ok(Response::json_error(StatusCode::NOT_FOUND, "Post not found").into()),
            },
            other => unknown_action("ApiController", other),
        }
    }
}
