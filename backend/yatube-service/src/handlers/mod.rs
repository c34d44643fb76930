/// HTTP handlers for yatube-service
///
/// Every page handler renders a template from `templates/` with a context
/// that always carries `user` (the logged-in user or null).
pub mod about;
pub mod comments;
pub mod health;
pub mod media;
pub mod posts;
pub mod users;

use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::metrics::serve_metrics;
use crate::templates;
use actix_web::{http::header, http::StatusCode, web, HttpRequest, HttpResponse};
use tera::Context;

/// Register every route of the site
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::NotFound(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .route("/", web::get().to(posts::index))
    .route("/group/{slug}/", web::get().to(posts::group_posts))
    .route("/profile/{username}/", web::get().to(posts::profile))
    .route("/posts/{post_id}/", web::get().to(posts::post_detail))
    .service(
        web::resource("/create/")
            .route(web::get().to(posts::post_create_form))
            .route(web::post().to(posts::post_create)),
    )
    .service(
        web::resource("/posts/{post_id}/edit/")
            .route(web::get().to(posts::post_edit_form))
            .route(web::post().to(posts::post_edit)),
    )
    .route(
        "/posts/{post_id}/comment/",
        web::post().to(comments::add_comment),
    )
    .route("/media/posts/{file}", web::get().to(media::serve_post_image))
    .service(
        web::resource("/auth/signup/")
            .route(web::get().to(users::signup_form))
            .route(web::post().to(users::signup)),
    )
    .service(
        web::resource("/auth/login/")
            .route(web::get().to(users::login_form))
            .route(web::post().to(users::login)),
    )
    .service(
        web::resource("/auth/logout/")
            .route(web::get().to(users::logout))
            .route(web::post().to(users::logout)),
    )
    .route("/about/author/", web::get().to(about::author))
    .route("/about/tech/", web::get().to(about::tech))
    .route("/api/v1/health", web::get().to(health::health_summary))
    .route("/api/v1/health/live", web::get().to(health::liveness_check))
    .route("/metrics", web::get().to(serve_metrics))
    .default_service(web::to(not_found));
}

/// Template context with the current user filled in
pub fn base_context(user: &CurrentUser) -> Context {
    let mut ctx = Context::new();
    ctx.insert("user", &user.user());
    ctx
}

pub fn redirect(location: impl Into<String>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.into()))
        .finish()
}

pub fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

/// Fallback for unknown routes
pub async fn not_found(req: HttpRequest, user: CurrentUser) -> Result<HttpResponse> {
    let mut ctx = base_context(&user);
    ctx.insert("path", req.path());
    templates::page_with_status(StatusCode::NOT_FOUND, "core/404.html", &ctx)
}
