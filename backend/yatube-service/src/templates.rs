//! HTML templates
//!
//! Templates are compiled into the binary and parsed once on first use.

use crate::error::Result;
use actix_web::{http::header::ContentType, http::StatusCode, HttpResponse};
use once_cell::sync::Lazy;
use tera::{Context, Tera};

static TERA: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();

    // added together so `extends` can resolve regardless of order
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        (
            "includes/header.html",
            include_str!("../templates/includes/header.html"),
        ),
        (
            "includes/paginator.html",
            include_str!("../templates/includes/paginator.html"),
        ),
        (
            "includes/post_card.html",
            include_str!("../templates/includes/post_card.html"),
        ),
        (
            "posts/index.html",
            include_str!("../templates/posts/index.html"),
        ),
        (
            "posts/group_list.html",
            include_str!("../templates/posts/group_list.html"),
        ),
        (
            "posts/profile.html",
            include_str!("../templates/posts/profile.html"),
        ),
        (
            "posts/post_detail.html",
            include_str!("../templates/posts/post_detail.html"),
        ),
        (
            "posts/create_post.html",
            include_str!("../templates/posts/create_post.html"),
        ),
        (
            "users/signup.html",
            include_str!("../templates/users/signup.html"),
        ),
        (
            "users/login.html",
            include_str!("../templates/users/login.html"),
        ),
        (
            "users/logged_out.html",
            include_str!("../templates/users/logged_out.html"),
        ),
        (
            "about/author.html",
            include_str!("../templates/about/author.html"),
        ),
        ("about/tech.html", include_str!("../templates/about/tech.html")),
        ("core/404.html", include_str!("../templates/core/404.html")),
        ("core/500.html", include_str!("../templates/core/500.html")),
    ])
    .expect("Failed to load embedded templates");

    tera
});

/// Render a template by name
pub fn render(name: &str, context: &Context) -> Result<String> {
    Ok(TERA.render(name, context)?)
}

/// Render a template into a 200 HTML response
pub fn page(name: &str, context: &Context) -> Result<HttpResponse> {
    page_with_status(StatusCode::OK, name, context)
}

pub fn page_with_status(status: StatusCode, name: &str, context: &Context) -> Result<HttpResponse> {
    let body = render(name, context)?;
    Ok(HttpResponse::build(status)
        .insert_header(ContentType::html())
        .insert_header(("X-Template", name.to_string()))
        .body(body))
}

/// Names of every embedded template
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = TERA.get_template_names().collect();
    names.sort_unstable();
    names
}
