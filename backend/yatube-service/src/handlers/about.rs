/// Static "about" pages
use super::base_context;
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::templates;
use actix_web::HttpResponse;

pub async fn author(user: CurrentUser) -> Result<HttpResponse> {
    templates::page("about/author.html", &base_context(&user))
}

pub async fn tech(user: CurrentUser) -> Result<HttpResponse> {
    templates::page("about/tech.html", &base_context(&user))
}
