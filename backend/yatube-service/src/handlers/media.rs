/// Uploaded post images
use crate::error::Result;
use crate::AppState;
use actix_web::{http::header, web, HttpResponse};

pub async fn serve_post_image(
    state: web::Data<AppState>,
    file: web::Path<String>,
) -> Result<HttpResponse> {
    let (bytes, mime) = state.media.open(&file).await?;

    Ok(HttpResponse::Ok()
        .content_type(mime)
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(bytes))
}
