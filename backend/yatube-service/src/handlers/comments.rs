/// Comment handlers
use super::posts::find_post;
use super::{post_url, redirect};
use crate::auth::LoginRequired;
use crate::error::Result;
use crate::forms::{CommentForm, Submission};
use crate::metrics::{record_content_write, ContentWrite};
use crate::models::NewComment;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{debug, info};

/// Add a comment and return to the post.
///
/// An empty comment is dropped; the visitor lands on the post either way.
pub async fn add_comment(
    state: web::Data<AppState>,
    LoginRequired(user): LoginRequired,
    post_id: web::Path<i64>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let post = find_post(&state, *post_id).await?;
    let submission = Submission::read(&req, payload, state.media.max_upload_bytes()).await?;

    match CommentForm::validate(&submission) {
        Ok(text) => {
            let comment = state
                .store
                .create_comment(NewComment {
                    post_id: post.id,
                    author_id: user.id,
                    text,
                })
                .await?;

            record_content_write(ContentWrite::CommentCreated);
            info!(
                post_id = post.id,
                comment_id = comment.id,
                username = %user.username,
                "comment created"
            );
        }
        Err(form) => {
            debug!(post_id = post.id, errors = ?form.errors, "comment rejected");
        }
    }

    Ok(redirect(post_url(post.id)))
}
