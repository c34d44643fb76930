/// Post handlers - listings, detail page, create and edit forms
use super::{base_context, post_url, profile_url, redirect};
use crate::auth::{CurrentUser, LoginRequired};
use crate::error::{AppError, Result};
use crate::forms::{CommentForm, PostForm, Submission};
use crate::metrics::{record_content_write, ContentWrite};
use crate::models::{ImageChange, NewPost, Post, PostChanges, PostFilter};
use crate::pagination::Page;
use crate::templates;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tera::Context;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

async fn paginate(
    state: &AppState,
    filter: PostFilter,
    page_param: Option<&str>,
) -> Result<Page<Post>> {
    let count = state.store.count_posts(filter).await?;
    let window = state.paginator.locate(count, page_param);
    let posts = state
        .store
        .list_posts(filter, window.limit(), window.offset())
        .await?;
    Ok(Page::new(posts, window))
}

/// Main page: every post, newest first
pub async fn index(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = paginate(&state, PostFilter::All, query.page.as_deref()).await?;

    let mut ctx = base_context(&user);
    ctx.insert("page_obj", &page);
    templates::page("posts/index.html", &ctx)
}

/// Posts of one group
pub async fn group_posts(
    state: web::Data<AppState>,
    user: CurrentUser,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let group = state
        .store
        .find_group_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("group '{}'", slug)))?;

    let page = paginate(&state, PostFilter::Group(group.id), query.page.as_deref()).await?;

    let mut ctx = base_context(&user);
    ctx.insert("group", &group);
    ctx.insert("page_obj", &page);
    templates::page("posts/group_list.html", &ctx)
}

/// Posts of one author
pub async fn profile(
    state: web::Data<AppState>,
    user: CurrentUser,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let author = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))?;

    let page = paginate(&state, PostFilter::Author(author.id), query.page.as_deref()).await?;

    let mut ctx = base_context(&user);
    ctx.insert("author", &author.as_author());
    ctx.insert("posts_count", &page.window.count);
    ctx.insert("page_obj", &page);
    templates::page("posts/profile.html", &ctx)
}

/// One post with its comments
pub async fn post_detail(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = find_post(&state, *post_id).await?;
    render_detail(&state, &user, &post, CommentForm::default()).await
}

pub(super) async fn render_detail(
    state: &AppState,
    user: &CurrentUser,
    post: &Post,
    form: CommentForm,
) -> Result<HttpResponse> {
    let posts_count = state
        .store
        .count_posts(PostFilter::Author(post.author.id))
        .await?;
    let comments = state.store.list_comments(post.id).await?;

    let mut ctx = base_context(user);
    ctx.insert("title", &post.to_string());
    ctx.insert("post", post);
    ctx.insert("posts_count", &posts_count);
    ctx.insert("comments", &comments);
    ctx.insert("form", &form);
    templates::page("posts/post_detail.html", &ctx)
}

pub(super) async fn find_post(state: &AppState, post_id: i64) -> Result<Post> {
    state
        .store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
}

async fn post_form_context(
    state: &AppState,
    user: &CurrentUser,
    form: &PostForm,
    editing: Option<&Post>,
) -> Result<Context> {
    let groups = state.store.list_groups().await?;

    let mut ctx = base_context(user);
    ctx.insert("form", form);
    ctx.insert("groups", &groups);
    ctx.insert("is_edit", &editing.is_some());
    if let Some(post) = editing {
        ctx.insert("post_id", &post.id);
        ctx.insert("post", post);
    }
    Ok(ctx)
}

/// Empty form for a new post
pub async fn post_create_form(
    state: web::Data<AppState>,
    LoginRequired(user): LoginRequired,
) -> Result<HttpResponse> {
    let current = CurrentUser(Some(user));
    let ctx = post_form_context(&state, &current, &PostForm::default(), None).await?;
    templates::page("posts/create_post.html", &ctx)
}

/// Create a post and go to the author's profile
pub async fn post_create(
    state: web::Data<AppState>,
    LoginRequired(user): LoginRequired,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let submission = Submission::read(&req, payload, state.media.max_upload_bytes()).await?;
    let current = CurrentUser(Some(user.clone()));

    let cleaned = match PostForm::validate(&submission, state.store.as_ref(), "").await? {
        Ok(cleaned) => cleaned,
        Err(form) => {
            let ctx = post_form_context(&state, &current, &form, None).await?;
            return templates::page("posts/create_post.html", &ctx);
        }
    };

    let image = match &cleaned.image {
        Some((bytes, format)) => Some(state.media.save_image(bytes, *format).await?),
        None => None,
    };

    let created = state
        .store
        .create_post(NewPost {
            author_id: user.id,
            text: cleaned.text,
            group_id: cleaned.group_id,
            image: image.clone(),
        })
        .await;

    let post = match created {
        Ok(post) => post,
        Err(err) => {
            if let Some(path) = &image {
                state.media.discard(path).await;
            }
            return Err(err);
        }
    };

    record_content_write(ContentWrite::PostCreated);
    info!(post_id = post.id, username = %user.username, "post created");

    Ok(redirect(profile_url(&user.username)))
}

/// Edit form pre-filled from the stored post
pub async fn post_edit_form(
    state: web::Data<AppState>,
    LoginRequired(user): LoginRequired,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = find_post(&state, *post_id).await?;
    if post.author.id != user.id {
        return Ok(redirect(post_url(post.id)));
    }

    let current = CurrentUser(Some(user));
    let ctx = post_form_context(&state, &current, &PostForm::for_post(&post), Some(&post)).await?;
    templates::page("posts/create_post.html", &ctx)
}

/// Save changes to a post; only its author may do so
pub async fn post_edit(
    state: web::Data<AppState>,
    LoginRequired(user): LoginRequired,
    post_id: web::Path<i64>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    let post = find_post(&state, *post_id).await?;
    if post.author.id != user.id {
        info!(post_id = post.id, username = %user.username, "edit refused for non-author");
        return Ok(redirect(post_url(post.id)));
    }

    let submission = Submission::read(&req, payload, state.media.max_upload_bytes()).await?;
    let current = CurrentUser(Some(user.clone()));

    let cleaned = match PostForm::validate(&submission, state.store.as_ref(), &post.image).await? {
        Ok(cleaned) => cleaned,
        Err(form) => {
            let ctx = post_form_context(&state, &current, &form, Some(&post)).await?;
            return templates::page("posts/create_post.html", &ctx);
        }
    };

    let image = match &cleaned.image {
        Some((bytes, format)) => ImageChange::Replace(state.media.save_image(bytes, *format).await?),
        None if cleaned.clear_image => ImageChange::Clear,
        None => ImageChange::Keep,
    };

    let new_image = match &image {
        ImageChange::Replace(path) => Some(path.clone()),
        _ => None,
    };

    let updated = state
        .store
        .update_post(
            post.id,
            PostChanges {
                text: cleaned.text,
                group_id: cleaned.group_id,
                image,
            },
        )
        .await
        .and_then(|updated| {
            updated.ok_or_else(|| AppError::NotFound(format!("post {}", post.id)))
        });

    let updated = match updated {
        Ok(updated) => updated,
        Err(err) => {
            if let Some(path) = &new_image {
                state.media.discard(path).await;
            }
            return Err(err);
        }
    };

    record_content_write(ContentWrite::PostEdited);
    info!(post_id = updated.id, username = %user.username, "post edited");

    Ok(redirect(post_url(updated.id)))
}
