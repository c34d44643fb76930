mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use common::{
    app_state, body, call_app, location, multipart_body, stored_uploads, template, TestContext,
    SMALL_GIF,
};
use std::sync::Arc;
use yatube_service::db::{BlogStore, MemoryStore};
use yatube_service::error::Result;
use yatube_service::forms::post::INVALID_CHOICE;
use yatube_service::forms::REQUIRED;
use yatube_service::models::{
    Comment, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostChanges, PostFilter, User,
};

/// Store whose group lookups still see groups that were deleted after the
/// form was validated
struct StaleGroupStore {
    inner: MemoryStore,
}

#[async_trait::async_trait]
impl BlogStore for StaleGroupStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.inner.create_user(user).await
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        self.inner.find_user(user_id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.find_user_by_username(username).await
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool> {
        self.inner.delete_user(user_id).await
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        self.inner.create_group(group).await
    }

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>> {
        Ok(Some(Group {
            id: group_id,
            title: "Удалённая группа".to_string(),
            slug: "deleted".to_string(),
            description: String::new(),
        }))
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        self.inner.find_group_by_slug(slug).await
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        self.inner.list_groups().await
    }

    async fn delete_group(&self, group_id: i64) -> Result<bool> {
        self.inner.delete_group(group_id).await
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        self.inner.create_post(post).await
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        self.inner.update_post(post_id, changes).await
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        self.inner.find_post(post_id).await
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        self.inner.count_posts(filter).await
    }

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        self.inner.list_posts(filter, limit, offset).await
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        self.inner.create_comment(comment).await
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.inner.list_comments(post_id).await
    }
}

async fn post_count(ctx: &TestContext) -> i64 {
    ctx.store.count_posts(PostFilter::All).await.unwrap()
}

#[actix_web::test]
async fn test_create_post() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;
    let group = ctx.group("test-slug", "Тестовая группа").await;
    let before = post_count(&ctx).await;

    let resp = ctx
        .post_form_as(
            &author,
            "/create/",
            &[("text", "Тестовый текст"), ("group", &group.id.to_string())],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/TestUser/");
    assert_eq!(post_count(&ctx).await, before + 1);

    let newest = ctx.store.list_posts(PostFilter::All, 1, 0).await.unwrap();
    let post = &newest[0];
    assert_eq!(post.text, "Тестовый текст");
    assert_eq!(post.author.id, author.id);
    assert_eq!(post.group.as_ref().map(|g| g.id), Some(group.id));
    assert!(!post.has_image());
}

#[actix_web::test]
async fn test_create_post_with_image() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;

    let resp = ctx
        .post_multipart_as(
            &author,
            "/create/",
            &[("text", "Пост с картинкой"), ("group", "")],
            Some(("image", "small.gif", SMALL_GIF)),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/TestUser/");

    let posts = ctx.store.list_posts(PostFilter::All, 10, 0).await.unwrap();
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert!(post.group.is_none());
    assert!(post.image.starts_with("posts/"));
    assert!(post.image.ends_with(".gif"));
    assert!(ctx.media_dir.path().join(&post.image).exists());

    let resp = ctx.get(&format!("/media/{}", post.image)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("content-type").unwrap(), "image/gif");
}

#[actix_web::test]
async fn test_create_post_rejects_non_image_upload() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;

    let resp = ctx
        .post_multipart_as(
            &author,
            "/create/",
            &[("text", "Пост с картинкой")],
            Some(("image", "notes.gif", b"definitely not a picture")),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(template(&resp), "posts/create_post.html");
    assert!(body(resp).await.contains("Загрузите правильное изображение."));
    assert_eq!(post_count(&ctx).await, 0);
}

#[actix_web::test]
async fn test_create_post_requires_text() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;

    let resp = ctx
        .post_form_as(&author, "/create/", &[("text", ""), ("group", "")])
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(template(&resp), "posts/create_post.html");
    assert!(body(resp).await.contains(REQUIRED));
    assert_eq!(post_count(&ctx).await, 0);
}

#[actix_web::test]
async fn test_create_post_with_unknown_group() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;

    let resp = ctx
        .post_form_as(&author, "/create/", &[("text", "Текст"), ("group", "999")])
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body(resp).await;
    assert!(html.contains(INVALID_CHOICE));
    // submitted text is kept in the form
    assert!(html.contains(">Текст</textarea>"));
    assert_eq!(post_count(&ctx).await, 0);
}

#[actix_web::test]
async fn test_anonymous_cannot_create_post() {
    let ctx = TestContext::new();

    let resp = ctx.post_form("/create/", &[("text", "Аноним")]).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
    assert_eq!(post_count(&ctx).await, 0);
}

#[actix_web::test]
async fn test_edit_post() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;
    let group = ctx.group("test-slug", "Тестовая группа").await;
    let new_group = ctx.group("new-slug", "Новая группа").await;
    let post = ctx.post(&author, Some(&group), "Тестовый текст").await;

    let resp = ctx
        .post_form_as(
            &author,
            &format!("/posts/{}/edit/", post.id),
            &[("text", "Изменённый текст"), ("group", &new_group.id.to_string())],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let edited = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(edited.text, "Изменённый текст");
    assert_eq!(edited.group.map(|g| g.id), Some(new_group.id));
    assert_eq!(edited.created, post.created);
    assert_eq!(post_count(&ctx).await, 1);
}

#[actix_web::test]
async fn test_edit_post_can_clear_group() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;
    let group = ctx.group("test-slug", "Тестовая группа").await;
    let post = ctx.post(&author, Some(&group), "Тестовый текст").await;

    let resp = ctx
        .post_form_as(
            &author,
            &format!("/posts/{}/edit/", post.id),
            &[("text", "Тестовый текст"), ("group", "")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let edited = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert!(edited.group.is_none());
}

#[actix_web::test]
async fn test_edit_post_keeps_and_clears_image() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;

    ctx.post_multipart_as(
        &author,
        "/create/",
        &[("text", "С картинкой")],
        Some(("image", "small.gif", SMALL_GIF)),
    )
    .await;
    let post = ctx.store.list_posts(PostFilter::All, 1, 0).await.unwrap()[0].clone();
    assert!(post.has_image());
    let edit = format!("/posts/{}/edit/", post.id);

    // no new file: the stored picture stays
    ctx.post_multipart_as(&author, &edit, &[("text", "Новый текст")], None)
        .await;
    let kept = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(kept.text, "Новый текст");
    assert_eq!(kept.image, post.image);

    ctx.post_multipart_as(
        &author,
        &edit,
        &[("text", "Без картинки"), ("image-clear", "on")],
        None,
    )
    .await;
    let cleared = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert!(!cleared.has_image());
}

#[actix_web::test]
async fn test_invalid_edit_leaves_post_unchanged() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;
    let post = ctx.post(&author, None, "Тестовый текст").await;

    let resp = ctx
        .post_form_as(&author, &format!("/posts/{}/edit/", post.id), &[])
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(template(&resp), "posts/create_post.html");
    assert!(body(resp).await.contains(REQUIRED));

    let stored = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Тестовый текст");
}

#[actix_web::test]
async fn test_non_author_cannot_edit() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;
    let intruder = ctx.user("Intruder").await;
    let post = ctx.post(&author, None, "Тестовый текст").await;

    let resp = ctx
        .post_form_as(
            &intruder,
            &format!("/posts/{}/edit/", post.id),
            &[("text", "Взлом")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let stored = ctx.store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Тестовый текст");
}

#[actix_web::test]
async fn test_authorized_user_can_comment() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;
    let reader = ctx.user("Reader").await;
    let post = ctx.post(&author, None, "Тестовый текст").await;

    let resp = ctx
        .post_form_as(
            &reader,
            &format!("/posts/{}/comment/", post.id),
            &[("text", "Тестовый комментарий")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let comments = ctx.store.list_comments(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Тестовый комментарий");
    assert_eq!(comments[0].author.id, reader.id);

    let html = body(ctx.get(&format!("/posts/{}/", post.id)).await).await;
    assert!(html.contains("Тестовый комментарий"));
}

#[actix_web::test]
async fn test_anonymous_comment_is_not_saved() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;
    let post = ctx.post(&author, None, "Тестовый текст").await;

    let resp = ctx
        .post_form(
            &format!("/posts/{}/comment/", post.id),
            &[("text", "Тестовый комментарий")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/"));
    assert!(ctx.store.list_comments(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_empty_comment_is_not_saved() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;
    let post = ctx.post(&author, None, "Тестовый текст").await;

    let resp = ctx
        .post_form_as(&author, &format!("/posts/{}/comment/", post.id), &[("text", "  ")])
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert!(ctx.store.list_comments(post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_comment_on_missing_post_is_404() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;

    let resp = ctx
        .post_form_as(&author, "/posts/999/comment/", &[("text", "Привет")])
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_post_and_comment_text_is_stored_trimmed() {
    let ctx = TestContext::new();
    let author = ctx.user("TestUser").await;

    let resp = ctx
        .post_form_as(&author, "/create/", &[("text", "  Тестовый текст \n")])
        .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let post = ctx.store.list_posts(PostFilter::All, 1, 0).await.unwrap()[0].clone();
    assert_eq!(post.text, "Тестовый текст");

    ctx.post_form_as(
        &author,
        &format!("/posts/{}/comment/", post.id),
        &[("text", "\t Отличный пост  ")],
    )
    .await;
    let comments = ctx.store.list_comments(post.id).await.unwrap();
    assert_eq!(comments[0].text, "Отличный пост");
}

#[actix_web::test]
async fn test_failed_post_write_discards_upload() {
    let store = Arc::new(StaleGroupStore {
        inner: MemoryStore::new(),
    });
    let media_dir = tempfile::tempdir().unwrap();
    let state = app_state(store.clone(), &media_dir);

    let author = store
        .create_user(NewUser {
            username: "TestUser".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: String::new(),
        })
        .await
        .unwrap();
    let cookie = state.sessions.login_cookie(&author).unwrap();

    // the group passes validation but is gone by the time the post is written
    let (content_type, payload) = multipart_body(
        &[("text", "Пост с картинкой"), ("group", "999")],
        Some(("image", "small.gif", SMALL_GIF)),
    );
    let resp = call_app(
        &state,
        TestRequest::post()
            .uri("/create/")
            .cookie(cookie.clone())
            .insert_header(("content-type", content_type))
            .set_payload(payload),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.count_posts(PostFilter::All).await.unwrap(), 0);
    assert_eq!(stored_uploads(&media_dir), 0);

    let post = store
        .create_post(NewPost {
            author_id: author.id,
            text: "Без картинки".to_string(),
            group_id: None,
            image: None,
        })
        .await
        .unwrap();

    let (content_type, payload) = multipart_body(
        &[("text", "С картинкой"), ("group", "999")],
        Some(("image", "small.gif", SMALL_GIF)),
    );
    let resp = call_app(
        &state,
        TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .cookie(cookie)
            .insert_header(("content-type", content_type))
            .set_payload(payload),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stored_uploads(&media_dir), 0);

    let stored = store.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Без картинки");
    assert!(!stored.has_image());
}
