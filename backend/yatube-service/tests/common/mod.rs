#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::{http::header, test, web, App};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tempfile::TempDir;

use yatube_service::auth::{hash_password, SessionKeys};
use yatube_service::config::{MediaConfig, SessionConfig};
use yatube_service::db::{BlogStore, MemoryStore};
use yatube_service::media::MediaStorage;
use yatube_service::middleware::MetricsMiddleware;
use yatube_service::models::{Group, NewGroup, NewPost, NewUser, Post, User};
use yatube_service::pagination::Paginator;
use yatube_service::{configure, AppState};

pub const PASSWORD: &str = "Test-pass-2024";

// 1x1 transparent GIF
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// App state over a fresh `MemoryStore` and a temporary media root
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: web::Data<AppState>,
    pub media_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let media_dir = tempfile::tempdir().expect("temp media dir");
        let state = app_state(store.clone(), &media_dir);

        Self {
            store,
            state,
            media_dir,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.store
            .create_user(NewUser {
                username: username.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                password_hash: hash_password(PASSWORD).expect("hash"),
            })
            .await
            .expect("create user")
    }

    pub async fn group(&self, slug: &str, title: &str) -> Group {
        self.store
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: String::new(),
            })
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &User, group: Option<&Group>, text: &str) -> Post {
        self.store
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .expect("create post")
    }

    pub async fn post_at(
        &self,
        author: &User,
        group: Option<&Group>,
        text: &str,
        created: DateTime<Utc>,
    ) -> Post {
        self.store
            .create_post_at(
                NewPost {
                    author_id: author.id,
                    text: text.to_string(),
                    group_id: group.map(|g| g.id),
                    image: None,
                },
                created,
            )
            .await
            .expect("create post")
    }

    pub fn session_cookie(&self, user: &User) -> Cookie<'static> {
        self.state
            .sessions
            .login_cookie(user)
            .expect("session cookie")
    }

    /// Send a request through the full application
    pub async fn call(&self, req: test::TestRequest) -> ServiceResponse {
        call_app(&self.state, req).await
    }

    pub async fn get(&self, uri: &str) -> ServiceResponse {
        self.call(test::TestRequest::get().uri(uri)).await
    }

    pub async fn get_as(&self, user: &User, uri: &str) -> ServiceResponse {
        self.call(
            test::TestRequest::get()
                .uri(uri)
                .cookie(self.session_cookie(user)),
        )
        .await
    }

    pub async fn post_form(&self, uri: &str, form: &[(&str, &str)]) -> ServiceResponse {
        self.call(test::TestRequest::post().uri(uri).set_form(form))
            .await
    }

    pub async fn post_form_as(
        &self,
        user: &User,
        uri: &str,
        form: &[(&str, &str)],
    ) -> ServiceResponse {
        self.call(
            test::TestRequest::post()
                .uri(uri)
                .cookie(self.session_cookie(user))
                .set_form(form),
        )
        .await
    }

    pub async fn post_multipart_as(
        &self,
        user: &User,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> ServiceResponse {
        let (content_type, body) = multipart_body(fields, file);
        self.call(
            test::TestRequest::post()
                .uri(uri)
                .cookie(self.session_cookie(user))
                .insert_header((header::CONTENT_TYPE, content_type))
                .set_payload(body),
        )
        .await
    }
}

/// Test settings over any store, with uploads under `media_dir`
pub fn app_state(store: Arc<dyn BlogStore>, media_dir: &TempDir) -> web::Data<AppState> {
    web::Data::new(AppState {
        store,
        sessions: SessionKeys::new(&SessionConfig::default()),
        media: MediaStorage::new(&MediaConfig {
            root: media_dir.path().to_path_buf(),
            max_upload_bytes: 64 * 1024,
        }),
        paginator: Paginator::new(10),
    })
}

pub async fn call_app(state: &web::Data<AppState>, req: test::TestRequest) -> ServiceResponse {
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap(MetricsMiddleware)
            .configure(configure),
    )
    .await;
    test::call_service(&app, req.to_request()).await
}

/// Number of files saved under the media `posts/` directory
pub fn stored_uploads(media_dir: &TempDir) -> usize {
    std::fs::read_dir(media_dir.path().join("posts"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

/// Encode text fields and an optional `(field, filename, bytes)` file
pub fn multipart_body(
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> (String, Vec<u8>) {
    let boundary = "----yatube-test-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    if let Some((name, filename, bytes)) = file {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}

pub fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn template(resp: &ServiceResponse) -> String {
    resp.headers()
        .get("X-Template")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body(resp: ServiceResponse) -> String {
    let bytes = test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Number of post cards on a listing page
pub fn card_count(html: &str) -> usize {
    html.matches("<article").count()
}
