/// Yatube Service Library
///
/// A small blogging site: users write posts, optionally in a group and with
/// a picture, and comment on each other's posts.
///
/// # Modules
///
/// - `handlers`: HTML pages and operational endpoints
/// - `models`: users, groups, posts and comments
/// - `db`: storage trait with PostgreSQL and in-memory implementations
/// - `forms`: form decoding and validation
/// - `auth`: passwords, session cookies and user extractors
/// - `pagination`: page-number pagination of listings
/// - `templates`: embedded Tera templates
/// - `media`: uploaded images on disk
/// - `admin`: maintenance commands run from the CLI
/// - `middleware`, `metrics`: request metrics and Prometheus collectors
/// - `error`, `config`: error types and configuration
pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod templates;

pub use config::Config;
pub use error::{AppError, Result};

use auth::SessionKeys;
use db::BlogStore;
use media::MediaStorage;
use pagination::Paginator;
use std::sync::Arc;

/// Shared state handed to every handler through `web::Data`
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub sessions: SessionKeys,
    pub media: MediaStorage,
    pub paginator: Paginator,
}

impl AppState {
    pub fn new(store: Arc<dyn BlogStore>, config: &Config) -> Self {
        Self {
            store,
            sessions: SessionKeys::new(&config.session),
            media: MediaStorage::new(&config.media),
            paginator: Paginator::new(config.pagination.posts_per_page),
        }
    }
}

pub use handlers::configure;
