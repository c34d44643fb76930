/// Database access layer
///
/// This module provides:
/// - The `BlogStore` trait every handler talks to
/// - `PgStore`: PostgreSQL implementation (sqlx)
/// - `MemoryStore`: in-process implementation with the same relational rules
/// - Connection pool creation and migrations
pub mod memory_store;
pub mod pg_store;
pub mod pool;

pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
pub use pool::{create_pool, run_migrations};

use crate::error::Result;
use crate::models::{
    Comment, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostChanges, PostFilter, User,
};

/// Storage operations for users, groups, posts and comments.
///
/// Implementations must keep these relational rules:
/// - deleting a user deletes their posts, their comments and every comment
///   under their posts;
/// - deleting a group clears `group` on its posts and keeps the posts;
/// - deleting a post deletes its comments;
/// - usernames and group slugs are unique (`AppError::Conflict`);
/// - a post or comment referencing a missing author, group or post is
///   rejected with `AppError::ValidationError`;
/// - listings are newest-first (`created DESC, id DESC`).
#[async_trait::async_trait]
pub trait BlogStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, user_id: i64) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Returns false when the user did not exist
    async fn delete_user(&self, user_id: i64) -> Result<bool>;

    async fn create_group(&self, group: NewGroup) -> Result<Group>;

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// All groups ordered by title
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// Returns false when the group did not exist
    async fn delete_group(&self, group_id: i64) -> Result<bool>;

    async fn create_post(&self, post: NewPost) -> Result<Post>;

    /// Returns None when the post does not exist
    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>>;

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>>;

    async fn count_posts(&self, filter: PostFilter) -> Result<i64>;

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>>;

    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;

    /// Comments under a post, newest first
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>>;

    /// Health check (optional)
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
