/// PostgreSQL-backed `BlogStore`
///
/// Foreign keys carry the delete rules (`ON DELETE CASCADE` for authors and
/// posts, `ON DELETE SET NULL` for groups), so deletes are single statements.
use super::BlogStore;
use crate::error::Result;
use crate::models::{
    Author, Comment, Group, GroupRef, ImageChange, NewComment, NewGroup, NewPost, NewUser, Post,
    PostChanges, PostFilter, User,
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

const POST_COLUMNS: &str = r#"
    p.id, p.text, p.created, p.image,
    p.author_id, u.username AS author_username,
    u.first_name AS author_first_name, u.last_name AS author_last_name,
    p.group_id, g.slug AS group_slug, g.title AS group_title
"#;

const COMMENT_COLUMNS: &str = r#"
    c.id, c.post_id, c.text, c.created,
    c.author_id, u.username AS author_username,
    u.first_name AS author_first_name, u.last_name AS author_last_name
"#;

#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    text: String,
    created: DateTime<Utc>,
    image: String,
    author_id: i64,
    author_username: String,
    author_first_name: String,
    author_last_name: String,
    group_id: Option<i64>,
    group_slug: Option<String>,
    group_title: Option<String>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let group = match (row.group_id, row.group_slug, row.group_title) {
            (Some(id), Some(slug), Some(title)) => Some(GroupRef { id, slug, title }),
            _ => None,
        };

        Post {
            id: row.id,
            text: row.text,
            created: row.created,
            image: row.image,
            author: Author::new(
                row.author_id,
                row.author_username,
                &row.author_first_name,
                &row.author_last_name,
            ),
            group,
        }
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    text: String,
    created: DateTime<Utc>,
    author_id: i64,
    author_username: String,
    author_first_name: String,
    author_last_name: String,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            text: row.text,
            created: row.created,
            author: Author::new(
                row.author_id,
                row.author_username,
                &row.author_first_name,
                &row.author_last_name,
            ),
        }
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BlogStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO auth_user (username, first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, first_name, last_name, email, password_hash, date_joined
            "#,
        )
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, first_name, last_name, email, password_hash, date_joined
            FROM auth_user
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, first_name, last_name, email, password_hash, date_joined
            FROM auth_user
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM auth_user WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO posts_group (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM posts_group WHERE id = $1",
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM posts_group WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM posts_group ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn delete_group(&self, group_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts_group WHERE id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let sql = format!(
            r#"
            WITH p AS (
                INSERT INTO posts_post (text, author_id, group_id, image)
                VALUES ($1, $2, $3, $4)
                RETURNING id, text, created, image, author_id, group_id
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN auth_user u ON u.id = p.author_id
            LEFT JOIN posts_group g ON g.id = p.group_id
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&post.text)
            .bind(post.author_id)
            .bind(post.group_id)
            .bind(post.image.unwrap_or_default())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        // NULL keeps the stored picture
        let image: Option<String> = match changes.image {
            ImageChange::Keep => None,
            ImageChange::Replace(path) => Some(path),
            ImageChange::Clear => Some(String::new()),
        };

        let sql = format!(
            r#"
            WITH p AS (
                UPDATE posts_post
                SET text = $1, group_id = $2, image = COALESCE($3, image)
                WHERE id = $4
                RETURNING id, text, created, image, author_id, group_id
            )
            SELECT {POST_COLUMNS}
            FROM p
            JOIN auth_user u ON u.id = p.author_id
            LEFT JOIN posts_group g ON g.id = p.group_id
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(&changes.text)
            .bind(changes.group_id)
            .bind(image)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts_post p
            JOIN auth_user u ON u.id = p.author_id
            LEFT JOIN posts_group g ON g.id = p.group_id
            WHERE p.id = $1
            "#
        );

        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM posts_post p
            WHERE ($1::BIGINT IS NULL OR p.group_id = $1)
              AND ($2::BIGINT IS NULL OR p.author_id = $2)
            "#,
        )
        .bind(filter.group_id())
        .bind(filter.author_id())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let sql = format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts_post p
            JOIN auth_user u ON u.id = p.author_id
            LEFT JOIN posts_group g ON g.id = p.group_id
            WHERE ($1::BIGINT IS NULL OR p.group_id = $1)
              AND ($2::BIGINT IS NULL OR p.author_id = $2)
            ORDER BY p.created DESC, p.id DESC
            LIMIT $3 OFFSET $4
            "#
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(filter.group_id())
            .bind(filter.author_id())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let sql = format!(
            r#"
            WITH c AS (
                INSERT INTO posts_comment (post_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, post_id, author_id, text, created
            )
            SELECT {COMMENT_COLUMNS}
            FROM c
            JOIN auth_user u ON u.id = c.author_id
            "#
        );

        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment.post_id)
            .bind(comment.author_id)
            .bind(&comment.text)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM posts_comment c
            JOIN auth_user u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created DESC, c.id DESC
            "#
        );

        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
