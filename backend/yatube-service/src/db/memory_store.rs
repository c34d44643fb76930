/// In-process `BlogStore`
///
/// Keeps every table behind one `RwLock` so a cascade is applied atomically.
/// Used with `STORAGE_BACKEND=memory` and by the HTTP test suites.
use super::BlogStore;
use crate::error::{AppError, Result};
use crate::models::{
    Comment, Group, GroupRef, ImageChange, NewComment, NewGroup, NewPost, NewUser, Post,
    PostChanges, PostFilter, User,
};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PostRecord {
    id: i64,
    text: String,
    created: DateTime<Utc>,
    image: String,
    author_id: i64,
    group_id: Option<i64>,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    id: i64,
    post_id: i64,
    author_id: i64,
    text: String,
    created: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, PostRecord>,
    comments: BTreeMap<i64, CommentRecord>,
    last_user_id: i64,
    last_group_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
}

impl Tables {
    fn post_view(&self, record: &PostRecord) -> Result<Post> {
        let author = self.users.get(&record.author_id).ok_or_else(|| {
            AppError::Internal(format!("post {} has no author", record.id))
        })?;

        Ok(Post {
            id: record.id,
            text: record.text.clone(),
            created: record.created,
            image: record.image.clone(),
            author: author.as_author(),
            group: record
                .group_id
                .and_then(|id| self.groups.get(&id))
                .map(GroupRef::from),
        })
    }

    fn comment_view(&self, record: &CommentRecord) -> Result<Comment> {
        let author = self.users.get(&record.author_id).ok_or_else(|| {
            AppError::Internal(format!("comment {} has no author", record.id))
        })?;

        Ok(Comment {
            id: record.id,
            post_id: record.post_id,
            text: record.text.clone(),
            created: record.created,
            author: author.as_author(),
        })
    }

    fn filtered_posts(&self, filter: PostFilter) -> Vec<&PostRecord> {
        let mut posts: Vec<&PostRecord> = self
            .posts
            .values()
            .filter(|p| match filter {
                PostFilter::All => true,
                PostFilter::Group(id) => p.group_id == Some(id),
                PostFilter::Author(id) => p.author_id == id,
            })
            .collect();
        posts.sort_by_key(|p| Reverse((p.created, p.id)));
        posts
    }

    fn check_group(&self, group_id: Option<i64>) -> Result<()> {
        match group_id {
            Some(id) if !self.groups.contains_key(&id) => Err(AppError::ValidationError(
                format!("group {} does not exist", id),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a post with an explicit timestamp
    pub async fn create_post_at(&self, post: NewPost, created: DateTime<Utc>) -> Result<Post> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&post.author_id) {
            return Err(AppError::ValidationError(format!(
                "user {} does not exist",
                post.author_id
            )));
        }
        tables.check_group(post.group_id)?;

        tables.last_post_id += 1;
        let record = PostRecord {
            id: tables.last_post_id,
            text: post.text,
            created,
            image: post.image.unwrap_or_default(),
            author_id: post.author_id,
            group_id: post.group_id,
        };
        let view = tables.post_view(&record)?;
        tables.posts.insert(record.id, record);

        Ok(view)
    }
}

#[async_trait::async_trait]
impl BlogStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "username '{}' is already taken",
                user.username
            )));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            date_joined: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;

        if tables.users.remove(&user_id).is_none() {
            return Ok(false);
        }

        tables.posts.retain(|_, p| p.author_id != user_id);
        let Tables {
            posts, comments, ..
        } = &mut *tables;
        comments.retain(|_, c| c.author_id != user_id && posts.contains_key(&c.post_id));

        Ok(true)
    }

    async fn create_group(&self, group: NewGroup) -> Result<Group> {
        let mut tables = self.tables.write().await;

        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "group slug '{}' is already taken",
                group.slug
            )));
        }

        tables.last_group_id += 1;
        let group = Group {
            id: tables.last_group_id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.insert(group.id, group.clone());

        Ok(group)
    }

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>> {
        Ok(self.tables.read().await.groups.get(&group_id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn delete_group(&self, group_id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;

        if tables.groups.remove(&group_id).is_none() {
            return Ok(false);
        }

        for post in tables.posts.values_mut() {
            if post.group_id == Some(group_id) {
                post.group_id = None;
            }
        }

        Ok(true)
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        self.create_post_at(post, Utc::now()).await
    }

    async fn update_post(&self, post_id: i64, changes: PostChanges) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        tables.check_group(changes.group_id)?;

        let Some(record) = tables.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        record.text = changes.text;
        record.group_id = changes.group_id;
        match changes.image {
            ImageChange::Keep => {}
            ImageChange::Replace(path) => record.image = path,
            ImageChange::Clear => record.image.clear(),
        }

        let record = record.clone();
        tables.post_view(&record).map(Some)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .get(&post_id)
            .map(|record| tables.post_view(record))
            .transpose()
    }

    async fn count_posts(&self, filter: PostFilter) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.filtered_posts(filter).len() as i64)
    }

    async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        tables
            .filtered_posts(filter)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|record| tables.post_view(record))
            .collect()
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;

        if !tables.posts.contains_key(&comment.post_id) {
            return Err(AppError::ValidationError(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(AppError::ValidationError(format!(
                "user {} does not exist",
                comment.author_id
            )));
        }

        tables.last_comment_id += 1;
        let record = CommentRecord {
            id: tables.last_comment_id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.text,
            created: Utc::now(),
        };
        let view = tables.comment_view(&record)?;
        tables.comments.insert(record.id, record);

        Ok(view)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<&CommentRecord> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by_key(|c| Reverse((c.created, c.id)));
        comments
            .into_iter()
            .map(|record| tables.comment_view(record))
            .collect()
    }
}
