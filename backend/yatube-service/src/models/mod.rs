/// Data models for yatube-service
///
/// This module defines structures for:
/// - User: site account that authors posts and comments
/// - Group: community a post may belong to
/// - Post: text entry with optional group and picture
/// - Comment: reply under a post
///
/// Read models (`Post`, `Comment`) carry the joined author and group data
/// the templates display, so a page never needs a follow-up query.
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;

/// Characters of a post or comment shown in its short string form.
pub const POST_CHARS_VIEWED: usize = 15;

fn excerpt(text: &str) -> String {
    text.chars().take(POST_CHARS_VIEWED).collect()
}

/// Site account
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// "First Last" when either part is set, otherwise the username.
    pub fn display_name(&self) -> String {
        full_name(&self.first_name, &self.last_name, &self.username)
    }

    pub fn as_author(&self) -> Author {
        Author {
            id: self.id,
            username: self.username.clone(),
            full_name: self.display_name(),
        }
    }
}

fn full_name(first: &str, last: &str, username: &str) -> String {
    let name = format!("{} {}", first.trim(), last.trim());
    let name = name.trim();
    if name.is_empty() {
        username.to_string()
    } else {
        name.to_string()
    }
}

/// Author reference embedded in posts and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

impl Author {
    pub fn new(id: i64, username: String, first_name: &str, last_name: &str) -> Self {
        let full_name = full_name(first_name, last_name, &username);
        Self {
            id,
            username,
            full_name,
        }
    }
}

/// Community of posts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Group reference embedded in posts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: i64,
    pub slug: String,
    pub title: String,
}

impl From<&Group> for GroupRef {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            slug: group.slug.clone(),
            title: group.title.clone(),
        }
    }
}

/// Post joined with its author and group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    /// Path relative to the media root, empty when the post has no picture
    pub image: String,
    pub author: Author,
    pub group: Option<GroupRef>,
}

impl Post {
    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&excerpt(&self.text))
    }
}

/// Comment joined with its author
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author: Author,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&excerpt(&self.text))
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// What happens to the stored picture on edit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageChange {
    #[default]
    Keep,
    Replace(String),
    Clear,
}

#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

/// Which posts a listing selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
}

impl PostFilter {
    pub fn group_id(&self) -> Option<i64> {
        match self {
            PostFilter::Group(id) => Some(*id),
            _ => None,
        }
    }

    pub fn author_id(&self) -> Option<i64> {
        match self {
            PostFilter::Author(id) => Some(*id),
            _ => None,
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Group(id) => post.group.as_ref().map(|g| g.id) == Some(*id),
            PostFilter::Author(id) => post.author.id == *id,
        }
    }
}
