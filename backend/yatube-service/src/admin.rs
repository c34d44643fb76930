//! Maintenance commands run from the command line
//!
//! `yatube-service create-group <slug> <title> [description]`
//! `yatube-service delete-group <slug>`
//! `yatube-service delete-user <username>`

use crate::db::BlogStore;
use crate::error::{AppError, Result};
use crate::models::{Group, NewGroup};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern compiles"));

const MAX_SLUG_LEN: usize = 50;
const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    CreateGroup {
        slug: String,
        title: String,
        description: String,
    },
    DeleteGroup {
        slug: String,
    },
    DeleteUser {
        username: String,
    },
}

impl AdminCommand {
    /// Parse `args` (without the binary name); `None` when the first word
    /// is not an admin command.
    pub fn parse(args: &[String]) -> Option<std::result::Result<Self, String>> {
        let (cmd, rest) = args.split_first()?;
        let parsed = match cmd.as_str() {
            "create-group" => match rest {
                [slug, title] => Ok(AdminCommand::CreateGroup {
                    slug: slug.clone(),
                    title: title.clone(),
                    description: String::new(),
                }),
                [slug, title, description] => Ok(AdminCommand::CreateGroup {
                    slug: slug.clone(),
                    title: title.clone(),
                    description: description.clone(),
                }),
                _ => Err("usage: create-group <slug> <title> [description]".to_string()),
            },
            "delete-group" => match rest {
                [slug] => Ok(AdminCommand::DeleteGroup { slug: slug.clone() }),
                _ => Err("usage: delete-group <slug>".to_string()),
            },
            "delete-user" => match rest {
                [username] => Ok(AdminCommand::DeleteUser {
                    username: username.clone(),
                }),
                _ => Err("usage: delete-user <username>".to_string()),
            },
            _ => return None,
        };
        Some(parsed)
    }

    /// Run the command and return a one-line report
    pub async fn run(&self, store: &dyn BlogStore) -> Result<String> {
        match self {
            AdminCommand::CreateGroup {
                slug,
                title,
                description,
            } => {
                let group = create_group(store, slug, title, description).await?;
                Ok(format!("created group '{}' ({})", group.slug, group.title))
            }
            AdminCommand::DeleteGroup { slug } => {
                let group = store
                    .find_group_by_slug(slug)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("group '{}'", slug)))?;
                store.delete_group(group.id).await?;
                info!(group_id = group.id, slug = %group.slug, "group deleted");
                Ok(format!(
                    "deleted group '{}'; its posts no longer have a group",
                    group.slug
                ))
            }
            AdminCommand::DeleteUser { username } => {
                let user = store
                    .find_user_by_username(username)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("user '{}'", username)))?;
                store.delete_user(user.id).await?;
                info!(user_id = user.id, username = %user.username, "user deleted");
                Ok(format!(
                    "deleted user '{}' with their posts and comments",
                    user.username
                ))
            }
        }
    }
}

async fn create_group(
    store: &dyn BlogStore,
    slug: &str,
    title: &str,
    description: &str,
) -> Result<Group> {
    let slug = slug.trim();
    let title = title.trim();

    if slug.is_empty() || slug.len() > MAX_SLUG_LEN || !SLUG_RE.is_match(slug) {
        return Err(AppError::ValidationError(format!(
            "slug must be 1-{} letters, digits, '-' or '_'",
            MAX_SLUG_LEN
        )));
    }
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::ValidationError(format!(
            "title must be 1-{} characters",
            MAX_TITLE_LEN
        )));
    }

    let group = store
        .create_group(NewGroup {
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.trim().to_string(),
        })
        .await?;
    info!(group_id = group.id, slug = %group.slug, "group created");
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewPost, NewUser, PostFilter};

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            AdminCommand::parse(&args(&["create-group", "cats", "Коты"])),
            Some(Ok(AdminCommand::CreateGroup {
                slug: "cats".into(),
                title: "Коты".into(),
                description: String::new(),
            }))
        );
        assert_eq!(
            AdminCommand::parse(&args(&["delete-user", "leo"])),
            Some(Ok(AdminCommand::DeleteUser {
                username: "leo".into()
            }))
        );
        assert!(matches!(
            AdminCommand::parse(&args(&["delete-group"])),
            Some(Err(_))
        ));
        assert_eq!(AdminCommand::parse(&args(&["serve"])), None);
        assert_eq!(AdminCommand::parse(&[]), None);
    }

    #[tokio::test]
    async fn test_create_and_delete_group_keeps_posts() {
        let store = MemoryStore::new();
        AdminCommand::CreateGroup {
            slug: "cats".into(),
            title: "Коты".into(),
            description: "Про котов".into(),
        }
        .run(&store)
        .await
        .unwrap();

        let group = store.find_group_by_slug("cats").await.unwrap().unwrap();
        let user = store
            .create_user(NewUser {
                username: "leo".into(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        store
            .create_post(NewPost {
                author_id: user.id,
                text: "мяу".into(),
                group_id: Some(group.id),
                image: None,
            })
            .await
            .unwrap();

        AdminCommand::DeleteGroup {
            slug: "cats".into(),
        }
        .run(&store)
        .await
        .unwrap();
        assert_eq!(store.count_posts(PostFilter::All).await.unwrap(), 1);

        AdminCommand::DeleteUser {
            username: "leo".into(),
        }
        .run(&store)
        .await
        .unwrap();
        assert_eq!(store.count_posts(PostFilter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_slug_and_missing_targets() {
        let store = MemoryStore::new();
        let err = AdminCommand::CreateGroup {
            slug: "no spaces".into(),
            title: "T".into(),
            description: String::new(),
        }
        .run(&store)
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = AdminCommand::DeleteUser {
            username: "ghost".into(),
        }
        .run(&store)
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
