/// HTML form handling
///
/// This module provides:
/// - `Submission`: the decoded body of a form POST (multipart or urlencoded)
/// - `FieldErrors`: per-field messages rendered next to each input
/// - the post, comment, signup and login forms
pub mod account;
pub mod comment;
pub mod post;

pub use account::{LoginForm, SignupForm};
pub use comment::CommentForm;
pub use post::{CleanedPost, PostForm};

use crate::error::{AppError, Result};
use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpRequest};
use futures::StreamExt;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use validator::ValidationErrors;

pub const REQUIRED: &str = "Обязательное поле.";

/// Upper bound for the non-file part of a submission
const MAX_TEXT_BYTES: usize = 256 * 1024;

/// Messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Drop earlier messages for `field` and keep only `message`
    pub fn replace(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), vec![message.into()]);
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        for (field, list) in errors.field_errors() {
            for error in list {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                out.add(&field, message);
            }
        }
        out
    }
}

/// File part of a multipart submission
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// The upload exceeded the size cap and was not kept
    pub oversized: bool,
}

/// Decoded form body
#[derive(Debug, Clone, Default)]
pub struct Submission {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl Submission {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, name: &str, file: UploadedFile) -> Self {
        self.files.insert(name.to_string(), file);
        self
    }

    /// Read a `multipart/form-data` or urlencoded body.
    ///
    /// Files larger than `max_file_bytes` are drained and flagged instead of
    /// failing the whole request.
    pub async fn read(
        req: &HttpRequest,
        payload: web::Payload,
        max_file_bytes: usize,
    ) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            Self::read_multipart(Multipart::new(req.headers(), payload), max_file_bytes).await
        } else {
            Self::read_urlencoded(payload).await
        }
    }

    async fn read_urlencoded(mut payload: web::Payload) -> Result<Self> {
        let mut body = web::BytesMut::new();
        while let Some(chunk) = payload.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
            if body.len() + chunk.len() > MAX_TEXT_BYTES {
                return Err(AppError::PayloadTooLarge("form body".into()));
            }
            body.extend_from_slice(&chunk);
        }

        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&body)
            .map_err(|e| AppError::BadRequest(format!("malformed form body: {}", e)))?;
        Ok(Self::from_pairs(pairs))
    }

    async fn read_multipart(mut payload: Multipart, max_file_bytes: usize) -> Result<Self> {
        let mut submission = Submission::default();
        let mut text_bytes = 0usize;

        while let Some(item) = payload.next().await {
            let mut field = item.map_err(|e| AppError::BadRequest(e.to_string()))?;
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);

            let mut data = Vec::new();
            let mut oversized = false;
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
                match filename {
                    Some(_) => {
                        if oversized || data.len() + chunk.len() > max_file_bytes {
                            // keep draining so the client is not cut off
                            oversized = true;
                            data.clear();
                        } else {
                            data.extend_from_slice(&chunk);
                        }
                    }
                    None => {
                        text_bytes += chunk.len();
                        if text_bytes > MAX_TEXT_BYTES {
                            return Err(AppError::PayloadTooLarge("form fields".into()));
                        }
                        data.extend_from_slice(&chunk);
                    }
                }
            }

            match filename {
                // browsers send an empty part when no file was chosen
                Some(filename) if filename.is_empty() && data.is_empty() && !oversized => {}
                Some(filename) => {
                    submission.files.insert(
                        name,
                        UploadedFile {
                            filename,
                            bytes: data,
                            oversized,
                        },
                    );
                }
                None => {
                    submission
                        .fields
                        .insert(name, String::from_utf8_lossy(&data).into_owned());
                }
            }
        }

        Ok(submission)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field value or an empty string
    pub fn value(&self, name: &str) -> String {
        self.text(name).unwrap_or_default().to_string()
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    /// Checkbox semantics: present and not "off"/"false"
    pub fn flag(&self, name: &str) -> bool {
        self.text(name)
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "" | "off" | "false" | "0"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_collect_per_field() {
        let mut errors = FieldErrors::default();
        assert!(errors.is_empty());
        errors.add("text", REQUIRED);
        errors.add("text", "second");
        assert_eq!(errors.get("text"), ["Обязательное поле.", "second"]);
        assert!(errors.get("group").is_empty());

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["text"][0], REQUIRED);
    }

    #[test]
    fn test_submission_accessors() {
        let submission = Submission::from_pairs([("text", "hello"), ("image-clear", "on")]);
        assert_eq!(submission.text("text"), Some("hello"));
        assert_eq!(submission.value("group"), "");
        assert!(submission.flag("image-clear"));
        assert!(!submission.flag("missing"));
    }
}
