use super::{FieldErrors, Submission, REQUIRED};
use crate::db::BlogStore;
use crate::error::Result;
use crate::media::inspect_image;
use crate::models::Post;
use image::ImageFormat;
use serde::Serialize;

pub const INVALID_CHOICE: &str =
    "Выберите корректный вариант. Вашего варианта нет среди допустимых значений.";
pub const INVALID_IMAGE: &str = "Загрузите правильное изображение. Файл, который вы загрузили, поврежден или не является изображением.";
pub const IMAGE_TOO_LARGE: &str = "Файл слишком большой.";

/// State of the post form as the template sees it
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostForm {
    pub text: String,
    pub group: Option<i64>,
    /// Currently stored picture, empty for none
    pub image: String,
    pub errors: FieldErrors,
    pub non_field_errors: Vec<String>,
}

/// Validated post form data
#[derive(Debug, Clone)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<(Vec<u8>, ImageFormat)>,
    pub clear_image: bool,
}

impl PostForm {
    /// Form pre-filled from a stored post
    pub fn for_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group.as_ref().map(|g| g.id),
            image: post.image.clone(),
            ..Self::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Validate a submission.
    ///
    /// On failure returns the form carrying the submitted values and the
    /// errors; `stored_image` is shown as the current picture.
    pub async fn validate(
        submission: &Submission,
        store: &dyn BlogStore,
        stored_image: &str,
    ) -> Result<std::result::Result<CleanedPost, PostForm>> {
        let mut form = PostForm {
            text: submission.value("text"),
            image: stored_image.to_string(),
            ..PostForm::default()
        };

        if form.text.trim().is_empty() {
            form.errors.add("text", REQUIRED);
        }

        let raw_group = submission.value("group");
        let raw_group = raw_group.trim();
        let mut group_id = None;
        if !raw_group.is_empty() {
            let known = match raw_group.parse::<i64>() {
                Ok(id) => store.find_group(id).await?.map(|g| g.id),
                Err(_) => None,
            };
            match known {
                Some(id) => {
                    group_id = Some(id);
                    form.group = Some(id);
                }
                None => form.errors.add("group", INVALID_CHOICE),
            }
        }

        let mut image = None;
        if let Some(upload) = submission.file("image") {
            if upload.oversized {
                form.errors.add("image", IMAGE_TOO_LARGE);
            } else {
                match inspect_image(&upload.bytes) {
                    Some(format) => image = Some((upload.bytes.clone(), format)),
                    None => form.errors.add("image", INVALID_IMAGE),
                }
            }
        }

        if !form.is_valid() {
            return Ok(Err(form));
        }

        Ok(Ok(CleanedPost {
            text: form.text.trim().to_string(),
            group_id,
            image,
            clear_image: submission.flag("image-clear"),
        }))
    }
}
