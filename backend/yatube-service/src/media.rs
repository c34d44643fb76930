/// Uploaded post images on the local filesystem
///
/// Files live under `<root>/posts/` with random names; posts store the path
/// relative to the root (`posts/<uuid>.<ext>`).
use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use image::ImageFormat;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

pub const POSTS_DIR: &str = "posts";

const ACCEPTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    max_upload_bytes: usize,
}

impl MediaStorage {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Write an already validated image and return its relative path
    pub async fn save_image(&self, bytes: &[u8], format: ImageFormat) -> Result<String> {
        let ext = extension(format);
        let dir = self.root.join(POSTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        let relative = format!("{}/{}", POSTS_DIR, file_name);
        info!(path = %relative, size = bytes.len(), "stored uploaded image");
        Ok(relative)
    }

    /// Remove a stored upload by its relative path; failures are only logged
    pub async fn discard(&self, relative: &str) {
        let Some(path) = relative
            .strip_prefix(POSTS_DIR)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|name| self.resolve(name))
        else {
            warn!(path = %relative, "refusing to discard unexpected media path");
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(path = %relative, "discarded uploaded image"),
            Err(err) => warn!(path = %relative, error = %err, "failed to discard uploaded image"),
        }
    }

    /// Absolute path of a file under `posts/`, `None` for unsafe names
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let unsafe_name = file_name.is_empty()
            || file_name.starts_with('.')
            || file_name.contains("..")
            || file_name.contains('/')
            || file_name.contains('\\');
        if unsafe_name {
            return None;
        }
        Some(self.root.join(POSTS_DIR).join(file_name))
    }

    /// Read a stored file together with its MIME type
    pub async fn open(&self, file_name: &str) -> Result<(Vec<u8>, &'static str)> {
        let path = self
            .resolve(file_name)
            .ok_or_else(|| AppError::NotFound(format!("media file {}", file_name)))?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("media file {}", file_name)))
            }
            Err(err) => return Err(err.into()),
        };

        let mime = ImageFormat::from_path(&path)
            .map(mime_type)
            .unwrap_or("application/octet-stream");
        Ok((bytes, mime))
    }
}

/// Detect and fully decode an upload; `None` when it is not a usable image.
pub fn inspect_image(bytes: &[u8]) -> Option<ImageFormat> {
    let format = image::guess_format(bytes).ok()?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return None;
    }
    image::load_from_memory_with_format(bytes, format).ok()?;
    Some(format)
}

fn extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        _ => "bin",
    }
}

fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        _ => "application/octet-stream",
    }
}
