use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Directory, relative to the media root, that recipe images are stored under.
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

const MAX_EXTENSION_LENGTH: usize = 10;

/// Storage path for a newly uploaded recipe image.
///
/// The name is a fresh UUID v4; only the extension of `filename` is kept,
/// and only when it is short and alphanumeric.
#[must_use]
pub fn recipe_image_file_path(filename: &str) -> String {
    recipe_image_file_path_with(Uuid::new_v4(), filename)
}

/// Same as [`recipe_image_file_path`] with a caller-supplied id.
#[must_use]
pub fn recipe_image_file_path_with(id: Uuid, filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| {
            !e.is_empty()
                && e.len() <= MAX_EXTENSION_LENGTH
                && e.chars().all(|c| c.is_ascii_alphanumeric())
        });

    match ext {
        Some(ext) => format!("{RECIPE_IMAGE_DIR}/{id}.{ext}"),
        None => format!("{RECIPE_IMAGE_DIR}/{id}"),
    }
}

/// Whether an upload's declared content type is an image.
#[must_use]
pub fn is_image_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
}

/// Writes uploaded files below the media root.
#[derive(Debug, Clone)]
pub struct ImageService {
    media_root: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    #[must_use]
    pub fn absolute_path(&self, relative: &str) -> PathBuf {
        self.media_root.join(relative)
    }

    /// Write `bytes` to `relative` under the media root, creating directories as needed.
    pub async fn save(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
        let file_path = self.absolute_path(relative);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        info!(path = %file_path.display(), size = bytes.len(), "Stored image");
        Ok(file_path)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) {
        let file_path = self.absolute_path(relative);
        match fs::remove_file(&file_path).await {
            Ok(()) => info!(path = %file_path.display(), "Removed image"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %file_path.display(), error = %e, "Failed to remove image"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_keeps_extension_and_uses_given_id() {
        let id = Uuid::parse_str("6f1c2a4e-59b2-4c1a-9d63-3f0a1f2b7c11").unwrap();
        assert_eq!(
            recipe_image_file_path_with(id, "myimage.jpg"),
            format!("uploads/recipe/{id}.jpg")
        );
    }

    #[test]
    fn path_without_extension_has_no_suffix() {
        let id = Uuid::nil();
        assert_eq!(
            recipe_image_file_path_with(id, "myimage"),
            format!("uploads/recipe/{id}")
        );
        assert_eq!(
            recipe_image_file_path_with(id, ".hidden"),
            format!("uploads/recipe/{id}")
        );
    }

    #[test]
    fn path_ignores_client_directories_and_keeps_last_extension() {
        let id = Uuid::nil();
        assert_eq!(
            recipe_image_file_path_with(id, "../../etc/photo.tar.png"),
            format!("uploads/recipe/{id}.png")
        );
    }

    #[test]
    fn oversized_or_odd_extensions_are_dropped() {
        let id = Uuid::nil();
        let long = format!("a.{}", "j".repeat(300));
        assert_eq!(
            recipe_image_file_path_with(id, &long),
            format!("uploads/recipe/{id}")
        );
        assert_eq!(
            recipe_image_file_path_with(id, "a.p g"),
            format!("uploads/recipe/{id}")
        );
        assert_eq!(
            recipe_image_file_path_with(id, "a.jpeg"),
            format!("uploads/recipe/{id}.jpeg")
        );
    }

    #[test]
    fn generated_paths_are_unique() {
        assert_ne!(
            recipe_image_file_path("a.jpg"),
            recipe_image_file_path("a.jpg")
        );
    }

    #[test]
    fn content_type_check() {
        assert!(is_image_content_type(Some("image/jpeg")));
        assert!(is_image_content_type(Some("IMAGE/PNG")));
        assert!(!is_image_content_type(Some("text/plain")));
        assert!(!is_image_content_type(None));
    }

    #[tokio::test]
    async fn save_then_remove() {
        let root = std::env::temp_dir().join(format!("pantry-media-{}", Uuid::new_v4()));
        let service = ImageService::new(&root);
        let relative = recipe_image_file_path("x.png");

        let written = service.save(&relative, b"png-bytes").await.unwrap();
        assert!(written.exists());

        service.remove(&relative).await;
        assert!(!written.exists());
        service.remove(&relative).await;

        std::fs::remove_dir_all(&root).ok();
    }
}
