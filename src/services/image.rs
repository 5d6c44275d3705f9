use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Extensions accepted for uploaded product and profile images
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// URL prefix the images directory is served under
pub const IMAGES_URL_PREFIX: &str = "/images";

/// Stores uploaded images on disk; the database only keeps the returned reference.
pub struct ImageService {
    images_path: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(images_path: impl Into<PathBuf>) -> Self {
        Self {
            images_path: images_path.into(),
        }
    }

    /// Writes the upload under a generated name and returns its public path.
    pub async fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<String> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "jpg".to_string());

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            bail!("Unsupported image type: .{extension}");
        }

        if !self.images_path.exists() {
            fs::create_dir_all(&self.images_path).await?;
        }

        let filename = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        let file_path = self.images_path.join(&filename);

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        info!(path = %file_path.display(), size = bytes.len(), "Stored uploaded image");

        Ok(format!("{IMAGES_URL_PREFIX}/{filename}"))
    }

    /// Removes a file stored by `save_upload` that ended up unreferenced.
    pub async fn discard(&self, reference: &str) -> Result<()> {
        let Some(filename) = reference
            .strip_prefix(IMAGES_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !(name.is_empty() || name.starts_with('.') || name.contains(['/', '\\'])))
        else {
            bail!("Not a stored image reference: {reference}");
        };

        let file_path = self.images_path.join(filename);
        fs::remove_file(&file_path)
            .await
            .with_context(|| format!("Failed to remove image {}", file_path.display()))?;

        info!(path = %file_path.display(), "Removed unreferenced image");
        Ok(())
    }
}
