//! Saves a generated image to local disk under a timestamped name.
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::AppResult;
use crate::types::GeneratedImage;

const FILE_PREFIX: &str = "VibeShift";

/// `VibeShift_<unix-millis>.<ext>`
pub fn download_file_name(millis: i64, extension: &str) -> String {
    format!("{}_{}.{}", FILE_PREFIX, millis, extension)
}

/// Writes `image` into `dir`, creating the directory if needed. An existing
/// file is never overwritten; a numeric suffix is appended instead.
pub async fn save_generated(image: &GeneratedImage, dir: impl AsRef<Path>) -> AppResult<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).await?;

    let millis = chrono::Utc::now().timestamp_millis();
    let ext = image.extension();
    let mut path = dir.join(download_file_name(millis, ext));
    let mut n = 1;
    while fs::try_exists(&path).await? {
        path = dir.join(format!("{}_{}_{}.{}", FILE_PREFIX, millis, n, ext));
        n += 1;
    }

    fs::write(&path, &image.data).await?;
    tracing::info!("Saved {} ({} bytes)", path.display(), image.data.len());
    Ok(path)
}
