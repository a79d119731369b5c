//! Photo store backed by a directory of image files.
//!
//! Each non-hidden image file is an asset whose identifier is its path. Assets are
//! ordered by modification time, newest first. Deletion moves files to the system
//! trash.

use super::AssetSource;
use crate::domain::{AccessResult, AssetId, AssetRef, Size};
use crate::error::{DeleteError, PhotoTinderError, Result};
use crate::imaging;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    /// Log deletions instead of performing them
    dry_run: bool,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Identifier of the file at `path`: the path itself.
    ///
    /// Paths must be valid UTF-8 to round-trip through `path_of`; the CLI rejects a
    /// non-UTF-8 root and listing skips non-UTF-8 file names.
    pub fn asset_id(path: &Path) -> AssetId {
        AssetId::new(path.to_string_lossy())
    }

    fn path_of(id: &AssetId) -> PathBuf {
        PathBuf::from(id.as_str())
    }
}

/// Checks whether the directory can be listed, and written to
fn check_access(root: &Path) -> AccessResult {
    let metadata = match fs::metadata(root) {
        Ok(m) if m.is_dir() => m,
        Ok(_) => return AccessResult::Denied,
        Err(_) => return AccessResult::Denied,
    };

    if fs::read_dir(root).is_err() {
        return AccessResult::Denied;
    }

    if metadata.permissions().readonly() {
        AccessResult::GrantedLimited
    } else {
        AccessResult::Granted
    }
}

/// Lists photo files under `root`, newest modification time first
pub fn list_photos(root: &Path, limit: usize) -> io::Result<Vec<AssetRef>> {
    let mut photos: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();

    for entry_result in fs::read_dir(root)? {
        // Skip entries that cannot be read (permission errors, etc.)
        let entry = match entry_result {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = entry.path();

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if file_name.starts_with('.') {
            continue;
        }

        let is_photo = path
            .extension()
            .and_then(|e| e.to_str())
            .map(imaging::is_photo_extension)
            .unwrap_or(false);
        if !is_photo {
            continue;
        }

        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        let modified: DateTime<Utc> = match metadata.modified() {
            Ok(t) => t.into(),
            Err(_) => continue,
        };

        photos.push((path, modified));
    }

    photos.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    photos.truncate(limit);

    Ok(photos
        .into_iter()
        .map(|(path, modified)| AssetRef::new(DirectorySource::asset_id(&path), modified))
        .collect())
}

fn decode(id: &AssetId, target: Size) -> Result<DynamicImage> {
    let path = DirectorySource::path_of(id);
    imaging::decode_to_fit(&path, target).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            PhotoTinderError::AssetUnavailable(id.clone())
        }
        _ => PhotoTinderError::DecodeFailed {
            id: id.clone(),
            reason: e.to_string(),
        },
    })
}

fn trash_all(ids: &[AssetId]) -> std::result::Result<(), DeleteError> {
    let paths: Vec<PathBuf> = ids.iter().map(DirectorySource::path_of).collect();

    // Nothing is touched unless every file is still there
    let missing: Vec<AssetId> = ids
        .iter()
        .zip(&paths)
        .filter(|(_, path)| !path.is_file())
        .map(|(id, _)| id.clone())
        .collect();
    if !missing.is_empty() {
        return Err(DeleteError::with_failed(
            format!("{} file(s) no longer exist", missing.len()),
            missing,
        ));
    }

    trash::delete_all(&paths).map_err(|e| {
        let failed = ids
            .iter()
            .zip(&paths)
            .filter(|(_, path)| path.exists())
            .map(|(id, _)| id.clone())
            .collect();
        DeleteError::with_failed(format!("Trash error: {}", e), failed)
    })
}

#[async_trait]
impl AssetSource for DirectorySource {
    async fn request_access(&self) -> AccessResult {
        let root = self.root.clone();
        let access = tokio::task::spawn_blocking(move || check_access(&root))
            .await
            .unwrap_or(AccessResult::Denied);
        info!(root = %self.root.display(), ?access, "library access resolved");
        access
    }

    async fn enumerate_newest(&self, limit: NonZeroUsize) -> Result<Vec<AssetRef>> {
        let root = self.root.clone();
        match tokio::task::spawn_blocking(move || list_photos(&root, limit.get())).await {
            Ok(Ok(assets)) => Ok(assets),
            Ok(Err(e)) => Err(PhotoTinderError::StoreUnavailable(format!(
                "{}: {}",
                self.root.display(),
                e
            ))),
            Err(e) => Err(PhotoTinderError::StoreUnavailable(format!(
                "Task panicked: {}",
                e
            ))),
        }
    }

    async fn fetch_image(&self, asset: &AssetRef, target: Size) -> Result<DynamicImage> {
        let id = asset.id.clone();
        tokio::task::spawn_blocking(move || decode(&id, target))
            .await
            .map_err(|e| PhotoTinderError::DecodeFailed {
                id: asset.id.clone(),
                reason: format!("Task panicked: {}", e),
            })?
    }

    async fn delete_assets(&self, ids: &[AssetId]) -> std::result::Result<(), DeleteError> {
        if self.dry_run {
            for id in ids {
                debug!(asset = %id, "dry run: would move to trash");
            }
            info!(count = ids.len(), "dry run: skipped delete");
            return Ok(());
        }

        let ids = ids.to_vec();
        let result = tokio::task::spawn_blocking(move || trash_all(&ids))
            .await
            .map_err(|e| DeleteError::new(format!("Task panicked: {}", e)))?;

        if let Err(ref e) = result {
            warn!(error = %e, failed = e.failed.len(), "delete was not committed");
        }
        result
    }
}
