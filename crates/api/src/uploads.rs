//! Photo storage on the local filesystem.
//!
//! Files live at `<uploads_dir>/<policy.folder>/<stored name>`. Removal is
//! best-effort: it runs on a detached task, never touches the shared
//! default photo, and only logs failures.

use std::path::{Path, PathBuf};

use chrono::Utc;
use eventhub_core::photo::{
    is_default_photo, is_safe_file_name, stored_file_name, validate_upload, PhotoPolicy,
};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::PhotoUpload;

/// Path of a stored photo, or `None` if the name could escape its folder.
pub fn photo_path(uploads_dir: &Path, policy: &PhotoPolicy, file_name: &str) -> Option<PathBuf> {
    is_safe_file_name(file_name).then(|| uploads_dir.join(policy.folder).join(file_name))
}

/// Validate an upload against `policy` and write it, returning the stored
/// file name.
pub async fn store_photo(
    uploads_dir: &Path,
    policy: &PhotoPolicy,
    upload: &PhotoUpload,
) -> Result<String, AppError> {
    validate_upload(policy, upload.content_type.as_deref(), upload.bytes.len())?;

    let file_name = stored_file_name(
        Utc::now().timestamp_millis(),
        &Uuid::new_v4().simple().to_string(),
        &upload.file_name,
    );
    let folder = uploads_dir.join(policy.folder);
    tokio::fs::create_dir_all(&folder)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload folder: {e}")))?;

    // Never overwrite: another record may already point at this file.
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(folder.join(&file_name))
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store photo: {e}")))?;
    file.write_all(&upload.bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store photo: {e}")))?;
    file.flush()
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store photo: {e}")))?;

    tracing::debug!(folder = policy.folder, %file_name, bytes = upload.bytes.len(), "Photo stored");
    Ok(file_name)
}

/// Delete a stored photo. The default photo and unsafe names are skipped.
pub async fn remove_photo(
    uploads_dir: &Path,
    policy: &PhotoPolicy,
    file_name: &str,
) -> std::io::Result<()> {
    if is_default_photo(file_name) {
        return Ok(());
    }
    match photo_path(uploads_dir, policy, file_name) {
        Some(path) => tokio::fs::remove_file(path).await,
        None => Ok(()),
    }
}

/// Remove a photo on a detached task; failures are logged, never returned.
pub fn discard_photo(uploads_dir: PathBuf, policy: PhotoPolicy, file_name: String) {
    if is_default_photo(&file_name) {
        return;
    }
    tokio::spawn(async move {
        if let Err(e) = remove_photo(&uploads_dir, &policy, &file_name).await {
            tracing::warn!(error = %e, folder = policy.folder, %file_name, "Failed to remove photo");
        }
    });
}
