//! Photo upload rules: folders, size caps, stored file naming.

use crate::error::CoreError;

/// Placeholder file shared by every record without an uploaded photo.
/// It is never deleted.
pub const DEFAULT_PHOTO: &str = "default.jpg";

/// Multipart field name carrying the uploaded image.
pub const PHOTO_FIELD: &str = "photo";

/// Where and how large uploaded photos of one resource may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoPolicy {
    /// Sub-directory of the uploads root.
    pub folder: &'static str,
    /// Maximum file size in bytes.
    pub max_bytes: usize,
}

pub const USER_PHOTOS: PhotoPolicy = PhotoPolicy {
    folder: "users",
    max_bytes: 1024 * 1024,
};

pub const EVENT_PHOTOS: PhotoPolicy = PhotoPolicy {
    folder: "events",
    max_bytes: 2 * 1024 * 1024,
};

/// Whether a filename refers to the shared placeholder.
pub fn is_default_photo(filename: &str) -> bool {
    filename == DEFAULT_PHOTO
}

/// Only `image/*` uploads are accepted.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type.trim().to_ascii_lowercase().starts_with("image/")
}

/// Stored names are restricted to `[A-Za-z0-9._-]` with no leading dot,
/// so they can never escape their folder.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Extract a lowercase alphanumeric extension from an uploaded file name.
///
/// Falls back to `jpg` when the name has no usable extension.
pub fn extension_of(original_name: &str) -> String {
    original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "jpg".to_string())
}

/// Build the stored name `<unix-millis>-<nonce>-photo.<ext>`.
///
/// `nonce` separates uploads landing in the same millisecond; characters
/// outside `[A-Za-z0-9]` are dropped.
pub fn stored_file_name(timestamp_millis: i64, nonce: &str, original_name: &str) -> String {
    let nonce: String = nonce.chars().filter(char::is_ascii_alphanumeric).collect();
    format!(
        "{timestamp_millis}-{nonce}-{PHOTO_FIELD}.{}",
        extension_of(original_name)
    )
}

/// Check an upload against a policy before it is written anywhere.
pub fn validate_upload(
    policy: &PhotoPolicy,
    content_type: Option<&str>,
    size: usize,
) -> Result<(), CoreError> {
    if !content_type.is_some_and(is_image_content_type) {
        return Err(CoreError::Validation(
            "Not an image! Only image files are allowed.".into(),
        ));
    }
    if size > policy.max_bytes {
        return Err(CoreError::Validation(format!(
            "Photo is too large. Maximum size is {} KB",
            policy.max_bytes / 1024
        )));
    }
    Ok(())
}
