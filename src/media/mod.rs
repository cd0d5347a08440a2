//! Media upload bridge.
//!
//! Accepts a single multipart `image` field, validates it by extension and
//! magic bytes, and writes it into the object store rooted at `UPLOAD_DIR`
//! (default `uploads/`), partitioned by a per-resource folder. Every stored
//! file is addressed by an explicit `asset_id` (`"<folder>/<filename>"`)
//! which is persisted next to its URL wherever the URL lands, so deleting a
//! superseded asset never depends on parsing the URL shape.

use axum::{extract::Multipart, http::StatusCode};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::routes::ErrorResponse;

const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// A successfully stored image.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub url: String,
    pub asset_id: String,
    pub size: usize,
    pub mime_type: String,
}

#[derive(Debug)]
pub enum MediaError {
    NoFile,
    InvalidMultipart,
    UnsupportedExtension,
    UnsupportedContent,
    TooLarge,
    Empty,
    Io(std::io::Error),
}

impl MediaError {
    pub fn status(&self) -> StatusCode {
        match self {
            MediaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            MediaError::NoFile => "No file provided",
            MediaError::InvalidMultipart => "Invalid multipart data",
            MediaError::UnsupportedExtension => {
                "Unsupported file type. Allowed: JPEG, PNG, WebP, GIF."
            }
            MediaError::UnsupportedContent => "File content does not match an allowed image type.",
            MediaError::TooLarge => "File too large. Maximum size is 5MB.",
            MediaError::Empty => "Empty file",
            MediaError::Io(_) => "Failed to save file",
        }
    }

    pub fn into_rejection(self) -> (StatusCode, axum::Json<ErrorResponse>) {
        if let MediaError::Io(ref e) = self {
            tracing::error!("Media store I/O error: {}", e);
        }
        (
            self.status(),
            axum::Json(ErrorResponse {
                error: self.message().to_string(),
                message: None,
            }),
        )
    }
}

fn upload_root() -> PathBuf {
    PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()))
}

pub fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 12 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// An asset id is exactly `<folder>/<filename>` with no traversal tricks.
pub fn is_valid_asset_id(asset_id: &str) -> bool {
    let mut parts = asset_id.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(folder), Some(file), None) => {
            !folder.is_empty()
                && !file.is_empty()
                && !asset_id.contains("..")
                && !asset_id.contains('\\')
                && !asset_id.contains('\0')
        }
        _ => false,
    }
}

/// Pull the `image` field out of the multipart body and persist it.
///
/// Validation order matters: extension first (cheap), then size, then magic
/// bytes, so the error a client sees names the actual problem.
pub async fn store_image(folder: &str, mut multipart: Multipart) -> Result<StoredImage, MediaError> {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return Err(MediaError::NoFile),
        Err(e) => {
            tracing::error!("Multipart error: {}", e);
            return Err(MediaError::InvalidMultipart);
        }
    };

    let original_name = field.file_name().unwrap_or("unknown").to_string();
    let original_ext = original_name
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_lowercase();

    if !ALLOWED_EXTENSIONS.contains(&original_ext.as_str()) {
        return Err(MediaError::UnsupportedExtension);
    }

    let bytes = match field.bytes().await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("Failed to read upload bytes: {}", e);
            return Err(MediaError::InvalidMultipart);
        }
    };

    if bytes.len() > MAX_FILE_SIZE {
        return Err(MediaError::TooLarge);
    }
    if bytes.is_empty() {
        return Err(MediaError::Empty);
    }

    let mime_type = sniff_image(&bytes).ok_or(MediaError::UnsupportedContent)?;

    let filename = format!("{}.{}", Uuid::new_v4(), extension_for(mime_type));
    let dir = upload_root().join(folder);
    tokio::fs::create_dir_all(&dir).await.map_err(MediaError::Io)?;
    tokio::fs::write(dir.join(&filename), &bytes)
        .await
        .map_err(MediaError::Io)?;

    let asset_id = format!("{}/{}", folder, filename);
    let url = format!("/uploads/{}", asset_id);
    tracing::info!("Image stored: {} ({} bytes)", asset_id, bytes.len());

    Ok(StoredImage {
        url,
        asset_id,
        size: bytes.len(),
        mime_type: mime_type.to_string(),
    })
}

/// Best-effort removal of a previously stored asset. Invalid or missing
/// asset ids are a silent no-op; the caller's write has already succeeded
/// and a stale file on disk is not worth failing the request over.
pub async fn delete_asset(asset_id: &str) {
    if asset_id.is_empty() {
        return;
    }
    if !is_valid_asset_id(asset_id) {
        tracing::warn!("Refusing to delete malformed asset id: {}", asset_id);
        return;
    }
    let path = upload_root().join(asset_id);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::info!("Asset deleted: {}", asset_id),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Asset already gone: {}", asset_id)
        }
        Err(e) => tracing::warn!("Failed to delete asset {}: {}", asset_id, e),
    }
}
