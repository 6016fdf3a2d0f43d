//! Picture blob storage.
//!
//! Item pictures live outside the database; a row only keeps the blob key.
//! [`PictureStore`] chooses a backend from configuration and owns the upload
//! rules (accepted types, size limit, key layout).

mod local;
mod s3;

use std::path::Path;
use std::sync::Arc;

use shared_types::{AppConfig, AppError};
use uuid::Uuid;

pub use local::LocalStore;
pub use s3::S3Store;

/// Prefix for every picture key.
pub const PICTURE_PREFIX: &str = "evidence_pictures";

pub const PICTURE_INVALID: &str =
    "Upload a valid image. Accepted types are JPEG, PNG, GIF and WebP.";
pub const PICTURE_EMPTY: &str = "The submitted file is empty.";
pub const PICTURE_NOT_A_FILE: &str =
    "The submitted data was not a file. Check the encoding type on the form.";

// ── Trait ────────────────────────────────────────────────────────────

/// Byte storage addressed by key.
#[allow(async_fn_in_trait)]
pub trait BlobStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing blob.
    async fn put(&self, key: &str, content_type: &str, body: Vec<u8>) -> Result<(), String>;

    /// Remove the blob. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), String>;

    /// Public URL a client can fetch the blob from.
    fn url(&self, key: &str) -> String;
}

// ── Upload ──────────────────────────────────────────────────────────

/// A picture file received with an item form.
#[derive(Debug, Clone)]
pub struct PictureUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PictureUpload {
    /// File extension for the upload. A declared content type must be one
    /// of the accepted image types; the file name is only consulted when
    /// the part declares no type.
    pub fn extension(&self) -> Option<&'static str> {
        if let Some(ct) = self.content_type.as_deref() {
            let essence = ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
            return match essence.as_str() {
                "image/jpeg" | "image/jpg" => Some("jpg"),
                "image/png" => Some("png"),
                "image/gif" => Some("gif"),
                "image/webp" => Some("webp"),
                _ => None,
            };
        }
        let name = self.file_name.as_deref()?;
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some("jpg"),
            "png" => Some("png"),
            "gif" => Some("gif"),
            "webp" => Some("webp"),
            _ => None,
        }
    }

    fn content_type_for(ext: &str) -> &'static str {
        match ext {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "image/jpeg",
        }
    }
}

/// Fresh storage key for a picture with the given extension.
pub fn picture_key(ext: &str) -> String {
    format!("{}/{}.{}", PICTURE_PREFIX, Uuid::new_v4(), ext)
}

// ── Store ───────────────────────────────────────────────────────────

enum Backend {
    Local(LocalStore),
    S3(S3Store),
}

/// Picture storage shared by the item handlers. Cheap to clone.
#[derive(Clone)]
pub struct PictureStore {
    backend: Arc<Backend>,
    max_bytes: usize,
}

impl PictureStore {
    pub fn local(store: LocalStore, max_bytes: usize) -> Self {
        Self {
            backend: Arc::new(Backend::Local(store)),
            max_bytes,
        }
    }

    pub fn s3(store: S3Store, max_bytes: usize) -> Self {
        Self {
            backend: Arc::new(Backend::S3(store)),
            max_bytes,
        }
    }

    /// Build the backend selected by `features.s3`.
    pub async fn from_config(config: &AppConfig) -> Result<Self, String> {
        let max_bytes = config.storage.max_picture_bytes;
        if config.features.s3 {
            let store = S3Store::from_env()?;
            store.ensure_bucket().await;
            tracing::info!("pictures stored in S3 bucket '{}'", store.bucket());
            Ok(Self::s3(store, max_bytes))
        } else {
            let store = LocalStore::new(&config.storage.media_root, &config.storage.media_url);
            tracing::info!("pictures stored under {}", store.root().display());
            Ok(Self::local(store, max_bytes))
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend.as_ref() {
            Backend::Local(_) => "local",
            Backend::S3(_) => "s3",
        }
    }

    /// Directory to serve read-only when pictures are kept on local disk.
    pub fn local_root(&self) -> Option<&Path> {
        match self.backend.as_ref() {
            Backend::Local(store) => Some(store.root()),
            Backend::S3(_) => None,
        }
    }

    /// Check an upload against the accepted types and the size limit.
    /// Yields the file extension, or the message to report on `picture`.
    pub fn check(&self, upload: &PictureUpload) -> Result<&'static str, String> {
        if upload.bytes.is_empty() {
            return Err(PICTURE_EMPTY.to_string());
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(format!(
                "Ensure this file is no larger than {} bytes (it has {} bytes).",
                self.max_bytes,
                upload.bytes.len()
            ));
        }
        upload.extension().ok_or_else(|| PICTURE_INVALID.to_string())
    }

    /// Validate and store an upload, returning its key.
    pub async fn save(&self, upload: PictureUpload) -> Result<String, AppError> {
        let ext = self
            .check(&upload)
            .map_err(|msg| AppError::field("picture", msg))?;
        let key = picture_key(ext);
        let content_type = PictureUpload::content_type_for(ext);
        let result = match self.backend.as_ref() {
            Backend::Local(store) => store.put(&key, content_type, upload.bytes).await,
            Backend::S3(store) => store.put(&key, content_type, upload.bytes).await,
        };
        result.map_err(|e| {
            tracing::error!(key = %key, error = %e, "picture upload failed");
            AppError::internal("Failed to store picture")
        })?;
        tracing::info!(key = %key, "picture stored");
        Ok(key)
    }

    /// Remove a stored picture. Failures are logged and otherwise ignored.
    pub async fn remove(&self, key: &str) {
        let result = match self.backend.as_ref() {
            Backend::Local(store) => store.delete(key).await,
            Backend::S3(store) => store.delete(key).await,
        };
        match result {
            Ok(()) => tracing::info!(key = %key, "picture removed"),
            Err(e) => tracing::warn!(key = %key, error = %e, "failed to remove picture"),
        }
    }

    pub fn url(&self, key: &str) -> String {
        match self.backend.as_ref() {
            Backend::Local(store) => store.url(key),
            Backend::S3(store) => store.url(key),
        }
    }
}
