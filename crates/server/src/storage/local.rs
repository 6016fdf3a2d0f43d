use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::BlobStore;

/// Blobs kept as files under a media root directory.
pub struct LocalStore {
    root: PathBuf,
    url_base: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, url_base: &str) -> Self {
        Self {
            root: root.into(),
            url_base: url_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key below the root. Keys that would escape it are rejected.
    fn path_for(&self, key: &str) -> Result<PathBuf, String> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(format!("invalid blob key '{key}'"));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for LocalStore {
    async fn put(&self, key: &str, _content_type: &str, body: Vec<u8>) -> Result<(), String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("create {}: {e}", parent.display()))?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| format!("write {}: {e}", path.display()))
    }

    async fn delete(&self, key: &str) -> Result<(), String> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("remove {}: {e}", path.display())),
        }
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.url_base, key)
    }
}
