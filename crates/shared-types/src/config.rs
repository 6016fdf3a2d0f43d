use serde::{Deserialize, Serialize};

/// Feature flags controlling which optional integrations are active.
///
/// Every field defaults to `false` so that a missing or incomplete config
/// file disables all optional features.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FeatureFlags {
    /// Store pictures in S3 instead of the local media root.
    #[serde(default)]
    pub s3: bool,
    /// Export traces and logs over OTLP.
    #[serde(default)]
    pub telemetry: bool,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty (or `*`) mirrors the request origin.
    pub cors_origins: Vec<String>,
    /// Also mount the resource routes under `/api`.
    pub api_alias: bool,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
            api_alias: true,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Picture storage settings for the local backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub media_root: String,
    pub media_url: String,
    pub max_picture_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_root: "media".to_string(),
            media_url: "/media".to_string(),
            max_picture_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Top-level config file structure matching `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}
