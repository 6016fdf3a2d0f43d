use shared_types::{AppConfig, FeatureFlags};
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Config file used when `APP_CONFIG` is not set, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// The process-wide configuration, loaded on first use.
///
/// Reads the file named by `APP_CONFIG` (or `config.toml`), then applies
/// environment overrides. A missing or unparseable file yields defaults.
pub fn app_config() -> &'static AppConfig {
    CONFIG.get_or_init(|| {
        let path = std::env::var("APP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => parse_config(&path, &contents),
            Err(e) => {
                tracing::info!("{path} not found ({e}), using default configuration");
                AppConfig::default()
            }
        };
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        tracing::info!(features = ?config.features, "configuration loaded");
        config
    })
}

/// Shortcut for the loaded feature flags.
pub fn feature_flags() -> &'static FeatureFlags {
    &app_config().features
}

fn parse_config(path: &str, contents: &str) -> AppConfig {
    toml::from_str(contents).unwrap_or_else(|e| {
        tracing::warn!("failed to parse {path}: {e}, using default configuration");
        AppConfig::default()
    })
}

/// Apply `HOST`, `PORT`, `MEDIA_ROOT` and `MAX_UPLOAD_BYTES` on top of the file values.
///
/// Values that fail to parse are ignored with a warning.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("HOST").filter(|h| !h.is_empty()) {
        config.server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        match port.parse() {
            Ok(p) => config.server.port = p,
            Err(_) => tracing::warn!("ignoring invalid PORT value {port:?}"),
        }
    }
    if let Some(root) = lookup("MEDIA_ROOT").filter(|r| !r.is_empty()) {
        config.storage.media_root = root;
    }
    if let Some(max) = lookup("MAX_UPLOAD_BYTES") {
        match max.parse() {
            Ok(n) => config.server.max_upload_bytes = n,
            Err(_) => tracing::warn!("ignoring invalid MAX_UPLOAD_BYTES value {max:?}"),
        }
    }
}
