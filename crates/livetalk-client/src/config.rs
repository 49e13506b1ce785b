//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the client starts without configuration;
//! image uploads stay disabled until a cloud name (or upload URL) and an
//! upload preset are provided.

use std::path::PathBuf;
use std::time::Duration;

use livetalk_shared::constants::{DEFAULT_AVATAR_URL, UPLOAD_API_BASE};

/// Default `tracing` filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "livetalk_client=debug,livetalk_store=info,warn";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Image hosting account name.
    /// Env: `LIVETALK_CLOUD_NAME`
    /// Default: empty
    pub cloud_name: String,

    /// Unsigned upload preset sent with every upload.
    /// Env: `LIVETALK_UPLOAD_PRESET`
    /// Default: empty
    pub upload_preset: String,

    /// Full upload endpoint, overriding the one derived from `cloud_name`.
    /// Env: `LIVETALK_UPLOAD_URL`
    pub upload_url: Option<String>,

    /// Directory holding the local database.
    /// Env: `LIVETALK_DATA_DIR`
    /// Default: the platform data directory.
    pub data_dir: Option<PathBuf>,

    /// Avatar put on outgoing messages when the user has no photo.
    /// Env: `LIVETALK_DEFAULT_AVATAR`
    pub default_avatar_url: String,

    /// Request timeout for uploads.
    /// Env: `LIVETALK_UPLOAD_TIMEOUT_SECS`
    /// Default: 60 seconds
    pub upload_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            upload_preset: String::new(),
            upload_url: None,
            data_dir: None,
            default_avatar_url: DEFAULT_AVATAR_URL.to_string(),
            upload_timeout: Duration::from_secs(60),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("LIVETALK_CLOUD_NAME") {
            config.cloud_name = name.trim().to_string();
        }

        if let Ok(preset) = std::env::var("LIVETALK_UPLOAD_PRESET") {
            config.upload_preset = preset.trim().to_string();
        }

        if let Ok(url) = std::env::var("LIVETALK_UPLOAD_URL") {
            if !url.trim().is_empty() {
                config.upload_url = Some(url.trim().to_string());
            }
        }

        if let Ok(dir) = std::env::var("LIVETALK_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(url) = std::env::var("LIVETALK_DEFAULT_AVATAR") {
            if !url.is_empty() {
                config.default_avatar_url = url;
            }
        }

        if let Ok(val) = std::env::var("LIVETALK_UPLOAD_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.upload_timeout = Duration::from_secs(secs),
                _ => {
                    tracing::warn!(
                        value = %val,
                        "Invalid LIVETALK_UPLOAD_TIMEOUT_SECS, using default"
                    );
                }
            }
        }

        config
    }

    /// The image upload endpoint, or `None` when uploads are not configured.
    pub fn upload_endpoint(&self) -> Option<String> {
        if self.upload_preset.is_empty() {
            return None;
        }
        if let Some(url) = &self.upload_url {
            return Some(url.clone());
        }
        if self.cloud_name.is_empty() {
            return None;
        }
        Some(format!("{}/{}/image/upload", UPLOAD_API_BASE, self.cloud_name))
    }
}
