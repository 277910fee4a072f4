//! Server configuration.
//!
//! Settings come from an optional TOML file with CLI flags layered on top.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::media::remote::{SIGN_TTL_SECS, STREAM_TTL_SECS};

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_MEDIA_ROOT: &str = "public";

fn default_stream_ttl() -> u64 {
    STREAM_TTL_SECS
}

fn default_sign_ttl() -> u64 {
    SIGN_TTL_SECS
}

/// Remote object store connection settings.
#[derive(Clone, Debug, Deserialize)]
pub struct RemoteStorageConfig {
    /// Storage API base URL, e.g. `https://media.example.com/storage/v1`.
    pub base_url: String,
    pub bucket: String,
    /// Service key used for signing and deletion. Never sent to clients.
    pub service_key: String,
    #[serde(default = "default_stream_ttl")]
    pub stream_ttl_secs: u64,
    #[serde(default = "default_sign_ttl")]
    pub sign_ttl_secs: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. `0.0.0.0:8080`.
    pub bind: Option<String>,
    /// Base URL clients reach this server on.
    pub public_base_url: Option<String>,
    /// Directory local media paths resolve under.
    pub media_root: Option<PathBuf>,
    /// Catalog TOML file to load at startup.
    pub catalog_file: Option<PathBuf>,
    /// Bearer token granting admin access. No token means no admin access.
    pub admin_token: Option<String>,
    pub remote_storage: Option<RemoteStorageConfig>,
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

pub fn bind_from_config(cli_bind: Option<&str>, config: &ServerConfig) -> String {
    cli_bind
        .map(|s| s.to_string())
        .or_else(|| config.bind.clone())
        .unwrap_or_else(|| DEFAULT_BIND.to_string())
}

pub fn media_root_from_config(cli_root: Option<&Path>, config: &ServerConfig) -> PathBuf {
    cli_root
        .map(|p| p.to_path_buf())
        .or_else(|| config.media_root.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT))
}

pub fn public_base_url_from_config(config: &ServerConfig, bind: &str) -> String {
    config
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("http://{bind}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: ServerConfig = toml::from_str(
            r#"
            bind = "0.0.0.0:9000"
            public_base_url = "https://music.example.com"
            media_root = "/srv/media"
            catalog_file = "/srv/catalog.toml"
            admin_token = "secret"

            [remote_storage]
            base_url = "https://media.example.com/storage/v1"
            bucket = "albums"
            service_key = "svc"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind.as_deref(), Some("0.0.0.0:9000"));
        let remote = config.remote_storage.unwrap();
        assert_eq!(remote.stream_ttl_secs, STREAM_TTL_SECS);
        assert_eq!(remote.sign_ttl_secs, SIGN_TTL_SECS);
    }

    #[test]
    fn cli_overrides_win() {
        let config: ServerConfig = toml::from_str(r#"bind = "0.0.0.0:9000""#).unwrap();
        assert_eq!(bind_from_config(Some("127.0.0.1:7000"), &config), "127.0.0.1:7000");
        assert_eq!(bind_from_config(None, &config), "0.0.0.0:9000");
        assert_eq!(
            bind_from_config(None, &ServerConfig::default()),
            DEFAULT_BIND
        );
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let config = ServerConfig::default();
        assert_eq!(
            media_root_from_config(None, &config),
            PathBuf::from(DEFAULT_MEDIA_ROOT)
        );
        assert_eq!(
            public_base_url_from_config(&config, "127.0.0.1:8080"),
            "http://127.0.0.1:8080"
        );
    }
}
