//! Server configuration loaded from the environment.
//!
//! Variables:
//! - `TIKTOK_CLIENT_KEY` / `TIKTOK_CLIENT_SECRET` (required)
//! - `TIKTOK_SCOPE` (default `user.info.basic`)
//! - `TIKTOK_SKIP_INFO` (`true`/`false`, default `false`)
//! - `PUBLIC_URL` (default `http://localhost:{port}`), used to build the callback URL
//! - `SERVER_HOST` (default `127.0.0.1`) / `SERVER_PORT` (default `3000`)

use anyhow::{Context, Result};
use ras_identity_tiktok::TikTokConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::info;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tiktok: TikTokConfig,
    pub public_url: String,
    pub host: IpAddr,
    pub port: u16,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let client_key = lookup("TIKTOK_CLIENT_KEY").context("TIKTOK_CLIENT_KEY is not set")?;
        let client_secret =
            lookup("TIKTOK_CLIENT_SECRET").context("TIKTOK_CLIENT_SECRET is not set")?;

        let mut tiktok = TikTokConfig::new(client_key, client_secret);
        if let Some(scope) = lookup("TIKTOK_SCOPE") {
            tiktok = tiktok.with_scope(scope);
        }
        if let Some(skip_info) = lookup("TIKTOK_SKIP_INFO") {
            let skip_info = skip_info
                .trim()
                .parse::<bool>()
                .context("Invalid TIKTOK_SKIP_INFO value")?;
            tiktok = tiktok.with_skip_info(skip_info);
        }

        let host = match lookup("SERVER_HOST") {
            Some(host) => host.parse().context("Invalid SERVER_HOST value")?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let port = match lookup("SERVER_PORT") {
            Some(port) => port.parse().context("Invalid SERVER_PORT value")?,
            None => 3000,
        };
        let public_url = lookup("PUBLIC_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let config = Self {
            tiktok,
            public_url,
            host,
            port,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.tiktok
            .validate()
            .context("Invalid TikTok configuration")?;
        if self.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
