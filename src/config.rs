use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to, e.g. "127.0.0.1:7990"
    pub listen_addr: String,

    /// SQLite connection string, e.g. "sqlite:linkblog.db"
    pub database_url: String,

    /// Public base address used when building short links in the feed,
    /// e.g. "https://links.example.com". Never has a trailing slash.
    pub pretty_addr: String,

    /// Maximum number of items in the RSS feed
    pub feed_limit: u32,

    /// Directory whose `static/` subdirectory is served under `/s/`
    pub asset_dir: PathBuf,

    /// Working directory holding `rss.xml` and its fingerprint file
    pub feed_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| "127.0.0.1:7990".into());

        let pretty_addr = lookup("PRETTY_ADDR")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("http://{listen_addr}"))
            .trim_end_matches('/')
            .to_owned();

        let feed_limit = match lookup("FEED_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .context("FEED_LIMIT must be a positive integer")?,
            None => 50,
        };
        if feed_limit == 0 {
            anyhow::bail!("FEED_LIMIT must be greater than zero");
        }

        let feed_dir = lookup("FEED_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("linkblog"));

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:linkblog.db".into()),
            listen_addr,
            pretty_addr,
            feed_limit,
            asset_dir: lookup("ASSET_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            feed_dir,
        })
    }
}
