//! Effective configuration for a CLI run
//!
//! Defaults, then the `--config` TOML file, then the environment (with
//! `.env` already loaded), then command-line overrides.

use std::path::Path;

use anyhow::{Context, Result};
use social_store::StoreConfig;

/// Command-line values that override file and environment settings
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database_url: Option<String>,
    pub no_cache: bool,
}

pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<StoreConfig> {
    let config = match path {
        Some(path) => StoreConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => StoreConfig::default(),
    };

    let mut config = config
        .merge_env()
        .context("Invalid configuration in environment")?;

    if let Some(url) = overrides.database_url {
        config.database_url = url;
    }
    if overrides.no_cache {
        config.redis.enabled = false;
    }

    tracing::debug!(
        max_open_conns = config.max_open_conns,
        query_timeout = ?config.query_timeout,
        cache = config.redis.enabled,
        "configuration loaded"
    );
    Ok(config)
}
