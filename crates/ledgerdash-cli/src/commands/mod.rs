//! CLI command handlers

pub mod check_config;
pub mod demo;

use anyhow::{Context, Result};
use ledgerdash_app::AppConfig;
use std::path::Path;

/// Resolve configuration from a TOML file, or from the environment.
pub fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => AppConfig::from_env().context("resolving configuration from environment"),
    }
}
