//! Configuration schema for strata
//!
//! Configuration is stored at `~/.config/strata/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build defaults
    pub build: BuildConfig,

    /// Build context handling
    pub context: ContextConfig,

    /// Signature store settings
    pub store: StoreConfig,
}

/// Build defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Backend whose identity is folded into every signature
    pub backend: String,

    /// Keep the extracted build context after signing
    pub keep_context: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            backend: "podman".to_string(),
            keep_context: false,
        }
    }
}

/// Build context handling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Where archive contexts are unpacked (state dir when unset)
    pub extraction_root: Option<PathBuf>,
}

/// Signature store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Auto-remove recorded builds older than N days (0 = disabled)
    pub gc_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { gc_days: 30 }
    }
}
