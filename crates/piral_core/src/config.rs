use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::apps::AppDefaults;
use crate::choices::{FORCE_OVERWRITE_KEYS, ForceOverwrite, PILET_LANGUAGE_KEYS, PiletLanguage};

pub const CONFIG_DIR: &str = ".piral";
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct PiralConfig {
    #[serde(default)]
    pub defaults: DefaultsSection,
}

/// Overrides for the stock flag defaults, shared across commands.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct DefaultsSection {
    pub cache_dir: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<u8>,
    pub registry: Option<String>,
    pub feed_url: Option<String>,
    pub api_key: Option<String>,
    pub language: Option<String>,
    pub force_overwrite: Option<String>,
}

/// `<cwd>/.piral/config.toml` unless an explicit path is given.
pub fn config_path(cwd: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => cwd.join(CONFIG_DIR).join(CONFIG_FILENAME),
    }
}

/// Load and parse a PiralConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<PiralConfig> {
    if !config_path.exists() {
        return Ok(PiralConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: PiralConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

impl PiralConfig {
    /// Layer env > config > `base` and return the merged defaults.
    pub fn apply(&self, base: AppDefaults) -> Result<AppDefaults> {
        self.apply_with_lookup(base, |key| env::var(key).ok())
    }

    fn apply_with_lookup<F>(&self, mut merged: AppDefaults, lookup_env: F) -> Result<AppDefaults>
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = &self.defaults;

        if let Some(cache_dir) = non_empty(section.cache_dir.as_deref()) {
            merged.debug_piral.cache_dir = cache_dir.clone();
            merged.build_piral.cache_dir = cache_dir.clone();
            merged.debug_pilet.cache_dir = cache_dir.clone();
            merged.build_pilet.cache_dir = cache_dir;
        }

        if let Some(port) = section.port {
            if port == 0 {
                bail!("[defaults] port must be greater than 0");
            }
            merged.debug_piral.port = port;
            merged.debug_pilet.port = port;
        }

        if let Some(level) = section.log_level {
            if !(1..=5).contains(&level) {
                bail!("[defaults] log_level must be between 1 and 5, got {level}");
            }
            merged.debug_piral.log_level = level;
            merged.build_piral.log_level = level;
            merged.validate_piral.log_level = level;
            merged.debug_pilet.log_level = level;
            merged.build_pilet.log_level = level;
            merged.validate_pilet.log_level = level;
        }

        if let Some(key) = non_empty(section.language.as_deref()) {
            let Some(language) = PiletLanguage::from_key(&key) else {
                bail!(
                    "[defaults] language `{key}` is not one of: {}",
                    PILET_LANGUAGE_KEYS.join(", ")
                );
            };
            merged.new_piral.language = language;
            merged.new_pilet.language = language;
        }

        if let Some(key) = non_empty(section.force_overwrite.as_deref()) {
            let Some(force_overwrite) = ForceOverwrite::from_key(&key) else {
                bail!(
                    "[defaults] force_overwrite `{key}` is not one of: {}",
                    FORCE_OVERWRITE_KEYS.join(", ")
                );
            };
            merged.new_piral.force_overwrite = force_overwrite;
            merged.new_pilet.force_overwrite = force_overwrite;
            merged.upgrade_pilet.force_overwrite = force_overwrite;
        }

        if let Some(registry) = layered(&lookup_env, "PIRAL_REGISTRY", &section.registry) {
            merged.new_pilet.registry = registry;
        }
        if let Some(url) = layered(&lookup_env, "PIRAL_FEED_URL", &section.feed_url) {
            merged.publish_pilet.url = url;
        }
        if let Some(api_key) = layered(&lookup_env, "PIRAL_API_KEY", &section.api_key) {
            merged.publish_pilet.api_key = api_key;
        }

        Ok(merged)
    }
}

fn layered<F>(lookup_env: &F, key: &str, configured: &Option<String>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup_env(key).as_deref()).or_else(|| non_empty(configured.as_deref()))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
