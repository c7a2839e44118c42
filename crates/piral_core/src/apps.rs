//! Collaborator seam for the operations behind each command.
//!
//! Bundling, scaffolding, package installation and feed publishing live
//! outside this crate. [`Apps`] is the boundary; [`Preflight`] is the
//! built-in implementation that checks inputs and reports what it would
//! hand to a real backend.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::choices::{BuildType, ForceOverwrite, PiletLanguage, TemplateType};

pub const DEFAULT_LOG_LEVEL: u8 = 3;
pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_CACHE_DIR: &str = ".cache";
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugPiralOptions {
    pub entry: String,
    pub cache_dir: String,
    pub port: u16,
    pub hmr: bool,
    pub auto_install: bool,
    pub scope_hoist: bool,
    pub public_url: String,
    pub log_level: u8,
    pub fresh: bool,
    pub open: bool,
}

impl Default for DebugPiralOptions {
    fn default() -> Self {
        Self {
            entry: "./".to_string(),
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            port: DEFAULT_PORT,
            hmr: true,
            auto_install: true,
            scope_hoist: false,
            public_url: "/".to_string(),
            log_level: DEFAULT_LOG_LEVEL,
            fresh: false,
            open: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPiralOptions {
    pub entry: String,
    pub target: String,
    pub cache_dir: String,
    pub public_url: String,
    pub minify: bool,
    pub scope_hoist: bool,
    pub content_hash: bool,
    pub source_maps: bool,
    pub detailed_report: bool,
    pub log_level: u8,
    pub fresh: bool,
    #[serde(rename = "type")]
    pub build_type: BuildType,
}

impl Default for BuildPiralOptions {
    fn default() -> Self {
        Self {
            entry: "./".to_string(),
            target: "./dist".to_string(),
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            public_url: "/".to_string(),
            minify: true,
            scope_hoist: false,
            content_hash: true,
            source_maps: true,
            detailed_report: false,
            log_level: DEFAULT_LOG_LEVEL,
            fresh: true,
            build_type: BuildType::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPiralOptions {
    pub app: String,
    pub target: String,
    pub only_core: bool,
    pub version: String,
    pub force_overwrite: ForceOverwrite,
    pub language: PiletLanguage,
    pub skip_install: bool,
    pub template: TemplateType,
}

impl Default for NewPiralOptions {
    fn default() -> Self {
        Self {
            app: "./src/index.html".to_string(),
            target: ".".to_string(),
            only_core: false,
            version: "latest".to_string(),
            force_overwrite: ForceOverwrite::No,
            language: PiletLanguage::Ts,
            skip_install: false,
            template: TemplateType::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePiralOptions {
    pub entry: String,
    pub log_level: u8,
}

impl Default for ValidatePiralOptions {
    fn default() -> Self {
        Self {
            entry: "./".to_string(),
            log_level: DEFAULT_LOG_LEVEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugPiletOptions {
    pub entry: String,
    pub cache_dir: String,
    pub port: u16,
    pub scope_hoist: bool,
    pub hmr: bool,
    pub auto_install: bool,
    pub app: Option<String>,
    pub log_level: u8,
    pub fresh: bool,
    pub open: bool,
}

impl Default for DebugPiletOptions {
    fn default() -> Self {
        Self {
            entry: "./src/index".to_string(),
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            port: DEFAULT_PORT,
            scope_hoist: false,
            hmr: true,
            auto_install: true,
            app: None,
            log_level: DEFAULT_LOG_LEVEL,
            fresh: false,
            open: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPiletOptions {
    pub entry: String,
    pub target: String,
    pub cache_dir: String,
    pub minify: bool,
    pub content_hash: bool,
    pub source_maps: bool,
    pub scope_hoist: bool,
    pub detailed_report: bool,
    pub fresh: bool,
    pub log_level: u8,
}

impl Default for BuildPiletOptions {
    fn default() -> Self {
        Self {
            entry: "./src/index".to_string(),
            target: "./dist/index.js".to_string(),
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            minify: true,
            content_hash: true,
            source_maps: true,
            scope_hoist: false,
            detailed_report: false,
            fresh: true,
            log_level: DEFAULT_LOG_LEVEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackPiletOptions {
    pub source: String,
    pub target: String,
}

impl Default for PackPiletOptions {
    fn default() -> Self {
        Self {
            source: "./".to_string(),
            target: "./".to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPiletOptions {
    pub source: String,
    pub url: String,
    pub api_key: String,
    pub fresh: bool,
}

impl Debug for PublishPiletOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishPiletOptions")
            .field("source", &self.source)
            .field("url", &self.url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("fresh", &self.fresh)
            .finish()
    }
}

impl Default for PublishPiletOptions {
    fn default() -> Self {
        Self {
            source: "*.tgz".to_string(),
            url: String::new(),
            api_key: String::new(),
            fresh: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPiletOptions {
    pub target: String,
    pub source: String,
    pub registry: String,
    pub force_overwrite: ForceOverwrite,
    pub language: PiletLanguage,
    pub skip_install: bool,
    pub template: TemplateType,
}

impl Default for NewPiletOptions {
    fn default() -> Self {
        Self {
            target: ".".to_string(),
            source: "piral".to_string(),
            registry: DEFAULT_REGISTRY.to_string(),
            force_overwrite: ForceOverwrite::No,
            language: PiletLanguage::Ts,
            skip_install: false,
            template: TemplateType::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradePiletOptions {
    pub target: String,
    pub version: String,
    pub force_overwrite: ForceOverwrite,
}

impl Default for UpgradePiletOptions {
    fn default() -> Self {
        Self {
            target: ".".to_string(),
            version: "latest".to_string(),
            force_overwrite: ForceOverwrite::No,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePiletOptions {
    pub entry: String,
    pub log_level: u8,
    pub app: Option<String>,
}

impl Default for ValidatePiletOptions {
    fn default() -> Self {
        Self {
            entry: "./src/index".to_string(),
            log_level: DEFAULT_LOG_LEVEL,
            app: None,
        }
    }
}

/// Per-operation defaults used to populate flag defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppDefaults {
    pub debug_piral: DebugPiralOptions,
    pub build_piral: BuildPiralOptions,
    pub new_piral: NewPiralOptions,
    pub validate_piral: ValidatePiralOptions,
    pub debug_pilet: DebugPiletOptions,
    pub build_pilet: BuildPiletOptions,
    pub pack_pilet: PackPiletOptions,
    pub publish_pilet: PublishPiletOptions,
    pub new_pilet: NewPiletOptions,
    pub upgrade_pilet: UpgradePiletOptions,
    pub validate_pilet: ValidatePiletOptions,
}

pub trait Apps: Send + Sync {
    fn debug_piral(&self, base_dir: &Path, options: DebugPiralOptions) -> Result<()>;
    fn build_piral(&self, base_dir: &Path, options: BuildPiralOptions) -> Result<()>;
    fn new_piral(&self, base_dir: &Path, options: NewPiralOptions) -> Result<()>;
    fn validate_piral(&self, base_dir: &Path, options: ValidatePiralOptions) -> Result<()>;
    fn debug_pilet(&self, base_dir: &Path, options: DebugPiletOptions) -> Result<()>;
    fn build_pilet(&self, base_dir: &Path, options: BuildPiletOptions) -> Result<()>;
    fn pack_pilet(&self, base_dir: &Path, options: PackPiletOptions) -> Result<()>;
    fn publish_pilet(&self, base_dir: &Path, options: PublishPiletOptions) -> Result<()>;
    fn new_pilet(&self, base_dir: &Path, options: NewPiletOptions) -> Result<()>;
    fn upgrade_pilet(&self, base_dir: &Path, options: UpgradePiletOptions) -> Result<()>;
    fn validate_pilet(&self, base_dir: &Path, options: ValidatePiletOptions) -> Result<()>;
}

/// Input checks without a bundler, scaffolder or feed client behind them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preflight;

impl Apps for Preflight {
    fn debug_piral(&self, base_dir: &Path, options: DebugPiralOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        ensure_log_level(options.log_level)?;
        ensure_port(options.port)?;
        unavailable("debug-piral", "bundler", base_dir, &options)
    }

    fn build_piral(&self, base_dir: &Path, options: BuildPiralOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        ensure_log_level(options.log_level)?;
        unavailable("build-piral", "bundler", base_dir, &options)
    }

    fn new_piral(&self, base_dir: &Path, options: NewPiralOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        unavailable("new-piral", "scaffolder", base_dir, &options)
    }

    fn validate_piral(&self, base_dir: &Path, options: ValidatePiralOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        ensure_log_level(options.log_level)?;
        let entry = ensure_entry(base_dir, &options.entry)?;
        tracing::info!(entry = %entry.display(), "Piral instance entry found");
        Ok(())
    }

    fn debug_pilet(&self, base_dir: &Path, options: DebugPiletOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        ensure_log_level(options.log_level)?;
        ensure_port(options.port)?;
        unavailable("debug-pilet", "bundler", base_dir, &options)
    }

    fn build_pilet(&self, base_dir: &Path, options: BuildPiletOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        ensure_log_level(options.log_level)?;
        unavailable("build-pilet", "bundler", base_dir, &options)
    }

    fn pack_pilet(&self, base_dir: &Path, options: PackPiletOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        unavailable("pack-pilet", "packer", base_dir, &options)
    }

    fn publish_pilet(&self, base_dir: &Path, options: PublishPiletOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        if options.url.trim().is_empty() {
            bail!("`publish-pilet` requires a feed URL (pass --url or set PIRAL_FEED_URL)");
        }
        unavailable("publish-pilet", "feed client", base_dir, &options)
    }

    fn new_pilet(&self, base_dir: &Path, options: NewPiletOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        unavailable("new-pilet", "scaffolder", base_dir, &options)
    }

    fn upgrade_pilet(&self, base_dir: &Path, options: UpgradePiletOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        unavailable("upgrade-pilet", "scaffolder", base_dir, &options)
    }

    fn validate_pilet(&self, base_dir: &Path, options: ValidatePiletOptions) -> Result<()> {
        ensure_base_dir(base_dir)?;
        ensure_log_level(options.log_level)?;
        let entry = ensure_entry(base_dir, &options.entry)?;
        tracing::info!(
            entry = %entry.display(),
            app = options.app.as_deref().unwrap_or("<from package.json>"),
            "pilet entry found"
        );
        Ok(())
    }
}

fn unavailable<T: Debug>(
    operation: &str,
    backend: &str,
    base_dir: &Path,
    options: &T,
) -> Result<()> {
    tracing::info!(
        operation,
        base = %base_dir.display(),
        ?options,
        "preflight passed"
    );
    bail!(
        "`{operation}` needs an external {backend}; none is linked into this build.\nResolved base directory: {}",
        normalize_path(base_dir)
    );
}

fn ensure_base_dir(base_dir: &Path) -> Result<()> {
    if !base_dir.is_dir() {
        bail!(
            "base directory does not exist: {}",
            normalize_path(base_dir)
        );
    }
    Ok(())
}

fn ensure_log_level(level: u8) -> Result<()> {
    if !(1..=5).contains(&level) {
        bail!("log level must be between 1 and 5, got {level}");
    }
    Ok(())
}

fn ensure_port(port: u16) -> Result<()> {
    if port == 0 {
        bail!("port must be greater than 0");
    }
    Ok(())
}

/// Resolves `entry` against `base_dir`. Extension-less entries also match
/// the usual script extensions.
fn ensure_entry(base_dir: &Path, entry: &str) -> Result<PathBuf> {
    let candidate = absolutize(Path::new(entry), base_dir);
    if candidate.exists() {
        return Ok(candidate);
    }
    if candidate.extension().is_none() {
        for extension in ["tsx", "ts", "jsx", "js"] {
            let with_extension = candidate.with_extension(extension);
            if with_extension.exists() {
                return Ok(with_extension);
            }
        }
    }
    bail!("entry not found: {}", normalize_path(&candidate));
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
