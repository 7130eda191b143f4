//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::Mode;

/// Top-level slidequiz configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidequizConfig {
    /// Directory searched for unit set files.
    #[serde(default = "default_lessons_dir")]
    pub lessons_dir: PathBuf,
    /// Mode used instead of each unit set's own, if set.
    #[serde(default)]
    pub default_mode: Option<Mode>,
    /// Fixed shuffle seed for reproducible sessions.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Where session reports are written.
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
}

fn default_lessons_dir() -> PathBuf {
    PathBuf::from("./lessons")
}
fn default_report_dir() -> PathBuf {
    PathBuf::from("./slidequiz-reports")
}

impl Default for SlidequizConfig {
    fn default() -> Self {
        Self {
            lessons_dir: default_lessons_dir(),
            default_mode: None,
            seed: None,
            report_dir: default_report_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `slidequiz.toml` in the current directory
/// 2. `~/.config/slidequiz/config.toml`
///
/// Environment variable override: `SLIDEQUIZ_SEED`.
pub fn load_config() -> Result<SlidequizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<SlidequizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("slidequiz.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<SlidequizConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => SlidequizConfig::default(),
    };

    apply_seed_override(&mut config, std::env::var("SLIDEQUIZ_SEED").ok().as_deref())?;

    config.lessons_dir = resolve_path(&config.lessons_dir);
    config.report_dir = resolve_path(&config.report_dir);

    Ok(config)
}

fn apply_seed_override(config: &mut SlidequizConfig, raw: Option<&str>) -> Result<()> {
    if let Some(raw) = raw {
        let seed = raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("SLIDEQUIZ_SEED is not a number: {raw}"))?;
        config.seed = Some(seed);
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("slidequiz"))
}
