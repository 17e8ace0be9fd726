//! lessonquiz configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use lessonquiz_core::parser::DEFAULT_CHAPTER_FILE;

/// Top-level lessonquiz configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonquizConfig {
    /// Folder holding one subfolder per chapter.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
    /// Name of the chapter document inside each chapter folder.
    #[serde(default = "default_chapter_file")]
    pub chapter_file: String,
    /// JSON document holding the latest result of every chapter.
    #[serde(default = "default_results_path")]
    pub results_path: PathBuf,
    /// Grace window before checking a multi-select answer.
    #[serde(default = "default_debounce_ms")]
    pub multi_select_debounce_ms: u64,
    /// Percentage shown as a pass in reports.
    #[serde(default = "default_pass_percentage")]
    pub pass_percentage: u32,
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("./chapters")
}
fn default_chapter_file() -> String {
    DEFAULT_CHAPTER_FILE.to_string()
}
fn default_results_path() -> PathBuf {
    PathBuf::from("./lessonquiz-results/test_results.json")
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_pass_percentage() -> u32 {
    70
}

impl Default for LessonquizConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            chapter_file: default_chapter_file(),
            results_path: default_results_path(),
            multi_select_debounce_ms: default_debounce_ms(),
            pass_percentage: default_pass_percentage(),
        }
    }
}

impl LessonquizConfig {
    pub fn multi_select_debounce(&self) -> Duration {
        Duration::from_millis(self.multi_select_debounce_ms)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied as they are, never expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
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
/// 1. `lessonquiz.toml` in the current directory
/// 2. `~/.config/lessonquiz/config.toml`
///
/// Environment variable overrides: `LESSONQUIZ_CONTENT_DIR`, `LESSONQUIZ_RESULTS_PATH`.
pub fn load_config() -> Result<LessonquizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LessonquizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("lessonquiz.toml");
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
            let config = parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => LessonquizConfig::default(),
    };

    // Apply env var overrides
    if let Ok(dir) = std::env::var("LESSONQUIZ_CONTENT_DIR") {
        config.content_dir = PathBuf::from(dir);
    }
    if let Ok(path) = std::env::var("LESSONQUIZ_RESULTS_PATH") {
        config.results_path = PathBuf::from(path);
    }

    Ok(config)
}

/// Parse a TOML config string and resolve `${VAR}` references in it.
pub fn parse_config_str(content: &str) -> Result<LessonquizConfig> {
    let mut config: LessonquizConfig = toml::from_str(content)?;
    config.content_dir = resolve_path(&config.content_dir);
    config.results_path = resolve_path(&config.results_path);
    config.chapter_file = resolve_env_vars(&config.chapter_file);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("lessonquiz"))
}
