//! Configuration file support for sessionlens.
//!
//! Loads `sessionlens.toml` from the working directory, falling back to
//! `<config dir>/sessionlens/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use tracing::debug;

/// The per-project config file name
pub const CONFIG_FILE_NAME: &str = "sessionlens.toml";

/// Default markdown viewer command
pub const DEFAULT_VIEWER: [&str; 2] = ["glow", "-"];

/// Tri-state switch used for colors and emoji.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    #[default]
    Auto,
    Always,
    Never,
}

impl Toggle {
    /// Resolve to a concrete setting, using `auto` when the toggle is `Auto`.
    pub fn resolve(self, auto: bool) -> bool {
        match self {
            Toggle::Auto => auto,
            Toggle::Always => true,
            Toggle::Never => false,
        }
    }
}

/// Settings loaded from a config file. Every key is optional.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default kind letters to show
    pub types: Option<String>,
    /// Default truncation width
    pub width: Option<i64>,
    /// Show timestamps by default
    pub timestamps: Option<bool>,
    pub colors: Option<Toggle>,
    pub emoji: Option<Toggle>,
    /// Where session logs live (default `~/.claude`)
    pub claude_dir: Option<PathBuf>,
    /// Markdown viewer program and arguments
    pub viewer: Option<Vec<String>>,
}

impl Config {
    /// Load configuration for `working_dir`.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if a file exists and parses successfully
    /// - `Ok(None)` if neither file exists
    /// - `Err(...)` if a file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let local = working_dir.join(CONFIG_FILE_NAME);
        if local.exists() {
            return Self::load_from(&local);
        }

        match user_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// Load a specific config file, `Ok(None)` when it does not exist.
    pub fn load_from(config_path: &Path) -> Result<Option<Self>> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        debug!(path = %config_path.display(), "Loaded config");
        Ok(Some(config))
    }

    /// Session log root. Priority: `claude_dir` > `~/.claude`
    pub fn claude_dir(&self) -> Option<PathBuf> {
        self.claude_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".claude")))
    }

    /// Viewer command line. An empty list falls back to the default.
    pub fn viewer(&self) -> Vec<String> {
        match &self.viewer {
            Some(viewer) if !viewer.is_empty() => viewer.clone(),
            _ => DEFAULT_VIEWER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sessionlens").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_full_config() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
types = "UR"
width = 80
timestamps = true
colors = "never"
emoji = "always"
claude_dir = "/data/claude"
viewer = ["bat", "-l", "md"]
"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.types.as_deref(), Some("UR"));
        assert_eq!(config.width, Some(80));
        assert_eq!(config.timestamps, Some(true));
        assert_eq!(config.colors, Some(Toggle::Never));
        assert_eq!(config.emoji, Some(Toggle::Always));
        assert_eq!(config.claude_dir(), Some(PathBuf::from("/data/claude")));
        assert_eq!(config.viewer(), vec!["bat", "-l", "md"]);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let result = Config::load_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_unknown_key_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "colour = \"always\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }

    #[test]
    fn test_invalid_toggle_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "emoji = \"sometimes\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.viewer(), vec!["glow", "-"]);

        let config = Config {
            viewer: Some(Vec::new()),
            ..Config::default()
        };
        assert_eq!(config.viewer(), vec!["glow", "-"]);
    }

    #[test]
    fn test_toggle_resolve() {
        assert!(Toggle::Auto.resolve(true));
        assert!(!Toggle::Auto.resolve(false));
        assert!(Toggle::Always.resolve(false));
        assert!(!Toggle::Never.resolve(true));
    }
}
