//! Configuration for the demo host: fallback variables and the
//! read-only flag, loaded from an optional TOML file.
//!
//! Mirrors spec.md §6's documented fallback variable set (`tab-width`,
//! `default-tab-width`, `indent-tabs-mode`, `indent-width`) for when no
//! richer variable broker is wired up — which, for this CLI, is always,
//! since there is no real editor behind it.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_tab_width")]
    pub tab_width: i64,

    #[serde(default = "default_tab_width")]
    pub default_tab_width: i64,

    #[serde(default)]
    pub indent_tabs_mode: bool,

    #[serde(default = "default_indent_width")]
    pub indent_width: i64,

    /// Refuse commands whose `CmdDef::mutates` is set.
    #[serde(default)]
    pub read_only: bool,
}

fn default_tab_width() -> i64 {
    8
}

fn default_indent_width() -> i64 {
    4
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tab_width: default_tab_width(),
            default_tab_width: default_tab_width(),
            indent_tabs_mode: false,
            indent_width: default_indent_width(),
            read_only: false,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_fallback_variables() {
        let config = Config::default();
        assert_eq!(config.tab_width, 8);
        assert_eq!(config.indent_width, 4);
        assert!(!config.indent_tabs_mode);
        assert!(!config.read_only);
    }

    #[test]
    fn loads_partial_toml_with_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qescript.toml");
        std::fs::write(&path, "read_only = true\n").unwrap();
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.read_only);
        assert_eq!(config.tab_width, 8);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load_from_path(Path::new("/nonexistent/qescript.toml")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
