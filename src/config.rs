//! `endpoint-comments.toml` discovery and parsing.
//!
//! The configuration lives next to the sources being annotated, usually at
//! the project root, and is found by walking up from the scanned path.
//!
//! # File format
//!
//! ```toml
//! # Base of every generated URL. Defaults to https://localhost:<port>, with
//! # the port read from the Spring application properties/YAML.
//! base_url = "https://api.example.test"
//!
//! # File extensions to scan:
//! extensions = ["java"]
//!
//! # Directory names skipped while walking:
//! exclude = ["target", "build", ".git", "node_modules"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "endpoint-comments.toml";

/// Configuration for one workspace.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// The file this config was loaded from.
    #[serde(skip)]
    pub source: Option<PathBuf>,

    /// The `baseUrl` value. `None` means derive it from the resolved port.
    pub base_url: Option<String>,

    /// Extensions of files considered for annotation (without the dot).
    pub extensions: Vec<String>,

    /// Directory names never descended into.
    pub exclude: Vec<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            source: None,
            base_url: None,
            extensions: vec!["java".to_string()],
            exclude: ["target", "build", ".git", ".gradle", "node_modules"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl EndpointConfig {
    /// Look up a configuration value by key. Only `baseUrl` (alias
    /// `base_url`) is defined; blank values count as absent.
    pub fn value(&self, key: &str) -> Option<String> {
        match key {
            "baseUrl" | "base_url" => self
                .base_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(String::from),
            _ => None,
        }
    }

    /// Replace the base URL when `base_url` is given (command-line or
    /// editor settings win over the file).
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if base_url.is_some() {
            self.base_url = base_url;
        }
        self
    }

    /// Whether a file extension is scanned.
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }

    /// Whether a directory name is skipped.
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        self.exclude.iter().any(|name| name == dir_name)
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Walk up from `start` and return the first config file found.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load an [`EndpointConfig`] from a config file.
pub fn load_config(path: &Path) -> Result<EndpointConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let mut config: EndpointConfig =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    config.source = Some(path.to_path_buf());

    Ok(config)
}

/// Discover and load the config for a path, falling back to defaults when
/// no config file exists above it.
pub fn discover_config(path: &Path) -> Result<EndpointConfig> {
    match find_config_file(path) {
        Some(file) => load_config(&file),
        None => Ok(EndpointConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: EndpointConfig = toml::from_str(
            r#"
base_url = "https://api.example.test/"
extensions = ["java", "kt"]
exclude = ["out"]
"#,
        )
        .unwrap();

        assert_eq!(
            config.value("baseUrl").as_deref(),
            Some("https://api.example.test/")
        );
        assert!(config.accepts_extension("kt"));
        assert!(config.accepts_extension("JAVA"));
        assert!(!config.accepts_extension("rs"));
        assert!(config.is_excluded("out"));
        assert!(!config.is_excluded("target"));
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: EndpointConfig = toml::from_str("").unwrap();
        assert_eq!(config.value("baseUrl"), None);
        assert_eq!(config.extensions, ["java"]);
        assert!(config.is_excluded("target"));
    }

    #[test]
    fn test_blank_base_url_is_absent() {
        let config = EndpointConfig::default().with_base_url(Some("   ".into()));
        assert_eq!(config.value("base_url"), None);
        assert_eq!(config.value("unknown"), None);
    }

    #[test]
    fn test_override_wins_over_file() {
        let config = EndpointConfig {
            base_url: Some("https://file".into()),
            ..Default::default()
        };
        assert_eq!(
            config.clone().with_base_url(Some("https://cli".into())).value("baseUrl").as_deref(),
            Some("https://cli")
        );
        assert_eq!(config.with_base_url(None).value("baseUrl").as_deref(), Some("https://file"));
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src/main/java");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "base_url = \"http://localhost:9000\"\n",
        )
        .unwrap();

        let config = discover_config(&nested).unwrap();
        assert_eq!(config.value("baseUrl").as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.source, Some(dir.path().join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap_err();
        assert!(err.to_string().contains("reading"));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "base_url = [").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }
}
