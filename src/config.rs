// ⚙️ Configuration - defaults, optional JSON file, command-line overrides

use crate::comments::DEFAULT_COMMENTS_FILE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_WEB_DIR: &str = "web";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON file backing the comment board
    pub comments_file: PathBuf,

    /// Address the web server listens on
    pub bind_addr: String,

    /// Directory served under /static
    pub web_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            comments_file: PathBuf::from(DEFAULT_COMMENTS_FILE),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            web_dir: PathBuf::from(DEFAULT_WEB_DIR),
        }
    }
}

/// Values given on the command line; `None` keeps the file/default value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub comments_file: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub web_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a JSON file; missing keys fall back to defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path.as_ref()))?;

        Ok(config)
    }

    /// Defaults, then the optional config file, then command-line overrides
    pub fn resolve(config_file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(comments_file) = overrides.comments_file {
            self.comments_file = comments_file;
        }
        if let Some(bind_addr) = overrides.bind_addr {
            self.bind_addr = bind_addr;
        }
        if let Some(web_dir) = overrides.web_dir {
            self.web_dir = web_dir;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryLog;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.comments_file, PathBuf::from("comments.json"));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("converter.json");
        fs::write(&path, r#"{"bind_addr": "127.0.0.1:8080"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.comments_file, PathBuf::from("comments.json"));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("converter.json");
        fs::write(&path, r#"{"comments_file": "from_file.json"}"#).unwrap();

        let config = Config::resolve(
            Some(&path),
            ConfigOverrides {
                comments_file: Some(PathBuf::from("from_flag.json")),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.comments_file, PathBuf::from("from_flag.json"));
    }

    #[test]
    fn test_history_size_is_not_configurable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("converter.json");
        fs::write(&path, r#"{"history_capacity": 8, "bind_addr": "127.0.0.1:9000"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");

        let mut log = HistoryLog::new();
        for i in 0..8 {
            log.record(i.to_string());
        }
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn test_bad_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("converter.json");
        fs::write(&path, "not json").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config JSON"));
    }
}
