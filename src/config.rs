//! Search configuration
//!
//! Read from `.symfind.json` in the project root when present. Every field
//! has a default, so a partial file is fine.

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = ".symfind.json";

/// Which backend to use
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// Pick one from project markers and installed tools
    #[default]
    Detect,
    Named(String),
}

impl FromStr for BackendPreference {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("detect") {
            Ok(BackendPreference::Detect)
        } else {
            Ok(BackendPreference::Named(s.to_string()))
        }
    }
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendPreference::Detect => f.write_str("detect"),
            BackendPreference::Named(name) => f.write_str(name),
        }
    }
}

impl Serialize for BackendPreference {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BackendPreference {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub backend: BackendPreference,
    /// ripgrep binary (None: `rg` from PATH)
    pub ripgrep_path: Option<PathBuf>,
    /// grep binary used when ripgrep is missing (None: `grep` from PATH)
    pub grep_path: Option<PathBuf>,
    /// GNU Global binary (None: `global` from PATH)
    pub global_path: Option<PathBuf>,
    /// Native backend: honour .gitignore and friends
    pub respect_gitignore: bool,
    /// Native backend: skip files larger than this many bytes
    pub max_file_size: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: BackendPreference::Detect,
            ripgrep_path: None,
            grep_path: None,
            global_path: None,
            respect_gitignore: true,
            max_file_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl SearchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| SearchError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| SearchError::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// `<root>/.symfind.json` if it exists, defaults otherwise
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            log::debug!("loading configuration from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            r#"{ "backend": "native", "max_file_size": 1024 }"#,
        )?;

        let config = SearchConfig::discover(temp_dir.path())?;
        assert_eq!(config.backend, BackendPreference::Named("native".into()));
        assert_eq!(config.max_file_size, 1024);
        assert!(config.respect_gitignore);
        assert_eq!(config.ripgrep_path, None);
        Ok(())
    }

    #[test]
    fn test_missing_file_gives_defaults() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        assert_eq!(SearchConfig::discover(temp_dir.path())?, SearchConfig::default());
        Ok(())
    }

    #[test]
    fn test_malformed_file_is_a_config_error() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "{ backend: ")?;
        assert!(matches!(
            SearchConfig::discover(temp_dir.path()),
            Err(SearchError::Config(_))
        ));
        Ok(())
    }

    #[test]
    fn test_backend_preference_round_trip() {
        assert_eq!("detect".parse::<BackendPreference>().unwrap(), BackendPreference::Detect);
        assert_eq!("".parse::<BackendPreference>().unwrap(), BackendPreference::Detect);
        assert_eq!(
            "global".parse::<BackendPreference>().unwrap(),
            BackendPreference::Named("global".into())
        );
        let json = serde_json::to_string(&SearchConfig::default()).unwrap();
        assert!(json.contains(r#""backend":"detect""#));
    }
}
