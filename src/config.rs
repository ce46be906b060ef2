//! Playground config — loaded from ~/.sieveplay/config.yaml.
//!
//! Every field is optional in the file; a missing file means defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::sieve::GenerateOpts;
use crate::state::StalePolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Built-in colour schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Default,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaygroundConfig {
    pub stale_results: StalePolicy,
    pub worker_entry: bool,
    pub debug: bool,
    pub keep_address: Option<String>,
    pub vacation_from: Option<String>,
    pub theme: ThemeName,
    /// `tracing` filter directive, e.g. `debug` or `sieveplay=trace`.
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            stale_results: StalePolicy::default(),
            worker_entry: true,
            debug: false,
            keep_address: None,
            vacation_from: None,
            theme: ThemeName::default(),
            log_level: None,
            log_file: None,
        }
    }
}

impl PlaygroundConfig {
    /// Parse a YAML document. An empty document yields defaults.
    pub fn from_yaml(yaml: &str, path: &Path) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`. A file that does not exist yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from the default location, if there is a home directory.
    pub fn load() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Code generation options derived from this config.
    pub fn generate_opts(&self) -> GenerateOpts {
        GenerateOpts {
            debug: self.debug,
            worker_entry: self.worker_entry,
            keep_address: self.keep_address.clone(),
            vacation_from: self.vacation_from.clone(),
        }
    }
}

/// `~/.sieveplay`, where config and logs live.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".sieveplay"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

pub fn default_log_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("sieveplay.log"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = PlaygroundConfig::default();
        assert_eq!(config.stale_results, StalePolicy::DiscardStale);
        assert!(config.worker_entry);
        assert_eq!(config.generate_opts(), GenerateOpts::default());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "stale_results: last-resolved\nkeep_address: inbox@example.com\ntheme: light\n";
        let config = PlaygroundConfig::from_yaml(yaml, Path::new("config.yaml")).unwrap();
        assert_eq!(config.stale_results, StalePolicy::LastResolved);
        assert_eq!(config.theme, ThemeName::Light);
        assert!(config.worker_entry);
        assert_eq!(
            config.generate_opts().keep_address.as_deref(),
            Some("inbox@example.com")
        );
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = PlaygroundConfig::from_yaml("  \n", Path::new("c.yaml")).unwrap();
        assert_eq!(config, PlaygroundConfig::default());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let err = PlaygroundConfig::from_yaml("colour: red\n", Path::new("c.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid config c.yaml"));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlaygroundConfig::load_from(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, PlaygroundConfig::default());
    }

    #[test]
    fn loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debug: true\nworker_entry: false\nlog_level: trace").unwrap();
        let config = PlaygroundConfig::load_from(file.path()).unwrap();
        assert!(config.debug);
        assert!(!config.worker_entry);
        assert_eq!(config.log_level.as_deref(), Some("trace"));
    }

    #[test]
    fn directory_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlaygroundConfig::load_from(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
