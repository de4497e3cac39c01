//! Runtime configuration.
//!
//! Values are resolved once at startup: command-line flags and environment
//! variables first, then `~/.kitintel/config.toml`, then built-in defaults.
//! The resulting [`KitConfig`] is passed explicitly to every command.

use kitintel_protocol::defaults::{
    DEFAULT_DEDUP_DELAY_MS, DEFAULT_ENDPOINT, DEFAULT_MAX_UPLOAD_ATTEMPTS, DEFAULT_TIMEOUT_SECS,
};
use kitintel_submit::SubmitConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub submit: SubmitSection,
}

/// `[submit]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmitSection {
    pub max_upload_attempts: Option<u32>,
    pub dedup_delay_ms: Option<u64>,
}

/// Values supplied on the command line (or through clap's `env` fallback).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub download_dir: Option<PathBuf>,
    /// Explicit config file; must exist when set.
    pub config_path: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct KitConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub download_dir: PathBuf,
    pub timeout: Duration,
    pub submit: SubmitConfig,
    /// File the settings were read from, if any.
    pub source: Option<PathBuf>,
}

impl KitConfig {
    /// Read the config file (if any) and merge it with `overrides`.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let (file, source) = match &overrides.config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.clone()));
                }
                (load_file_config(path)?, Some(path.clone()))
            }
            None => {
                let path = kitintel_protocol::paths::default_config_path();
                if path.exists() {
                    (load_file_config(&path)?, Some(path))
                } else {
                    (FileConfig::default(), None)
                }
            }
        };

        let mut config = Self::from_parts(overrides, file);
        config.source = source;
        Ok(config)
    }

    /// Merge without touching the filesystem.
    pub fn from_parts(overrides: ConfigOverrides, file: FileConfig) -> Self {
        let api_key = overrides
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let endpoint = overrides
            .endpoint
            .or(file.endpoint)
            .map(|e| e.trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let download_dir = overrides
            .download_dir
            .or(file.download_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let submit = SubmitConfig {
            max_upload_attempts: file
                .submit
                .max_upload_attempts
                .unwrap_or(DEFAULT_MAX_UPLOAD_ATTEMPTS)
                .max(1),
            dedup_delay: Duration::from_millis(
                file.submit.dedup_delay_ms.unwrap_or(DEFAULT_DEDUP_DELAY_MS),
            ),
            ..SubmitConfig::default()
        };

        Self {
            api_key,
            endpoint,
            download_dir,
            timeout: Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            submit,
            source: None,
        }
    }

    /// The API key, or [`ConfigError::MissingApiKey`].
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    /// Key with all but the last four characters masked.
    pub fn redacted_api_key(&self) -> String {
        match &self.api_key {
            None => "(not set)".to_string(),
            Some(key) if key.chars().count() <= 4 => "****".to_string(),
            Some(key) => {
                let tail: String = key
                    .chars()
                    .skip(key.chars().count() - 4)
                    .collect();
                format!("****{}", tail)
            }
        }
    }

    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            api_key: self.redacted_api_key(),
            endpoint: self.endpoint.clone(),
            download_dir: self.download_dir.clone(),
            timeout_secs: self.timeout.as_secs(),
            max_upload_attempts: self.submit.max_upload_attempts,
            dedup_delay_ms: self.submit.dedup_delay.as_millis() as u64,
            config_file: self.source.clone(),
        }
    }
}

/// Printable view of the resolved settings; the key is always redacted.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub api_key: String,
    pub endpoint: String,
    pub download_dir: PathBuf,
    pub timeout_secs: u64,
    pub max_upload_attempts: u32,
    pub dedup_delay_ms: u64,
    pub config_file: Option<PathBuf>,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let config = KitConfig::from_parts(ConfigOverrides::default(), FileConfig::default());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.download_dir, PathBuf::from("."));
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.submit.max_upload_attempts, DEFAULT_MAX_UPLOAD_ATTEMPTS);
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_flags_beat_file() {
        let file: FileConfig = toml::from_str(
            r#"
endpoint = "https://file.example/KIT/v1"
download_dir = "/tmp/from-file"

[submit]
max_upload_attempts = 3
dedup_delay_ms = 0
"#,
        )
        .unwrap();
        let overrides = ConfigOverrides {
            api_key: Some("  secret-key  ".to_string()),
            endpoint: Some("https://flag.example/KIT/v1/".to_string()),
            ..Default::default()
        };

        let config = KitConfig::from_parts(overrides, file);
        assert_eq!(config.endpoint, "https://flag.example/KIT/v1");
        assert_eq!(config.download_dir, PathBuf::from("/tmp/from-file"));
        assert_eq!(config.submit.max_upload_attempts, 3);
        assert!(config.submit.dedup_delay.is_zero());
        assert_eq!(config.require_api_key().unwrap(), "secret-key");
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let overrides = ConfigOverrides {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        let config = KitConfig::from_parts(overrides, FileConfig::default());
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let file: FileConfig = toml::from_str("[submit]\nmax_upload_attempts = 0\n").unwrap();
        let config = KitConfig::from_parts(ConfigOverrides::default(), file);
        assert_eq!(config.submit.max_upload_attempts, 1);
    }

    #[test]
    fn test_redaction() {
        let mut config = KitConfig::from_parts(ConfigOverrides::default(), FileConfig::default());
        assert_eq!(config.redacted_api_key(), "(not set)");
        config.api_key = Some("abc".to_string());
        assert_eq!(config.redacted_api_key(), "****");
        config.api_key = Some("0123456789abcd".to_string());
        assert_eq!(config.redacted_api_key(), "****abcd");
        assert!(!serde_json::to_string(&config.summary())
            .unwrap()
            .contains("0123456789"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            config_path: Some(temp.path().join("absent.toml")),
            ..Default::default()
        };
        assert!(matches!(
            KitConfig::resolve(overrides),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_toml_names_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "endpoint = [").unwrap();
        let err = load_file_config(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
