use std::{fs, path::PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "dropzone";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOGS_DIR_NAME: &str = "logs";

/// Which uploader moves file bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UploaderKind {
    /// Direct S3 puts (multipart above the threshold)
    #[default]
    Sdk,
    /// One `aws s3 cp` process per file
    Cli,
}

/// Settings persisted in `config.toml`. Credentials are never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Region used when none is given on the command line (defaults to us-east-1)
    #[serde(default)]
    pub region: Option<String>,
    /// Custom S3 endpoint, e.g. a local S3-compatible server
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub uploader: UploaderKind,
    /// Program invoked by the CLI uploader
    #[serde(default = "default_cli_program")]
    pub cli_program: String,
    /// Files above this size (MiB) are uploaded in parts
    #[serde(default = "default_multipart_threshold_mb")]
    pub multipart_threshold_mb: u64,
    /// Directory for daily rolling log files (no file logging when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_cli_program() -> String {
    "aws".to_string()
}

fn default_multipart_threshold_mb() -> u64 {
    8
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            uploader: UploaderKind::default(),
            cli_program: default_cli_program(),
            multipart_threshold_mb: default_multipart_threshold_mb(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn multipart_threshold_bytes(&self) -> u64 {
        self.multipart_threshold_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the dropzone directory (~/.dropzone)
    pub dropzone_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether the directory exists on disk
    pub initialized: bool,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the dropzone directory path (custom or default ~/.dropzone)
    pub fn dropzone_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new dropzone directory with a config file
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let dropzone_dir = Self::dropzone_dir(custom_path)?;

        if dropzone_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&dropzone_dir)?;

        let mut config = config.unwrap_or_default();
        if config.log_dir.is_none() {
            config.log_dir = Some(dropzone_dir.join(LOGS_DIR_NAME));
        }
        let config_path = dropzone_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            dropzone_dir,
            config_path,
            initialized: true,
            config,
        })
    }

    /// Load existing state from the dropzone directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let dropzone_dir = Self::dropzone_dir(custom_path)?;

        if !dropzone_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = dropzone_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            dropzone_dir,
            config_path,
            initialized: true,
            config,
        })
    }

    /// Load the directory if it exists, otherwise use defaults without touching disk
    pub fn load_or_default(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        match Self::load(custom_path.clone()) {
            Ok(state) => Ok(state),
            Err(StateError::NotInitialized) => {
                let dropzone_dir = Self::dropzone_dir(custom_path)?;
                Ok(Self {
                    config_path: dropzone_dir.join(CONFIG_FILE_NAME),
                    dropzone_dir,
                    initialized: false,
                    config: AppConfig::default(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("dropzone directory not initialized. Run 'dropzone init' first")]
    NotInitialized,

    #[error("dropzone directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("dz");

        let config = AppConfig {
            region: Some("eu-west-1".to_string()),
            uploader: UploaderKind::Cli,
            ..Default::default()
        };
        let state = AppState::init(Some(dir.clone()), Some(config)).unwrap();
        assert!(state.config_path.exists());
        assert_eq!(state.config.log_dir, Some(dir.join(LOGS_DIR_NAME)));

        let loaded = AppState::load(Some(dir.clone())).unwrap();
        assert_eq!(loaded.config, state.config);
        assert!(loaded.initialized);

        assert!(matches!(
            AppState::init(Some(dir), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_missing_dir_falls_back_to_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("absent");

        let state = AppState::load_or_default(Some(dir.clone())).unwrap();
        assert!(!state.initialized);
        assert_eq!(state.config, AppConfig::default());
        assert!(!dir.exists());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("uploader = \"cli\"\n").unwrap();
        assert_eq!(config.uploader, UploaderKind::Cli);
        assert_eq!(config.cli_program, "aws");
        assert_eq!(config.multipart_threshold_bytes(), 8 * 1024 * 1024);
    }

    #[test]
    fn test_config_never_has_credential_fields() {
        let rendered = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("access_key"));
    }
}
