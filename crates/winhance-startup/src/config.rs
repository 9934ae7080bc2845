use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tokio::{
    fs::{OpenOptions, create_dir_all, read_to_string},
    io::AsyncWriteExt,
};
use winhance_bridge::config::Config;

/// Errors that can occur while loading or resolving application configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to determine the user's configuration or data directories. This
    /// usually occurs when required environment variables are missing (e.g.,
    /// `$HOME` on Unix or `%APPDATA%` on Windows).
    #[error("failed to obtain user's directories")]
    DirectoriesNotFound,
    /// An I/O error occurred while reading or writing the configuration file.
    #[error("failed to read config: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file contains invalid TOML or does not match the expected structure.
    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),
    /// Failed to serialize the configuration to TOML (e.g., when saving changes).
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Per-user directories used by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl AppDirs {
    /// Resolves the platform directories for the current user.
    pub fn discover() -> Result<Self, ConfigError> {
        match ProjectDirs::from("net", "Winhance", "Winhance") {
            Some(dirs) => Ok(Self {
                config_dir: dirs.config_dir().to_path_buf(),
                data_dir: dirs.data_local_dir().to_path_buf(),
                cache_dir: dirs.cache_dir().to_path_buf(),
            }),
            None => Err(ConfigError::DirectoriesNotFound),
        }
    }

    /// Resolves the platform directories, falling back to a folder under the
    /// system temp directory when the user's home cannot be determined.
    pub fn discover_or_temp() -> Self {
        Self::discover().unwrap_or_else(|_| Self::rooted_at(&std::env::temp_dir().join("Winhance")))
    }

    /// Lays every directory out below a single root.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            cache_dir: root.join("cache"),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("Logs")
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.toml")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("Backups")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.data_dir.join("Scripts")
    }
}

/// Loads the application configuration from `dirs`. A missing file is created
/// with default contents.
pub async fn load_config(dirs: &AppDirs) -> Result<Config, ConfigError> {
    let config_path = dirs.config_path();
    log::info!("Loading configuration from {config_path:?}");
    if config_path.exists() {
        let contents = read_to_string(config_path).await?;
        let config: Config = toml::from_str(&contents)?;
        return Ok(config);
    }

    let config = Config::default();
    if let Some(parent) = config_path.parent() {
        create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(&config)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(config_path)
        .await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;

    Ok(config)
}

/// Loads the configuration, reporting failures and continuing with defaults.
/// Startup never stops because of a broken config file.
pub async fn load_config_or_default(dirs: &AppDirs) -> Config {
    match load_config(dirs).await {
        Ok(config) => config,
        Err(error) => {
            log::warn!("Using default configuration: {error}");
            Config::default()
        }
    }
}
