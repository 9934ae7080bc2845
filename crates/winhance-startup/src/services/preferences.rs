use std::{future::Future, path::PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use super::UserPreferencesService;
use crate::error::ServiceError;

/// Typed access on top of [`UserPreferencesService`].
pub trait PreferencesExt: UserPreferencesService {
    /// Reads `key`, returning `default` when it is missing or stored with a
    /// different type.
    fn get_preference<T>(&self, key: &str, default: T) -> impl Future<Output = T> + Send
    where
        T: DeserializeOwned + Send;

    fn save_preference<T>(
        &self,
        key: &str,
        value: T,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send
    where
        T: Serialize + Send;
}

impl<S: UserPreferencesService + ?Sized> PreferencesExt for S {
    fn get_preference<T>(&self, key: &str, default: T) -> impl Future<Output = T> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            match self.get_value(key).await {
                Some(value) => T::deserialize(value).unwrap_or(default),
                None => default,
            }
        }
    }

    fn save_preference<T>(
        &self,
        key: &str,
        value: T,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send
    where
        T: Serialize + Send,
    {
        async move {
            let value = toml::Value::try_from(value)
                .map_err(|error| ServiceError::context(format!("serializing preference {key}"), error))?;
            self.save_value(key, value).await
        }
    }
}

/// Preferences persisted as a flat TOML table in the user's data directory.
pub struct TomlPreferencesService {
    path: PathBuf,
    values: RwLock<toml::Table>,
}

impl TomlPreferencesService {
    /// Opens the store at `path`. A missing or unreadable file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match toml::from_str::<toml::Table>(&contents) {
                Ok(values) => values,
                Err(error) => {
                    log::warn!("Ignoring unreadable preferences at {path:?}: {error}");
                    toml::Table::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
            Err(error) => {
                log::warn!("Failed to read preferences at {path:?}: {error}");
                toml::Table::new()
            }
        };

        Self {
            path,
            values: RwLock::new(values),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn persist(&self, values: &toml::Table) -> Result<(), ServiceError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = toml::to_string_pretty(values)
            .map_err(|error| ServiceError::context("serializing preferences", error))?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

#[async_trait]
impl UserPreferencesService for TomlPreferencesService {
    async fn get_value(&self, key: &str) -> Option<toml::Value> {
        self.values.read().await.get(key).cloned()
    }

    async fn save_value(&self, key: &str, value: toml::Value) -> Result<(), ServiceError> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        // the in-memory value stays authoritative for this run even if the
        // file cannot be written
        if let Err(error) = self.persist(&values).await {
            log::warn!("Failed to save preferences to {:?}: {error}", self.path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_keys_and_mismatched_types_yield_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = TomlPreferencesService::open(temp.path().join("preferences.toml")).await;

        assert!(!store.get_preference("SkipSystemBackup", false).await);

        store
            .save_preference("Language", "de")
            .await
            .expect("save should succeed");
        assert_eq!(store.get_preference("Language", 7_i64).await, 7);
        assert_eq!(
            store.get_preference("Language", "en".to_string()).await,
            "de"
        );
    }

    #[tokio::test]
    async fn saved_values_survive_reopen() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("preferences.toml");
        {
            let store = TomlPreferencesService::open(&path).await;
            store
                .save_preference("RegistryBackupCompleted", true)
                .await
                .expect("save should succeed");
        }

        let reopened = TomlPreferencesService::open(&path).await;
        assert!(reopened.get_preference("RegistryBackupCompleted", false).await);
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("preferences.toml");
        std::fs::write(&path, "Theme = ").expect("write corrupt file");

        let store = TomlPreferencesService::open(&path).await;
        assert_eq!(
            store.get_preference("Theme", "Dark".to_string()).await,
            "Dark"
        );
    }
}
