use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use chrono::Local;
use winhance_bridge::results::BackupResult;

use super::{PREF_REGISTRY_BACKUP_COMPLETED, PreferencesExt, SystemBackupService, UserPreferencesService};
use crate::error::ServiceError;

/// Copies the user's settings files into a timestamped folder under the
/// backups directory.
pub struct SnapshotBackupService {
    backups_dir: PathBuf,
    sources: Vec<PathBuf>,
    preferences: Arc<dyn UserPreferencesService>,
}

impl SnapshotBackupService {
    pub fn new(
        backups_dir: impl Into<PathBuf>,
        sources: Vec<PathBuf>,
        preferences: Arc<dyn UserPreferencesService>,
    ) -> Self {
        Self {
            backups_dir: backups_dir.into(),
            sources,
            preferences,
        }
    }

    async fn snapshot(&self, target: &PathBuf) -> std::io::Result<Vec<String>> {
        tokio::fs::create_dir_all(target).await?;
        let mut backed_up = Vec::new();
        for source in &self.sources {
            if !tokio::fs::try_exists(source).await.unwrap_or(false) {
                log::debug!("Backup source {source:?} does not exist, skipping");
                continue;
            }
            let Some(file_name) = source.file_name() else {
                continue;
            };
            tokio::fs::copy(source, target.join(file_name)).await?;
            backed_up.push(file_name.to_string_lossy().to_string());
        }
        Ok(backed_up)
    }
}

#[async_trait]
impl SystemBackupService for SnapshotBackupService {
    async fn ensure_initial_backups(&self) -> Result<BackupResult, ServiceError> {
        let target = self
            .backups_dir
            .join(Local::now().format("%Y%m%d_%H%M%S").to_string());
        log::info!("Creating initial backup in {target:?}");

        match self.snapshot(&target).await {
            Ok(backed_up) => {
                self.preferences
                    .save_preference(PREF_REGISTRY_BACKUP_COMPLETED, true)
                    .await?;
                Ok(BackupResult {
                    success: true,
                    backup_path: Some(target),
                    backed_up,
                    error_message: None,
                })
            }
            Err(error) => {
                log::warn!("Initial backup failed: {error}");
                Ok(BackupResult {
                    success: false,
                    backup_path: None,
                    backed_up: Vec::new(),
                    error_message: Some(error.to_string()),
                })
            }
        }
    }
}
