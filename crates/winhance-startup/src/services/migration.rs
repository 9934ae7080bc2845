use std::path::{Path, PathBuf};

use async_trait::async_trait;
use winhance_bridge::results::MigrationResult;

use super::ScriptMigrationService;
use crate::error::ServiceError;

/// Moves scripts left in legacy locations into the current scripts
/// directory. Running it again after a successful move is a no-op.
pub struct LegacyPathMigrationService {
    legacy_dirs: Vec<PathBuf>,
    scripts_dir: PathBuf,
}

impl LegacyPathMigrationService {
    pub fn new(legacy_dirs: Vec<PathBuf>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            legacy_dirs,
            scripts_dir: scripts_dir.into(),
        }
    }

    async fn move_dir_contents(&self, legacy_dir: &Path) -> std::io::Result<Vec<String>> {
        let mut moved = Vec::new();
        let mut entries = tokio::fs::read_dir(legacy_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let target = self.scripts_dir.join(&file_name);
            if tokio::fs::try_exists(&target).await? {
                log::info!("Keeping existing {target:?}; removing legacy copy");
                tokio::fs::remove_file(entry.path()).await?;
                continue;
            }
            tokio::fs::create_dir_all(&self.scripts_dir).await?;
            if tokio::fs::rename(entry.path(), &target).await.is_err() {
                // rename fails across volumes
                tokio::fs::copy(entry.path(), &target).await?;
                tokio::fs::remove_file(entry.path()).await?;
            }
            moved.push(file_name.to_string_lossy().to_string());
        }
        if let Err(error) = tokio::fs::remove_dir(legacy_dir).await {
            log::debug!("Legacy directory {legacy_dir:?} left in place: {error}");
        }
        Ok(moved)
    }

    /// Whether `legacy_dir` is the scripts directory itself, which happens
    /// when the platform maps config and data to the same folder.
    async fn is_scripts_dir(&self, legacy_dir: &Path) -> bool {
        if legacy_dir == self.scripts_dir {
            return true;
        }
        match (
            tokio::fs::canonicalize(legacy_dir).await,
            tokio::fs::canonicalize(&self.scripts_dir).await,
        ) {
            (Ok(legacy), Ok(scripts)) => legacy == scripts,
            _ => false,
        }
    }
}

#[async_trait]
impl ScriptMigrationService for LegacyPathMigrationService {
    async fn migrate_from_old_paths(&self) -> Result<MigrationResult, ServiceError> {
        let mut result = MigrationResult {
            success: true,
            ..MigrationResult::default()
        };

        for legacy_dir in &self.legacy_dirs {
            if !tokio::fs::try_exists(legacy_dir).await.unwrap_or(false) {
                continue;
            }
            if self.is_scripts_dir(legacy_dir).await {
                log::debug!("Legacy path {legacy_dir:?} is the scripts directory, skipping");
                continue;
            }
            result.needed = true;
            log::info!("Migrating scripts from legacy path {legacy_dir:?}");
            match self.move_dir_contents(legacy_dir).await {
                Ok(moved) => result.migrated.extend(moved),
                Err(error) => {
                    log::warn!("Failed to migrate {legacy_dir:?}: {error}");
                    result.success = false;
                    result.error_message = Some(format!("{}: {error}", legacy_dir.display()));
                }
            }
        }

        Ok(result)
    }
}
