//! Contracts for the collaborators the startup core drives, plus the default
//! implementations the application ships with.
//!
//! Every contract is object safe so the composition root can hand the core a
//! set of `Arc<dyn _>` references; nothing here is reached through global
//! state.

pub mod backup;
pub mod host;
pub mod localization;
pub mod log_service;
pub mod migration;
pub mod notification;
pub mod preferences;
pub mod theme;
pub mod version;

use std::sync::Arc;

use async_trait::async_trait;
use winhance_bridge::{
    ProgressReceiver,
    results::{BackupResult, MigrationResult, VersionInfo},
};

use crate::{app::AppContext, error::ServiceError, events::Subscription};

pub use preferences::PreferencesExt;
pub use theme::Theme;

/// Preference key holding the selected UI language.
pub const PREF_LANGUAGE: &str = "Language";
/// Preference key holding the selected theme (`Dark` / `Light`).
pub const PREF_THEME: &str = "Theme";
/// Preference key: the user opted out of the initial system backup.
pub const PREF_SKIP_SYSTEM_BACKUP: &str = "SkipSystemBackup";
/// Preference key: the initial registry backup already completed.
pub const PREF_REGISTRY_BACKUP_COMPLETED: &str = "RegistryBackupCompleted";
/// Preference key: whether the update check runs after startup.
pub const PREF_AUTO_UPDATE_CHECK: &str = "AutoUpdateCheck";

/// Process-wide service container start (pipeline stage 1).
#[async_trait]
pub trait ServiceHost: Send + Sync {
    async fn start(&self) -> Result<(), ServiceError>;
}

/// Information handed to the durable log when it is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub app_version: String,
    pub os_description: String,
}

impl LogContext {
    pub fn current(app_version: impl Into<String>) -> Self {
        Self {
            app_version: app_version.into(),
            os_description: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

/// Durable application log.
pub trait LogService: Send + Sync {
    fn log(&self, level: log::Level, message: &str);
    fn initialize(&self, context: &LogContext) -> Result<(), ServiceError>;
    fn start_log(&self) -> Result<(), ServiceError>;
}

/// String lookup. A key without a translation resolves to the key itself.
pub trait LocalizationService: Send + Sync {
    fn get_string(&self, key: &str) -> String;
    fn set_language(&self, code: &str) -> Result<(), ServiceError>;
    fn current_language(&self) -> String;
    fn available_languages(&self) -> Vec<String>;
    /// Registers a handler invoked with the new language code after each change.
    fn subscribe(&self, handler: Box<dyn Fn(&String) + Send + Sync>) -> Subscription;
}

/// User-scoped key/value preferences, durable across runs.
///
/// Typed access goes through [`PreferencesExt`].
#[async_trait]
pub trait UserPreferencesService: Send + Sync {
    async fn get_value(&self, key: &str) -> Option<toml::Value>;
    async fn save_value(&self, key: &str, value: toml::Value) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait SystemBackupService: Send + Sync {
    async fn ensure_initial_backups(&self) -> Result<BackupResult, ServiceError>;
}

#[async_trait]
pub trait ScriptMigrationService: Send + Sync {
    async fn migrate_from_old_paths(&self) -> Result<MigrationResult, ServiceError>;
}

#[async_trait]
pub trait VersionService: Send + Sync {
    fn current_version(&self) -> String;
    async fn check_for_update(&self) -> Result<VersionInfo, ServiceError>;
    async fn download_and_install_update(&self) -> Result<(), ServiceError>;
}

/// Surfaces preload results to the user once the main window is visible.
#[async_trait]
pub trait StartupNotificationService: Send + Sync {
    async fn show_backup_notification(&self, result: Option<&BackupResult>);
    fn show_migration_notification(&self, result: Option<&MigrationResult>);
}

#[async_trait]
pub trait CompatibleSettingsRegistry: Send + Sync {
    async fn initialize(&self) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait GlobalSettingsPreloader: Send + Sync {
    async fn preload_all_settings(&self) -> Result<(), ServiceError>;
}

/// View-model of the feature shown first; primed before the main window
/// appears so the first navigation does not wait on data.
#[async_trait]
pub trait FeatureViewModel: Send + Sync {
    fn name(&self) -> &str;
    async fn initialize(&self) -> Result<(), ServiceError>;
}

/// View-model backing the main window.
#[async_trait]
pub trait MainViewModel: Send + Sync {
    /// Navigates to the default view.
    async fn initialize_application(&self) -> Result<(), ServiceError>;
}

/// A long-lived domain subscription wired during startup (stage 5).
pub trait DomainEventHandler: Send + Sync {
    fn name(&self) -> &str;
    fn attach(&self, context: &AppContext) -> Result<Subscription, ServiceError>;
}

/// Window lifecycle owned by the UI thread.
#[async_trait]
pub trait WindowManager: Send + Sync {
    /// Shows the loading window. Progress updates arriving on `progress` are
    /// applied by the window on its own thread.
    fn show_loading_window(&self, theme: Theme, progress: ProgressReceiver)
    -> Result<(), ServiceError>;
    fn close_loading_window(&self) -> Result<(), ServiceError>;
    /// Resolves the main window and its view-model without showing it.
    fn create_main_window(&self) -> Result<Arc<dyn MainViewModel>, ServiceError>;
    fn show_main_window(&self) -> Result<(), ServiceError>;
    /// Asks the UI to shut down.
    fn request_exit(&self);
    /// Resolves once the main window has been closed.
    async fn run_until_closed(&self);
}

#[async_trait]
pub trait DialogService: Send + Sync {
    /// Shows a blocking error dialog. Returns `false` when no UI surface was
    /// available to show it on.
    async fn show_startup_error(&self, title: &str, message: &str) -> bool;
    /// Asks whether to install `latest` now. `true` means install.
    async fn confirm_update(&self, current_version: &str, latest: &VersionInfo) -> bool;
}
