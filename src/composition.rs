//! Builds the default set of collaborators for the startup pipeline.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use winhance_startup::{
    StartupEnvironment,
    app::AppContext,
    config::AppDirs,
    platform::Platform,
    services::{
        LocalizationService, LogContext, UserPreferencesService,
        backup::SnapshotBackupService,
        host::DefaultHost,
        localization::TranslationCatalog,
        log_service::FileLogService,
        migration::LegacyPathMigrationService,
        notification::{LogNotificationSink, ResultNotificationService},
        preferences::TomlPreferencesService,
        theme::ThemeManager,
        version::GithubVersionService,
    },
};

use crate::{
    features::{ScriptLibrary, SettingsCatalog, TooltipRefreshHandler},
    shell::HeadlessShell,
};

const APP_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// The OS capabilities used for instance gating and elevation.
pub fn platform() -> Platform {
    Platform::native()
}

/// Directories scripts used to live in: next to the executable and under the
/// config directory. Entries that are the scripts directory itself are
/// dropped, which happens where config and data share one root.
fn legacy_script_dirs(exe_dir: Option<&Path>, dirs: &AppDirs) -> Vec<PathBuf> {
    let scripts_dir = dirs.scripts_dir();
    exe_dir
        .map(|dir| dir.join("Scripts"))
        .into_iter()
        .chain(std::iter::once(dirs.config_dir.join("Scripts")))
        .filter(|dir| *dir != scripts_dir)
        .collect()
}

pub async fn compose(env: StartupEnvironment) -> AppContext {
    let StartupEnvironment { dirs, config, .. } = env;

    let preferences: Arc<dyn UserPreferencesService> =
        Arc::new(TomlPreferencesService::open(dirs.preferences_path()).await);
    let localization: Arc<dyn LocalizationService> =
        Arc::new(TranslationCatalog::with_builtin_tables());
    let shell = Arc::new(HeadlessShell::new());
    let settings = Arc::new(SettingsCatalog::new(preferences.clone()));

    let exe = std::env::current_exe().ok();
    let legacy_script_dirs = legacy_script_dirs(exe.as_deref().and_then(Path::parent), &dirs);

    AppContext {
        log_context: LogContext::current(APP_VERSION),
        host: Arc::new(DefaultHost::new(dirs.clone())),
        log_service: Arc::new(FileLogService::new(dirs.log_dir())),
        theme: Arc::new(ThemeManager::new(preferences.clone())),
        windows: shell.clone(),
        dialogs: shell,
        event_handlers: vec![Arc::new(TooltipRefreshHandler)],
        settings_registry: settings.clone(),
        settings_preloader: settings,
        backup: Arc::new(SnapshotBackupService::new(
            dirs.backups_dir(),
            vec![dirs.preferences_path(), dirs.config_path()],
            preferences.clone(),
        )),
        migration: Arc::new(LegacyPathMigrationService::new(
            legacy_script_dirs,
            dirs.scripts_dir(),
        )),
        primary_feature: Arc::new(ScriptLibrary::new(dirs.scripts_dir())),
        versions: Arc::new(GithubVersionService::new(
            APP_VERSION,
            config.updates.release_feed_url.clone(),
            dirs.cache_dir.clone(),
        )),
        notifications: Arc::new(ResultNotificationService::new(
            localization.clone(),
            Arc::new(LogNotificationSink),
        )),
        localization,
        preferences,
        config,
    }
}
