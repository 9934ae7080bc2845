//! Feature services the startup pipeline primes before the main window is
//! shown.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use winhance_startup::{
    app::AppContext,
    error::ServiceError,
    events::Subscription,
    services::{
        CompatibleSettingsRegistry, DomainEventHandler, FeatureViewModel,
        GlobalSettingsPreloader, UserPreferencesService,
    },
};

/// A tweak and the operating systems it applies to.
struct SettingDefinition {
    id: &'static str,
    platforms: &'static [&'static str],
}

const SETTING_DEFINITIONS: &[SettingDefinition] = &[
    SettingDefinition { id: "DisableTelemetry", platforms: &["windows"] },
    SettingDefinition { id: "ShowFileExtensions", platforms: &["windows"] },
    SettingDefinition { id: "DarkModeApps", platforms: &["windows", "linux", "macos"] },
    SettingDefinition { id: "ClassicContextMenu", platforms: &["windows"] },
    SettingDefinition { id: "DisableWebSearch", platforms: &["windows"] },
];

fn poisoned(_: impl std::fmt::Debug) -> ServiceError {
    ServiceError::failed("settings state is poisoned")
}

/// Registry of the settings that apply to this OS, plus a cache of their
/// saved values.
pub struct SettingsCatalog {
    preferences: Arc<dyn UserPreferencesService>,
    compatible: RwLock<Vec<&'static str>>,
    cache: RwLock<HashMap<&'static str, toml::Value>>,
}

impl SettingsCatalog {
    pub fn new(preferences: Arc<dyn UserPreferencesService>) -> Self {
        Self {
            preferences,
            compatible: RwLock::new(Vec::new()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn compatible_ids(&self) -> Result<Vec<&'static str>, ServiceError> {
        Ok(self.compatible.read().map_err(poisoned)?.clone())
    }
}

#[async_trait]
impl CompatibleSettingsRegistry for SettingsCatalog {
    async fn initialize(&self) -> Result<(), ServiceError> {
        let os = std::env::consts::OS;
        let ids: Vec<&'static str> = SETTING_DEFINITIONS
            .iter()
            .filter(|definition| definition.platforms.contains(&os))
            .map(|definition| definition.id)
            .collect();
        log::info!("{} of {} settings apply to {os}", ids.len(), SETTING_DEFINITIONS.len());
        *self.compatible.write().map_err(poisoned)? = ids;
        Ok(())
    }
}

#[async_trait]
impl GlobalSettingsPreloader for SettingsCatalog {
    async fn preload_all_settings(&self) -> Result<(), ServiceError> {
        let mut loaded = HashMap::new();
        for id in self.compatible_ids()? {
            if let Some(value) = self.preferences.get_value(id).await {
                loaded.insert(id, value);
            }
        }
        log::debug!("Cached {} saved setting values", loaded.len());
        *self.cache.write().map_err(poisoned)? = loaded;
        Ok(())
    }
}

/// Primary feature: the list of user scripts available to run.
pub struct ScriptLibrary {
    scripts_dir: PathBuf,
    scripts: RwLock<Vec<String>>,
}

impl ScriptLibrary {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            scripts: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FeatureViewModel for ScriptLibrary {
    fn name(&self) -> &str {
        "SoftwareApps"
    }

    async fn initialize(&self) -> Result<(), ServiceError> {
        let mut found = Vec::new();
        if tokio::fs::try_exists(&self.scripts_dir).await? {
            let mut entries = tokio::fs::read_dir(&self.scripts_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_file() {
                    found.push(entry.file_name().to_string_lossy().to_string());
                }
            }
        }
        found.sort();
        log::info!("{} scripts available", found.len());
        *self.scripts.write().map_err(poisoned)? = found;
        Ok(())
    }
}

/// Refreshes tooltip text whenever the UI language changes.
pub struct TooltipRefreshHandler;

impl DomainEventHandler for TooltipRefreshHandler {
    fn name(&self) -> &str {
        "TooltipRefresh"
    }

    fn attach(&self, context: &AppContext) -> Result<Subscription, ServiceError> {
        let localization = Arc::downgrade(&context.localization);
        Ok(context.localization.subscribe(Box::new(move |language: &String| {
            let Some(localization) = localization.upgrade() else {
                return;
            };
            log::info!(
                "Refreshing tooltips for {language} ({})",
                localization.get_string("Nav_SoftwareApps")
            );
        })))
    }
}

#[cfg(test)]
mod tests {
    use winhance_startup::services::preferences::TomlPreferencesService;

    use super::*;

    #[tokio::test]
    async fn preloader_caches_only_saved_compatible_settings() {
        let temp = tempfile::tempdir().unwrap();
        let preferences = Arc::new(TomlPreferencesService::open(temp.path().join("prefs.toml")).await);
        preferences
            .save_value("DarkModeApps", toml::Value::Boolean(true))
            .await
            .unwrap();
        preferences
            .save_value("Unrelated", toml::Value::Boolean(true))
            .await
            .unwrap();

        let catalog = SettingsCatalog::new(preferences);
        catalog.initialize().await.unwrap();
        catalog.preload_all_settings().await.unwrap();

        let cache = catalog.cache.read().unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("DarkModeApps"));
    }

    #[tokio::test]
    async fn script_library_lists_files_in_order() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("b.ps1"), "").unwrap();
        std::fs::write(temp.path().join("a.ps1"), "").unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();

        let library = ScriptLibrary::new(temp.path());
        library.initialize().await.unwrap();
        assert_eq!(*library.scripts.read().unwrap(), vec!["a.ps1", "b.ps1"]);
    }

    #[tokio::test]
    async fn missing_scripts_dir_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let library = ScriptLibrary::new(temp.path().join("absent"));
        library.initialize().await.unwrap();
        assert!(library.scripts.read().unwrap().is_empty());
    }
}
