//! Application context handed to the startup pipeline.
//!
//! The context holds every collaborator the pipeline drives. The composition
//! root builds it once; stages and domain event handlers borrow from it.

use std::sync::Arc;

use winhance_bridge::config::Config;

use crate::services::{
    CompatibleSettingsRegistry, DialogService, DomainEventHandler, FeatureViewModel,
    GlobalSettingsPreloader, LocalizationService, LogContext, LogService,
    ScriptMigrationService, ServiceHost, StartupNotificationService, SystemBackupService,
    UserPreferencesService, VersionService, WindowManager, theme::ThemeManager,
};

/// Shared application context passed to pipeline stages and event handlers.
pub struct AppContext {
    /// Loaded application configuration.
    pub config: Config,
    /// Version and OS details written at the top of the durable log.
    pub log_context: LogContext,
    pub host: Arc<dyn ServiceHost>,
    pub log_service: Arc<dyn LogService>,
    pub localization: Arc<dyn LocalizationService>,
    pub preferences: Arc<dyn UserPreferencesService>,
    pub theme: Arc<ThemeManager>,
    pub windows: Arc<dyn WindowManager>,
    pub dialogs: Arc<dyn DialogService>,
    /// Subscriptions wired in order during event handler initialization.
    pub event_handlers: Vec<Arc<dyn DomainEventHandler>>,
    pub settings_registry: Arc<dyn CompatibleSettingsRegistry>,
    pub settings_preloader: Arc<dyn GlobalSettingsPreloader>,
    pub backup: Arc<dyn SystemBackupService>,
    pub migration: Arc<dyn ScriptMigrationService>,
    /// View-model of the feature shown first after navigation.
    pub primary_feature: Arc<dyn FeatureViewModel>,
    pub versions: Arc<dyn VersionService>,
    pub notifications: Arc<dyn StartupNotificationService>,
}

impl AppContext {
    /// Looks up a localized string.
    pub fn text(&self, key: &str) -> String {
        self.localization.get_string(key)
    }
}
