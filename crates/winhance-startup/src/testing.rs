//! Recording fakes for every collaborator contract. Each fake writes what it
//! was asked to do into a shared [`Journal`], which tests inspect for order.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use winhance_bridge::{
    ProgressReceiver,
    config::Config,
    results::{BackupResult, MigrationResult, VersionInfo},
};

use crate::{
    app::AppContext,
    error::{PlatformError, ServiceError},
    events::{EventChannel, Subscription},
    platform::{ElevationBackend, PeerLocator, RelaunchRequest, WindowActivator},
    services::{
        CompatibleSettingsRegistry, DialogService, DomainEventHandler, FeatureViewModel,
        GlobalSettingsPreloader, LocalizationService, LogContext, LogService, MainViewModel,
        ScriptMigrationService, ServiceHost, StartupNotificationService, SystemBackupService,
        Theme, UserPreferencesService, VersionService, WindowManager, theme::ThemeManager,
    },
};

#[derive(Clone, Default)]
pub(crate) struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.position(entry).is_some()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().unwrap().iter().position(|e| e == entry)
    }

    /// Makes the operation recorded as `point` fail from now on.
    pub fn fail(&self, point: &str) {
        self.failing.lock().unwrap().insert(point.to_string());
    }

    /// Records `point` and fails if it was marked failing.
    pub fn check(&self, point: &str) -> Result<(), ServiceError> {
        self.record(point);
        if self.failing.lock().unwrap().contains(point) {
            Err(ServiceError::failed(format!("{point} failed")))
        } else {
            Ok(())
        }
    }
}

pub(crate) struct FakeHost(pub Journal);

#[async_trait]
impl ServiceHost for FakeHost {
    async fn start(&self) -> Result<(), ServiceError> {
        self.0.check("host:start")
    }
}

pub(crate) struct FakeLogService {
    journal: Journal,
    pub lines: Mutex<Vec<String>>,
}

impl LogService for FakeLogService {
    fn log(&self, _level: log::Level, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }

    fn initialize(&self, _context: &LogContext) -> Result<(), ServiceError> {
        self.journal.check("log:initialize")
    }

    fn start_log(&self) -> Result<(), ServiceError> {
        self.journal.check("log:start")
    }
}

pub(crate) struct FakeLocalization {
    journal: Journal,
    language: Mutex<String>,
    changed: EventChannel<String>,
}

impl LocalizationService for FakeLocalization {
    fn get_string(&self, key: &str) -> String {
        key.to_string()
    }

    fn set_language(&self, code: &str) -> Result<(), ServiceError> {
        self.journal.check(&format!("localization:set:{code}"))?;
        *self.language.lock().unwrap() = code.to_string();
        self.changed.publish(&code.to_string());
        Ok(())
    }

    fn current_language(&self) -> String {
        self.language.lock().unwrap().clone()
    }

    fn available_languages(&self) -> Vec<String> {
        vec!["en".to_string()]
    }

    fn subscribe(&self, handler: Box<dyn Fn(&String) + Send + Sync>) -> Subscription {
        self.changed.subscribe(handler)
    }
}

#[derive(Default)]
pub(crate) struct FakePreferences {
    values: Mutex<HashMap<String, toml::Value>>,
}

impl FakePreferences {
    pub fn set(&self, key: &str, value: impl Into<toml::Value>) {
        self.values.lock().unwrap().insert(key.to_string(), value.into());
    }
}

#[async_trait]
impl UserPreferencesService for FakePreferences {
    async fn get_value(&self, key: &str) -> Option<toml::Value> {
        self.values.lock().unwrap().get(key).cloned()
    }

    async fn save_value(&self, key: &str, value: toml::Value) -> Result<(), ServiceError> {
        self.set(key, value);
        Ok(())
    }
}

pub(crate) struct FakeMainViewModel(Journal);

impl FakeMainViewModel {
    pub fn new(journal: &Journal) -> Self {
        Self(journal.clone())
    }
}

#[async_trait]
impl MainViewModel for FakeMainViewModel {
    async fn initialize_application(&self) -> Result<(), ServiceError> {
        self.0.check("main:navigate")
    }
}

pub(crate) struct FakeWindows {
    journal: Journal,
    pub progress: Mutex<Option<ProgressReceiver>>,
    pub exit_requested: AtomicBool,
    on_run: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

impl FakeWindows {
    /// Runs `hook` while the app is "running", before the window closes.
    pub fn on_run(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_run.lock().unwrap() = Some(Box::new(hook));
    }
}

#[async_trait]
impl WindowManager for FakeWindows {
    fn show_loading_window(
        &self,
        theme: Theme,
        progress: ProgressReceiver,
    ) -> Result<(), ServiceError> {
        self.journal.check("loading:show")?;
        self.journal.record(format!("loading:theme:{theme:?}"));
        *self.progress.lock().unwrap() = Some(progress);
        Ok(())
    }

    fn close_loading_window(&self) -> Result<(), ServiceError> {
        self.journal.check("loading:close")
    }

    fn create_main_window(&self) -> Result<Arc<dyn MainViewModel>, ServiceError> {
        self.journal.check("main:create")?;
        Ok(Arc::new(FakeMainViewModel(self.journal.clone())))
    }

    fn show_main_window(&self) -> Result<(), ServiceError> {
        self.journal.check("main:show")
    }

    fn request_exit(&self) {
        self.journal.record("app:exit");
        self.exit_requested.store(true, Ordering::SeqCst);
    }

    async fn run_until_closed(&self) {
        if let Some(hook) = self.on_run.lock().unwrap().as_ref() {
            hook();
        }
        self.journal.record("app:closed");
    }
}

pub(crate) struct FakeDialogs {
    journal: Journal,
    pub accept_update: AtomicBool,
    pub errors: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl DialogService for FakeDialogs {
    async fn show_startup_error(&self, title: &str, message: &str) -> bool {
        self.journal.record("dialog:error");
        self.errors
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        true
    }

    async fn confirm_update(&self, _current_version: &str, _latest: &VersionInfo) -> bool {
        self.journal.record("dialog:update");
        self.accept_update.load(Ordering::SeqCst)
    }
}

pub(crate) struct FakeEventHandler {
    journal: Journal,
    name: &'static str,
}

impl DomainEventHandler for FakeEventHandler {
    fn name(&self) -> &str {
        self.name
    }

    fn attach(&self, context: &AppContext) -> Result<Subscription, ServiceError> {
        self.journal.check(&format!("events:{}", self.name))?;
        let journal = self.journal.clone();
        Ok(context
            .localization
            .subscribe(Box::new(move |code: &String| {
                journal.record(format!("events:language:{code}"))
            })))
    }
}

pub(crate) struct FakeRegistry(Journal);

#[async_trait]
impl CompatibleSettingsRegistry for FakeRegistry {
    async fn initialize(&self) -> Result<(), ServiceError> {
        self.0.check("preload:registry")
    }
}

pub(crate) struct FakePreloader(Journal);

#[async_trait]
impl GlobalSettingsPreloader for FakePreloader {
    async fn preload_all_settings(&self) -> Result<(), ServiceError> {
        self.0.check("preload:settings")
    }
}

pub(crate) struct FakeBackup(Journal);

#[async_trait]
impl SystemBackupService for FakeBackup {
    async fn ensure_initial_backups(&self) -> Result<BackupResult, ServiceError> {
        self.0.check("preload:backup")?;
        Ok(BackupResult {
            success: true,
            ..Default::default()
        })
    }
}

pub(crate) struct FakeMigration(Journal);

#[async_trait]
impl ScriptMigrationService for FakeMigration {
    async fn migrate_from_old_paths(&self) -> Result<MigrationResult, ServiceError> {
        self.0.check("preload:migration")?;
        Ok(MigrationResult::default())
    }
}

pub(crate) struct FakeFeature(Journal);

#[async_trait]
impl FeatureViewModel for FakeFeature {
    fn name(&self) -> &str {
        "SoftwareApps"
    }

    async fn initialize(&self) -> Result<(), ServiceError> {
        self.0.check("preload:feature")
    }
}

pub(crate) struct FakeVersions {
    journal: Journal,
    pub update_available: AtomicBool,
}

#[async_trait]
impl VersionService for FakeVersions {
    fn current_version(&self) -> String {
        "v25.01.01".to_string()
    }

    async fn check_for_update(&self) -> Result<VersionInfo, ServiceError> {
        self.journal.check("update:check")?;
        let available = self.update_available.load(Ordering::SeqCst);
        Ok(VersionInfo {
            update_available: available,
            version: if available { "v26.01.01" } else { "v25.01.01" }.to_string(),
            download_url: None,
        })
    }

    async fn download_and_install_update(&self) -> Result<(), ServiceError> {
        self.journal.check("update:install")
    }
}

pub(crate) struct FakeNotifications(Journal);

#[async_trait]
impl StartupNotificationService for FakeNotifications {
    async fn show_backup_notification(&self, result: Option<&BackupResult>) {
        let state = if result.is_some() { "some" } else { "none" };
        self.0.record(format!("notify:backup:{state}"));
    }

    fn show_migration_notification(&self, result: Option<&MigrationResult>) {
        let state = if result.is_some() { "some" } else { "none" };
        self.0.record(format!("notify:migration:{state}"));
    }
}

/// The full set of fakes sharing one journal.
pub(crate) struct Fakes {
    pub journal: Journal,
    pub config: Config,
    pub log_service: Arc<FakeLogService>,
    pub preferences: Arc<FakePreferences>,
    pub windows: Arc<FakeWindows>,
    pub dialogs: Arc<FakeDialogs>,
    pub versions: Arc<FakeVersions>,
}

impl Fakes {
    pub fn new() -> Self {
        let journal = Journal::default();
        Self {
            config: Config::default(),
            log_service: Arc::new(FakeLogService {
                journal: journal.clone(),
                lines: Mutex::new(Vec::new()),
            }),
            preferences: Arc::new(FakePreferences::default()),
            windows: Arc::new(FakeWindows {
                journal: journal.clone(),
                progress: Mutex::new(None),
                exit_requested: AtomicBool::new(false),
                on_run: Mutex::new(None),
            }),
            dialogs: Arc::new(FakeDialogs {
                journal: journal.clone(),
                accept_update: AtomicBool::new(false),
                errors: Mutex::new(Vec::new()),
            }),
            versions: Arc::new(FakeVersions {
                journal: journal.clone(),
                update_available: AtomicBool::new(false),
            }),
            journal,
        }
    }

    pub fn context(&self) -> AppContext {
        let journal = &self.journal;
        let preferences: Arc<dyn UserPreferencesService> = self.preferences.clone();
        AppContext {
            config: self.config.clone(),
            log_context: LogContext::current("v25.01.01"),
            host: Arc::new(FakeHost(journal.clone())),
            log_service: self.log_service.clone(),
            localization: Arc::new(FakeLocalization {
                journal: journal.clone(),
                language: Mutex::new("en".to_string()),
                changed: EventChannel::new(),
            }),
            theme: Arc::new(ThemeManager::new(preferences.clone())),
            preferences,
            windows: self.windows.clone(),
            dialogs: self.dialogs.clone(),
            event_handlers: vec![Arc::new(FakeEventHandler {
                journal: journal.clone(),
                name: "tooltips",
            })],
            settings_registry: Arc::new(FakeRegistry(journal.clone())),
            settings_preloader: Arc::new(FakePreloader(journal.clone())),
            backup: Arc::new(FakeBackup(journal.clone())),
            migration: Arc::new(FakeMigration(journal.clone())),
            primary_feature: Arc::new(FakeFeature(journal.clone())),
            versions: self.versions.clone(),
            notifications: Arc::new(FakeNotifications(journal.clone())),
        }
    }
}

/// Peer lookup returning a fixed set of pids.
pub(crate) struct FakePeers(pub Vec<u32>);

impl PeerLocator for FakePeers {
    fn find_peers(&self) -> Result<Vec<u32>, PlatformError> {
        Ok(self.0.clone())
    }
}

/// Activator recording the pids it was asked to restore and focus.
pub(crate) struct FakeActivator(pub Journal);

impl WindowActivator for FakeActivator {
    fn restore(&self, pid: u32) -> Result<bool, PlatformError> {
        self.0.record(format!("restore:{pid}"));
        Ok(true)
    }

    fn focus(&self, pid: u32) -> Result<(), PlatformError> {
        self.0.record(format!("focus:{pid}"));
        Ok(())
    }
}

/// How [`FakeElevation`] responds to the elevation check and relaunch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElevationScript {
    Elevated,
    CheckFails,
    RelaunchSucceeds,
    RelaunchDeclined,
    RelaunchFails,
}

pub(crate) struct FakeElevation {
    pub journal: Journal,
    pub script: ElevationScript,
}

impl ElevationBackend for FakeElevation {
    fn is_elevated(&self) -> Result<bool, PlatformError> {
        self.journal.record("elevation:check");
        match self.script {
            ElevationScript::Elevated => Ok(true),
            ElevationScript::CheckFails => Err(PlatformError::CurrentProcess("no token".into())),
            _ => Ok(false),
        }
    }

    fn relaunch_elevated(&self, _request: &RelaunchRequest) -> Result<(), PlatformError> {
        self.journal.record("elevation:relaunch");
        match self.script {
            ElevationScript::RelaunchDeclined => Err(PlatformError::ElevationDeclined),
            ElevationScript::RelaunchFails => Err(PlatformError::Unsupported("relaunch")),
            _ => Ok(()),
        }
    }
}
