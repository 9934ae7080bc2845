//! The bootstrap pipeline: an ordered list of stages, each tagged with how a
//! failure affects the rest of startup.
//!
//! The driver runs every stage in order and records a result for each. A
//! failed stage is always logged first; then its [`Fatality`] decides whether
//! startup continues. Fatal failures show a blocking error dialog, close the
//! loading window if it is open, and stop the pipeline. Effects that already
//! happened are never undone.

use std::{fmt, sync::Arc};

use winhance_bridge::{ProgressSender, progress_channel};

use crate::{
    app::AppContext,
    error::{ServiceError, error_chain},
    events::Subscription,
    preload::{PreloadError, PreloadOrchestrator, PreloadOutcome},
    services::{MainViewModel, PREF_AUTO_UPDATE_CHECK, PREF_LANGUAGE, PreferencesExt},
    startup_log::StartupLogger,
};

/// Exit code used when a fatal stage aborts startup.
pub const EXIT_BOOTSTRAP_FAILED: u8 = 2;

/// Buffered progress updates between the control thread and the loading window.
const PROGRESS_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    HostStart,
    LoggingInit,
    LocalizationInit,
    LoadingUiShow,
    EventHandlerInit,
    MainWindowCreate,
    PreloadData,
    ShowMainWindow,
    PostShowNotifications,
    UpdateCheck,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::HostStart => "HostStart",
            Stage::LoggingInit => "LoggingInit",
            Stage::LocalizationInit => "LocalizationInit",
            Stage::LoadingUiShow => "LoadingUiShow",
            Stage::EventHandlerInit => "EventHandlerInit",
            Stage::MainWindowCreate => "MainWindowCreate",
            Stage::PreloadData => "PreloadData",
            Stage::ShowMainWindow => "ShowMainWindow",
            Stage::PostShowNotifications => "PostShowNotifications",
            Stage::UpdateCheck => "UpdateCheck",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a stage failure affects the rest of startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatality {
    /// Abort startup.
    Fatal,
    /// Log and continue with reduced functionality.
    Degraded,
    /// Fatal until the stage's visible effect has happened; later failures
    /// inside the stage are logged only.
    Committed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub stage: Stage,
    pub fatality: Fatality,
}

const fn spec(stage: Stage, fatality: Fatality) -> StageSpec {
    StageSpec { stage, fatality }
}

/// Startup stages in execution order.
pub const STAGES: [StageSpec; 10] = [
    spec(Stage::HostStart, Fatality::Fatal),
    spec(Stage::LoggingInit, Fatality::Degraded),
    spec(Stage::LocalizationInit, Fatality::Degraded),
    spec(Stage::LoadingUiShow, Fatality::Degraded),
    spec(Stage::EventHandlerInit, Fatality::Degraded),
    spec(Stage::MainWindowCreate, Fatality::Fatal),
    spec(Stage::PreloadData, Fatality::Fatal),
    spec(Stage::ShowMainWindow, Fatality::Committed),
    spec(Stage::PostShowNotifications, Fatality::Degraded),
    spec(Stage::UpdateCheck, Fatality::Degraded),
];

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Preload(#[from] PreloadError),
    #[error("{0} is not available")]
    Missing(&'static str),
}

/// Display text of a stage failure and its causes, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub message: String,
    pub causes: Vec<String>,
}

impl StageFailure {
    fn from_error(error: &StageError) -> Self {
        let mut chain = error_chain(error);
        let message = chain.remove(0);
        Self {
            message,
            causes: chain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapStageResult {
    pub stage: Stage,
    pub success: bool,
    pub error: Option<StageFailure>,
}

/// Per-stage results of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
    pub results: Vec<BootstrapStageResult>,
}

impl BootstrapReport {
    pub fn result(&self, stage: Stage) -> Option<&BootstrapStageResult> {
        self.results.iter().find(|result| result.stage == stage)
    }

    pub fn failed_stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.results
            .iter()
            .filter(|result| !result.success)
            .map(|result| result.stage)
    }
}

#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    /// The main window is visible and the app should run until it closes.
    Ready(BootstrapReport),
    /// A fatal stage failed; the process should exit.
    Aborted { stage: Stage, report: BootstrapReport },
}

impl BootstrapOutcome {
    pub fn report(&self) -> &BootstrapReport {
        match self {
            BootstrapOutcome::Ready(report) | BootstrapOutcome::Aborted { report, .. } => report,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapOutcome::Ready(_) => 0,
            BootstrapOutcome::Aborted { .. } => EXIT_BOOTSTRAP_FAILED,
        }
    }
}

/// State carried between stages.
#[derive(Default)]
struct BootstrapState {
    durable_log_ready: bool,
    loading_window_open: bool,
    progress: Option<ProgressSender>,
    main_view_model: Option<Arc<dyn MainViewModel>>,
    preload: PreloadOutcome,
    /// Held until the pipeline is dropped at shutdown.
    subscriptions: Vec<Subscription>,
}

pub struct BootstrapPipeline {
    context: Arc<AppContext>,
    logger: StartupLogger,
    state: BootstrapState,
}

impl BootstrapPipeline {
    pub fn new(context: Arc<AppContext>, logger: StartupLogger) -> Self {
        Self {
            context,
            logger,
            state: BootstrapState::default(),
        }
    }

    /// Runs every stage in order. Call once per process.
    pub async fn run(&mut self) -> BootstrapOutcome {
        let mut report = BootstrapReport::default();

        for StageSpec { stage, fatality } in STAGES {
            self.info(format!("{stage} starting"));
            match self.execute(stage).await {
                Ok(()) => {
                    self.info(format!("{stage} completed"));
                    report.results.push(BootstrapStageResult {
                        stage,
                        success: true,
                        error: None,
                    });
                }
                Err(error) => {
                    self.error(&format!("Error in {stage}"), &error);
                    report.results.push(BootstrapStageResult {
                        stage,
                        success: false,
                        error: Some(StageFailure::from_error(&error)),
                    });
                    match fatality {
                        Fatality::Degraded => {
                            self.warn(format!("{stage} failed, continuing with reduced functionality"));
                        }
                        Fatality::Fatal | Fatality::Committed => {
                            self.abort(stage, &error).await;
                            return BootstrapOutcome::Aborted { stage, report };
                        }
                    }
                }
            }
        }

        self.state.progress = None;
        self.info("Startup completed");
        BootstrapOutcome::Ready(report)
    }

    async fn execute(&mut self, stage: Stage) -> Result<(), StageError> {
        let context = self.context.clone();
        match stage {
            Stage::HostStart => context.host.start().await?,
            Stage::LoggingInit => {
                context.log_service.initialize(&context.log_context)?;
                context.log_service.start_log()?;
                self.state.durable_log_ready = true;
            }
            Stage::LocalizationInit => {
                let language = context
                    .preferences
                    .get_preference(PREF_LANGUAGE, context.config.localization.default_language.clone())
                    .await;
                context.localization.set_language(&language)?;
                self.info(format!("Localization initialized with language: {language}"));
            }
            Stage::LoadingUiShow => {
                let theme = context.theme.load().await;
                let (tx, rx) = progress_channel(PROGRESS_BUFFER);
                context.windows.show_loading_window(theme, rx)?;
                self.state.loading_window_open = true;
                self.state.progress = Some(tx);
            }
            Stage::EventHandlerInit => {
                for handler in &context.event_handlers {
                    let subscription = handler.attach(&context)?;
                    self.state.subscriptions.push(subscription);
                    self.info(format!("Event handler '{}' attached", handler.name()));
                }
            }
            Stage::MainWindowCreate => {
                self.state.main_view_model = Some(context.windows.create_main_window()?);
            }
            Stage::PreloadData => {
                let main_view_model = self
                    .state
                    .main_view_model
                    .clone()
                    .ok_or(StageError::Missing("main window view-model"))?;
                let orchestrator =
                    PreloadOrchestrator::new(&context, &self.logger, self.state.progress.clone());
                self.state.preload = orchestrator.run(main_view_model.as_ref()).await?;
            }
            Stage::ShowMainWindow => {
                context.windows.show_main_window()?;
                self.info("Main window shown");
                // the main window is visible; from here failures are not fatal
                self.close_loading_window();
            }
            Stage::PostShowNotifications => {
                let preload = &self.state.preload;
                context
                    .notifications
                    .show_backup_notification(preload.backup.as_ref())
                    .await;
                context
                    .notifications
                    .show_migration_notification(preload.migration.as_ref());
            }
            Stage::UpdateCheck => self.check_for_updates().await?,
        }
        Ok(())
    }

    async fn check_for_updates(&self) -> Result<(), StageError> {
        let context = &self.context;
        if !context.config.updates.enabled {
            self.info("Update check disabled by configuration");
            return Ok(());
        }
        if !context.preferences.get_preference(PREF_AUTO_UPDATE_CHECK, true).await {
            self.info("Automatic update check disabled by user");
            return Ok(());
        }

        self.info("Checking for updates");
        let latest = context.versions.check_for_update().await?;
        if !latest.update_available {
            self.info("No updates available");
            return Ok(());
        }

        self.info(format!("Update available: {}", latest.version));
        let current = context.versions.current_version();
        if context.dialogs.confirm_update(&current, &latest).await {
            self.info("Downloading and installing update");
            context.versions.download_and_install_update().await?;
            context.windows.request_exit();
        } else {
            self.info("User chose to be reminded later");
        }
        Ok(())
    }

    fn close_loading_window(&mut self) {
        if !self.state.loading_window_open {
            return;
        }
        self.state.loading_window_open = false;
        self.state.progress = None;
        if let Err(error) = self.context.windows.close_loading_window() {
            self.error("Failed to close loading window", &StageError::from(error));
        }
    }

    async fn abort(&mut self, stage: Stage, error: &StageError) {
        self.info(format!("Startup aborted at {stage}"));
        let title = self.context.text("Startup_Error_Title");
        let message = format!(
            "Winhance failed to start ({stage}).\n\n{}\n\nDetails were written to {}",
            error_chain(error).join("\n"),
            self.logger.path().display()
        );
        if !self.context.dialogs.show_startup_error(&title, &message).await {
            self.warn("No UI was available to show the startup error");
        }
        self.close_loading_window();
    }

    fn info(&self, message: impl AsRef<str>) {
        self.logger.info(message.as_ref());
        self.forward(log::Level::Info, message.as_ref());
    }

    fn warn(&self, message: impl AsRef<str>) {
        self.logger.warn(message.as_ref());
        self.forward(log::Level::Warn, message.as_ref());
    }

    fn error(&self, message: &str, error: &StageError) {
        self.logger.error(message, error);
        self.forward(
            log::Level::Error,
            &format!("{message}: {}", error_chain(error).join(": ")),
        );
    }

    fn forward(&self, level: log::Level, message: &str) {
        if self.state.durable_log_ready {
            self.context.log_service.log(level, message);
        }
    }
}
