//! Data preloading that runs behind the loading window.
//!
//! Steps run strictly in order and each reports progress before it starts.
//! The first failing step stops the sequence; its error is returned to the
//! pipeline, which treats it as fatal.

use std::fmt;

use winhance_bridge::{
    ProgressSender,
    results::{BackupResult, MigrationResult},
};

use crate::{
    app::AppContext,
    error::ServiceError,
    services::{
        MainViewModel, PREF_REGISTRY_BACKUP_COMPLETED, PREF_SKIP_SYSTEM_BACKUP, PreferencesExt,
    },
    startup_log::StartupLogger,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadStep {
    SettingsRegistry,
    SettingsCache,
    SystemBackup,
    ScriptMigration,
    FeaturePrime,
    InitialNavigation,
}

impl PreloadStep {
    pub const ALL: [PreloadStep; 6] = [
        PreloadStep::SettingsRegistry,
        PreloadStep::SettingsCache,
        PreloadStep::SystemBackup,
        PreloadStep::ScriptMigration,
        PreloadStep::FeaturePrime,
        PreloadStep::InitialNavigation,
    ];

    /// Text shown in the loading window while the step runs.
    pub fn description(self) -> &'static str {
        match self {
            PreloadStep::SettingsRegistry => "Initializing settings registry",
            PreloadStep::SettingsCache => "Loading settings",
            PreloadStep::SystemBackup => "Checking system backup",
            PreloadStep::ScriptMigration => "Migrating scripts",
            PreloadStep::FeaturePrime => "Loading installed software",
            PreloadStep::InitialNavigation => "Opening main view",
        }
    }

    fn index(self) -> u32 {
        Self::ALL.iter().position(|step| *step == self).unwrap_or(0) as u32 + 1
    }

    fn fail(self, source: ServiceError) -> PreloadError {
        PreloadError { step: self, source }
    }
}

impl fmt::Display for PreloadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("preload step '{step}' failed")]
pub struct PreloadError {
    pub step: PreloadStep,
    #[source]
    pub source: ServiceError,
}

/// Results kept for the post-show notifications. `None` means the step did
/// not run.
#[derive(Debug, Clone, Default)]
pub struct PreloadOutcome {
    pub backup: Option<BackupResult>,
    pub migration: Option<MigrationResult>,
}

pub struct PreloadOrchestrator<'a> {
    context: &'a AppContext,
    logger: &'a StartupLogger,
    progress: Option<ProgressSender>,
}

impl<'a> PreloadOrchestrator<'a> {
    pub fn new(
        context: &'a AppContext,
        logger: &'a StartupLogger,
        progress: Option<ProgressSender>,
    ) -> Self {
        Self {
            context,
            logger,
            progress,
        }
    }

    pub async fn run(&self, main_view_model: &dyn MainViewModel) -> Result<PreloadOutcome, PreloadError> {
        self.run_steps(main_view_model).await.inspect_err(|error| {
            self.logger
                .error("Error preloading application data", error)
        })
    }

    async fn run_steps(&self, main_view_model: &dyn MainViewModel) -> Result<PreloadOutcome, PreloadError> {
        let context = self.context;
        let mut outcome = PreloadOutcome::default();

        self.begin(PreloadStep::SettingsRegistry);
        context
            .settings_registry
            .initialize()
            .await
            .map_err(|error| PreloadStep::SettingsRegistry.fail(error))?;

        self.begin(PreloadStep::SettingsCache);
        context
            .settings_preloader
            .preload_all_settings()
            .await
            .map_err(|error| PreloadStep::SettingsCache.fail(error))?;

        self.begin(PreloadStep::SystemBackup);
        let skip_backup = context
            .preferences
            .get_preference(PREF_SKIP_SYSTEM_BACKUP, false)
            .await;
        let backup_completed = context
            .preferences
            .get_preference(PREF_REGISTRY_BACKUP_COMPLETED, false)
            .await;
        if skip_backup && backup_completed {
            self.logger.info("System backup skipped");
        } else {
            let result = context
                .backup
                .ensure_initial_backups()
                .await
                .map_err(|error| PreloadStep::SystemBackup.fail(error))?;
            self.logger
                .info(format!("System backup finished, success: {}", result.success));
            outcome.backup = Some(result);
        }

        self.begin(PreloadStep::ScriptMigration);
        let migration = context
            .migration
            .migrate_from_old_paths()
            .await
            .map_err(|error| PreloadStep::ScriptMigration.fail(error))?;
        outcome.migration = Some(migration);

        self.begin(PreloadStep::FeaturePrime);
        self.logger
            .info(format!("Priming {}", context.primary_feature.name()));
        context
            .primary_feature
            .initialize()
            .await
            .map_err(|error| PreloadStep::FeaturePrime.fail(error))?;

        self.begin(PreloadStep::InitialNavigation);
        main_view_model
            .initialize_application()
            .await
            .map_err(|error| PreloadStep::InitialNavigation.fail(error))?;

        self.logger.info("Application data preloaded");
        Ok(outcome)
    }

    fn begin(&self, step: PreloadStep) {
        self.logger.info(format!("Preload: {step}"));
        if let Some(progress) = &self.progress {
            progress.report(step.index(), PreloadStep::ALL.len() as u32, step.description());
        }
    }
}

#[cfg(test)]
mod tests {
    use winhance_bridge::progress_channel;

    use super::*;
    use crate::testing::{FakeMainViewModel, Fakes};

    async fn preload(fakes: &Fakes) -> Result<PreloadOutcome, PreloadError> {
        let temp = tempfile::tempdir().unwrap();
        let logger = StartupLogger::in_dir(temp.path());
        let context = fakes.context();
        let main = FakeMainViewModel::new(&fakes.journal);
        PreloadOrchestrator::new(&context, &logger, None)
            .run(&main)
            .await
    }

    #[tokio::test]
    async fn steps_run_in_order() {
        let fakes = Fakes::new();
        let outcome = preload(&fakes).await.expect("preload");

        assert_eq!(
            fakes.journal.entries(),
            vec![
                "preload:registry",
                "preload:settings",
                "preload:backup",
                "preload:migration",
                "preload:feature",
                "main:navigate",
            ]
        );
        assert!(outcome.backup.is_some());
        assert!(outcome.migration.is_some());
    }

    #[tokio::test]
    async fn primed_feature_is_named_in_the_log() {
        let temp = tempfile::tempdir().unwrap();
        let logger = StartupLogger::in_dir(temp.path());
        let fakes = Fakes::new();
        let context = fakes.context();
        let main = FakeMainViewModel::new(&fakes.journal);

        PreloadOrchestrator::new(&context, &logger, None)
            .run(&main)
            .await
            .expect("preload");

        let log = std::fs::read_to_string(logger.path()).unwrap();
        assert!(log.contains("Priming SoftwareApps"));
    }

    #[tokio::test]
    async fn backup_runs_unless_skipped_and_completed() {
        for (skip, completed, runs) in [
            (false, false, true),
            (true, false, true),
            (false, true, true),
            (true, true, false),
        ] {
            let fakes = Fakes::new();
            fakes.preferences.set(PREF_SKIP_SYSTEM_BACKUP, skip);
            fakes.preferences.set(PREF_REGISTRY_BACKUP_COMPLETED, completed);

            let outcome = preload(&fakes).await.expect("preload");
            assert_eq!(fakes.journal.contains("preload:backup"), runs, "skip={skip} completed={completed}");
            assert_eq!(outcome.backup.is_some(), runs);
        }
    }

    #[tokio::test]
    async fn failing_step_stops_the_sequence() {
        let fakes = Fakes::new();
        fakes.journal.fail("preload:migration");

        let error = preload(&fakes).await.expect_err("migration should fail");
        assert_eq!(error.step, PreloadStep::ScriptMigration);
        assert!(!fakes.journal.contains("preload:feature"));
        assert!(!fakes.journal.contains("main:navigate"));
    }

    #[tokio::test]
    async fn progress_counts_up_to_six() {
        let fakes = Fakes::new();
        let temp = tempfile::tempdir().unwrap();
        let logger = StartupLogger::in_dir(temp.path());
        let context = fakes.context();
        let main = FakeMainViewModel::new(&fakes.journal);
        let (tx, mut rx) = progress_channel(16);

        PreloadOrchestrator::new(&context, &logger, Some(tx))
            .run(&main)
            .await
            .expect("preload");

        let mut steps = Vec::new();
        while let Some(update) = rx.try_recv() {
            assert_eq!(update.total, 6);
            steps.push(update.current);
        }
        assert_eq!(steps, vec![1, 2, 3, 4, 5, 6]);
    }
}
