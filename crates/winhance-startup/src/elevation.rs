//! Administrative rights check and elevated relaunch.
//!
//! The elevator runs once, after the instance lock is taken and before any
//! service or window exists. When a relaunch is needed the lock is released
//! first so the elevated copy can acquire it.

use crate::{
    error::PlatformError,
    instance::InstanceLock,
    platform::{ElevationBackend, RelaunchRequest},
    startup_log::StartupLogger,
};

/// Exit code used when elevation was declined or could not be started.
pub const EXIT_ELEVATION_FAILED: u8 = 1;

/// What the process should do after the elevation decision.
#[derive(Debug)]
pub enum ElevationOutcome {
    /// Keep starting up, still holding the instance lock if there was one.
    Continue(Option<InstanceLock>),
    /// An elevated copy was started; this process exits normally.
    Relaunched,
    /// The user declined the elevation prompt.
    Declined,
    /// The elevated copy could not be started.
    Failed,
}

impl ElevationOutcome {
    /// Process exit code for outcomes that end this process.
    pub fn exit_code(&self) -> Option<u8> {
        match self {
            ElevationOutcome::Continue(_) => None,
            ElevationOutcome::Relaunched => Some(0),
            ElevationOutcome::Declined | ElevationOutcome::Failed => Some(EXIT_ELEVATION_FAILED),
        }
    }
}

pub struct PrivilegeElevator {
    backend: Box<dyn ElevationBackend>,
    logger: StartupLogger,
    required: bool,
}

impl PrivilegeElevator {
    pub fn new(backend: Box<dyn ElevationBackend>, logger: StartupLogger, required: bool) -> Self {
        Self {
            backend,
            logger,
            required,
        }
    }

    /// Decides whether this process may continue. Consumes the elevator so
    /// the decision is made at most once per process.
    pub fn ensure_elevated(self, lock: Option<InstanceLock>) -> ElevationOutcome {
        if !self.required {
            return ElevationOutcome::Continue(lock);
        }

        match self.backend.is_elevated() {
            Ok(true) => {
                self.logger.info("Running with administrator privileges");
                return ElevationOutcome::Continue(lock);
            }
            Ok(false) => {}
            Err(error) => {
                self.logger.error(
                    "Elevation check failed, continuing without elevation",
                    &error,
                );
                return ElevationOutcome::Continue(lock);
            }
        }

        let request = match RelaunchRequest::current() {
            Ok(request) => request,
            Err(error) => {
                self.logger.error(
                    "Could not describe the current process for relaunch, continuing",
                    &error,
                );
                return ElevationOutcome::Continue(lock);
            }
        };

        self.logger
            .info("Not running as administrator, starting elevated process");
        if let Some(lock) = lock {
            lock.release();
        }

        match self.backend.relaunch_elevated(&request) {
            Ok(()) => {
                self.logger.info("Elevated process started, exiting");
                ElevationOutcome::Relaunched
            }
            Err(PlatformError::ElevationDeclined) => {
                self.logger.warn("User declined elevation, exiting");
                ElevationOutcome::Declined
            }
            Err(error) => {
                self.logger
                    .error("Failed to start elevated process", &error);
                ElevationOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ElevationScript, FakeElevation, Journal};

    fn run(script: ElevationScript, required: bool) -> (ElevationOutcome, Journal) {
        let temp = tempfile::tempdir().unwrap();
        let journal = Journal::default();
        let elevator = PrivilegeElevator::new(
            Box::new(FakeElevation {
                journal: journal.clone(),
                script,
            }),
            StartupLogger::in_dir(temp.path()),
            required,
        );
        (elevator.ensure_elevated(None), journal)
    }

    #[test]
    fn elevated_process_never_relaunches() {
        let (outcome, journal) = run(ElevationScript::Elevated, true);
        assert!(matches!(outcome, ElevationOutcome::Continue(None)));
        assert!(!journal.contains("elevation:relaunch"));
        assert_eq!(outcome.exit_code(), None);
    }

    #[test]
    fn not_required_skips_the_check() {
        let (outcome, journal) = run(ElevationScript::RelaunchSucceeds, false);
        assert!(matches!(outcome, ElevationOutcome::Continue(None)));
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn failed_check_fails_open() {
        let (outcome, journal) = run(ElevationScript::CheckFails, true);
        assert!(matches!(outcome, ElevationOutcome::Continue(None)));
        assert!(!journal.contains("elevation:relaunch"));
    }

    #[test]
    fn successful_relaunch_exits_zero() {
        let (outcome, journal) = run(ElevationScript::RelaunchSucceeds, true);
        assert!(matches!(outcome, ElevationOutcome::Relaunched));
        assert_eq!(outcome.exit_code(), Some(0));
        assert_eq!(journal.entries(), vec!["elevation:check", "elevation:relaunch"]);
    }

    #[test]
    fn declined_and_failed_relaunch_exit_one() {
        let (declined, _) = run(ElevationScript::RelaunchDeclined, true);
        assert!(matches!(declined, ElevationOutcome::Declined));
        assert_eq!(declined.exit_code(), Some(EXIT_ELEVATION_FAILED));

        let (failed, _) = run(ElevationScript::RelaunchFails, true);
        assert!(matches!(failed, ElevationOutcome::Failed));
        assert_eq!(failed.exit_code(), Some(EXIT_ELEVATION_FAILED));
    }

    #[test]
    fn lock_is_released_before_relaunch() {
        use crate::{
            instance::{InstanceStatus, SingleInstanceGuard},
            testing::{FakeActivator, FakePeers},
        };

        struct LockCheckingRelaunch {
            name: String,
            journal: Journal,
        }
        impl ElevationBackend for LockCheckingRelaunch {
            fn is_elevated(&self) -> Result<bool, PlatformError> {
                Ok(false)
            }
            fn relaunch_elevated(&self, _request: &RelaunchRequest) -> Result<(), PlatformError> {
                let second = single_instance::SingleInstance::new(&self.name).unwrap();
                self.journal.record(format!("lock-free:{}", second.is_single()));
                Ok(())
            }
        }

        let temp = tempfile::tempdir().unwrap();
        let logger = StartupLogger::in_dir(temp.path());
        let journal = Journal::default();
        let name = format!("winhance-test-elevate-{}", std::process::id());
        let guard = SingleInstanceGuard::new(
            name.as_str(),
            Box::new(FakePeers(Vec::new())),
            Box::new(FakeActivator(journal.clone())),
            logger.clone(),
        );
        let InstanceStatus::Acquired(lock) = guard.acquire() else {
            panic!("lock should be free");
        };

        let elevator = PrivilegeElevator::new(
            Box::new(LockCheckingRelaunch {
                name,
                journal: journal.clone(),
            }),
            logger,
            true,
        );
        let outcome = elevator.ensure_elevated(Some(lock));
        assert!(matches!(outcome, ElevationOutcome::Relaunched));
        assert_eq!(journal.entries(), vec!["lock-free:true"]);
    }
}
