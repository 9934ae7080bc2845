//! Single-instance enforcement through a named, session-scoped lock.
//!
//! The first process to acquire the lock holds it for its whole lifetime.
//! A second process finds the holder, brings its window forward, and exits.
//! Failing to create or query the lock never blocks startup.

use single_instance::SingleInstance;

use crate::{
    error::PlatformError,
    platform::{PeerLocator, WindowActivator},
    startup_log::StartupLogger,
};

/// Ownership of the instance lock. Dropping it releases the lock.
pub struct InstanceLock {
    name: String,
    _lock: SingleInstance,
}

impl InstanceLock {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Releases the lock so another process can acquire it.
    pub fn release(self) {
        log::debug!("Releasing instance lock '{}'", self.name);
    }
}

impl std::fmt::Debug for InstanceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceLock").field("name", &self.name).finish()
    }
}

/// Result of trying to become the primary instance.
#[derive(Debug)]
pub enum InstanceStatus {
    /// This process is the primary instance and owns the lock.
    Acquired(InstanceLock),
    /// Another instance holds the lock; this process should exit.
    AlreadyRunning,
    /// The lock could not be used; startup continues without protection.
    Unchecked,
}

/// Acquires the instance lock and activates the holder on contention.
pub struct SingleInstanceGuard {
    lock_name: String,
    peers: Box<dyn PeerLocator>,
    activator: Box<dyn WindowActivator>,
    logger: StartupLogger,
}

impl SingleInstanceGuard {
    pub fn new(
        lock_name: impl Into<String>,
        peers: Box<dyn PeerLocator>,
        activator: Box<dyn WindowActivator>,
        logger: StartupLogger,
    ) -> Self {
        Self {
            lock_name: lock_name.into(),
            peers,
            activator,
            logger,
        }
    }

    pub fn acquire(&self) -> InstanceStatus {
        let lock = match SingleInstance::new(&self.lock_name) {
            Ok(lock) => lock,
            Err(error) => {
                let error = PlatformError::InstanceLock {
                    name: self.lock_name.clone(),
                    reason: error.to_string(),
                };
                self.logger
                    .error("Continuing without single-instance enforcement", &error);
                return InstanceStatus::Unchecked;
            }
        };

        if lock.is_single() {
            self.logger.info("Instance lock acquired");
            return InstanceStatus::Acquired(InstanceLock {
                name: self.lock_name.clone(),
                _lock: lock,
            });
        }

        self.logger
            .info("Another instance is already running, activating it");
        self.activate_existing_instance();
        InstanceStatus::AlreadyRunning
    }

    /// Restores and focuses the first peer with a window. Every failure is
    /// logged and swallowed.
    fn activate_existing_instance(&self) {
        let peers = match self.peers.find_peers() {
            Ok(peers) => peers,
            Err(error) => {
                self.logger
                    .error("Failed to look up the running instance", &error);
                return;
            }
        };

        for pid in peers {
            match self.activator.restore(pid) {
                Ok(true) => {
                    if let Err(error) = self.activator.focus(pid) {
                        self.logger
                            .error(format!("Failed to focus instance {pid}"), &error);
                    }
                    return;
                }
                Ok(false) => continue,
                Err(error) => {
                    self.logger
                        .error(format!("Failed to restore instance {pid}"), &error);
                }
            }
        }
        self.logger.warn("No window of the running instance was found");
    }
}
