use std::process::Command;

use sysinfo::System;

use super::{ElevationBackend, RelaunchRequest, WindowActivator};
use crate::error::PlatformError;

/// `pkexec` exit status when the authentication dialog was dismissed.
const PKEXEC_DISMISSED: i32 = 126;
/// `pkexec` exit status when authorization could not be obtained.
const PKEXEC_NOT_AUTHORIZED: i32 = 127;

/// There is no portable way to raise another process's window outside
/// Windows; activation reports that no window was found.
pub(super) struct UnsupportedWindowActivator;

impl WindowActivator for UnsupportedWindowActivator {
    fn restore(&self, pid: u32) -> Result<bool, PlatformError> {
        log::debug!("Window activation for pid {pid} is not available on this platform");
        Ok(false)
    }

    fn focus(&self, _pid: u32) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported("window activation"))
    }
}

/// Root check through the process table and relaunch through `pkexec`.
///
/// `pkexec` runs the elevated copy as its own child, so the relaunch waits for
/// it to exit before reporting the handoff.
pub(super) struct PkexecElevation;

impl ElevationBackend for PkexecElevation {
    fn is_elevated(&self) -> Result<bool, PlatformError> {
        let pid = sysinfo::get_current_pid()
            .map_err(|error| PlatformError::CurrentProcess(error.to_string()))?;
        let mut system = System::new();
        system.refresh_process(pid);
        let process = system
            .process(pid)
            .ok_or_else(|| PlatformError::CurrentProcess(format!("pid {pid} not in process table")))?;
        let uid = process
            .effective_user_id()
            .ok_or_else(|| PlatformError::CurrentProcess("effective user id unavailable".to_string()))?;
        Ok(**uid == 0)
    }

    fn relaunch_elevated(&self, request: &RelaunchRequest) -> Result<(), PlatformError> {
        let status = Command::new("pkexec")
            .arg(&request.executable)
            .args(&request.args)
            .current_dir(&request.working_dir)
            .status()
            .map_err(|source| PlatformError::Spawn {
                program: "pkexec".to_string(),
                source,
            })?;

        pkexec_outcome(status.code())
    }
}

/// Maps the exit status of `pkexec` to the relaunch result. Any status other
/// than the two reserved by `pkexec` belongs to the elevated copy.
fn pkexec_outcome(code: Option<i32>) -> Result<(), PlatformError> {
    match code {
        Some(0) => Ok(()),
        Some(PKEXEC_DISMISSED) => Err(PlatformError::ElevationDeclined),
        Some(PKEXEC_NOT_AUTHORIZED) => Err(PlatformError::RelaunchFailed(
            "pkexec could not obtain authorization".to_string(),
        )),
        None => Err(PlatformError::RelaunchFailed(
            "pkexec was terminated by a signal".to_string(),
        )),
        Some(code) => {
            log::info!("Elevated instance exited with status {code}");
            Ok(())
        }
    }
}
