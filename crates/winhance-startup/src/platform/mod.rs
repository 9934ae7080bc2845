//! OS capabilities used before the UI exists: finding a peer process,
//! bringing its window forward, and checking or acquiring administrative
//! rights. The implementation is chosen at composition time.

#[cfg(not(windows))]
mod unix;
#[cfg(windows)]
mod win32;

use std::path::PathBuf;

use sysinfo::System;

use crate::error::PlatformError;

/// Restores and focuses the main window of another process.
pub trait WindowActivator: Send + Sync {
    /// Restores the main window of `pid` if it is minimized. Returns `false`
    /// when the process owns no visible top-level window.
    fn restore(&self, pid: u32) -> Result<bool, PlatformError>;
    /// Brings the main window of `pid` to the foreground.
    fn focus(&self, pid: u32) -> Result<(), PlatformError>;
}

/// Checks for and requests administrative rights.
pub trait ElevationBackend: Send + Sync {
    fn is_elevated(&self) -> Result<bool, PlatformError>;
    /// Starts `request` with elevated rights. Returns
    /// [`PlatformError::ElevationDeclined`] when the user cancels the prompt.
    fn relaunch_elevated(&self, request: &RelaunchRequest) -> Result<(), PlatformError>;
}

/// Finds other running instances of this executable.
pub trait PeerLocator: Send + Sync {
    fn find_peers(&self) -> Result<Vec<u32>, PlatformError>;
}

/// Command line used to start a new copy of the running executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaunchRequest {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl RelaunchRequest {
    /// Describes the current process: same executable, arguments and
    /// working directory.
    pub fn current() -> Result<Self, PlatformError> {
        let executable = std::env::current_exe().map_err(PlatformError::CurrentExe)?;
        let working_dir = std::env::current_dir().map_err(PlatformError::CurrentExe)?;
        Ok(Self {
            executable,
            args: std::env::args().skip(1).collect(),
            working_dir,
        })
    }
}

/// Looks up peers in the OS process table by executable name.
pub struct ProcessTable;

impl PeerLocator for ProcessTable {
    fn find_peers(&self) -> Result<Vec<u32>, PlatformError> {
        let current_pid = sysinfo::get_current_pid()
            .map_err(|error| PlatformError::CurrentProcess(error.to_string()))?;
        let executable = std::env::current_exe().map_err(PlatformError::CurrentExe)?;
        let Some(name) = executable.file_name().map(|name| name.to_string_lossy().to_string())
        else {
            return Err(PlatformError::CurrentProcess(format!(
                "executable path {executable:?} has no file name"
            )));
        };

        let mut system = System::new();
        system.refresh_processes();
        let peers = system
            .processes_by_exact_name(&name)
            .filter(|process| process.pid() != current_pid)
            .map(|process| process.pid().as_u32())
            .collect();
        Ok(peers)
    }
}

/// The OS capabilities used to gate the process, chosen by the composition
/// root.
pub struct Platform {
    pub peers: Box<dyn PeerLocator>,
    pub activator: Box<dyn WindowActivator>,
    pub elevation: Box<dyn ElevationBackend>,
}

impl Platform {
    /// Capabilities backed by the running operating system.
    pub fn native() -> Self {
        Self {
            peers: Box::new(ProcessTable),
            activator: window_activator(),
            elevation: elevation_backend(),
        }
    }
}

/// Window activation for the current platform.
fn window_activator() -> Box<dyn WindowActivator> {
    #[cfg(windows)]
    {
        Box::new(win32::Win32WindowActivator)
    }
    #[cfg(not(windows))]
    {
        Box::new(unix::UnsupportedWindowActivator)
    }
}

/// Elevation backend for the current platform.
fn elevation_backend() -> Box<dyn ElevationBackend> {
    #[cfg(windows)]
    {
        Box::new(win32::RunAsElevation)
    }
    #[cfg(not(windows))]
    {
        Box::new(unix::PkexecElevation)
    }
}

/// Joins arguments into a single command line, quoting any that contain
/// whitespace or quotes.
pub(crate) fn join_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.is_empty() || arg.contains([' ', '\t', '"']) {
                format!("\"{}\"", arg.replace('"', "\\\""))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
