//! Error types shared by the startup core and its collaborators.

use std::error::Error as StdError;

/// Boxed error used to carry a collaborator's own failure as a source.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors reported by external collaborators (services, windows, dialogs).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The collaborator failed and described why.
    #[error("{0}")]
    Failed(String),
    /// An I/O error occurred inside the collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A network request made by the collaborator failed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The collaborator failed while performing `context`, caused by `source`.
    #[error("{context}")]
    Context {
        context: String,
        #[source]
        source: BoxError,
    },
}

impl ServiceError {
    /// Builds a plain failure from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Wraps `source` with a description of what was being attempted.
    pub fn context(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Context {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Errors raised by OS-level operations: the instance lock, process lookup,
/// window activation and elevation.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The named instance lock could not be created or opened.
    #[error("failed to open instance lock '{name}': {reason}")]
    InstanceLock { name: String, reason: String },
    /// The path or name of the running executable could not be determined.
    #[error("failed to resolve current executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    /// The current process could not be identified.
    #[error("failed to identify current process: {0}")]
    CurrentProcess(String),
    /// The user dismissed the elevation prompt.
    #[error("elevation was declined by the user")]
    ElevationDeclined,
    /// Spawning or waiting on a helper process failed.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The elevated relaunch could not be started.
    #[error("elevated relaunch failed: {0}")]
    RelaunchFailed(String),
    /// The operation is not available on this platform.
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
    /// A Win32 call failed.
    #[cfg(windows)]
    #[error("windows API call failed: {0}")]
    Windows(#[from] windows::core::Error),
}

/// Collects the display text of `error` followed by every error in its
/// `source()` chain.
pub fn error_chain(error: &(dyn StdError + 'static)) -> Vec<String> {
    let mut chain = vec![error.to_string()];
    let mut current = error.source();
    while let Some(cause) = current {
        chain.push(cause.to_string());
        current = cause.source();
    }
    chain
}
