//! Fallback startup log, usable before any other service exists.
//!
//! Every write is attempted independently and failures are swallowed: the
//! logger must never be the reason the process it is diagnosing goes down.

use std::{
    error::Error as StdError,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Local};

use crate::error::error_chain;

/// File name of the startup log inside the log directory.
pub const STARTUP_LOG_FILE: &str = "WinhanceStartupLog.txt";

/// One line (plus optional error detail) of the startup log.
#[derive(Debug, Clone)]
pub struct StartupLogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    /// Display text of the attached error followed by its cause chain.
    pub exception: Option<Vec<String>>,
}

impl StartupLogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
            exception: None,
        }
    }

    pub fn with_error(message: impl Into<String>, error: &(dyn StdError + 'static)) -> Self {
        Self {
            exception: Some(error_chain(error)),
            ..Self::new(message)
        }
    }

    /// Renders the entry as it is written to disk, including the trailing
    /// newline.
    pub fn render(&self) -> String {
        let mut text = format!(
            "[{}] {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        );
        if let Some(chain) = &self.exception {
            let mut causes = chain.iter();
            if let Some(head) = causes.next() {
                text.push_str(&format!("Exception: {head}\n"));
            }
            for cause in causes {
                text.push_str(&format!("Caused by: {cause}\n"));
            }
        }
        text
    }
}

/// Append-only writer for the startup log. Cloning is cheap; every clone
/// appends to the same file.
#[derive(Debug, Clone)]
pub struct StartupLogger {
    path: Arc<PathBuf>,
}

impl StartupLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    /// Logger writing to `<log_dir>/WinhanceStartupLog.txt`.
    pub fn in_dir(log_dir: &Path) -> Self {
        Self::new(log_dir.join(STARTUP_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: impl AsRef<str>) {
        log::info!("{}", message.as_ref());
        self.append(&StartupLogEntry::new(message.as_ref()));
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        log::warn!("{}", message.as_ref());
        self.append(&StartupLogEntry::new(message.as_ref()));
    }

    /// Logs `message` together with the full cause chain of `error`.
    pub fn error(&self, message: impl AsRef<str>, error: &(dyn StdError + 'static)) {
        let entry = StartupLogEntry::with_error(message.as_ref(), error);
        log::error!("{}: {}", message.as_ref(), error_chain(error).join(": "));
        self.append(&entry);
    }

    /// Appends an entry, dropping any failure.
    pub fn append(&self, entry: &StartupLogEntry) {
        let _ = self.try_append(entry);
    }

    fn try_append(&self, entry: &StartupLogEntry) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_path())?;
        file.write_all(entry.render().as_bytes())
    }
}
