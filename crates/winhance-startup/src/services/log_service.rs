use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::Local;

use super::{LogContext, LogService};
use crate::error::ServiceError;

/// Durable per-run log file under the user's log directory.
///
/// Messages logged before [`LogService::start_log`] only reach the `log`
/// facade.
pub struct FileLogService {
    log_dir: PathBuf,
    context: Mutex<Option<LogContext>>,
    file: Mutex<Option<(PathBuf, File)>>,
}

impl FileLogService {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            context: Mutex::new(None),
            file: Mutex::new(None),
        }
    }

    /// Path of the file opened by `start_log`, if it has run.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.file
            .lock()
            .ok()
            .and_then(|file| file.as_ref().map(|(path, _)| path.clone()))
    }

    fn open_log_file(log_dir: &Path) -> std::io::Result<(PathBuf, File)> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(format!(
            "Winhance_Log_{}.txt",
            Local::now().format("%Y%m%d_%H%M%S")
        ));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok((path, file))
    }
}

impl LogService for FileLogService {
    fn log(&self, level: log::Level, message: &str) {
        log::log!(level, "{message}");
        let Ok(mut guard) = self.file.lock() else {
            return;
        };
        if let Some((_, file)) = guard.as_mut() {
            let _ = writeln!(
                file,
                "[{}] [{level}] {message}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    fn initialize(&self, context: &LogContext) -> Result<(), ServiceError> {
        let mut guard = self
            .context
            .lock()
            .map_err(|_| ServiceError::failed("log context lock poisoned"))?;
        *guard = Some(context.clone());
        Ok(())
    }

    fn start_log(&self) -> Result<(), ServiceError> {
        let (path, mut file) = Self::open_log_file(&self.log_dir)
            .map_err(|error| ServiceError::context("opening log file", error))?;

        let context = self
            .context
            .lock()
            .ok()
            .and_then(|context| context.clone());
        writeln!(file, "==== Winhance log started {} ====", Local::now().to_rfc3339())?;
        if let Some(context) = context {
            writeln!(file, "Version: {}", context.app_version)?;
            writeln!(file, "OS: {}", context.os_description)?;
        }

        let mut guard = self
            .file
            .lock()
            .map_err(|_| ServiceError::failed("log file lock poisoned"))?;
        *guard = Some((path, file));
        Ok(())
    }
}
