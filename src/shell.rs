//! Headless application shell.
//!
//! Renders the window lifecycle and dialogs as log lines. Loading progress is
//! drained on its own task, standing in for the UI thread.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::{sync::Notify, task::JoinHandle};
use winhance_bridge::{ProgressReceiver, results::VersionInfo};
use winhance_startup::{
    error::ServiceError,
    services::{DialogService, MainViewModel, Theme, WindowManager},
};

/// View-model behind the console "main window".
pub struct ConsoleMainViewModel {
    current_view: Mutex<Option<&'static str>>,
}

impl ConsoleMainViewModel {
    const DEFAULT_VIEW: &'static str = "SoftwareApps";
}

#[async_trait]
impl MainViewModel for ConsoleMainViewModel {
    async fn initialize_application(&self) -> Result<(), ServiceError> {
        let mut current = self
            .current_view
            .lock()
            .map_err(|_| ServiceError::failed("navigation state is poisoned"))?;
        *current = Some(Self::DEFAULT_VIEW);
        log::info!("Navigated to {}", Self::DEFAULT_VIEW);
        Ok(())
    }
}

pub struct HeadlessShell {
    loading: Mutex<Option<JoinHandle<()>>>,
    main_window: Mutex<Option<Arc<ConsoleMainViewModel>>>,
    closed: Notify,
}

impl HeadlessShell {
    pub fn new() -> Self {
        Self {
            loading: Mutex::new(None),
            main_window: Mutex::new(None),
            closed: Notify::new(),
        }
    }
}

#[async_trait]
impl WindowManager for HeadlessShell {
    fn show_loading_window(
        &self,
        theme: Theme,
        mut progress: ProgressReceiver,
    ) -> Result<(), ServiceError> {
        log::info!("Loading window shown ({theme:?} theme)");
        let task = tokio::spawn(async move {
            while let Some(update) = progress.recv().await {
                log::info!("[{}/{}] {}", update.current, update.total, update.message);
            }
        });
        let mut loading = self
            .loading
            .lock()
            .map_err(|_| ServiceError::failed("loading window state is poisoned"))?;
        *loading = Some(task);
        Ok(())
    }

    fn close_loading_window(&self) -> Result<(), ServiceError> {
        let task = self
            .loading
            .lock()
            .map_err(|_| ServiceError::failed("loading window state is poisoned"))?
            .take();
        if task.is_some() {
            log::info!("Loading window closed");
        }
        Ok(())
    }

    fn create_main_window(&self) -> Result<Arc<dyn MainViewModel>, ServiceError> {
        let view_model = Arc::new(ConsoleMainViewModel {
            current_view: Mutex::new(None),
        });
        *self
            .main_window
            .lock()
            .map_err(|_| ServiceError::failed("main window state is poisoned"))? =
            Some(view_model.clone());
        Ok(view_model)
    }

    fn show_main_window(&self) -> Result<(), ServiceError> {
        let created = self
            .main_window
            .lock()
            .map_err(|_| ServiceError::failed("main window state is poisoned"))?
            .is_some();
        if !created {
            return Err(ServiceError::failed("main window was never created"));
        }
        log::info!("Main window shown, press Ctrl+C to exit");
        Ok(())
    }

    fn request_exit(&self) {
        log::info!("Exit requested");
        self.closed.notify_one();
    }

    async fn run_until_closed(&self) {
        tokio::select! {
            _ = self.closed.notified() => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(error) = result {
                    log::error!("Failed to listen for Ctrl+C: {error}");
                }
            }
        }
    }
}

#[async_trait]
impl DialogService for HeadlessShell {
    async fn show_startup_error(&self, title: &str, message: &str) -> bool {
        log::error!("{title}: {message}");
        false
    }

    async fn confirm_update(&self, current_version: &str, latest: &VersionInfo) -> bool {
        log::info!(
            "Update {} is available (running {current_version}); install it from the release page",
            latest.version
        );
        false
    }
}
