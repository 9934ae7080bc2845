//! Process-level orchestration.
//!
//! This module owns the order of the startup phases: config load, instance
//! gating, elevation, the bootstrap pipeline, and the run loop. It also
//! installs the panic hook that mirrors crashes into the startup log.

use std::{future::Future, sync::Arc};

use winhance_bridge::config::Config;

use crate::{
    app::AppContext,
    config::{AppDirs, load_config_or_default},
    elevation::{ElevationOutcome, PrivilegeElevator},
    instance::{InstanceStatus, SingleInstanceGuard},
    pipeline::{BootstrapOutcome, BootstrapPipeline, EXIT_BOOTSTRAP_FAILED},
    platform::Platform,
    startup_log::{StartupLogEntry, StartupLogger},
};

/// Everything the composition root needs to build the [`AppContext`].
pub struct StartupEnvironment {
    pub dirs: AppDirs,
    pub config: Config,
    pub logger: StartupLogger,
}

/// Mirrors panics into the startup log, then defers to the previous hook.
fn install_panic_hook(logger: StartupLogger) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        let location = info
            .location()
            .map(|location| format!(" at {}:{}", location.file(), location.line()))
            .unwrap_or_default();
        logger.append(&StartupLogEntry::new(format!(
            "Unhandled panic{location}: {payload}"
        )));
        previous(info);
    }));
}

/// Gates the process, bootstraps the application, and runs it until the main
/// window closes. Returns the process exit code.
async fn start_application<C, Fut>(
    dirs: AppDirs,
    logger: StartupLogger,
    platform: Platform,
    compose: C,
) -> u8
where
    C: FnOnce(StartupEnvironment) -> Fut,
    Fut: Future<Output = AppContext>,
{
    let config = load_config_or_default(&dirs).await;
    let Platform {
        peers,
        activator,
        elevation,
    } = platform;

    let guard = SingleInstanceGuard::new(
        config.instance.lock_name.as_str(),
        peers,
        activator,
        logger.clone(),
    );
    let lock = match guard.acquire() {
        InstanceStatus::Acquired(lock) => Some(lock),
        InstanceStatus::Unchecked => None,
        InstanceStatus::AlreadyRunning => {
            logger.info("Exiting, another instance is active");
            return 0;
        }
    };

    let elevator = PrivilegeElevator::new(elevation, logger.clone(), config.elevation.required);
    let lock = match elevator.ensure_elevated(lock) {
        ElevationOutcome::Continue(lock) => lock,
        outcome => return outcome.exit_code().unwrap_or(0),
    };

    let context = Arc::new(
        compose(StartupEnvironment {
            dirs,
            config,
            logger: logger.clone(),
        })
        .await,
    );

    let mut pipeline = BootstrapPipeline::new(context.clone(), logger.clone());
    let code = match pipeline.run().await {
        BootstrapOutcome::Ready(_) => {
            context.windows.run_until_closed().await;
            logger.info("Main window closed, shutting down");
            0
        }
        outcome @ BootstrapOutcome::Aborted { .. } => outcome.exit_code(),
    };

    drop(pipeline);
    drop(lock);
    code
}

/// Runs the whole startup on a tokio runtime owned by the calling thread.
///
/// `platform` supplies the OS capabilities used for instance gating and
/// elevation. `compose` builds the application's collaborators once the
/// process is known to be the primary, sufficiently privileged instance.
pub fn run<C, Fut>(platform: Platform, compose: C) -> u8
where
    C: FnOnce(StartupEnvironment) -> Fut,
    Fut: Future<Output = AppContext>,
{
    let dirs = AppDirs::discover_or_temp();
    let logger = StartupLogger::in_dir(&dirs.log_dir());
    install_panic_hook(logger.clone());
    logger.info("Winhance process starting");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            logger.error("Failed to build tokio runtime", &error);
            return EXIT_BOOTSTRAP_FAILED;
        }
    };

    runtime.block_on(start_application(dirs, logger, platform, compose))
}
