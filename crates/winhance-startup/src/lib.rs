//! Startup orchestration for Winhance.
//!
//! Bringing the application up happens in three phases, all driven from the
//! control thread by [`run`]:
//! 1. Process gating: the single-instance lock and the elevation decision,
//!    both made before any service or window exists.
//! 2. The bootstrap pipeline: ten ordered stages, each tagged fatal or
//!    degraded, that start services, show the loading window, preload data
//!    and reveal the main window.
//! 3. Running until the main window closes.
//!
//! Collaborators are passed in as trait objects through [`app::AppContext`];
//! nothing is looked up through global state.

pub mod app;
pub mod config;
pub mod elevation;
pub mod error;
pub mod events;
pub mod instance;
pub mod pipeline;
pub mod platform;
pub mod preload;
pub mod runtime;
pub mod services;
pub mod startup_log;

#[cfg(test)]
mod testing;

pub use crate::runtime::{StartupEnvironment, run};
