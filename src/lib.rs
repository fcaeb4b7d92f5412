pub mod actions;
pub mod config;
pub mod drag;
pub mod errors;
pub mod host;
pub mod identity;
pub mod models;
pub mod organizer;
pub mod persistence;
pub mod reconcile;
pub mod scheduler;
pub mod store;

pub use crate::actions::FolderActions;
pub use crate::config::OrganizerConfig;
pub use crate::drag::{DragDropController, DropOutcome, DropTarget};
pub use crate::errors::{AppError, AppResult};
pub use crate::organizer::{HostBindings, Organizer};

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Installs the global JSON subscriber writing to a daily rolling file in `log_dir`.
/// `RUST_LOG` overrides `default_level`.
pub fn init_tracing(log_dir: &Path, default_level: &str) -> Result<(), String> {
    std::fs::create_dir_all(log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "entry-folders.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    if LOG_GUARD.set(guard).is_err() {
        return Err("tracing already initialised".to_string());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
