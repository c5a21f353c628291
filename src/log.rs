//! File-based logging for debugging
//!
//! `init` routes `tracing` output to a log file; the `log!` macro is the
//! crate's shorthand for debug-level events.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::shared::LogSettings;

static INSTALLED: OnceLock<PathBuf> = OnceLock::new();

/// Get the directory where the executable is located
pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .unwrap_or_else(|_| PathBuf::from("panelkit"))
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Default log file location
pub fn default_log_path() -> PathBuf {
    exe_dir().join("panelkit.log")
}

/// Initialize logging from settings. Returns the active log file.
///
/// Only the first call installs a subscriber; later calls return the path
/// chosen by the first one.
pub fn init(settings: &LogSettings) -> PathBuf {
    let path = settings.file.clone().unwrap_or_else(default_log_path);
    INSTALLED
        .get_or_init(|| {
            install(&path, &settings.level);
            path.clone()
        })
        .clone()
}

fn install(path: &Path, level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file = match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("panelkit: cannot open log file {}: {}", path.display(), e);
            return;
        }
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .try_init();

    if installed.is_ok() {
        tracing::info!("=== panelkit log started ===");
    }
}

/// Log a formatted debug message
#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}
