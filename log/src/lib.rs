//! Logging setup for hosts embedding the Quill text core.
//!
//! The library crates (`quill_text`, `quill_parser`) only emit `tracing` events. Whoever
//! owns the process decides where those go by calling [`init`] once at startup; tests
//! call [`test`] instead.
//!
//! ## Environment Variables
//!
//! 1. **`QUILL_LOG`** (highest priority) - a bare level such as `debug` is expanded to
//!    every quill crate; anything with `=`, `:` or `,` is used verbatim
//! 2. **`RUST_LOG`** - Standard tracing environment variable
//! 3. **Default** - `warn` globally, `info` for quill crates
//!
//! ## Log File Location
//!
//! Default: `<data_local_dir>/quill/logs/quill-<pid>.log`
//! - macOS: `~/Library/Application Support/quill/logs/quill-12345.log`
//! - Linux: `~/.local/share/quill/logs/quill-12345.log`
//!
//! Override with [`LogConfig::log_file_path`].

use std::{
    env,
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

const QUILL_CRATES: &[&str] = &["quill_text", "quill_parser"];

/// Returned from [`init`]; must be held alive to ensure log file flushing.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

#[derive(Debug, Default)]
pub struct LogConfig {
    /// Either a directory (the default file name is used inside it) or a full file path.
    pub log_file_path: Option<PathBuf>,
}

/// Initialize logging.
///
/// Respects the priority described in the module docs:
/// [`QUILL_LOG`] > [`RUST_LOG`] > default settings.
///
/// The returned [`LogGuard`] must be held for the lifetime of the program --
/// dropping it flushes and stops the background file writer.
///
/// Fails if a global subscriber is already installed.
pub fn init(config: LogConfig) -> Result<LogGuard, Box<dyn std::error::Error + Send + Sync>> {
    let (log_dir, filename) = resolve_log_path(config.log_file_path);

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &filename);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(create_file_filter());

    let stdout_enabled =
        env::var("QUILL_LOG").is_ok() || env::var("RUST_LOG").is_ok() || cfg!(debug_assertions);

    let stdout_layer = if stdout_enabled {
        Some(fmt::layer().with_filter(create_filter()))
    } else {
        None
    };

    Registry::default()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(LogGuard {
        _file_guard: file_guard,
        log_file: log_dir.join(filename),
    })
}

/// Initialize logging for tests.
///
/// Stdout-only, captured by the test harness. Safe to call from every test: a second
/// call (or a subscriber installed elsewhere) is silently ignored.
pub fn test() {
    let _ = fmt()
        .with_env_filter(create_filter())
        .with_test_writer()
        .try_init();
}

fn resolve_log_path(override_path: Option<PathBuf>) -> (PathBuf, String) {
    let filename = format!("quill-{}.log", std::process::id());

    if let Some(path) = override_path {
        if path.extension().is_some() {
            let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(filename);
            return (dir, name);
        }
        return (path, filename);
    }

    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quill")
        .join("logs");

    (dir, filename)
}

/// File filter: uses user-specified level if set, otherwise defaults to `warn`.
fn create_file_filter() -> EnvFilter {
    if env::var("QUILL_LOG").is_ok() || env::var("RUST_LOG").is_ok() {
        return create_filter();
    }
    EnvFilter::new("warn")
}

/// Create the [`EnvFilter`] for the current environment.
fn create_filter() -> EnvFilter {
    if let Ok(quill_log) = env::var("QUILL_LOG") {
        return expand_quill_log(&quill_log);
    }

    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }

    EnvFilter::new(filter_directives("info"))
}

/// Expand [`QUILL_LOG`] values into full tracing filter strings.
///
/// - `QUILL_LOG=debug` becomes `warn,quill_text=debug,quill_parser=debug`
/// - `QUILL_LOG=quill_text=trace` is used as-is
fn expand_quill_log(quill_log: &str) -> EnvFilter {
    if is_directive_list(quill_log) {
        return EnvFilter::new(quill_log);
    }
    EnvFilter::new(filter_directives(quill_log))
}

fn is_directive_list(value: &str) -> bool {
    value.contains('=') || value.contains(':') || value.contains(',')
}

fn filter_directives(level: &str) -> String {
    let mut directives = String::from("warn");
    for name in QUILL_CRATES {
        directives.push(',');
        directives.push_str(name);
        directives.push('=');
        directives.push_str(level);
    }
    directives
}
