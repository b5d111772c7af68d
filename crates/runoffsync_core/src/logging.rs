//! Logging bootstrap for the sync engine.
//!
//! # Responsibility
//! - Initialize file-based rolling logs exactly once per process.
//! - Keep sync diagnostics metadata-only (`event=... module=... status=...`);
//!   station and catchment names never reach the log.
//!
//! # Invariants
//! - Logging init is idempotent for the same level and directory.
//! - Logging initialization must not panic.
//! - Re-initialization with a different level or directory is rejected.

use crate::config::LoggingConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "runoffsync";
const DEFAULT_LOG_DIR_NAME: &str = "runoffsync-logs";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Initializes logging from a `LoggingConfig`.
///
/// Without a configured directory, logs go to `default_log_dir()`.
///
/// # Errors
/// - Returns an error when the level is unsupported.
/// - Returns an error when the directory is empty, non-absolute, or cannot be
///   created.
/// - Returns an error when logging is already active with other settings.
pub fn init_logging(config: &LoggingConfig) -> Result<(), String> {
    let log_dir = match config.dir.as_deref() {
        Some(dir) => dir.to_string(),
        None => default_log_dir()
            .to_str()
            .ok_or_else(|| "temp directory path is not valid UTF-8".to_string())?
            .to_string(),
    };
    init_logging_at(&config.level, &log_dir)
}

/// Initializes logging with an explicit level and directory.
///
/// # Invariants
/// - Calling this function repeatedly with the same settings is idempotent.
/// - Re-initialization with a different level or directory is rejected.
/// - Initialization never panics.
pub fn init_logging_at(level: &str, log_dir: &str) -> Result<(), String> {
    let level = normalize_level(level)?;
    let dir = normalize_log_dir(log_dir)?;

    if let Some(state) = LOGGING_STATE.get() {
        return state.ensure_matches(level, &dir);
    }

    let state = LOGGING_STATE.get_or_try_init(|| start_file_logger(level, &dir))?;
    state.ensure_matches(level, &dir)
}

impl LoggingState {
    fn ensure_matches(&self, level: &str, dir: &Path) -> Result<(), String> {
        if self.log_dir != dir {
            return Err(format!(
                "logging already initialized at `{}`; refusing to switch to `{}`",
                self.log_dir.display(),
                dir.display()
            ));
        }
        if self.level != level {
            return Err(format!(
                "logging already initialized with level `{}`; refusing to switch to `{level}`",
                self.level
            ));
        }
        Ok(())
    }
}

fn start_file_logger(level: &'static str, dir: &Path) -> Result<LoggingState, String> {
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("failed to create log directory `{}`: {err}", dir.display()))?;

    let logger = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?
        .log_to_file(
            FileSpec::default()
                .directory(dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook_once();
    info!(
        "event=engine_start module=core status=ok platform={} build_mode={} version={} level={level} log_dir={}",
        std::env::consts::OS,
        build_mode(),
        env!("CARGO_PKG_VERSION"),
        dir.display()
    );

    Ok(LoggingState {
        level,
        log_dir: dir.to_path_buf(),
        _logger: logger,
    })
}

/// Returns active logging status metadata.
///
/// Returns `None` when logging has not been initialized.
/// Returns `(level, log_dir)` when logging is active.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_dir.clone()))
}

/// Returns the default log level for current build mode.
///
/// - `debug` builds -> `debug`
/// - `release` builds -> `info`
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub(crate) fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

/// Log directory used when none is configured.
pub fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME)
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

fn build_mode() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payload may carry station or catchment names; sanitize and cap it.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location, payload
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
