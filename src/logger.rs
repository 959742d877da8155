//! Session logger: backs the `log` facade with a single file in the OS data directory.
//!
//! The file is **truncated (overwritten) at each launch**, so it only ever
//! contains output from the most-recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\PaintShell\paintshell.log`
//!   Linux:    `~/.local/share/PaintShell/paintshell.log`
//!   macOS:    `~/Library/Application Support/PaintShell/paintshell.log`
//!
//! Use the regular `log::info!` / `log::warn!` / `log::error!` macros anywhere
//! in the crate.  Warnings and errors are mirrored to stderr so a missing host
//! container or a denied font query is visible when launched from a terminal.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Environment variable that overrides the configured level.
pub const LEVEL_ENV: &str = "PAINTSHELL_LOG";

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOGGER: SessionLogger = SessionLogger;

struct SessionLogger;

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{}] [{}] {}",
            timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        if record.level() <= Level::Warn {
            eprintln!("{}", line);
        }
        write_line(&line);
    }

    fn flush(&self) {
        if let Some(mutex) = LOG_FILE.get()
            && let Ok(mut file) = mutex.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Returns the path to the current session log file.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Write a raw line to the session log.  Silently ignores I/O errors so that
/// logging never crashes the application.
pub fn write_line(line: &str) {
    if let Some(mutex) = LOG_FILE.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

/// Parse a level name as written in the config file or `PAINTSHELL_LOG`.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Initialise the session logger.  Call once before any logging.
///
/// * Creates (or truncates) the log file.  Failing to open it is not fatal:
///   the logger still mirrors warnings to stderr.
/// * `PAINTSHELL_LOG` wins over `default_level`.
/// * Installs a panic hook that writes the panic message to the log before
///   propagating to the default handler.
pub fn init(default_level: LevelFilter) {
    let level = resolve_level(std::env::var(LEVEL_ENV).ok().as_deref(), default_level);

    let path = log_file_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
    {
        Ok(f) => {
            let _ = LOG_PATH.set(path.clone());
            let _ = LOG_FILE.set(Mutex::new(f));
        }
        Err(e) => {
            eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
        }
    }

    if log::set_logger(&LOGGER).is_err() {
        // Already installed (e.g. GUI relaunch inside one process); keep the first.
        return;
    }
    log::set_max_level(level);

    write_line(&format!(
        "=== PaintShell session started {} ===",
        human_timestamp()
    ));
    write_line(&format!("Log file: {}", path.display()));
    write_line("");

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write_line(&format!("[{}] [PANIC] {}", timestamp(), info));
        prev(info);
    }));
}

/// Change the level once settings are known.  `PAINTSHELL_LOG` still wins.
pub fn set_level(configured: LevelFilter) {
    let level = resolve_level(std::env::var(LEVEL_ENV).ok().as_deref(), configured);
    if level != log::max_level() {
        log::set_max_level(level);
        log::debug!("Log level set to {}", level);
    }
}

fn resolve_level(env: Option<&str>, configured: LevelFilter) -> LevelFilter {
    env.and_then(parse_level).unwrap_or(configured)
}

fn log_file_path() -> PathBuf {
    data_dir().join("PaintShell").join("paintshell.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

/// HH:MM:SS within the current UTC day.
fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let secs = d.as_secs();
            let h = (secs % 86400) / 3600;
            let m = (secs % 3600) / 60;
            let s = secs % 60;
            format!("{:02}:{:02}:{:02}", h, m, s)
        }
        Err(_) => "??:??:??".to_string(),
    }
}

fn human_timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => format!("(unix {})", d.as_secs()),
        Err(_) => "(unknown time)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_accepts_known_names() {
        assert_eq!(parse_level("warn"), Some(LevelFilter::Warn));
        assert_eq!(parse_level(" Debug "), Some(LevelFilter::Debug));
        assert_eq!(parse_level("warning"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_env_level_wins_over_configured() {
        assert_eq!(resolve_level(Some("trace"), LevelFilter::Warn), LevelFilter::Trace);
        assert_eq!(resolve_level(None, LevelFilter::Warn), LevelFilter::Warn);
        assert_eq!(resolve_level(Some("loud"), LevelFilter::Error), LevelFilter::Error);
    }
}
