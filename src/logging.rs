use chrono::{DateTime, Local};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use crate::{
    log_buffer::LogBuffer, runtime_paths, DESKTOP_LOG_DIR, DESKTOP_LOG_FILE,
    DESKTOP_LOG_MAX_BYTES, LOG_BUFFER_CAPACITY,
};

static LOG_BUFFER: OnceLock<Mutex<LogBuffer>> = OnceLock::new();
static DESKTOP_LOG_WRITE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DesktopLogCategory {
    Startup,
    Runtime,
    Window,
    Cookie,
    Update,
    Crash,
    Shutdown,
}

impl DesktopLogCategory {
    fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Runtime => "runtime",
            Self::Window => "window",
            Self::Cookie => "cookie",
            Self::Update => "update",
            Self::Crash => "crash",
            Self::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

pub(crate) fn format_log_line(
    timestamp: DateTime<Local>,
    level: LogLevel,
    category: DesktopLogCategory,
    message: &str,
) -> String {
    format!(
        "[{}] [{}] [{}] {}",
        timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        level.as_str(),
        category.as_str(),
        message.replace('\r', "").replace('\n', "\\n")
    )
}

fn log_buffer() -> &'static Mutex<LogBuffer> {
    LOG_BUFFER.get_or_init(|| Mutex::new(LogBuffer::with_capacity(LOG_BUFFER_CAPACITY)))
}

/// Records one console emission: buffered for "copy log" and crash reports,
/// forwarded unchanged to stderr, and appended to the desktop log file.
pub(crate) fn emit(category: DesktopLogCategory, level: LogLevel, message: &str) {
    let line = format_log_line(Local::now(), level, category, message);

    match log_buffer().lock() {
        Ok(mut buffer) => buffer.push(line.clone()),
        Err(error) => error.into_inner().push(line.clone()),
    }

    eprintln!("{message}");

    if let Some(data_dir) = runtime_paths::default_data_dir() {
        append_to_desktop_log_file(
            &resolve_desktop_log_path(&data_dir),
            &line,
            DESKTOP_LOG_MAX_BYTES,
        );
    }
}

/// Newline-joined copy of the in-memory log, taken under a single lock.
pub(crate) fn snapshot_log_buffer() -> String {
    match log_buffer().lock() {
        Ok(buffer) => buffer.snapshot(),
        Err(error) => error.into_inner().snapshot(),
    }
}

pub(crate) fn resolve_desktop_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DESKTOP_LOG_DIR).join(DESKTOP_LOG_FILE)
}

fn append_to_desktop_log_file(path: &Path, line: &str, max_bytes: u64) {
    if cfg!(test) {
        return;
    }

    let _guard = match DESKTOP_LOG_WRITE_LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        Err(error) => error.into_inner(),
    };

    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    rotate_if_needed(path, max_bytes);

    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{line}");
    }
}

fn rotate_if_needed(path: &Path, max_bytes: u64) {
    let Ok(metadata) = fs::metadata(path) else {
        return;
    };
    if metadata.len() < max_bytes {
        return;
    }

    let mut backup = path.as_os_str().to_owned();
    backup.push(".1");
    let _ = fs::rename(path, PathBuf::from(backup));
}

pub(crate) fn append_startup_log(message: &str) {
    emit(DesktopLogCategory::Startup, LogLevel::Info, message);
}

pub(crate) fn append_desktop_log(message: &str) {
    emit(DesktopLogCategory::Runtime, LogLevel::Info, message);
}

pub(crate) fn append_window_log(message: &str) {
    emit(DesktopLogCategory::Window, LogLevel::Info, message);
}

pub(crate) fn append_cookie_log(message: &str) {
    emit(DesktopLogCategory::Cookie, LogLevel::Info, message);
}

pub(crate) fn append_update_log(message: &str) {
    emit(DesktopLogCategory::Update, LogLevel::Info, message);
}

pub(crate) fn append_shutdown_log(message: &str) {
    emit(DesktopLogCategory::Shutdown, LogLevel::Info, message);
}

pub(crate) fn append_crash_log(message: &str) {
    emit(DesktopLogCategory::Crash, LogLevel::Error, message);
}

pub(crate) fn append_warning_log(message: &str) {
    emit(DesktopLogCategory::Runtime, LogLevel::Warn, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_log_line_is_single_line_with_level_and_category() {
        let timestamp = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let line = format_log_line(
            timestamp,
            LogLevel::Warn,
            DesktopLogCategory::Cookie,
            "first\nsecond",
        );
        assert_eq!(
            line,
            "[2026-01-02 03:04:05.000] [WARN] [cookie] first\\nsecond"
        );
    }

    fn buffered_line_for(marker: &str) -> Option<String> {
        snapshot_log_buffer()
            .lines()
            .find(|line| line.contains(marker))
            .map(str::to_string)
    }

    #[test]
    fn append_helpers_buffer_timestamped_tagged_lines() {
        append_window_log("main window hidden [buffer-window-7f3a]");
        append_warning_log("lock unavailable [buffer-warn-7f3a]");
        append_crash_log("fatal fault [buffer-crash-7f3a]");

        let window = buffered_line_for("[buffer-window-7f3a]").unwrap();
        assert!(window.starts_with('['));
        assert!(window.ends_with("[INFO] [window] main window hidden [buffer-window-7f3a]"));
        assert!(buffered_line_for("[buffer-warn-7f3a]")
            .unwrap()
            .contains("[WARN] [runtime] lock unavailable"));
        assert!(buffered_line_for("[buffer-crash-7f3a]")
            .unwrap()
            .contains("[ERROR] [crash] fatal fault"));
    }

    #[test]
    fn snapshot_keeps_emission_order_and_flattens_newlines() {
        append_cookie_log("first [order-1-9c2e]");
        append_update_log("second\nline [order-2-9c2e]");

        let snapshot = snapshot_log_buffer();
        let first = snapshot.find("[order-1-9c2e]").unwrap();
        let second = snapshot.find("[order-2-9c2e]").unwrap();
        assert!(first < second);
        assert!(buffered_line_for("[order-2-9c2e]")
            .unwrap()
            .ends_with("[INFO] [update] second\\nline [order-2-9c2e]"));
    }

    #[test]
    fn resolve_desktop_log_path_nests_under_logs_dir() {
        let path = resolve_desktop_log_path(Path::new("/data"));
        assert_eq!(path, Path::new("/data").join("logs").join("desktop.log"));
    }

    #[test]
    fn rotate_if_needed_moves_oversized_file_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desktop.log");
        fs::write(&path, "0123456789").unwrap();

        rotate_if_needed(&path, 4);

        assert!(!path.exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("desktop.log.1")).unwrap(),
            "0123456789"
        );
    }

    #[test]
    fn rotate_if_needed_keeps_small_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desktop.log");
        fs::write(&path, "ok").unwrap();

        rotate_if_needed(&path, 1024);

        assert!(path.exists());
    }
}
