use std::time::Duration;

pub(crate) const APP_TITLE: &str = "Omocha Kiki";
pub(crate) const APP_DATA_DIR_NAME: &str = "Omocha-kiki";
pub(crate) const DEFAULT_HOSTED_URL: &str = "https://rocket.omocha-kiki.com/home";
pub(crate) const HOSTED_URL_ENV: &str = "OMOCHA_KIKI_URL";
pub(crate) const DATA_DIR_ENV: &str = "OMOCHA_KIKI_DATA_DIR";

pub(crate) const MAIN_WINDOW_LABEL: &str = "main";
pub(crate) const TRAY_ID: &str = "omocha-kiki-tray";

pub(crate) const STARTUP_FLAG: &str = "--startup";
pub(crate) const DEV_FLAG: &str = "--dev";

pub(crate) const COOKIES_FILE: &str = "cookies.json";
pub(crate) const FIRST_LAUNCH_MARKER: &str = ".first-launch";
pub(crate) const DESKTOP_LOG_DIR: &str = "logs";
pub(crate) const DESKTOP_LOG_FILE: &str = "desktop.log";
pub(crate) const DESKTOP_LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;

pub(crate) const LOG_BUFFER_CAPACITY: usize = 500;

/// Page titles starting with this marker carry an unread counter, e.g. `(3) Home`.
pub(crate) const NOTIFY_TITLE_MARKER: &str = "(";
pub(crate) const TOOLTIP_NEW_MESSAGE: &str = "New message";
pub(crate) const TOOLTIP_NO_NEW_MESSAGE: &str = "No new message";

pub(crate) const COOKIE_WATCH_INTERVAL: Duration = Duration::from_secs(2);
pub(crate) const UPDATE_RECHECK_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

pub(crate) const CRASH_REPORT_LOG_LINES: usize = 40;
pub(crate) const NO_FAULT_DETAIL: &str = "No detail provided";
pub(crate) const FATAL_FAULT_TITLE: &str =
    "A critical error has occurred. The app will now exit after this.";
