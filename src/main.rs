#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_constants;
mod app_runtime;
mod app_types;
mod cookie_store;
mod cookie_sync;
mod crash_reporter;
mod dispatcher;
mod exit_events;
mod external_links;
mod first_launch;
mod instance_guard;
mod launch_options;
mod log_buffer;
mod logging;
mod main_window;
mod page_context_menu;
mod runtime_paths;
mod shell_events;
mod tauri_shell;
mod tray_actions;
mod tray_menu;
mod tray_setup;
mod update_dialogs;
mod update_orchestrator;
mod update_session;
mod updater_feed;
mod window_tray;

pub(crate) use app_constants::*;
pub(crate) use app_types::{AppState, AtomicFlagGuard, TrayMenuState};
pub(crate) use logging::{
    append_cookie_log, append_crash_log, append_desktop_log, append_shutdown_log,
    append_startup_log, append_update_log, append_warning_log, append_window_log,
};

fn main() {
    app_runtime::run();
}
