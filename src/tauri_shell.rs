use tauri::{
    window::{ProgressBarState, ProgressBarStatus},
    AppHandle, Manager, WebviewWindow,
};
use tauri_plugin_clipboard_manager::ClipboardExt;

use crate::{
    append_shutdown_log, append_window_log, page_context_menu,
    tray_menu::{MenuSpec, TrayIconVariant},
    tray_setup::ShellIcons,
    window_tray::ShellSurface,
    AppState, TrayMenuState, MAIN_WINDOW_LABEL, TRAY_ID,
};

/// `ShellSurface` over the running Tauri app.
pub(crate) struct TauriShell {
    app_handle: AppHandle,
    icons: ShellIcons,
}

impl TauriShell {
    pub(crate) fn new(app_handle: AppHandle, icons: ShellIcons) -> Self {
        Self { app_handle, icons }
    }

    fn main_window(&self) -> Option<WebviewWindow> {
        self.app_handle.get_webview_window(MAIN_WINDOW_LABEL)
    }

    fn with_main_window<F>(&self, action: &str, apply: F)
    where
        F: FnOnce(&WebviewWindow) -> tauri::Result<()>,
    {
        let Some(window) = self.main_window() else {
            append_window_log(&format!("{action} skipped: main window not found"));
            return;
        };
        if let Err(error) = apply(&window) {
            append_window_log(&format!("failed to {action}: {error}"));
        }
    }

    fn for_each_window<F>(&self, action: &str, apply: F)
    where
        F: Fn(&WebviewWindow) -> tauri::Result<()>,
    {
        for (label, window) in self.app_handle.webview_windows() {
            if let Err(error) = apply(&window) {
                append_window_log(&format!("failed to {action} window {label}: {error}"));
            }
        }
    }
}

impl ShellSurface for TauriShell {
    fn main_window_exists(&self) -> bool {
        self.main_window().is_some()
    }

    fn is_main_window_minimized(&self) -> bool {
        self.main_window()
            .and_then(|window| window.is_minimized().ok())
            .unwrap_or(false)
    }

    fn is_any_window_visible(&self) -> bool {
        self.app_handle
            .webview_windows()
            .values()
            .any(|window| window.is_visible().unwrap_or(false))
    }

    fn show_all_windows(&self) {
        self.for_each_window("show", |window| window.show());
    }

    fn hide_all_windows(&self) {
        self.for_each_window("hide", |window| window.hide());
    }

    fn unminimize_main_window(&self) {
        self.with_main_window("unminimize main window", |window| window.unminimize());
    }

    fn focus_main_window(&self) {
        self.with_main_window("focus main window", |window| window.set_focus());
    }

    fn bind_context_menu(&self) {
        self.with_main_window("bind page context menu", |window| {
            window.eval(page_context_menu::BIND_SCRIPT)
        });
    }

    fn dispose_context_menu(&self) {
        self.with_main_window("dispose page context menu", |window| {
            window.eval(page_context_menu::DISPOSE_SCRIPT)
        });
    }

    fn apply_tray_icon(&self, variant: TrayIconVariant) {
        let Some(tray) = self.app_handle.tray_by_id(TRAY_ID) else {
            return;
        };
        let icon = match variant {
            TrayIconVariant::Normal => self.icons.tray.clone(),
            TrayIconVariant::Notify => self.icons.tray_notify.clone(),
        };
        if let Err(error) = tray.set_icon(Some(icon)) {
            append_window_log(&format!("failed to set tray icon {variant:?}: {error}"));
        }
    }

    fn apply_tray_tooltip(&self, tooltip: &str) {
        let Some(tray) = self.app_handle.tray_by_id(TRAY_ID) else {
            return;
        };
        if let Err(error) = tray.set_tooltip(Some(tooltip)) {
            append_window_log(&format!("failed to set tray tooltip: {error}"));
        }
    }

    #[cfg(target_os = "windows")]
    fn apply_window_badge(&self, notifying: bool) {
        let overlay = notifying.then(|| self.icons.overlay_notify.clone());
        self.with_main_window("set overlay icon", |window| window.set_overlay_icon(overlay));
    }

    #[cfg(not(target_os = "windows"))]
    fn apply_window_badge(&self, notifying: bool) {
        append_window_log(&format!(
            "window badge unsupported on this platform, notifying={notifying}"
        ));
    }

    fn apply_tray_menu(&self, menu: &MenuSpec) {
        let Some(tray_state) = self.app_handle.try_state::<TrayMenuState>() else {
            return;
        };
        if let Err(error) = tray_state.version_item.set_text(&menu.version_label) {
            append_window_log(&format!("failed to update tray version label: {error}"));
        }
        if let Err(error) = tray_state
            .check_update_item
            .set_text(&menu.check_update_label)
            .and_then(|()| {
                tray_state
                    .check_update_item
                    .set_enabled(menu.check_update_enabled)
            })
        {
            append_window_log(&format!("failed to update tray update item: {error}"));
        }
    }

    fn apply_download_progress(&self, percent: Option<u8>) {
        let state = ProgressBarState {
            status: Some(if percent.is_some() {
                ProgressBarStatus::Normal
            } else {
                ProgressBarStatus::None
            }),
            progress: percent.map(u64::from),
        };
        self.with_main_window("set download progress", |window| {
            window.set_progress_bar(state)
        });
    }

    fn write_clipboard(&self, text: &str) -> Result<(), String> {
        self.app_handle
            .clipboard()
            .write_text(text)
            .map_err(|error| format!("clipboard write failed: {error}"))
    }

    fn relaunch(&self) {
        append_shutdown_log("relaunching desktop shell");
        self.app_handle.restart();
    }

    fn exit(&self) {
        if let Some(state) = self.app_handle.try_state::<AppState>() {
            state.mark_quitting();
        }
        append_shutdown_log("exiting desktop shell");
        self.app_handle.exit(0);
    }
}
