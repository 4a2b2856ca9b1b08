use tauri::{AppHandle, ExitRequestApi, Manager};

use crate::{append_shutdown_log, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseDecision {
    Allow,
    HideInstead,
}

pub(crate) fn decide_close(quitting: bool) -> CloseDecision {
    if quitting {
        CloseDecision::Allow
    } else {
        CloseDecision::HideInstead
    }
}

/// Closing the last window must not end the process: the tray keeps it
/// alive. An explicit `exit(code)` always goes through.
pub(crate) fn should_prevent_exit(quitting: bool, exit_code: Option<i32>) -> bool {
    !quitting && exit_code.is_none()
}

pub(crate) fn handle_exit_requested(
    app_handle: &AppHandle,
    exit_code: Option<i32>,
    api: &ExitRequestApi,
) {
    let quitting = app_handle
        .try_state::<AppState>()
        .map(|state| state.is_quitting())
        .unwrap_or(true);

    if should_prevent_exit(quitting, exit_code) {
        append_shutdown_log("exit requested without quit, keeping tray alive");
        api.prevent_exit();
        return;
    }

    if let Some(state) = app_handle.try_state::<AppState>() {
        state.mark_quitting();
    }
    append_shutdown_log(&format!("exit requested: code={exit_code:?}"));
}

/// Process exit hook. Installs an update staged for exit.
pub(crate) fn handle_exit_event(app_handle: &AppHandle) {
    let Some(state) = app_handle.try_state::<AppState>() else {
        append_shutdown_log("desktop process exiting");
        return;
    };
    state.mark_quitting();

    if let Some(orchestrator) = state.updates.get() {
        orchestrator.install_pending_on_exit();
    }
    append_shutdown_log("desktop process exiting");
}
