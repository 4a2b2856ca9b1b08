use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind, MessageDialogResult};

use crate::{
    append_update_log,
    shell_events::{ShellEvent, ShellEventSender},
    update_orchestrator::{UpdateHost, UpdateNotice},
    update_session::{UpdateChoice, UpdateIndicator, UpdatePrompt},
    APP_TITLE,
};

const CHOICE_NOW: &str = "Download and update now";
const CHOICE_ON_EXIT: &str = "Download and update on exit";
const CHOICE_NOT_NOW: &str = "Not now";

/// Native dialogs for update prompts and notices. Window and tray changes
/// go through the dispatcher like every other shell event.
pub(crate) struct DialogUpdateHost {
    app_handle: AppHandle,
    events: ShellEventSender,
}

impl DialogUpdateHost {
    pub(crate) fn new(app_handle: AppHandle, events: ShellEventSender) -> Self {
        Self { app_handle, events }
    }
}

/// Platforms without custom labels answer with plain Yes/No/Cancel.
pub(crate) fn choice_from_result(result: &MessageDialogResult) -> UpdateChoice {
    match result {
        MessageDialogResult::Yes => UpdateChoice::InstallNow,
        MessageDialogResult::No => UpdateChoice::InstallOnExit,
        MessageDialogResult::Custom(label) if label == CHOICE_NOW => UpdateChoice::InstallNow,
        MessageDialogResult::Custom(label) if label == CHOICE_ON_EXIT => UpdateChoice::InstallOnExit,
        _ => UpdateChoice::NotNow,
    }
}

pub(crate) fn notice_text(notice: &UpdateNotice) -> (MessageDialogKind, String) {
    match notice {
        UpdateNotice::NoUpdate => (
            MessageDialogKind::Info,
            "No update available\nYou are running the latest version.".to_string(),
        ),
        UpdateNotice::AwaitingInstall(version) => (
            MessageDialogKind::Info,
            format!("Update v.{version} is downloaded\nIt will be installed when you exit."),
        ),
        UpdateNotice::CheckFailed(error) => (
            MessageDialogKind::Error,
            format!("Failed to check for update\n{error}"),
        ),
        UpdateNotice::DownloadFailed(error) => (
            MessageDialogKind::Error,
            format!("Failed to download update\n{error}"),
        ),
        UpdateNotice::InstallFailed(error) => (
            MessageDialogKind::Error,
            format!("Failed to install update\n{error}"),
        ),
    }
}

impl UpdateHost for DialogUpdateHost {
    async fn prompt(&self, prompt: UpdatePrompt) -> UpdateChoice {
        let app_handle = self.app_handle.clone();
        let shown = tauri::async_runtime::spawn_blocking(move || {
            app_handle
                .dialog()
                .message(prompt.message())
                .title(APP_TITLE)
                .kind(MessageDialogKind::Info)
                .buttons(MessageDialogButtons::YesNoCancelCustom(
                    CHOICE_NOW.to_string(),
                    CHOICE_ON_EXIT.to_string(),
                    CHOICE_NOT_NOW.to_string(),
                ))
                .blocking_show_with_result()
        })
        .await;

        match shown {
            Ok(result) => {
                let choice = choice_from_result(&result);
                append_update_log(&format!("update prompt answered: {result:?} -> {choice:?}"));
                choice
            }
            Err(error) => {
                append_update_log(&format!("update prompt failed, treating as not now: {error}"));
                UpdateChoice::NotNow
            }
        }
    }

    async fn notify(&self, notice: UpdateNotice) {
        let (kind, message) = notice_text(&notice);
        let app_handle = self.app_handle.clone();
        let shown = tauri::async_runtime::spawn_blocking(move || {
            app_handle
                .dialog()
                .message(message)
                .title(APP_TITLE)
                .kind(kind)
                .blocking_show();
        })
        .await;

        if let Err(error) = shown {
            append_update_log(&format!("failed to show update notice {notice:?}: {error}"));
        }
    }

    fn hide_main_window(&self) {
        self.events
            .dispatch(ShellEvent::HideRequested, append_update_log);
    }

    fn publish(&self, indicator: UpdateIndicator) {
        self.events
            .dispatch(ShellEvent::UpdateIndicator(indicator), append_update_log);
    }
}
