use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{cookie_sync::CookieChange, tray_actions::TrayMenuAction, update_session::UpdateIndicator};

/// Every asynchronous input the shell reacts to, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ShellEvent {
    WindowCreated { start_hidden: bool },
    CloseRequested,
    /// Hide requested by a collaborator (e.g. "install update now").
    HideRequested,
    WindowDestroyed,
    TrayClicked,
    SecondInstance,
    TitleChanged(String),
    PageLoaded,
    MenuAction(TrayMenuAction),
    CookiesChanged(CookieChange),
    UpdateIndicator(UpdateIndicator),
}

#[derive(Debug, Clone)]
pub(crate) struct ShellEventSender {
    sender: UnboundedSender<ShellEvent>,
}

impl ShellEventSender {
    pub(crate) fn dispatch<F>(&self, event: ShellEvent, log: F)
    where
        F: Fn(&str),
    {
        if let Err(error) = self.sender.send(event) {
            log(&format!(
                "shell event dropped, dispatcher is gone: {:?}",
                error.0
            ));
        }
    }
}

pub(crate) fn shell_event_channel() -> (ShellEventSender, UnboundedReceiver<ShellEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ShellEventSender { sender }, receiver)
}
