use std::sync::Arc;

use tauri::{AppHandle, Manager};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    append_cookie_log, append_desktop_log, append_update_log,
    cookie_store::WebviewCookieStore,
    cookie_sync::WriteOutcome,
    logging,
    shell_events::ShellEvent,
    tray_actions::TrayMenuAction,
    window_tray::{ShellSurface, WindowTrayController},
    AppState,
};

/// Work the dispatcher hands off instead of doing inline.
pub(crate) trait ShellServices {
    /// Full re-read of the cookie store and snapshot overwrite.
    fn persist_cookies(&self);
    fn start_manual_update_check(&self);
    fn wake_cookie_watch(&self);
    fn log_snapshot(&self) -> String;
}

/// Single consumer of the shell event queue. Every window and tray
/// transition happens here, in arrival order.
pub(crate) struct Dispatcher<S, V> {
    controller: WindowTrayController<S>,
    services: V,
}

impl<S, V> Dispatcher<S, V>
where
    S: ShellSurface,
    V: ShellServices,
{
    pub(crate) fn new(controller: WindowTrayController<S>, services: V) -> Self {
        Self {
            controller,
            services,
        }
    }

    pub(crate) fn handle(&mut self, event: ShellEvent) {
        match event {
            ShellEvent::WindowCreated { start_hidden } => {
                self.controller.on_window_created(start_hidden)
            }
            ShellEvent::CloseRequested | ShellEvent::HideRequested => self.controller.hide(),
            ShellEvent::WindowDestroyed => self.controller.on_window_destroyed(),
            ShellEvent::TrayClicked => self.controller.show(),
            ShellEvent::SecondInstance => self.controller.on_second_instance(),
            ShellEvent::TitleChanged(title) => self.controller.on_title_changed(&title),
            ShellEvent::PageLoaded => {
                self.controller.on_page_loaded();
                self.services.wake_cookie_watch();
            }
            ShellEvent::MenuAction(action) => self.handle_menu_action(action),
            ShellEvent::CookiesChanged(change) => {
                append_cookie_log(&format!(
                    "cookie changed: name={} cause={:?} removed={}",
                    change.name, change.cause, change.removed
                ));
                self.services.persist_cookies();
            }
            ShellEvent::UpdateIndicator(indicator) => {
                self.controller.on_update_indicator(indicator)
            }
        }
    }

    fn handle_menu_action(&mut self, action: TrayMenuAction) {
        match action {
            TrayMenuAction::Open => self.controller.show(),
            TrayMenuAction::CheckForUpdate => self.services.start_manual_update_check(),
            TrayMenuAction::CopyLog => self.controller.copy_log(&self.services.log_snapshot()),
            TrayMenuAction::Exit => self.controller.exit(),
        }
    }

    pub(crate) async fn run(mut self, mut receiver: UnboundedReceiver<ShellEvent>) {
        while let Some(event) = receiver.recv().await {
            self.handle(event);
        }
        append_desktop_log("shell event queue closed, dispatcher stopped");
    }
}

pub(crate) struct TauriServices {
    app_handle: AppHandle,
}

impl TauriServices {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

impl ShellServices for TauriServices {
    fn persist_cookies(&self) {
        let Some(state) = self.app_handle.try_state::<AppState>() else {
            return;
        };
        let cookie_sync = Arc::clone(&state.cookie_sync);
        let store = WebviewCookieStore::new(self.app_handle.clone());
        tauri::async_runtime::spawn_blocking(move || match cookie_sync.persist(&store) {
            Ok(WriteOutcome::Committed) => {}
            Ok(WriteOutcome::Discarded) => {
                append_cookie_log("cookie snapshot superseded by a newer write")
            }
            Err(error) => append_cookie_log(&format!("failed to persist cookies: {error}")),
        });
    }

    fn start_manual_update_check(&self) {
        let Some(orchestrator) = self
            .app_handle
            .try_state::<AppState>()
            .and_then(|state| state.updates.get().cloned())
        else {
            append_update_log("manual update check skipped: updater not initialized");
            return;
        };
        tauri::async_runtime::spawn(async move {
            orchestrator.check_for_update_interactive().await;
        });
    }

    fn wake_cookie_watch(&self) {
        if let Some(state) = self.app_handle.try_state::<AppState>() {
            state.cookie_wake.notify_one();
        }
    }

    fn log_snapshot(&self) -> String {
        logging::snapshot_log_buffer()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        cookie_sync::{CookieChange, CookieChangeCause},
        update_session::UpdateIndicator,
        window_tray::tests::FakeSurface,
    };

    #[derive(Default)]
    struct RecordingServices {
        calls: RefCell<Vec<&'static str>>,
    }

    impl ShellServices for &RecordingServices {
        fn persist_cookies(&self) {
            self.calls.borrow_mut().push("persist_cookies");
        }

        fn start_manual_update_check(&self) {
            self.calls.borrow_mut().push("manual_update_check");
        }

        fn wake_cookie_watch(&self) {
            self.calls.borrow_mut().push("wake_cookie_watch");
        }

        fn log_snapshot(&self) -> String {
            "first\nsecond".to_string()
        }
    }

    fn dispatcher<'a>(
        surface: &'a FakeSurface,
        services: &'a RecordingServices,
    ) -> Dispatcher<&'a FakeSurface, &'a RecordingServices> {
        let controller = WindowTrayController::new(surface, "1.4.0", |_| {});
        let mut dispatcher = Dispatcher::new(controller, services);
        surface.any_visible.set(true);
        dispatcher.handle(ShellEvent::WindowCreated {
            start_hidden: false,
        });
        surface.take_calls();
        dispatcher
    }

    #[test]
    fn close_and_tray_click_round_trip_through_queue() {
        let surface = FakeSurface::default();
        let services = RecordingServices::default();
        let mut dispatcher = dispatcher(&surface, &services);

        dispatcher.handle(ShellEvent::CloseRequested);
        dispatcher.handle(ShellEvent::HideRequested);
        dispatcher.handle(ShellEvent::TrayClicked);

        assert_eq!(
            surface.take_calls(),
            vec!["hide_all", "dispose_menu", "show_all", "focus", "bind_menu"]
        );
    }

    #[test]
    fn every_cookie_change_triggers_a_full_persist() {
        let surface = FakeSurface::default();
        let services = RecordingServices::default();
        let mut dispatcher = dispatcher(&surface, &services);

        for removed in [false, false, true] {
            dispatcher.handle(ShellEvent::CookiesChanged(CookieChange {
                name: "rc_token".to_string(),
                cause: CookieChangeCause::Explicit,
                removed,
            }));
        }

        assert_eq!(*services.calls.borrow(), vec!["persist_cookies"; 3]);
    }

    #[test]
    fn menu_actions_route_to_controller_and_services() {
        let surface = FakeSurface::default();
        let services = RecordingServices::default();
        let mut dispatcher = dispatcher(&surface, &services);

        dispatcher.handle(ShellEvent::MenuAction(TrayMenuAction::CheckForUpdate));
        dispatcher.handle(ShellEvent::MenuAction(TrayMenuAction::CopyLog));
        dispatcher.handle(ShellEvent::MenuAction(TrayMenuAction::Exit));

        assert_eq!(*services.calls.borrow(), vec!["manual_update_check"]);
        assert_eq!(
            surface.take_calls(),
            vec!["clipboard:first\nsecond", "exit"]
        );
    }

    #[test]
    fn page_load_rebinds_menu_and_wakes_cookie_watch() {
        let surface = FakeSurface::default();
        let services = RecordingServices::default();
        let mut dispatcher = dispatcher(&surface, &services);

        dispatcher.handle(ShellEvent::PageLoaded);

        assert_eq!(surface.take_calls(), vec!["bind_menu"]);
        assert_eq!(*services.calls.borrow(), vec!["wake_cookie_watch"]);
    }

    #[test]
    fn hide_requested_during_update_then_indicator_updates_tray() {
        let surface = FakeSurface::default();
        let services = RecordingServices::default();
        let mut dispatcher = dispatcher(&surface, &services);

        dispatcher.handle(ShellEvent::HideRequested);
        dispatcher.handle(ShellEvent::UpdateIndicator(UpdateIndicator::Installing));

        assert_eq!(
            surface.take_calls(),
            vec![
                "hide_all",
                "dispose_menu",
                "tooltip:No new message - installing update",
                "menu:Installing update...",
            ]
        );
    }

    #[test]
    fn run_drains_queue_until_senders_drop() {
        let surface = FakeSurface::default();
        let services = RecordingServices::default();
        let dispatcher = dispatcher(&surface, &services);
        let (sender, receiver) = crate::shell_events::shell_event_channel();

        sender.dispatch(ShellEvent::TitleChanged("(1) Home".to_string()), |_| {});
        drop(sender);
        tauri::async_runtime::block_on(dispatcher.run(receiver));

        assert_eq!(
            surface.take_calls(),
            vec!["badge:true", "tray_icon:Notify", "tooltip:New message"]
        );
    }
}
