use crate::{
    instance_guard,
    tray_menu::{self, MenuSpec, TrayIconVariant, TrayState},
    update_session::UpdateIndicator,
};

/// Window and tray operations the controller drives. Implemented over the
/// Tauri app handle in `tauri_shell`.
pub(crate) trait ShellSurface {
    fn main_window_exists(&self) -> bool;
    fn is_main_window_minimized(&self) -> bool;
    fn is_any_window_visible(&self) -> bool;

    fn show_all_windows(&self);
    fn hide_all_windows(&self);
    fn unminimize_main_window(&self);
    fn focus_main_window(&self);

    fn bind_context_menu(&self);
    fn dispose_context_menu(&self);

    fn apply_tray_icon(&self, variant: TrayIconVariant);
    fn apply_tray_tooltip(&self, tooltip: &str);
    fn apply_window_badge(&self, notifying: bool);
    fn apply_tray_menu(&self, menu: &MenuSpec);
    fn apply_download_progress(&self, percent: Option<u8>);

    fn write_clipboard(&self, text: &str) -> Result<(), String>;
    /// Starts the same executable with the same arguments and exits this one.
    fn relaunch(&self);
    /// Marks the process as quitting and exits.
    fn exit(&self);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct WindowState {
    pub(crate) visible: bool,
    pub(crate) destroyed: bool,
    pub(crate) notifying: bool,
}

pub(crate) struct WindowTrayController<S> {
    surface: S,
    window: WindowState,
    applied_tray: Option<TrayState>,
    indicator: UpdateIndicator,
    version: String,
    log: fn(&str),
}

impl<S: ShellSurface> WindowTrayController<S> {
    pub(crate) fn new(surface: S, version: impl Into<String>, log: fn(&str)) -> Self {
        Self {
            surface,
            window: WindowState::default(),
            applied_tray: None,
            indicator: UpdateIndicator::Idle,
            version: version.into(),
            log,
        }
    }

    #[cfg(test)]
    pub(crate) fn window_state(&self) -> WindowState {
        self.window
    }

    pub(crate) fn on_window_created(&mut self, start_hidden: bool) {
        self.window = WindowState {
            visible: !start_hidden,
            destroyed: false,
            notifying: false,
        };
        if self.window.visible {
            self.surface.bind_context_menu();
        }
        (self.log)(&format!(
            "main window created: start_hidden={start_hidden}"
        ));
        self.sync_tray();
    }

    /// Close button, "install now" and any other hide request.
    pub(crate) fn hide(&mut self) {
        if self.window.destroyed || !self.window.visible {
            (self.log)("hide request ignored: main window is not shown");
            return;
        }

        self.surface.hide_all_windows();
        self.surface.dispose_context_menu();
        self.window.visible = false;
        (self.log)("main window hidden to tray");
    }

    /// Tray click and the Open menu item.
    pub(crate) fn show(&mut self) {
        if self.window.destroyed || !self.surface.main_window_exists() {
            (self.log)("main window is gone, relaunching the shell");
            self.surface.relaunch();
            return;
        }

        if self.window.visible {
            self.surface.focus_main_window();
            return;
        }

        self.surface.show_all_windows();
        self.surface.focus_main_window();
        self.surface.bind_context_menu();
        self.window.visible = true;
        (self.log)("main window shown from tray");
    }

    pub(crate) fn on_second_instance(&mut self) {
        if self.window.destroyed || !self.surface.main_window_exists() {
            (self.log)("second instance hand-off: main window absent, nothing to focus");
            return;
        }

        let plan = instance_guard::plan_focus(
            self.surface.is_main_window_minimized(),
            self.surface.is_any_window_visible(),
        );
        if plan.unminimize {
            self.surface.unminimize_main_window();
        }
        if plan.show_all {
            self.surface.show_all_windows();
            if !self.window.visible {
                self.surface.bind_context_menu();
            }
            self.window.visible = true;
        }
        if plan.focus {
            self.surface.focus_main_window();
        }
    }

    pub(crate) fn on_window_destroyed(&mut self) {
        self.window.destroyed = true;
        self.window.visible = false;
        (self.log)("main window destroyed");
    }

    pub(crate) fn on_title_changed(&mut self, title: &str) {
        let notifying = tray_menu::title_signals_notification(title);
        if notifying == self.window.notifying {
            return;
        }

        self.window.notifying = notifying;
        self.surface.apply_window_badge(notifying);
        self.sync_tray();
    }

    /// Navigation drops injected listeners, so the binding is re-installed.
    pub(crate) fn on_page_loaded(&mut self) {
        if self.window.visible && !self.window.destroyed {
            self.surface.bind_context_menu();
        }
    }

    pub(crate) fn on_update_indicator(&mut self, indicator: UpdateIndicator) {
        if indicator == self.indicator {
            return;
        }

        let progress = |indicator: &UpdateIndicator| match indicator {
            UpdateIndicator::Downloading(percent) => Some(*percent),
            _ => None,
        };
        if progress(&indicator) != progress(&self.indicator) {
            self.surface.apply_download_progress(progress(&indicator));
        }

        self.indicator = indicator;
        self.sync_tray();
    }

    pub(crate) fn copy_log(&self, snapshot: &str) {
        match self.surface.write_clipboard(snapshot) {
            Ok(()) => (self.log)("console log copied to clipboard"),
            Err(error) => (self.log)(&format!("failed to copy console log: {error}")),
        }
    }

    pub(crate) fn exit(&self) {
        (self.log)("exit requested from tray");
        self.surface.exit();
    }

    fn sync_tray(&mut self) {
        let next = TrayState::derive(self.window.notifying, &self.indicator, &self.version);
        let previous = self.applied_tray.as_ref();

        if previous.map(|tray| tray.icon_variant) != Some(next.icon_variant) {
            self.surface.apply_tray_icon(next.icon_variant);
        }
        if previous.map(|tray| tray.tooltip.as_str()) != Some(next.tooltip.as_str()) {
            self.surface.apply_tray_tooltip(&next.tooltip);
        }
        if previous.map(|tray| &tray.menu) != Some(&next.menu) {
            self.surface.apply_tray_menu(&next.menu);
        }

        self.applied_tray = Some(next);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[derive(Default)]
    pub(crate) struct FakeSurface {
        pub(crate) calls: RefCell<Vec<String>>,
        pub(crate) window_missing: Cell<bool>,
        pub(crate) minimized: Cell<bool>,
        pub(crate) any_visible: Cell<bool>,
        pub(crate) clipboard_error: Option<String>,
    }

    impl FakeSurface {
        fn record(&self, call: impl Into<String>) {
            self.calls.borrow_mut().push(call.into());
        }

        pub(crate) fn take_calls(&self) -> Vec<String> {
            self.calls.borrow_mut().drain(..).collect()
        }
    }

    impl ShellSurface for &FakeSurface {
        fn main_window_exists(&self) -> bool {
            !self.window_missing.get()
        }

        fn is_main_window_minimized(&self) -> bool {
            self.minimized.get()
        }

        fn is_any_window_visible(&self) -> bool {
            self.any_visible.get()
        }

        fn show_all_windows(&self) {
            self.any_visible.set(true);
            self.record("show_all");
        }

        fn hide_all_windows(&self) {
            self.any_visible.set(false);
            self.record("hide_all");
        }

        fn unminimize_main_window(&self) {
            self.minimized.set(false);
            self.record("unminimize");
        }

        fn focus_main_window(&self) {
            self.record("focus");
        }

        fn bind_context_menu(&self) {
            self.record("bind_menu");
        }

        fn dispose_context_menu(&self) {
            self.record("dispose_menu");
        }

        fn apply_tray_icon(&self, variant: TrayIconVariant) {
            self.record(format!("tray_icon:{variant:?}"));
        }

        fn apply_tray_tooltip(&self, tooltip: &str) {
            self.record(format!("tooltip:{tooltip}"));
        }

        fn apply_window_badge(&self, notifying: bool) {
            self.record(format!("badge:{notifying}"));
        }

        fn apply_tray_menu(&self, menu: &MenuSpec) {
            self.record(format!("menu:{}", menu.check_update_label));
        }

        fn apply_download_progress(&self, percent: Option<u8>) {
            self.record(format!("progress:{percent:?}"));
        }

        fn write_clipboard(&self, text: &str) -> Result<(), String> {
            self.record(format!("clipboard:{text}"));
            match &self.clipboard_error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }

        fn relaunch(&self) {
            self.record("relaunch");
        }

        fn exit(&self) {
            self.record("exit");
        }
    }

    fn created(surface: &FakeSurface, start_hidden: bool) -> WindowTrayController<&FakeSurface> {
        surface.any_visible.set(!start_hidden);
        let mut controller = WindowTrayController::new(surface, "1.4.0", |_| {});
        controller.on_window_created(start_hidden);
        surface.take_calls();
        controller
    }

    #[test]
    fn window_created_applies_initial_tray_state_once() {
        let surface = FakeSurface::default();
        let mut controller = WindowTrayController::new(&surface, "1.4.0", |_| {});

        controller.on_window_created(false);

        assert_eq!(
            surface.take_calls(),
            vec![
                "bind_menu",
                "tray_icon:Normal",
                "tooltip:No new message",
                "menu:Check for update",
            ]
        );
        assert!(controller.window_state().visible);
    }

    #[test]
    fn startup_launch_starts_hidden_without_menu_binding() {
        let surface = FakeSurface::default();
        let controller = created(&surface, true);

        assert!(!controller.window_state().visible);
        assert!(surface.take_calls().is_empty());
    }

    #[test]
    fn close_then_tray_click_hides_then_shows_and_focuses() {
        let surface = FakeSurface::default();
        let mut controller = created(&surface, false);

        controller.hide();
        assert_eq!(surface.take_calls(), vec!["hide_all", "dispose_menu"]);
        assert!(!controller.window_state().visible);

        controller.show();
        assert_eq!(
            surface.take_calls(),
            vec!["show_all", "focus", "bind_menu"]
        );
        assert!(controller.window_state().visible);
    }

    #[test]
    fn duplicate_hide_is_ignored_and_duplicate_show_only_refocuses() {
        let surface = FakeSurface::default();
        let mut controller = created(&surface, false);

        controller.show();
        assert_eq!(surface.take_calls(), vec!["focus"]);

        controller.hide();
        surface.take_calls();
        controller.hide();
        assert!(surface.take_calls().is_empty());
    }

    #[test]
    fn show_after_destroy_relaunches() {
        let surface = FakeSurface::default();
        let mut controller = created(&surface, false);

        controller.on_window_destroyed();
        controller.show();

        assert_eq!(surface.take_calls(), vec!["relaunch"]);
        assert!(controller.window_state().destroyed);
        assert!(!controller.window_state().visible);
    }

    #[test]
    fn show_with_missing_window_relaunches() {
        let surface = FakeSurface::default();
        let mut controller = created(&surface, true);
        surface.window_missing.set(true);

        controller.show();

        assert_eq!(surface.take_calls(), vec!["relaunch"]);
    }

    #[test]
    fn second_instance_restores_minimized_hidden_window() {
        let surface = FakeSurface::default();
        let mut controller = created(&surface, true);
        surface.minimized.set(true);

        controller.on_second_instance();

        assert_eq!(
            surface.take_calls(),
            vec!["unminimize", "show_all", "bind_menu", "focus"]
        );
        assert!(controller.window_state().visible);
    }

    #[test]
    fn second_instance_with_visible_window_only_focuses() {
        let surface = FakeSurface::default();
        let mut controller = created(&surface, false);

        controller.on_second_instance();

        assert_eq!(surface.take_calls(), vec!["focus"]);
    }

    #[test]
    fn second_instance_without_window_only_logs() {
        let surface = FakeSurface::default();
        let mut controller = created(&surface, false);
        controller.on_window_destroyed();

        controller.on_second_instance();

        assert!(surface.take_calls().is_empty());
    }

    #[test]
    fn title_badge_is_idempotent() {
        let surface = FakeSurface::default();
        let mut controller = created(&surface, false);

        controller.on_title_changed("(1) Home");
        assert_eq!(
            surface.take_calls(),
            vec!["badge:true", "tray_icon:Notify", "tooltip:New message"]
        );

        controller.on_title_changed("(2) Home");
        assert!(surface.take_calls().is_empty());

        controller.on_title_changed("Home");
        assert_eq!(
            surface.take_calls(),
            vec!["badge:false", "tray_icon:Normal", "tooltip:No new message"]
        );
        assert!(!controller.window_state().notifying);
    }

    #[test]
    fn page_load_rebinds_menu_only_while_shown() {
        let surface = FakeSurface::default();
        let mut controller = created(&surface, false);

        controller.on_page_loaded();
        assert_eq!(surface.take_calls(), vec!["bind_menu"]);

        controller.hide();
        surface.take_calls();
        controller.on_page_loaded();
        assert!(surface.take_calls().is_empty());
    }

    #[test]
    fn update_indicator_drives_progress_and_menu() {
        let surface = FakeSurface::default();
        let mut controller = created(&surface, false);

        controller.on_update_indicator(UpdateIndicator::Downloading(10));
        assert_eq!(
            surface.take_calls(),
            vec![
                "progress:Some(10)",
                "tooltip:No new message - downloading update 10%",
                "menu:Downloading update (10%)",
            ]
        );

        controller.on_update_indicator(UpdateIndicator::Downloading(10));
        assert!(surface.take_calls().is_empty());

        controller.on_update_indicator(UpdateIndicator::Idle);
        assert_eq!(
            surface.take_calls(),
            vec![
                "progress:None",
                "tooltip:No new message",
                "menu:Check for update",
            ]
        );
    }

    #[test]
    fn copy_log_writes_snapshot_to_clipboard() {
        let surface = FakeSurface {
            clipboard_error: Some("clipboard busy".to_string()),
            ..FakeSurface::default()
        };
        let controller = created(&surface, false);

        controller.copy_log("line one\nline two");

        assert_eq!(surface.take_calls(), vec!["clipboard:line one\nline two"]);
    }
}
