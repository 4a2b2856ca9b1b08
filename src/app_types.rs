use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};
use tauri::menu::MenuItem;
use tokio::sync::Notify;
use url::Url;

use crate::{
    cookie_sync::CookieSync,
    launch_options::LaunchOptions,
    runtime_paths::{self, RuntimePaths},
    shell_events::ShellEventSender,
    update_dialogs::DialogUpdateHost,
    update_orchestrator::UpdateOrchestrator,
    updater_feed::UpdaterFeed,
};

pub(crate) type ShellUpdateOrchestrator = UpdateOrchestrator<UpdaterFeed, DialogUpdateHost>;

#[derive(Clone)]
pub(crate) struct TrayMenuState {
    pub(crate) version_item: MenuItem<tauri::Wry>,
    pub(crate) check_update_item: MenuItem<tauri::Wry>,
}

/// Process-wide state shared with Tauri callbacks. Window and tray state are
/// owned by the dispatcher's controller instead.
pub(crate) struct AppState {
    pub(crate) launch: LaunchOptions,
    pub(crate) paths: RuntimePaths,
    pub(crate) hosted_url: Url,
    pub(crate) events: ShellEventSender,
    pub(crate) cookie_sync: Arc<CookieSync>,
    pub(crate) cookie_wake: Arc<Notify>,
    pub(crate) updates: OnceLock<Arc<ShellUpdateOrchestrator>>,
    quitting: AtomicBool,
}

impl AppState {
    pub(crate) fn new(launch: LaunchOptions, events: ShellEventSender) -> Self {
        let data_dir = runtime_paths::default_data_dir().unwrap_or_else(|| PathBuf::from("."));
        let paths = RuntimePaths::for_data_dir(data_dir);
        let hosted_url = runtime_paths::hosted_url();
        let cookie_sync = CookieSync::new(
            paths.cookies_file.clone(),
            runtime_paths::hosted_origin(&hosted_url),
        );

        Self {
            launch,
            paths,
            hosted_url,
            events,
            cookie_sync: Arc::new(cookie_sync),
            cookie_wake: Arc::new(Notify::new()),
            updates: OnceLock::new(),
            quitting: AtomicBool::new(false),
        }
    }

    pub(crate) fn mark_quitting(&self) {
        self.quitting.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_quitting(&self) -> bool {
        self.quitting.load(Ordering::SeqCst)
    }
}

pub(crate) struct AtomicFlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> AtomicFlagGuard<'a> {
    pub(crate) fn try_set(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag })
    }
}

impl Drop for AtomicFlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}
