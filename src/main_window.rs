use std::sync::Arc;

use tauri::{
    webview::PageLoadEvent, AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder,
};
use url::Url;

use crate::{
    append_cookie_log, append_window_log,
    cookie_store::{self, WebviewCookieStore},
    cookie_sync::{self, CookieStore},
    crash_reporter::{self, ShellCrashReporter},
    external_links::{self, NavigationDecision},
    runtime_paths,
    shell_events::ShellEvent,
    AppState, APP_TITLE, MAIN_WINDOW_LABEL,
};

const BLANK_PAGE: &str = "about:blank";

/// Creates the main window on a blank page; the hosted app is loaded by
/// `spawn_window_bootstrap` once cookies are restored.
pub(crate) fn build_main_window(app_handle: &AppHandle) -> Result<WebviewWindow, String> {
    let state = app_handle
        .try_state::<AppState>()
        .ok_or_else(|| "app state is not managed".to_string())?;
    let hosted_origin = runtime_paths::hosted_origin(&state.hosted_url);
    let blank = Url::parse(BLANK_PAGE).map_err(|error| format!("invalid blank page url: {error}"))?;
    let page_events = state.events.clone();
    let title_events = state.events.clone();

    let window = WebviewWindowBuilder::new(app_handle, MAIN_WINDOW_LABEL, WebviewUrl::External(blank))
        .title(APP_TITLE)
        .inner_size(1280.0, 800.0)
        .min_inner_size(800.0, 600.0)
        .maximized(true)
        .visible(!state.launch.start_hidden())
        .devtools(state.launch.dev)
        .on_navigation(move |url| match external_links::decide_navigation(&hosted_origin, url) {
            NavigationDecision::Allow => true,
            NavigationDecision::OpenExternally(target) => {
                if let Err(error) = external_links::open_external(target.as_str()) {
                    append_window_log(&format!("failed to open {target} externally: {error}"));
                }
                false
            }
            NavigationDecision::Block => {
                append_window_log(&format!("blocked navigation to {url}"));
                false
            }
        })
        .on_page_load(move |_window, payload| {
            if payload.event() == PageLoadEvent::Finished {
                page_events.dispatch(ShellEvent::PageLoaded, append_window_log);
            }
        })
        .on_document_title_changed(move |_window, title| {
            title_events.dispatch(ShellEvent::TitleChanged(title), append_window_log);
        })
        .build()
        .map_err(|error| format!("Failed to create main window: {error}"))?;

    if state.launch.dev {
        window.open_devtools();
    }
    Ok(window)
}

/// Restores the cookie snapshot, loads the hosted app and starts the cookie
/// watch. Failing to load the hosted app is fatal.
pub(crate) fn spawn_window_bootstrap(app_handle: AppHandle, reporter: Arc<ShellCrashReporter>) {
    crash_reporter::spawn_reported(reporter, "main-window-bootstrap", async move {
        let state = app_handle
            .try_state::<AppState>()
            .ok_or_else(|| "app state is not managed".to_string())?;
        let store = WebviewCookieStore::new(app_handle.clone());

        state
            .cookie_sync
            .restore(&store, cookie_sync::now_epoch_seconds(), append_cookie_log);
        let baseline = store.all_cookies().unwrap_or_else(|error| {
            append_cookie_log(&format!("cookie watch starts without baseline: {error}"));
            Vec::new()
        });

        let window = app_handle
            .get_webview_window(MAIN_WINDOW_LABEL)
            .ok_or_else(|| "main window disappeared before navigation".to_string())?;
        window
            .navigate(state.hosted_url.clone())
            .map_err(|error| format!("failed to load {}: {error}", state.hosted_url))?;
        append_window_log(&format!("main window navigated to {}", state.hosted_url));

        cookie_store::spawn_cookie_watch(
            store,
            state.events.clone(),
            Arc::clone(&state.cookie_wake),
            baseline,
        );
        Ok(())
    });
}
