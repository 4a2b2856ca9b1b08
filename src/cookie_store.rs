use std::sync::Arc;

use tauri::{webview::Cookie, AppHandle, Manager};
use time::OffsetDateTime;
use tokio::sync::Notify;
use url::Url;

use crate::{
    append_cookie_log,
    cookie_sync::{self, CookieRecord, CookieSameSite, CookieStore},
    shell_events::{ShellEvent, ShellEventSender},
    COOKIE_WATCH_INTERVAL, MAIN_WINDOW_LABEL,
};

/// Cookie store of the main window's webview.
#[derive(Clone)]
pub(crate) struct WebviewCookieStore {
    app_handle: AppHandle,
}

impl WebviewCookieStore {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }

    fn main_window(&self) -> Result<tauri::WebviewWindow, String> {
        self.app_handle
            .get_webview_window(MAIN_WINDOW_LABEL)
            .ok_or_else(|| "main window is not available".to_string())
    }
}

impl CookieStore for WebviewCookieStore {
    fn all_cookies(&self) -> Result<Vec<CookieRecord>, String> {
        let cookies = self
            .main_window()?
            .cookies()
            .map_err(|error| format!("failed to read webview cookies: {error}"))?;
        Ok(cookies.iter().map(record_from_cookie).collect())
    }

    fn set_cookie(&self, origin: &Url, record: &CookieRecord) -> Result<(), String> {
        self.main_window()?
            .set_cookie(cookie_from_record(origin, record))
            .map_err(|error| format!("failed to set webview cookie: {error}"))
    }
}

pub(crate) fn record_from_cookie(cookie: &Cookie<'_>) -> CookieRecord {
    let expiration_date = cookie
        .expires_datetime()
        .map(|expires_at| expires_at.unix_timestamp_nanos() as f64 / 1_000_000_000.0);

    CookieRecord {
        name: cookie.name().to_string(),
        value: cookie.value().to_string(),
        domain: cookie.domain().map(str::to_string),
        host_only: cookie.domain().is_none(),
        path: cookie.path().unwrap_or("/").to_string(),
        secure: cookie.secure().unwrap_or(false),
        http_only: cookie.http_only().unwrap_or(false),
        session: expiration_date.is_none(),
        expiration_date,
        same_site: cookie.same_site().map(|same_site| match same_site {
            cookie::SameSite::Strict => CookieSameSite::Strict,
            cookie::SameSite::Lax => CookieSameSite::Lax,
            cookie::SameSite::None => CookieSameSite::NoRestriction,
        }),
    }
}

/// Host-only records are pinned to the hosted origin's host.
pub(crate) fn cookie_from_record(origin: &Url, record: &CookieRecord) -> Cookie<'static> {
    let domain = match (&record.domain, record.host_only) {
        (Some(domain), false) => domain.trim_start_matches('.').to_string(),
        _ => origin.host_str().unwrap_or_default().to_string(),
    };

    let mut builder = Cookie::build((record.name.clone(), record.value.clone()))
        .domain(domain)
        .path(record.path.clone())
        .secure(record.secure)
        .http_only(record.http_only);

    if !record.session {
        let expires_at = record
            .expiration_date
            .and_then(|seconds| {
                OffsetDateTime::from_unix_timestamp_nanos((seconds * 1_000_000_000.0) as i128).ok()
            });
        if let Some(expires_at) = expires_at {
            builder = builder.expires(expires_at);
        }
    }

    builder = match record.same_site {
        Some(CookieSameSite::Strict) => builder.same_site(cookie::SameSite::Strict),
        Some(CookieSameSite::Lax) => builder.same_site(cookie::SameSite::Lax),
        Some(CookieSameSite::NoRestriction) => builder.same_site(cookie::SameSite::None),
        Some(CookieSameSite::Unspecified) | None => builder,
    };

    builder.build()
}

/// Polls the webview store and turns differences into `CookiesChanged` events.
/// A page load pokes the watch through `wake` for an immediate read.
pub(crate) fn spawn_cookie_watch(
    store: WebviewCookieStore,
    events: ShellEventSender,
    wake: Arc<Notify>,
    baseline: Vec<CookieRecord>,
) {
    tauri::async_runtime::spawn(async move {
        let mut known = baseline;
        loop {
            let _ = tokio::time::timeout(COOKIE_WATCH_INTERVAL, wake.notified()).await;

            if store.main_window().is_err() {
                append_cookie_log("cookie watch stopped: main window is gone");
                break;
            }

            let current = match store.all_cookies() {
                Ok(current) => current,
                Err(error) => {
                    append_cookie_log(&format!("cookie watch read failed: {error}"));
                    continue;
                }
            };

            let now = cookie_sync::now_epoch_seconds();
            for change in cookie_sync::diff_cookie_sets(&known, &current, now) {
                events.dispatch(ShellEvent::CookiesChanged(change), append_cookie_log);
            }
            known = current;
        }
    });
}
