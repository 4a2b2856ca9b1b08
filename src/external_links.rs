use std::process::{Command, Stdio};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NavigationDecision {
    Allow,
    OpenExternally(Url),
    Block,
}

/// The main window stays on the hosted origin; other web links go to the
/// system browser.
pub(crate) fn decide_navigation(hosted_origin: &Url, target: &Url) -> NavigationDecision {
    match target.scheme() {
        "about" | "blob" => NavigationDecision::Allow,
        "http" | "https" if target.origin() == hosted_origin.origin() => NavigationDecision::Allow,
        "http" | "https" => NavigationDecision::OpenExternally(target.clone()),
        _ => NavigationDecision::Block,
    }
}

pub(crate) fn parse_openable_url(raw_url: &str) -> Result<Url, String> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err("missing external url".to_string());
    }

    let parsed = Url::parse(trimmed).map_err(|error| format!("invalid url: {error}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(format!(
            "unsupported url scheme '{scheme}', only http/https can be opened"
        )),
    }
}

pub(crate) fn open_external(raw_url: &str) -> Result<(), String> {
    let url = parse_openable_url(raw_url)?;
    open_url_with_system_browser(url.as_str())
}

fn spawn_detached(program: &str, args: &[&str]) -> Result<(), String> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|error| format!("failed to run '{program}': {error}"))
}

#[cfg(target_os = "macos")]
fn open_url_with_system_browser(url: &str) -> Result<(), String> {
    spawn_detached("open", &[url])
}

#[cfg(target_os = "windows")]
fn open_url_with_system_browser(url: &str) -> Result<(), String> {
    spawn_detached("rundll32", &["url.dll,FileProtocolHandler", url])
}

#[cfg(all(unix, not(target_os = "macos")))]
fn open_url_with_system_browser(url: &str) -> Result<(), String> {
    spawn_detached("xdg-open", &[url])
}

#[cfg(not(any(target_os = "macos", target_os = "windows", unix)))]
fn open_url_with_system_browser(_url: &str) -> Result<(), String> {
    Err("opening external urls is not supported on this platform".to_string())
}
