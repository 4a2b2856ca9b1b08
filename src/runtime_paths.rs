use std::{
    env,
    path::{Path, PathBuf},
};
use url::Url;

use crate::{
    APP_DATA_DIR_NAME, COOKIES_FILE, DATA_DIR_ENV, DEFAULT_HOSTED_URL, FIRST_LAUNCH_MARKER,
    HOSTED_URL_ENV,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RuntimePaths {
    pub(crate) data_dir: PathBuf,
    pub(crate) cookies_file: PathBuf,
    pub(crate) first_launch_marker: PathBuf,
}

impl RuntimePaths {
    pub(crate) fn for_data_dir(data_dir: PathBuf) -> Self {
        Self {
            cookies_file: data_dir.join(COOKIES_FILE),
            first_launch_marker: data_dir.join(FIRST_LAUNCH_MARKER),
            data_dir,
        }
    }
}

/// Per-user application data directory (`OMOCHA_KIKI_DATA_DIR` wins when set).
pub(crate) fn default_data_dir() -> Option<PathBuf> {
    if let Ok(raw) = env::var(DATA_DIR_ENV) {
        let path = PathBuf::from(raw.trim());
        if !path.as_os_str().is_empty() {
            return Some(path);
        }
    }

    platform_data_root().map(|root| root.join(APP_DATA_DIR_NAME))
}

#[cfg(target_os = "windows")]
fn platform_data_root() -> Option<PathBuf> {
    env::var_os("APPDATA")
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|home| home.join("AppData").join("Roaming")))
}

#[cfg(target_os = "macos")]
fn platform_data_root() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join("Library").join("Preferences"))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn platform_data_root() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".local").join("share"))
}

/// Base directory for optional on-disk assets.
///
/// Under OS auto-launch the working directory is not the install directory,
/// so `--startup` launches resolve assets next to the executable instead.
pub(crate) fn asset_base_dir(launched_at_login: bool) -> PathBuf {
    let current_dir = || env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if !launched_at_login {
        return current_dir();
    }

    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(current_dir)
}

pub(crate) fn hosted_url() -> Url {
    let raw = env::var(HOSTED_URL_ENV).unwrap_or_default();
    normalize_hosted_url(&raw, DEFAULT_HOSTED_URL)
}

pub(crate) fn normalize_hosted_url(raw: &str, default_url: &str) -> Url {
    let fallback = || Url::parse(default_url).expect("default hosted url is valid");
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return fallback();
    }

    match Url::parse(trimmed) {
        Ok(mut parsed) if matches!(parsed.scheme(), "http" | "https") => {
            if parsed.path().is_empty() {
                parsed.set_path("/");
            }
            parsed
        }
        _ => fallback(),
    }
}

/// `scheme://host[:port]` of the hosted application, used to scope restored cookies.
pub(crate) fn hosted_origin(hosted: &Url) -> Url {
    let mut origin = hosted.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_paths_live_inside_data_dir() {
        let paths = RuntimePaths::for_data_dir(PathBuf::from("/data/Omocha-kiki"));
        assert_eq!(
            paths.cookies_file,
            PathBuf::from("/data/Omocha-kiki").join("cookies.json")
        );
        assert_eq!(
            paths.first_launch_marker,
            PathBuf::from("/data/Omocha-kiki").join(".first-launch")
        );
    }

    #[test]
    fn normalize_hosted_url_falls_back_for_blank_and_invalid_values() {
        let default_url = "https://chat.example.com/home";
        assert_eq!(
            normalize_hosted_url("  ", default_url).as_str(),
            default_url
        );
        assert_eq!(
            normalize_hosted_url("not a url", default_url).as_str(),
            default_url
        );
        assert_eq!(
            normalize_hosted_url("file:///etc/passwd", default_url).as_str(),
            default_url
        );
    }

    #[test]
    fn normalize_hosted_url_accepts_http_and_https() {
        let parsed = normalize_hosted_url(" http://127.0.0.1:3000 ", DEFAULT_HOSTED_URL);
        assert_eq!(parsed.as_str(), "http://127.0.0.1:3000/");
    }

    #[test]
    fn hosted_origin_strips_path_query_and_fragment() {
        let hosted = Url::parse("https://rocket.omocha-kiki.com/home?x=1#top").unwrap();
        assert_eq!(
            hosted_origin(&hosted).as_str(),
            "https://rocket.omocha-kiki.com/"
        );
    }

    #[test]
    fn asset_base_dir_uses_working_directory_for_manual_launch() {
        assert_eq!(asset_base_dir(false), env::current_dir().unwrap());
    }
}
