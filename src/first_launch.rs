use std::{fs, path::Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FirstLaunchAction {
    RegisterAutoLaunch,
    SkipDevMode,
    SkipAlreadyDone,
}

pub(crate) fn decide_first_launch(dev: bool, marker_exists: bool) -> FirstLaunchAction {
    if dev {
        FirstLaunchAction::SkipDevMode
    } else if marker_exists {
        FirstLaunchAction::SkipAlreadyDone
    } else {
        FirstLaunchAction::RegisterAutoLaunch
    }
}

/// Registers launch-at-login once per data directory. The marker is only
/// written after a successful registration, so a failure retries next launch.
pub(crate) fn run_first_launch<R, F>(
    marker: &Path,
    dev: bool,
    register_auto_launch: R,
    log: F,
) -> FirstLaunchAction
where
    R: FnOnce() -> Result<(), String>,
    F: Fn(&str),
{
    let action = decide_first_launch(dev, marker.exists());
    if action != FirstLaunchAction::RegisterAutoLaunch {
        return action;
    }

    if let Err(error) = register_auto_launch() {
        log(&format!("failed to register launch at login: {error}"));
        return action;
    }

    let written = marker
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(marker, b""));
    match written {
        Ok(()) => log("first launch: registered launch at login"),
        Err(error) => log(&format!(
            "failed to write first launch marker {}: {error}",
            marker.display()
        )),
    }
    action
}
