use tauri::{plugin::TauriPlugin, Manager, Runtime};

use crate::{
    append_startup_log, append_warning_log, append_window_log, shell_events::ShellEvent, AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClaimOutcome {
    Primary,
    /// The OS lock mechanism could not be used at all.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartupDecision {
    Continue,
    ContinueStandalone,
}

pub(crate) fn decide_startup(outcome: ClaimOutcome) -> StartupDecision {
    match outcome {
        ClaimOutcome::Primary => StartupDecision::Continue,
        ClaimOutcome::Unavailable => StartupDecision::ContinueStandalone,
    }
}

/// Steps the running instance takes when another launch hands off to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FocusPlan {
    pub(crate) unminimize: bool,
    pub(crate) show_all: bool,
    pub(crate) focus: bool,
}

pub(crate) fn plan_focus(minimized: bool, any_visible: bool) -> FocusPlan {
    FocusPlan {
        unminimize: minimized,
        show_all: !any_visible,
        focus: true,
    }
}

/// Registered before any setup side effect. A secondary launch hands off to
/// the running instance and exits inside the plugin initialisation, so only
/// the primary instance ever gets a registration result back.
pub(crate) fn plugin<R: Runtime>() -> TauriPlugin<R> {
    tauri_plugin_single_instance::init(|app, argv, _cwd| {
        append_startup_log(&format!(
            "second instance launch detected, args={argv:?}; handing off to running instance"
        ));
        match app.try_state::<AppState>() {
            Some(state) => state
                .events
                .dispatch(ShellEvent::SecondInstance, append_window_log),
            None => append_startup_log("second instance hand-off skipped: app state not ready"),
        }
    })
}

/// Maps the single-instance registration result onto a startup decision.
pub(crate) fn claim_outcome<E: std::fmt::Display>(registration: Result<(), E>) -> ClaimOutcome {
    match registration {
        Ok(()) => ClaimOutcome::Primary,
        Err(error) => {
            append_warning_log(&format!("single-instance lock unavailable: {error}"));
            ClaimOutcome::Unavailable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_lock_continues_standalone() {
        assert_eq!(
            decide_startup(ClaimOutcome::Primary),
            StartupDecision::Continue
        );
        assert_eq!(
            decide_startup(ClaimOutcome::Unavailable),
            StartupDecision::ContinueStandalone
        );
    }

    #[test]
    fn failed_registration_maps_to_unavailable() {
        assert_eq!(claim_outcome::<String>(Ok(())), ClaimOutcome::Primary);
        assert_eq!(
            claim_outcome(Err("dbus unavailable".to_string())),
            ClaimOutcome::Unavailable
        );
    }

    #[test]
    fn plan_focus_restores_minimized_hidden_window() {
        assert_eq!(
            plan_focus(true, false),
            FocusPlan {
                unminimize: true,
                show_all: true,
                focus: true,
            }
        );
    }

    #[test]
    fn plan_focus_only_focuses_visible_window() {
        assert_eq!(
            plan_focus(false, true),
            FocusPlan {
                unminimize: false,
                show_all: false,
                focus: true,
            }
        );
    }
}
