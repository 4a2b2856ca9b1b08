use crate::{update_session::UpdateIndicator, APP_TITLE, TOOLTIP_NEW_MESSAGE, TOOLTIP_NO_NEW_MESSAGE};

pub(crate) const MENU_OPEN_LABEL: &str = "Open";
pub(crate) const MENU_CHECK_UPDATE_LABEL: &str = "Check for update";
pub(crate) const MENU_COPY_LOG_LABEL: &str = "Copy console log";
pub(crate) const MENU_EXIT_LABEL: &str = "Exit";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum TrayIconVariant {
    #[default]
    Normal,
    Notify,
}

/// Mutable parts of the tray menu; Open, Copy console log and Exit never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MenuSpec {
    pub(crate) version_label: String,
    pub(crate) check_update_label: String,
    pub(crate) check_update_enabled: bool,
}

impl MenuSpec {
    pub(crate) fn derive(version: &str, indicator: &UpdateIndicator) -> Self {
        let (check_update_label, check_update_enabled) = match indicator {
            UpdateIndicator::Idle => (MENU_CHECK_UPDATE_LABEL.to_string(), true),
            UpdateIndicator::Checking => ("Checking for update...".to_string(), false),
            UpdateIndicator::Downloading(percent) => {
                (format!("Downloading update ({percent}%)"), false)
            }
            UpdateIndicator::ReadyOnExit(latest) => {
                (format!("Update v.{latest} installs on exit"), false)
            }
            UpdateIndicator::Installing => ("Installing update...".to_string(), false),
        };

        Self {
            version_label: format!("{APP_TITLE} v.{version}"),
            check_update_label,
            check_update_enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrayState {
    pub(crate) icon_variant: TrayIconVariant,
    pub(crate) tooltip: String,
    pub(crate) menu: MenuSpec,
}

impl TrayState {
    pub(crate) fn derive(notifying: bool, indicator: &UpdateIndicator, version: &str) -> Self {
        let icon_variant = if notifying {
            TrayIconVariant::Notify
        } else {
            TrayIconVariant::Normal
        };

        Self {
            icon_variant,
            tooltip: derive_tooltip(notifying, indicator),
            menu: MenuSpec::derive(version, indicator),
        }
    }
}

fn derive_tooltip(notifying: bool, indicator: &UpdateIndicator) -> String {
    let base = if notifying {
        TOOLTIP_NEW_MESSAGE
    } else {
        TOOLTIP_NO_NEW_MESSAGE
    };

    match indicator {
        UpdateIndicator::Idle => base.to_string(),
        UpdateIndicator::Checking => format!("{base} - checking for update"),
        UpdateIndicator::Downloading(percent) => format!("{base} - downloading update {percent}%"),
        UpdateIndicator::ReadyOnExit(latest) => format!("{base} - v.{latest} ready on exit"),
        UpdateIndicator::Installing => format!("{base} - installing update"),
    }
}

/// Badge state carried by a page title, e.g. `(3) Home`.
pub(crate) fn title_signals_notification(title: &str) -> bool {
    title.starts_with(crate::NOTIFY_TITLE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_state_uses_plain_tooltip_and_enabled_check_item() {
        let state = TrayState::derive(false, &UpdateIndicator::Idle, "1.4.0");

        assert_eq!(state.icon_variant, TrayIconVariant::Normal);
        assert_eq!(state.tooltip, TOOLTIP_NO_NEW_MESSAGE);
        assert_eq!(state.menu.version_label, "Omocha Kiki v.1.4.0");
        assert_eq!(state.menu.check_update_label, MENU_CHECK_UPDATE_LABEL);
        assert!(state.menu.check_update_enabled);
    }

    #[test]
    fn notify_state_switches_icon_and_tooltip() {
        let state = TrayState::derive(true, &UpdateIndicator::Idle, "1.4.0");

        assert_eq!(state.icon_variant, TrayIconVariant::Notify);
        assert_eq!(state.tooltip, TOOLTIP_NEW_MESSAGE);
    }

    #[test]
    fn update_phases_disable_check_item() {
        let downloading = MenuSpec::derive("1.4.0", &UpdateIndicator::Downloading(42));
        assert_eq!(downloading.check_update_label, "Downloading update (42%)");
        assert!(!downloading.check_update_enabled);

        let staged = TrayState::derive(
            false,
            &UpdateIndicator::ReadyOnExit("1.5.0".to_string()),
            "1.4.0",
        );
        assert_eq!(staged.tooltip, "No new message - v.1.5.0 ready on exit");
        assert!(!staged.menu.check_update_enabled);
    }

    #[test]
    fn title_marker_detection() {
        assert!(title_signals_notification("(2) Home"));
        assert!(!title_signals_notification("Home (2)"));
        assert!(!title_signals_notification(""));
    }
}
