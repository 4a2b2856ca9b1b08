pub const TRAY_MENU_VERSION_LABEL: &str = "tray_version_label";
pub const TRAY_MENU_OPEN: &str = "tray_open";
pub const TRAY_MENU_CHECK_UPDATE: &str = "tray_check_update";
pub const TRAY_MENU_COPY_LOG: &str = "tray_copy_log";
pub const TRAY_MENU_EXIT: &str = "tray_exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayMenuAction {
    Open,
    CheckForUpdate,
    CopyLog,
    Exit,
}

pub fn action_from_menu_id(menu_id: &str) -> Option<TrayMenuAction> {
    match menu_id {
        TRAY_MENU_OPEN => Some(TrayMenuAction::Open),
        TRAY_MENU_CHECK_UPDATE => Some(TrayMenuAction::CheckForUpdate),
        TRAY_MENU_COPY_LOG => Some(TrayMenuAction::CopyLog),
        TRAY_MENU_EXIT => Some(TrayMenuAction::Exit),
        _ => None,
    }
}
