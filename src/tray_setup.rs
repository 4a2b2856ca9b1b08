use std::path::Path;

use tauri::{
    image::Image,
    menu::{Menu, MenuItem, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager,
};

use crate::{
    append_startup_log, append_window_log,
    shell_events::ShellEvent,
    tray_actions,
    tray_menu::{
        MenuSpec, MENU_CHECK_UPDATE_LABEL, MENU_COPY_LOG_LABEL, MENU_EXIT_LABEL, MENU_OPEN_LABEL,
    },
    update_session::UpdateIndicator,
    AppState, TrayMenuState, TOOLTIP_NO_NEW_MESSAGE, TRAY_ID,
};

/// Tray and badge images, optionally overridden by `<asset base>/assets/*.png`.
#[derive(Clone)]
pub(crate) struct ShellIcons {
    pub(crate) tray: Image<'static>,
    pub(crate) tray_notify: Image<'static>,
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    pub(crate) overlay_notify: Image<'static>,
}

fn load_icon(asset_base: &Path, file_name: &str, bundled: Image<'static>) -> Image<'static> {
    let path = asset_base.join("assets").join(file_name);
    if !path.is_file() {
        return bundled;
    }

    match Image::from_path(&path) {
        Ok(image) => image.to_owned(),
        Err(error) => {
            append_startup_log(&format!(
                "failed to load icon override {}: {error}",
                path.display()
            ));
            bundled
        }
    }
}

pub(crate) fn load_shell_icons(asset_base: &Path) -> ShellIcons {
    ShellIcons {
        tray: load_icon(
            asset_base,
            "tray.png",
            tauri::include_image!("./icons/tray.png"),
        ),
        tray_notify: load_icon(
            asset_base,
            "tray-notify.png",
            tauri::include_image!("./icons/tray-notify.png"),
        ),
        overlay_notify: load_icon(
            asset_base,
            "overlay-notify.png",
            tauri::include_image!("./icons/overlay-notify.png"),
        ),
    }
}

pub fn setup_tray(app_handle: &AppHandle, icons: &ShellIcons, version: &str) -> Result<(), String> {
    let spec = MenuSpec::derive(version, &UpdateIndicator::Idle);

    let version_item = MenuItem::with_id(
        app_handle,
        tray_actions::TRAY_MENU_VERSION_LABEL,
        &spec.version_label,
        false,
        None::<&str>,
    )
    .map_err(|error| format!("Failed to create tray version menu item: {error}"))?;
    let separator = PredefinedMenuItem::separator(app_handle)
        .map_err(|error| format!("Failed to create tray separator menu item: {error}"))?;
    let open_item = MenuItem::with_id(
        app_handle,
        tray_actions::TRAY_MENU_OPEN,
        MENU_OPEN_LABEL,
        true,
        None::<&str>,
    )
    .map_err(|error| format!("Failed to create tray open menu item: {error}"))?;
    let check_update_item = MenuItem::with_id(
        app_handle,
        tray_actions::TRAY_MENU_CHECK_UPDATE,
        MENU_CHECK_UPDATE_LABEL,
        spec.check_update_enabled,
        None::<&str>,
    )
    .map_err(|error| format!("Failed to create tray update menu item: {error}"))?;
    let copy_log_item = MenuItem::with_id(
        app_handle,
        tray_actions::TRAY_MENU_COPY_LOG,
        MENU_COPY_LOG_LABEL,
        true,
        None::<&str>,
    )
    .map_err(|error| format!("Failed to create tray copy log menu item: {error}"))?;
    let exit_item = MenuItem::with_id(
        app_handle,
        tray_actions::TRAY_MENU_EXIT,
        MENU_EXIT_LABEL,
        true,
        None::<&str>,
    )
    .map_err(|error| format!("Failed to create tray exit menu item: {error}"))?;

    let menu = Menu::with_items(
        app_handle,
        &[
            &version_item,
            &separator,
            &open_item,
            &check_update_item,
            &copy_log_item,
            &exit_item,
        ],
    )
    .map_err(|error| format!("Failed to build tray menu: {error}"))?;

    if !app_handle.manage(TrayMenuState {
        version_item,
        check_update_item,
    }) {
        append_startup_log("tray menu state already exists, skipping manage");
    }

    // Menu clicks reach the app-wide menu router registered on the builder.
    let tray_builder = TrayIconBuilder::with_id(TRAY_ID)
        .menu(&menu)
        .tooltip(TOOLTIP_NO_NEW_MESSAGE)
        .icon(icons.tray.clone())
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                if let Some(state) = tray.app_handle().try_state::<AppState>() {
                    state
                        .events
                        .dispatch(ShellEvent::TrayClicked, append_window_log);
                }
            }
        });

    tray_builder
        .build(app_handle)
        .map_err(|error| format!("Failed to create tray icon: {error}"))?;
    Ok(())
}
