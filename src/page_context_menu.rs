use std::sync::Mutex;

use tauri::{
    menu::{Menu, MenuItem},
    AppHandle, Manager, WebviewWindow,
};
use tauri_plugin_clipboard_manager::ClipboardExt;

use crate::{append_window_log, external_links};

const MENU_ID_PREFIX: &str = "page_context:";
pub(crate) const MENU_OPEN_LINK: &str = "page_context:open_link";
pub(crate) const MENU_COPY_LINK: &str = "page_context:copy_link";
pub(crate) const MENU_COPY_IMAGE: &str = "page_context:copy_image";

/// Installs the page `contextmenu` listener; re-running it is a no-op.
pub(crate) const BIND_SCRIPT: &str = r#"(function () {
  if (window.__omochaKikiContextMenu) { return; }
  const handler = function (event) {
    const target = event.target instanceof Element ? event.target : null;
    const link = target ? target.closest('a[href]') : null;
    const image = target ? target.closest('img[src]') : null;
    if (!link && !image) { return; }
    event.preventDefault();
    window.__TAURI_INTERNALS__.invoke('show_page_context_menu', {
      linkUrl: link ? link.href : null,
      imageUrl: image ? image.src : null
    });
  };
  window.addEventListener('contextmenu', handler, true);
  window.__omochaKikiContextMenu = handler;
})();"#;

pub(crate) const DISPOSE_SCRIPT: &str = r#"(function () {
  const handler = window.__omochaKikiContextMenu;
  if (!handler) { return; }
  window.removeEventListener('contextmenu', handler, true);
  delete window.__omochaKikiContextMenu;
})();"#;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PageContextTargets {
    pub(crate) link_url: Option<String>,
    pub(crate) image_url: Option<String>,
}

/// Targets of the last popup, read back when one of its items is chosen.
#[derive(Debug, Default)]
pub(crate) struct PageContextMenuState {
    targets: Mutex<PageContextTargets>,
}

impl PageContextMenuState {
    fn replace(&self, targets: PageContextTargets) {
        match self.targets.lock() {
            Ok(mut guard) => *guard = targets,
            Err(error) => *error.into_inner() = targets,
        }
    }

    fn current(&self) -> PageContextTargets {
        match self.targets.lock() {
            Ok(guard) => guard.clone(),
            Err(error) => error.into_inner().clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageContextAction {
    OpenLink,
    CopyLink,
    CopyImage,
}

impl PageContextAction {
    fn menu_id(self) -> &'static str {
        match self {
            Self::OpenLink => MENU_OPEN_LINK,
            Self::CopyLink => MENU_COPY_LINK,
            Self::CopyImage => MENU_COPY_IMAGE,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::OpenLink => "Open link in browser",
            Self::CopyLink => "Copy link address",
            Self::CopyImage => "Copy image address",
        }
    }
}

pub(crate) fn menu_entries(targets: &PageContextTargets) -> Vec<PageContextAction> {
    let mut entries = Vec::new();
    if targets.link_url.is_some() {
        entries.extend([PageContextAction::OpenLink, PageContextAction::CopyLink]);
    }
    if targets.image_url.is_some() {
        entries.push(PageContextAction::CopyImage);
    }
    entries
}

pub(crate) fn action_from_menu_id(menu_id: &str) -> Option<PageContextAction> {
    if !menu_id.starts_with(MENU_ID_PREFIX) {
        return None;
    }
    match menu_id {
        MENU_OPEN_LINK => Some(PageContextAction::OpenLink),
        MENU_COPY_LINK => Some(PageContextAction::CopyLink),
        MENU_COPY_IMAGE => Some(PageContextAction::CopyImage),
        _ => None,
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[tauri::command]
pub(crate) fn show_page_context_menu(
    window: WebviewWindow,
    link_url: Option<String>,
    image_url: Option<String>,
) -> Result<(), String> {
    let targets = PageContextTargets {
        link_url: non_blank(link_url),
        image_url: non_blank(image_url),
    };
    let entries = menu_entries(&targets);
    if entries.is_empty() {
        return Ok(());
    }

    let app_handle = window.app_handle();
    let menu = Menu::new(app_handle)
        .map_err(|error| format!("failed to create page context menu: {error}"))?;
    for action in entries {
        let item = MenuItem::with_id(app_handle, action.menu_id(), action.label(), true, None::<&str>)
            .map_err(|error| format!("failed to create page context menu item: {error}"))?;
        menu.append(&item)
            .map_err(|error| format!("failed to append page context menu item: {error}"))?;
    }

    if let Some(state) = app_handle.try_state::<PageContextMenuState>() {
        state.replace(targets);
    }
    window
        .popup_menu(&menu)
        .map_err(|error| format!("failed to show page context menu: {error}"))
}

pub(crate) fn handle_page_context_action(app_handle: &AppHandle, action: PageContextAction) {
    let Some(state) = app_handle.try_state::<PageContextMenuState>() else {
        return;
    };
    let targets = state.current();

    let result = match action {
        PageContextAction::OpenLink => targets
            .link_url
            .as_deref()
            .map(external_links::open_external),
        PageContextAction::CopyLink => targets.link_url.map(|link| {
            app_handle
                .clipboard()
                .write_text(link)
                .map_err(|error| format!("failed to copy link address: {error}"))
        }),
        PageContextAction::CopyImage => targets.image_url.map(|image| {
            app_handle
                .clipboard()
                .write_text(image)
                .map_err(|error| format!("failed to copy image address: {error}"))
        }),
    };

    match result {
        Some(Ok(())) => {}
        Some(Err(error)) => append_window_log(&format!("page context action {action:?} failed: {error}")),
        None => append_window_log(&format!("page context action {action:?} has no target")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_follow_available_targets() {
        let both = PageContextTargets {
            link_url: Some("https://example.com".to_string()),
            image_url: Some("https://example.com/a.png".to_string()),
        };
        assert_eq!(
            menu_entries(&both),
            vec![
                PageContextAction::OpenLink,
                PageContextAction::CopyLink,
                PageContextAction::CopyImage,
            ]
        );

        let image_only = PageContextTargets {
            link_url: None,
            image_url: Some("https://example.com/a.png".to_string()),
        };
        assert_eq!(menu_entries(&image_only), vec![PageContextAction::CopyImage]);
        assert!(menu_entries(&PageContextTargets::default()).is_empty());
    }

    #[test]
    fn menu_ids_round_trip_and_ignore_tray_ids() {
        for action in [
            PageContextAction::OpenLink,
            PageContextAction::CopyLink,
            PageContextAction::CopyImage,
        ] {
            assert_eq!(action_from_menu_id(action.menu_id()), Some(action));
        }
        assert_eq!(action_from_menu_id(crate::tray_actions::TRAY_MENU_EXIT), None);
        assert_eq!(action_from_menu_id("page_context:unknown"), None);
    }

    #[test]
    fn blank_targets_are_dropped() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(
            non_blank(Some(" https://a.b ".to_string())),
            Some("https://a.b".to_string())
        );
    }

    #[test]
    fn scripts_guard_against_double_binding() {
        assert!(BIND_SCRIPT.contains("if (window.__omochaKikiContextMenu) { return; }"));
        assert!(DISPOSE_SCRIPT.contains("removeEventListener('contextmenu'"));
    }
}
