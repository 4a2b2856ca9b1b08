use std::sync::Arc;

use tauri::{AppHandle, Manager, RunEvent, WindowEvent};
use tauri_plugin_autostart::{MacosLauncher, ManagerExt};

use crate::{
    append_desktop_log, append_startup_log, append_update_log, append_warning_log,
    append_window_log,
    crash_reporter::{self, CrashReporter, DialogFaultPresenter},
    dispatcher::{Dispatcher, TauriServices},
    exit_events::{self, CloseDecision},
    first_launch,
    instance_guard::{self, StartupDecision},
    launch_options::LaunchOptions,
    logging, main_window, page_context_menu, runtime_paths,
    shell_events::{shell_event_channel, ShellEvent},
    tauri_shell::TauriShell,
    tray_actions, tray_setup,
    update_dialogs::DialogUpdateHost,
    update_orchestrator::UpdateOrchestrator,
    updater_feed::UpdaterFeed,
    window_tray::WindowTrayController,
    AppState, MAIN_WINDOW_LABEL, STARTUP_FLAG, UPDATE_RECHECK_INTERVAL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShellPlugin {
    SingleInstance,
    Updater,
    Dialog,
    Clipboard,
    Autostart,
}

/// Registration order inside `setup`. A secondary launch exits while the
/// single-instance plugin initialises, before anything else runs.
const PLUGIN_ORDER: [ShellPlugin; 5] = [
    ShellPlugin::SingleInstance,
    ShellPlugin::Updater,
    ShellPlugin::Dialog,
    ShellPlugin::Clipboard,
    ShellPlugin::Autostart,
];

fn register_plugin(app_handle: &AppHandle, plugin: ShellPlugin) -> tauri::Result<()> {
    match plugin {
        ShellPlugin::SingleInstance => app_handle.plugin(instance_guard::plugin()),
        ShellPlugin::Updater => app_handle.plugin(tauri_plugin_updater::Builder::new().build()),
        ShellPlugin::Dialog => app_handle.plugin(tauri_plugin_dialog::init()),
        ShellPlugin::Clipboard => app_handle.plugin(tauri_plugin_clipboard_manager::init()),
        ShellPlugin::Autostart => app_handle.plugin(tauri_plugin_autostart::init(
            MacosLauncher::LaunchAgent,
            Some(vec![STARTUP_FLAG]),
        )),
    }
}

fn register_plugins(app_handle: &AppHandle) -> tauri::Result<()> {
    for plugin in PLUGIN_ORDER {
        let registered = register_plugin(app_handle, plugin);
        if plugin != ShellPlugin::SingleInstance {
            registered?;
            continue;
        }
        match instance_guard::decide_startup(instance_guard::claim_outcome(registered)) {
            StartupDecision::Continue => {}
            StartupDecision::ContinueStandalone => {
                append_warning_log("continuing without single-instance enforcement");
            }
        }
    }
    Ok(())
}

fn log_startup(state: &AppState) {
    append_startup_log(&format!(
        "desktop process starting: launched_at_login={} dev={}",
        state.launch.launched_at_login, state.launch.dev
    ));
    append_startup_log(&format!(
        "desktop log path: {}",
        logging::resolve_desktop_log_path(&state.paths.data_dir).display()
    ));
    append_startup_log(&format!("hosted url: {}", state.hosted_url));
}

fn route_menu_event(app_handle: &AppHandle, menu_id: &str) {
    if let Some(action) = tray_actions::action_from_menu_id(menu_id) {
        if let Some(state) = app_handle.try_state::<AppState>() {
            state
                .events
                .dispatch(ShellEvent::MenuAction(action), append_window_log);
        }
    } else if let Some(action) = page_context_menu::action_from_menu_id(menu_id) {
        page_context_menu::handle_page_context_action(app_handle, action);
    }
}

pub(crate) fn run() {
    let launch = LaunchOptions::from_env();
    let (events, receiver) = shell_event_channel();
    let state = AppState::new(launch, events);

    tauri::Builder::default()
        .manage(state)
        .manage(page_context_menu::PageContextMenuState::default())
        .invoke_handler(tauri::generate_handler![
            crate::page_context_menu::show_page_context_menu,
        ])
        .on_window_event(|window, event| {
            if window.label() != MAIN_WINDOW_LABEL {
                return;
            }
            let Some(state) = window.app_handle().try_state::<AppState>() else {
                return;
            };

            match event {
                WindowEvent::CloseRequested { api, .. } => {
                    if exit_events::decide_close(state.is_quitting()) == CloseDecision::HideInstead
                    {
                        api.prevent_close();
                        state
                            .events
                            .dispatch(ShellEvent::CloseRequested, append_window_log);
                    }
                }
                WindowEvent::Destroyed => {
                    state
                        .events
                        .dispatch(ShellEvent::WindowDestroyed, append_window_log);
                }
                _ => {}
            }
        })
        .on_menu_event(|app_handle, event| route_menu_event(app_handle, event.id().as_ref()))
        .setup(move |app| {
            let app_handle = app.handle().clone();
            register_plugins(&app_handle)?;

            let state = app_handle.state::<AppState>();
            log_startup(&state);

            let reporter = Arc::new(CrashReporter::new(
                DialogFaultPresenter::new(app_handle.clone()),
                |code| std::process::exit(code),
                logging::snapshot_log_buffer,
            ));
            crash_reporter::install_panic_hook(Arc::clone(&reporter));

            let version = app_handle.package_info().version.to_string();

            first_launch::run_first_launch(
                &state.paths.first_launch_marker,
                state.launch.dev,
                || {
                    app_handle
                        .autolaunch()
                        .enable()
                        .map_err(|error| error.to_string())
                },
                append_startup_log,
            );

            let icons = tray_setup::load_shell_icons(&runtime_paths::asset_base_dir(
                state.launch.launched_at_login,
            ));
            if let Err(error) = tray_setup::setup_tray(&app_handle, &icons, &version) {
                append_startup_log(&format!("failed to initialize tray: {error}"));
            }

            let orchestrator = Arc::new(UpdateOrchestrator::new(
                UpdaterFeed::new(app_handle.clone()),
                DialogUpdateHost::new(app_handle.clone(), state.events.clone()),
                version.clone(),
                append_update_log,
            ));
            if state.updates.set(Arc::clone(&orchestrator)).is_err() {
                append_startup_log("update orchestrator already initialized");
            }

            let controller = WindowTrayController::new(
                TauriShell::new(app_handle.clone(), icons),
                version,
                append_window_log,
            );
            let dispatcher = Dispatcher::new(controller, TauriServices::new(app_handle.clone()));
            tauri::async_runtime::spawn(dispatcher.run(receiver));

            main_window::build_main_window(&app_handle)?;
            state.events.dispatch(
                ShellEvent::WindowCreated {
                    start_hidden: state.launch.start_hidden(),
                },
                append_window_log,
            );
            main_window::spawn_window_bootstrap(app_handle.clone(), reporter);

            tauri::async_runtime::spawn(async move {
                orchestrator.initialize().await;
                loop {
                    tokio::time::sleep(UPDATE_RECHECK_INTERVAL).await;
                    orchestrator.background_check().await;
                }
            });

            append_desktop_log("desktop shell setup finished");
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| match event {
            RunEvent::ExitRequested { code, api, .. } => {
                exit_events::handle_exit_requested(app_handle, code, &api);
            }
            RunEvent::Exit => {
                exit_events::handle_exit_event(app_handle);
            }
            _ => {}
        });
}
