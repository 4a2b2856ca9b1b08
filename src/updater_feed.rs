use std::sync::{Mutex, MutexGuard};

use tauri::AppHandle;
use tauri_plugin_updater::{Update, UpdaterExt};

use crate::{
    update_orchestrator::UpdateFeed,
    update_session::UpdateInfo,
};

/// `tauri-plugin-updater` behind the orchestrator's feed seam. Keeps the
/// update found by the last check and the bytes of the last download.
pub(crate) struct UpdaterFeed {
    app_handle: AppHandle,
    found: Mutex<Option<Update>>,
    downloaded: Mutex<Option<Vec<u8>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(error) => error.into_inner(),
    }
}

impl UpdaterFeed {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self {
            app_handle,
            found: Mutex::new(None),
            downloaded: Mutex::new(None),
        }
    }

    fn install_downloaded(&self) -> Result<(), String> {
        let update = lock(&self.found)
            .clone()
            .ok_or_else(|| "no update has been checked".to_string())?;
        let bytes = lock(&self.downloaded)
            .take()
            .ok_or_else(|| "no downloaded update to install".to_string())?;
        update
            .install(bytes)
            .map_err(|error| format!("failed to install update {}: {error}", update.version))
    }
}

impl UpdateFeed for UpdaterFeed {
    async fn check(&self) -> Result<Option<UpdateInfo>, String> {
        let updater = self
            .app_handle
            .updater()
            .map_err(|error| format!("failed to initialize updater: {error}"))?;
        let update = updater
            .check()
            .await
            .map_err(|error| format!("failed to check for update: {error}"))?;

        let info = update.as_ref().map(|update| UpdateInfo {
            version: update.version.clone(),
            release_notes: update.body.clone(),
        });
        *lock(&self.found) = update;
        Ok(info)
    }

    async fn download<P>(&self, mut on_progress: P) -> Result<(), String>
    where
        P: FnMut(u64, Option<u64>) + Send,
    {
        let update = lock(&self.found)
            .clone()
            .ok_or_else(|| "no update available to download".to_string())?;
        let bytes = update
            .download(
                |chunk_len, content_length| on_progress(chunk_len as u64, content_length),
                || {},
            )
            .await
            .map_err(|error| format!("failed to download update {}: {error}", update.version))?;

        *lock(&self.downloaded) = Some(bytes);
        Ok(())
    }

    fn install_now(&self) -> Result<(), String> {
        self.install_downloaded()?;
        self.app_handle.restart()
    }

    fn install_staged(&self) -> Result<(), String> {
        self.install_downloaded()
    }
}
