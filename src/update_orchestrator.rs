use std::{fmt, future::Future, sync::Mutex};

use crate::update_session::{
    CheckOutcome, CheckRejected, CheckTrigger, InstallMode, PromptResolution, UpdateChoice,
    UpdateIndicator, UpdateInfo, UpdatePrompt, UpdateSession,
};

/// Remote update feed. Downloads never start on their own.
pub(crate) trait UpdateFeed: Send + Sync {
    fn check(&self) -> impl Future<Output = Result<Option<UpdateInfo>, String>> + Send;

    /// Downloads the update found by the last successful `check`.
    /// `on_progress` receives `(chunk_len, content_length)`.
    fn download<P>(&self, on_progress: P) -> impl Future<Output = Result<(), String>> + Send
    where
        P: FnMut(u64, Option<u64>) + Send;

    /// Installs the downloaded update and restarts the app.
    fn install_now(&self) -> Result<(), String>;

    /// Installs the downloaded update while the process is exiting.
    fn install_staged(&self) -> Result<(), String>;
}

/// User-facing side of the update workflow: prompts, notices, tray indicator.
pub(crate) trait UpdateHost: Send + Sync {
    fn prompt(&self, prompt: UpdatePrompt) -> impl Future<Output = UpdateChoice> + Send;

    fn notify(&self, notice: UpdateNotice) -> impl Future<Output = ()> + Send;

    fn hide_main_window(&self);

    fn publish(&self, indicator: UpdateIndicator);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UpdateNotice {
    NoUpdate,
    AwaitingInstall(String),
    CheckFailed(String),
    DownloadFailed(String),
    InstallFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UpdateError {
    SessionBusy,
    AwaitingInstall(String),
    Feed(String),
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionBusy => write!(f, "an update session is already in progress"),
            Self::AwaitingInstall(version) => {
                write!(f, "update {version} is downloaded and installs on exit")
            }
            Self::Feed(reason) => write!(f, "update feed error: {reason}"),
        }
    }
}

impl From<CheckRejected> for UpdateError {
    fn from(rejected: CheckRejected) -> Self {
        match rejected {
            CheckRejected::SessionBusy => Self::SessionBusy,
            CheckRejected::AwaitingInstall(version) => Self::AwaitingInstall(version),
        }
    }
}

pub(crate) struct UpdateOrchestrator<F, H> {
    feed: F,
    host: H,
    session: Mutex<UpdateSession>,
    current_version: String,
    log: fn(&str),
}

impl<F, H> UpdateOrchestrator<F, H>
where
    F: UpdateFeed,
    H: UpdateHost,
{
    pub(crate) fn new(feed: F, host: H, current_version: impl Into<String>, log: fn(&str)) -> Self {
        Self {
            feed,
            host,
            session: Mutex::new(UpdateSession::default()),
            current_version: current_version.into(),
            log,
        }
    }

    fn with_session<T>(&self, apply: impl FnOnce(&mut UpdateSession) -> T) -> T {
        match self.session.lock() {
            Ok(mut guard) => apply(&mut guard),
            Err(error) => {
                (self.log)("update session lock poisoned; continuing with inner state");
                apply(&mut error.into_inner())
            }
        }
    }

    fn publish_indicator(&self) {
        let indicator = self.with_session(|session| session.indicator());
        self.host.publish(indicator);
    }

    /// Startup check; failures only reach the log.
    pub(crate) async fn initialize(&self) {
        (self.log)(&format!(
            "update orchestrator initialized, auto-download disabled, current_version={}",
            self.current_version
        ));
        if let Err(error) = self.run_check(CheckTrigger::Startup).await {
            (self.log)(&format!("startup update check failed (silent): {error}"));
        }
    }

    pub(crate) async fn background_check(&self) {
        if let Err(error) = self.run_check(CheckTrigger::Background).await {
            (self.log)(&format!("background update check skipped: {error}"));
        }
    }

    /// Manual check. Clears a previous decline; `Ok(false)` means no update.
    pub(crate) async fn check_for_update(&self) -> Result<bool, UpdateError> {
        self.run_check(CheckTrigger::Manual).await
    }

    /// Manual check from the tray, surfacing every outcome to the user.
    pub(crate) async fn check_for_update_interactive(&self) {
        match self.check_for_update().await {
            Ok(true) => {}
            Ok(false) => self.host.notify(UpdateNotice::NoUpdate).await,
            Err(UpdateError::SessionBusy) => {
                (self.log)("manual update check ignored: a session is already in progress");
            }
            Err(UpdateError::AwaitingInstall(version)) => {
                self.host
                    .notify(UpdateNotice::AwaitingInstall(version))
                    .await;
            }
            Err(UpdateError::Feed(reason)) => {
                self.host.notify(UpdateNotice::CheckFailed(reason)).await;
            }
        }
    }

    async fn run_check(&self, trigger: CheckTrigger) -> Result<bool, UpdateError> {
        let declined = self.with_session(|session| {
            session
                .begin_check(trigger)
                .map(|()| session.declined())
                .map_err(|rejected| {
                    (self.log)(&format!(
                        "update check rejected: trigger={trigger:?} phase={:?}",
                        session.phase()
                    ));
                    rejected
                })
        })?;
        self.publish_indicator();
        (self.log)(&format!(
            "checking for update: trigger={trigger:?} declined={declined}"
        ));

        let found = match self.feed.check().await {
            Ok(found) => found,
            Err(error) => {
                self.with_session(|session| session.fail_check());
                self.publish_indicator();
                return Err(UpdateError::Feed(error));
            }
        };

        let outcome = self.with_session(|session| {
            session.finish_check(trigger, found, &self.current_version)
        });
        self.publish_indicator();

        match outcome {
            CheckOutcome::NoUpdate => {
                (self.log)("update check finished: no update available");
                Ok(false)
            }
            CheckOutcome::Suppressed => {
                (self.log)("update available but prompt suppressed: declined this session");
                Ok(true)
            }
            CheckOutcome::Prompt(prompt) => {
                (self.log)(&format!("update available: version={}", prompt.version));
                self.prompt_and_apply(prompt).await;
                Ok(true)
            }
        }
    }

    async fn prompt_and_apply(&self, prompt: UpdatePrompt) {
        let choice = self.host.prompt(prompt).await;
        let mode = match self.with_session(|session| session.resolve_prompt(choice)) {
            PromptResolution::Declined => {
                (self.log)("update prompt declined; no further prompts until a manual check");
                self.publish_indicator();
                return;
            }
            PromptResolution::Download(mode) => mode,
        };

        if mode == InstallMode::Now {
            self.host.hide_main_window();
        }
        self.with_session(|session| session.begin_download());
        self.publish_indicator();
        (self.log)(&format!("downloading update: mode={mode:?}"));

        let mut downloaded: u64 = 0;
        let result = self
            .feed
            .download(|chunk_len, content_length| {
                downloaded = downloaded.saturating_add(chunk_len);
                let changed = self
                    .with_session(|session| session.record_progress(downloaded, content_length));
                if let Some(percent) = changed {
                    self.host.publish(UpdateIndicator::Downloading(percent));
                }
            })
            .await;

        if let Err(error) = result {
            self.with_session(|session| session.fail_download());
            self.publish_indicator();
            (self.log)(&format!("update download failed: {error}"));
            self.host.notify(UpdateNotice::DownloadFailed(error)).await;
            return;
        }

        match self.with_session(|session| session.finish_download()) {
            Some(InstallMode::Now) => {
                self.with_session(|session| session.begin_install());
                self.publish_indicator();
                (self.log)("update downloaded, installing and restarting");
                if let Err(error) = self.feed.install_now() {
                    self.with_session(|session| session.fail_download());
                    self.publish_indicator();
                    (self.log)(&format!("update install failed: {error}"));
                    self.host.notify(UpdateNotice::InstallFailed(error)).await;
                }
            }
            Some(InstallMode::OnExit) => {
                self.publish_indicator();
                (self.log)("update downloaded, installs on next exit");
            }
            None => {}
        }
    }

    /// Exit hook: installs an update that was staged for the next quit.
    pub(crate) fn install_pending_on_exit(&self) {
        let staged_version = self.with_session(|session| {
            if !session.pending_install_on_exit() {
                return None;
            }
            let version = session.latest_version().unwrap_or_default().to_string();
            session.begin_install();
            Some(version)
        });
        let Some(version) = staged_version else {
            return;
        };

        (self.log)(&format!("installing staged update {version} on exit"));
        if let Err(error) = self.feed.install_staged() {
            (self.log)(&format!("staged update install failed: {error}"));
        }
    }

    #[cfg(test)]
    fn session_snapshot(&self) -> UpdateSession {
        self.with_session(|session| session.clone())
    }
}
