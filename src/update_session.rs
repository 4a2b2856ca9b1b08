use regex::Regex;
use std::sync::LazyLock;

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("markup tag pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InstallMode {
    Now,
    OnExit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UpdatePhase {
    Idle,
    Checking,
    NoUpdate,
    /// Found while the user had declined this session; no prompt shown.
    Available,
    Prompted,
    Declined,
    DownloadPending(InstallMode),
    Downloading { mode: InstallMode, percent: u8 },
    Downloaded(InstallMode),
    Installing,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CheckTrigger {
    Startup,
    Background,
    Manual,
}

impl CheckTrigger {
    pub(crate) fn is_automatic(self) -> bool {
        !matches!(self, Self::Manual)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpdateInfo {
    pub(crate) version: String,
    pub(crate) release_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpdatePrompt {
    pub(crate) version: String,
    pub(crate) release_notes: String,
}

impl UpdatePrompt {
    pub(crate) fn message(&self) -> String {
        format!(
            "New update available\nUpdate now?\n\n\nNew version: v.{}\nRelease notes: {}",
            self.version, self.release_notes
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpdateChoice {
    InstallNow,
    InstallOnExit,
    NotNow,
}

/// What the tray shows about the update session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UpdateIndicator {
    Idle,
    Checking,
    Downloading(u8),
    ReadyOnExit(String),
    Installing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CheckRejected {
    SessionBusy,
    AwaitingInstall(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CheckOutcome {
    NoUpdate,
    Suppressed,
    Prompt(UpdatePrompt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptResolution {
    Declined,
    Download(InstallMode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpdateSession {
    phase: UpdatePhase,
    latest_version: Option<String>,
    release_notes: Option<String>,
    declined: bool,
}

impl Default for UpdateSession {
    fn default() -> Self {
        Self {
            phase: UpdatePhase::Idle,
            latest_version: None,
            release_notes: None,
            declined: false,
        }
    }
}

impl UpdateSession {
    pub(crate) fn phase(&self) -> &UpdatePhase {
        &self.phase
    }

    pub(crate) fn declined(&self) -> bool {
        self.declined
    }

    pub(crate) fn latest_version(&self) -> Option<&str> {
        self.latest_version.as_deref()
    }

    pub(crate) fn begin_check(&mut self, trigger: CheckTrigger) -> Result<(), CheckRejected> {
        match &self.phase {
            UpdatePhase::Checking
            | UpdatePhase::Prompted
            | UpdatePhase::DownloadPending(_)
            | UpdatePhase::Downloading { .. }
            | UpdatePhase::Downloaded(InstallMode::Now)
            | UpdatePhase::Installing => return Err(CheckRejected::SessionBusy),
            UpdatePhase::Downloaded(InstallMode::OnExit) => {
                return Err(CheckRejected::AwaitingInstall(
                    self.latest_version.clone().unwrap_or_default(),
                ));
            }
            UpdatePhase::Idle
            | UpdatePhase::NoUpdate
            | UpdatePhase::Available
            | UpdatePhase::Declined
            | UpdatePhase::Failed => {}
        }

        if trigger == CheckTrigger::Manual {
            self.declined = false;
        }
        self.latest_version = None;
        self.release_notes = None;
        self.phase = UpdatePhase::Checking;
        Ok(())
    }

    pub(crate) fn finish_check(
        &mut self,
        trigger: CheckTrigger,
        found: Option<UpdateInfo>,
        current_version: &str,
    ) -> CheckOutcome {
        let Some(info) = found.filter(|info| is_newer_version(&info.version, current_version))
        else {
            self.phase = UpdatePhase::NoUpdate;
            return CheckOutcome::NoUpdate;
        };

        let prompt = UpdatePrompt {
            version: info.version.clone(),
            release_notes: strip_markup(info.release_notes.as_deref().unwrap_or_default()),
        };
        self.latest_version = Some(info.version);
        self.release_notes = info.release_notes;

        if self.declined && trigger.is_automatic() {
            self.phase = UpdatePhase::Available;
            return CheckOutcome::Suppressed;
        }

        self.phase = UpdatePhase::Prompted;
        CheckOutcome::Prompt(prompt)
    }

    pub(crate) fn fail_check(&mut self) {
        self.phase = UpdatePhase::Failed;
    }

    pub(crate) fn resolve_prompt(&mut self, choice: UpdateChoice) -> PromptResolution {
        let resolution = match choice {
            UpdateChoice::NotNow => PromptResolution::Declined,
            UpdateChoice::InstallNow => PromptResolution::Download(InstallMode::Now),
            UpdateChoice::InstallOnExit => PromptResolution::Download(InstallMode::OnExit),
        };

        match resolution {
            PromptResolution::Declined => {
                self.declined = true;
                self.phase = UpdatePhase::Declined;
            }
            PromptResolution::Download(mode) => {
                self.phase = UpdatePhase::DownloadPending(mode);
            }
        }
        resolution
    }

    pub(crate) fn begin_download(&mut self) {
        if let UpdatePhase::DownloadPending(mode) = self.phase {
            self.phase = UpdatePhase::Downloading { mode, percent: 0 };
        }
    }

    /// Returns the new rounded percentage only when it changed.
    pub(crate) fn record_progress(&mut self, downloaded: u64, total: Option<u64>) -> Option<u8> {
        let UpdatePhase::Downloading { mode, percent } = self.phase else {
            return None;
        };
        let total = total.filter(|total| *total > 0)?;

        let ratio = (downloaded as f64 / total as f64).clamp(0.0, 1.0);
        let next = (ratio * 100.0).round() as u8;
        if next == percent {
            return None;
        }
        self.phase = UpdatePhase::Downloading {
            mode,
            percent: next,
        };
        Some(next)
    }

    pub(crate) fn finish_download(&mut self) -> Option<InstallMode> {
        let UpdatePhase::Downloading { mode, .. } = self.phase else {
            return None;
        };
        self.phase = UpdatePhase::Downloaded(mode);
        Some(mode)
    }

    pub(crate) fn fail_download(&mut self) {
        self.phase = UpdatePhase::Failed;
    }

    pub(crate) fn begin_install(&mut self) {
        self.phase = UpdatePhase::Installing;
    }

    pub(crate) fn pending_install_on_exit(&self) -> bool {
        self.phase == UpdatePhase::Downloaded(InstallMode::OnExit)
    }

    pub(crate) fn indicator(&self) -> UpdateIndicator {
        match &self.phase {
            UpdatePhase::Checking => UpdateIndicator::Checking,
            UpdatePhase::DownloadPending(_) => UpdateIndicator::Downloading(0),
            UpdatePhase::Downloading { percent, .. } => UpdateIndicator::Downloading(*percent),
            UpdatePhase::Downloaded(InstallMode::OnExit) => {
                UpdateIndicator::ReadyOnExit(self.latest_version.clone().unwrap_or_default())
            }
            UpdatePhase::Downloaded(InstallMode::Now) | UpdatePhase::Installing => {
                UpdateIndicator::Installing
            }
            UpdatePhase::Idle
            | UpdatePhase::NoUpdate
            | UpdatePhase::Available
            | UpdatePhase::Prompted
            | UpdatePhase::Declined
            | UpdatePhase::Failed => UpdateIndicator::Idle,
        }
    }
}

pub(crate) fn strip_markup(raw: &str) -> String {
    MARKUP_TAG.replace_all(raw, "").trim().to_string()
}

/// Unparseable versions are trusted: the feed already decided there is an update.
pub(crate) fn is_newer_version(candidate: &str, current: &str) -> bool {
    let parse = |raw: &str| semver::Version::parse(raw.trim().trim_start_matches('v'));
    match (parse(candidate), parse(current)) {
        (Ok(candidate), Ok(current)) => candidate > current,
        _ => true,
    }
}
