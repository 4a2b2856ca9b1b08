use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};
use url::Url;

/// One persisted cookie. Field names follow the legacy Electron cookie dump so
/// snapshots written by older releases keep restoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CookieRecord {
    pub(crate) name: String,
    pub(crate) value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) domain: Option<String>,
    #[serde(default)]
    pub(crate) host_only: bool,
    #[serde(default = "default_cookie_path")]
    pub(crate) path: String,
    #[serde(default)]
    pub(crate) secure: bool,
    #[serde(default)]
    pub(crate) http_only: bool,
    #[serde(default)]
    pub(crate) session: bool,
    /// Seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) expiration_date: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) same_site: Option<CookieSameSite>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum CookieSameSite {
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl CookieRecord {
    fn key(&self) -> (String, String, String) {
        (
            self.name.clone(),
            self.domain.clone().unwrap_or_default(),
            self.path.clone(),
        )
    }

    pub(crate) fn is_expired(&self, now_secs: f64) -> bool {
        !self.session
            && self
                .expiration_date
                .is_some_and(|expires_at| expires_at <= now_secs)
    }

    /// Checks that the record can be set on the hosted origin.
    pub(crate) fn validate_for_origin(&self, origin: &Url, now_secs: f64) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("cookie has an empty name".to_string());
        }
        if self.is_expired(now_secs) {
            return Err(format!("cookie {} is expired", self.name));
        }

        let Some(domain) = self.domain.as_deref() else {
            return Ok(());
        };
        let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
        let host = origin.host_str().unwrap_or_default().to_ascii_lowercase();
        if domain.is_empty() || host == domain || host.ends_with(&format!(".{domain}")) {
            Ok(())
        } else {
            Err(format!(
                "cookie {} belongs to foreign domain {domain}",
                self.name
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CookieChangeCause {
    Explicit,
    Overwrite,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CookieChange {
    pub(crate) name: String,
    pub(crate) cause: CookieChangeCause,
    pub(crate) removed: bool,
}

/// Live cookie store of the webview.
pub(crate) trait CookieStore: Send + Sync {
    fn all_cookies(&self) -> Result<Vec<CookieRecord>, String>;
    fn set_cookie(&self, origin: &Url, record: &CookieRecord) -> Result<(), String>;
}

/// One change per cookie that appeared, changed or disappeared between two reads.
pub(crate) fn diff_cookie_sets(
    previous: &[CookieRecord],
    current: &[CookieRecord],
    now_secs: f64,
) -> Vec<CookieChange> {
    let previous: BTreeMap<_, _> = previous.iter().map(|record| (record.key(), record)).collect();
    let current: BTreeMap<_, _> = current.iter().map(|record| (record.key(), record)).collect();
    let mut changes = Vec::new();

    for (key, record) in &current {
        match previous.get(key) {
            None => changes.push(CookieChange {
                name: record.name.clone(),
                cause: CookieChangeCause::Explicit,
                removed: false,
            }),
            Some(old) if old != record => changes.push(CookieChange {
                name: record.name.clone(),
                cause: CookieChangeCause::Overwrite,
                removed: false,
            }),
            Some(_) => {}
        }
    }

    for (key, record) in &previous {
        if current.contains_key(key) {
            continue;
        }
        let cause = if record.is_expired(now_secs) {
            CookieChangeCause::Expired
        } else {
            CookieChangeCause::Explicit
        };
        changes.push(CookieChange {
            name: record.name.clone(),
            cause,
            removed: true,
        });
    }

    changes
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CookieRestoreError {
    Missing,
    Unreadable(String),
    NotAnArray(String),
}

impl fmt::Display for CookieRestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no cookie snapshot yet"),
            Self::Unreadable(error) => write!(f, "failed to read cookie snapshot: {error}"),
            Self::NotAnArray(error) => write!(f, "cookie snapshot is not a JSON array: {error}"),
        }
    }
}

/// Parses each array element on its own; malformed elements are skipped.
pub(crate) fn read_snapshot<F>(path: &Path, log: F) -> Result<Vec<CookieRecord>, CookieRestoreError>
where
    F: Fn(&str),
{
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(CookieRestoreError::Missing)
        }
        Err(error) => return Err(CookieRestoreError::Unreadable(error.to_string())),
    };

    let elements: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .map_err(|error| CookieRestoreError::NotAnArray(error.to_string()))?;

    Ok(elements
        .into_iter()
        .enumerate()
        .filter_map(|(index, element)| {
            serde_json::from_value::<CookieRecord>(element)
                .map_err(|error| log(&format!("skipping malformed cookie #{index}: {error}")))
                .ok()
        })
        .collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RestoreReport {
    pub(crate) restored: usize,
    pub(crate) skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    Committed,
    /// A newer snapshot had already been committed.
    Discarded,
}

pub(crate) struct CookieSync {
    snapshot_path: PathBuf,
    origin: Url,
    next_sequence: AtomicU64,
    last_committed: Mutex<u64>,
}

impl CookieSync {
    pub(crate) fn new(snapshot_path: PathBuf, origin: Url) -> Self {
        Self {
            snapshot_path,
            origin,
            next_sequence: AtomicU64::new(0),
            last_committed: Mutex::new(0),
        }
    }

    #[cfg(test)]
    pub(crate) fn origin(&self) -> &Url {
        &self.origin
    }

    /// Loads the snapshot into the store; called once at window creation.
    pub(crate) fn restore<S, F>(&self, store: &S, now_secs: f64, log: F) -> RestoreReport
    where
        S: CookieStore + ?Sized,
        F: Fn(&str),
    {
        let records = match read_snapshot(&self.snapshot_path, &log) {
            Ok(records) => records,
            Err(CookieRestoreError::Missing) => {
                log("no cookie snapshot found, starting with an empty session");
                return RestoreReport::default();
            }
            Err(error) => {
                log(&format!("cookie restore skipped: {error}"));
                return RestoreReport::default();
            }
        };

        let mut report = RestoreReport::default();
        for record in &records {
            let result = record
                .validate_for_origin(&self.origin, now_secs)
                .and_then(|()| store.set_cookie(&self.origin, record));
            match result {
                Ok(()) => report.restored += 1,
                Err(error) => {
                    report.skipped += 1;
                    log(&format!("skipping cookie {}: {error}", record.name));
                }
            }
        }

        log(&format!(
            "cookies restored: restored={} skipped={}",
            report.restored, report.skipped
        ));
        report
    }

    /// Re-reads the whole store and overwrites the snapshot.
    pub(crate) fn persist<S>(&self, store: &S) -> Result<WriteOutcome, String>
    where
        S: CookieStore + ?Sized,
    {
        let sequence = self.next_sequence.fetch_add(1, Ordering::AcqRel) + 1;
        let records = store.all_cookies()?;
        self.write_snapshot(sequence, &records)
    }

    fn write_snapshot(&self, sequence: u64, records: &[CookieRecord]) -> Result<WriteOutcome, String> {
        let payload = serde_json::to_vec(records)
            .map_err(|error| format!("failed to serialize cookie snapshot: {error}"))?;
        let parent = self
            .snapshot_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|error| {
            format!(
                "failed to create cookie snapshot dir {}: {error}",
                parent.display()
            )
        })?;

        let mut staged = tempfile::NamedTempFile::new_in(parent)
            .map_err(|error| format!("failed to stage cookie snapshot: {error}"))?;
        staged
            .write_all(&payload)
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|error| format!("failed to write cookie snapshot: {error}"))?;

        let mut last_committed = match self.last_committed.lock() {
            Ok(guard) => guard,
            Err(error) => error.into_inner(),
        };
        if sequence < *last_committed {
            return Ok(WriteOutcome::Discarded);
        }

        staged.persist(&self.snapshot_path).map_err(|error| {
            format!(
                "failed to commit cookie snapshot {}: {error}",
                self.snapshot_path.display()
            )
        })?;
        *last_committed = sequence;
        Ok(WriteOutcome::Committed)
    }
}

pub(crate) fn now_epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
