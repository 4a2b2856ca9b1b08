use std::{
    any::Any,
    backtrace::Backtrace,
    future::Future,
    sync::{atomic::AtomicBool, Arc},
};

use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

use crate::{
    append_crash_log, AtomicFlagGuard, CRASH_REPORT_LOG_LINES, FATAL_FAULT_TITLE, NO_FAULT_DETAIL,
};

pub(crate) trait FaultPresenter: Send + Sync {
    /// Shows the fault and blocks until it is dismissed.
    fn present(&self, title: &str, detail: &str);
}

pub(crate) struct DialogFaultPresenter {
    app_handle: AppHandle,
}

impl DialogFaultPresenter {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

impl FaultPresenter for DialogFaultPresenter {
    fn present(&self, title: &str, detail: &str) {
        self.app_handle
            .dialog()
            .message(detail)
            .title(title)
            .kind(MessageDialogKind::Error)
            .blocking_show();
    }
}

pub(crate) type ShellCrashReporter = CrashReporter<DialogFaultPresenter>;

pub(crate) fn format_fault_detail(trace: Option<&str>, origin: Option<&str>) -> String {
    let body = trace
        .map(str::trim)
        .filter(|trace| !trace.is_empty())
        .unwrap_or(NO_FAULT_DETAIL);
    match origin {
        Some(origin) => format!("{body}\n\n(Error Origin = {origin})"),
        None => body.to_string(),
    }
}

/// Appends the newest `max_lines` lines of `recent_log` under the detail.
pub(crate) fn append_log_tail(detail: &str, recent_log: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = recent_log.lines().collect();
    if lines.is_empty() || max_lines == 0 {
        return detail.to_string();
    }
    let tail = &lines[lines.len().saturating_sub(max_lines)..];
    format!("{detail}\n\nRecent log:\n{}", tail.join("\n"))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        ""
    }
}

pub(crate) struct CrashReporter<P> {
    presenter: P,
    reporting: AtomicBool,
    terminate: fn(i32),
    recent_log: fn() -> String,
}

impl<P: FaultPresenter> CrashReporter<P> {
    pub(crate) fn new(presenter: P, terminate: fn(i32), recent_log: fn() -> String) -> Self {
        Self {
            presenter,
            reporting: AtomicBool::new(false),
            terminate,
            recent_log,
        }
    }

    /// Logs the fault with the recent log tail, shows it when `can_block` and
    /// terminates with status 0.
    pub(crate) fn report(&self, detail: &str, can_block: bool) {
        let Some(_reporting) = AtomicFlagGuard::try_set(&self.reporting) else {
            append_crash_log("fault raised while reporting a fault, exiting immediately");
            (self.terminate)(0);
            return;
        };

        let detail = append_log_tail(detail, &(self.recent_log)(), CRASH_REPORT_LOG_LINES);
        append_crash_log(&format!("fatal fault: {detail}"));
        if can_block {
            self.presenter.present(FATAL_FAULT_TITLE, &detail);
        }
        (self.terminate)(0);
    }
}

/// Chains onto the current hook. A panic on the main thread cannot wait for
/// the modal (the dialog needs the main thread), so it exits right away.
pub(crate) fn install_panic_hook<P>(reporter: Arc<CrashReporter<P>>)
where
    P: FaultPresenter + 'static,
{
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);

        let origin = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()));
        let trace = format!(
            "{}\n{}",
            panic_message(info.payload()),
            Backtrace::force_capture()
        );
        let detail = format_fault_detail(Some(&trace), origin.as_deref());
        let on_main_thread = std::thread::current().name() == Some("main");
        reporter.report(&detail, !on_main_thread);
    }));
}

/// Spawns a task whose error is fatal and reported like a panic.
pub(crate) fn spawn_reported<P, Fut>(
    reporter: Arc<CrashReporter<P>>,
    origin: &'static str,
    task: Fut,
) where
    P: FaultPresenter + 'static,
    Fut: Future<Output = Result<(), String>> + Send + 'static,
{
    tauri::async_runtime::spawn(async move {
        if let Err(error) = task.await {
            let detail = format_fault_detail(Some(&error), Some(origin));
            tauri::async_runtime::spawn_blocking(move || reporter.report(&detail, true));
        }
    });
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, sync::Mutex};

    use super::*;

    static HOOK_EXIT_CODES: Mutex<Vec<i32>> = Mutex::new(Vec::new());

    fn record_hook_exit(code: i32) {
        HOOK_EXIT_CODES.lock().unwrap().push(code);
    }

    fn recent_window_log() -> String {
        "[INFO] [window] main window hidden\n[INFO] [cookie] cookie snapshot written".to_string()
    }

    thread_local! {
        static EXIT_CODES: RefCell<Vec<i32>> = const { RefCell::new(Vec::new()) };
    }

    fn record_exit(code: i32) {
        EXIT_CODES.with(|codes| codes.borrow_mut().push(code));
    }

    fn take_exit_codes() -> Vec<i32> {
        EXIT_CODES.with(|codes| codes.borrow_mut().drain(..).collect())
    }

    #[derive(Default)]
    struct RecordingPresenter {
        shown: Mutex<Vec<(String, String)>>,
    }

    impl FaultPresenter for RecordingPresenter {
        fn present(&self, title: &str, detail: &str) {
            self.shown
                .lock()
                .unwrap()
                .push((title.to_string(), detail.to_string()));
        }
    }

    #[test]
    fn fault_detail_includes_trace_and_origin() {
        assert_eq!(
            format_fault_detail(Some("boom\n  at main"), Some("src/main.rs:10")),
            "boom\n  at main\n\n(Error Origin = src/main.rs:10)"
        );
    }

    #[test]
    fn fault_detail_falls_back_when_trace_is_missing() {
        assert_eq!(
            format_fault_detail(None, Some("cookie-restore")),
            "No detail provided\n\n(Error Origin = cookie-restore)"
        );
        assert_eq!(format_fault_detail(Some("   "), None), NO_FAULT_DETAIL);
    }

    #[test]
    fn report_presents_modal_then_exits_with_zero() {
        take_exit_codes();
        let reporter = CrashReporter::new(RecordingPresenter::default(), record_exit, String::new);

        reporter.report("boom", true);

        assert_eq!(
            *reporter.presenter.shown.lock().unwrap(),
            vec![(FATAL_FAULT_TITLE.to_string(), "boom".to_string())]
        );
        assert_eq!(take_exit_codes(), vec![0]);
    }

    #[test]
    fn report_includes_recent_log_lines() {
        take_exit_codes();
        let reporter = CrashReporter::new(RecordingPresenter::default(), record_exit, recent_window_log);

        reporter.report("boom", true);

        let shown = reporter.presenter.shown.lock().unwrap();
        assert_eq!(
            shown[0].1,
            "boom\n\nRecent log:\n[INFO] [window] main window hidden\n[INFO] [cookie] cookie snapshot written"
        );
        assert_eq!(take_exit_codes(), vec![0]);
    }

    #[test]
    fn log_tail_keeps_only_newest_lines() {
        let recent = (0..100)
            .map(|index| format!("line {index}"))
            .collect::<Vec<_>>()
            .join("\n");

        let detail = append_log_tail("boom", &recent, 3);

        assert_eq!(detail, "boom\n\nRecent log:\nline 97\nline 98\nline 99");
        assert_eq!(append_log_tail("boom", "", 3), "boom");
    }

    #[test]
    fn panic_hook_reports_worker_panic_with_origin_and_log() {
        let reporter = Arc::new(CrashReporter::new(
            RecordingPresenter::default(),
            record_hook_exit,
            recent_window_log,
        ));
        install_panic_hook(Arc::clone(&reporter));

        let joined = std::thread::Builder::new()
            .name("cookie-worker".to_string())
            .spawn(|| panic!("cookie jar exploded"))
            .unwrap()
            .join();
        drop(std::panic::take_hook());

        assert!(joined.is_err());
        let shown = reporter.presenter.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, FATAL_FAULT_TITLE);
        assert!(shown[0].1.starts_with("cookie jar exploded"));
        assert!(shown[0].1.contains("(Error Origin = "));
        assert!(shown[0].1.contains("crash_reporter.rs:"));
        assert!(shown[0].1.ends_with("[INFO] [cookie] cookie snapshot written"));
        assert_eq!(*HOOK_EXIT_CODES.lock().unwrap(), vec![0]);
    }

    #[test]
    fn report_without_blocking_skips_modal() {
        take_exit_codes();
        let reporter = CrashReporter::new(RecordingPresenter::default(), record_exit, String::new);

        reporter.report("main thread panic", false);

        assert!(reporter.presenter.shown.lock().unwrap().is_empty());
        assert_eq!(take_exit_codes(), vec![0]);
    }

    #[test]
    fn reentrant_report_exits_without_second_modal() {
        take_exit_codes();
        let reporter = CrashReporter::new(RecordingPresenter::default(), record_exit, String::new);
        let _in_flight = AtomicFlagGuard::try_set(&reporter.reporting).unwrap();

        reporter.report("nested", true);

        assert!(reporter.presenter.shown.lock().unwrap().is_empty());
        assert_eq!(take_exit_codes(), vec![0]);
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let from_str: Box<dyn Any + Send> = Box::new("static message");
        let from_string: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(from_str.as_ref()), "static message");
        assert_eq!(panic_message(from_string.as_ref()), "owned message");
        assert_eq!(panic_message(other.as_ref()), "");
    }
}
