use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::debounce::Debounce;
use crate::findings::{FieldReport, FieldScanner};

/// Configuration for [`ScanScheduler`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// When false, scan requests are ignored. Previously published results
    /// stay visible until [`ScanScheduler::clear_results`] is called.
    pub enabled: bool,
    /// Quiet period that must elapse after the last request before the
    /// scanner runs.
    pub debounce: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce: Duration::from_millis(500),
        }
    }
}

/// Debounced scheduler for field-level content scanning.
///
/// Delays invocation of an injected [`FieldScanner`] until input quiesces,
/// so an expensive scan does not run on every keystroke. Pure debounce:
/// every request supersedes the previous one and only the latest recorded
/// fields are ever scanned. The host drives execution by calling
/// [`ScanScheduler::poll`] on its tick loop.
pub struct ScanScheduler<S: FieldScanner> {
    scanner: S,
    options: ScanOptions,
    timer: Debounce,
    latest_fields: Option<BTreeMap<String, String>>,
    results: BTreeMap<String, FieldReport>,
    warning_count: usize,
    has_findings: bool,
}

impl<S: FieldScanner> ScanScheduler<S> {
    pub fn new(scanner: S, options: ScanOptions) -> Self {
        let timer = Debounce::new(options.debounce);
        Self {
            scanner,
            options,
            timer,
            latest_fields: None,
            results: BTreeMap::new(),
            warning_count: 0,
            has_findings: false,
        }
    }

    /// Records `fields` as the most recent input and (re-)arms the debounce
    /// timer. No-op while disabled.
    pub fn scan_fields(&mut self, fields: BTreeMap<String, String>, now: Instant) {
        if !self.options.enabled {
            return;
        }
        self.latest_fields = Some(fields);
        self.timer.arm(now);
    }

    /// Cancels any outstanding deadline and scans `fields` immediately.
    ///
    /// Intended for blur/save-time validation where debounce latency is
    /// undesirable.
    pub fn scan_fields_now(&mut self, fields: BTreeMap<String, String>) {
        if !self.options.enabled {
            return;
        }
        self.timer.cancel();
        self.latest_fields = None;
        self.publish(&fields);
    }

    /// Host tick entry: runs the scanner over the latest recorded fields
    /// once the quiet period has elapsed. Returns true when results were
    /// republished.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.timer.fire(now) {
            return false;
        }
        let Some(fields) = self.latest_fields.take() else {
            return false;
        };
        self.publish(&fields);
        true
    }

    /// Resets all published state and cancels any outstanding deadline.
    pub fn clear_results(&mut self) {
        self.timer.cancel();
        self.latest_fields = None;
        self.results.clear();
        self.warning_count = 0;
        self.has_findings = false;
    }

    /// Disabling cancels any outstanding deadline but leaves published
    /// results in place.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.options.enabled = enabled;
        if !enabled {
            self.timer.cancel();
            self.latest_fields = None;
        }
    }

    pub fn results(&self) -> &BTreeMap<String, FieldReport> {
        &self.results
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn has_findings(&self) -> bool {
        self.has_findings
    }

    /// True exactly while a debounced scan is queued but not yet executed.
    pub fn is_pending(&self) -> bool {
        self.timer.is_armed()
    }

    fn publish(&mut self, fields: &BTreeMap<String, String>) {
        let results = self.scanner.scan(fields);
        self.warning_count = results.values().map(FieldReport::warning_count).sum();
        self.has_findings = results.values().any(|report| !report.findings.is_empty());
        self.results = results;
    }
}
