use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, Instant};

use caseport_core::{FieldReport, FieldScanner, Finding, ScanOptions, ScanScheduler};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(portal_logging::initialize_for_tests);
}

/// Flags every occurrence of the substring `secret` and records each
/// invocation so tests can assert on call counts and captured fields.
#[derive(Clone, Default)]
struct RecordingScanner {
    calls: Arc<Mutex<Vec<BTreeMap<String, String>>>>,
}

impl RecordingScanner {
    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last_call(&self) -> Option<BTreeMap<String, String>> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl FieldScanner for RecordingScanner {
    fn scan(&self, fields: &BTreeMap<String, String>) -> BTreeMap<String, FieldReport> {
        self.calls.lock().unwrap().push(fields.clone());
        fields
            .iter()
            .filter_map(|(name, value)| {
                let findings: Vec<Finding> = value
                    .match_indices("secret")
                    .map(|(offset, matched)| Finding {
                        kind: "secret".to_string(),
                        excerpt: matched.to_string(),
                        offset,
                    })
                    .collect();
                if findings.is_empty() {
                    None
                } else {
                    Some((name.clone(), FieldReport { findings }))
                }
            })
            .collect()
    }
}

fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn rapid_requests_coalesce_into_one_scan_of_latest_fields() {
    init_logging();
    let scanner = RecordingScanner::default();
    let mut scheduler = ScanScheduler::new(scanner.clone(), ScanOptions::default());
    let t0 = Instant::now();

    scheduler.scan_fields(fields(&[("details", "1")]), t0);
    scheduler.scan_fields(fields(&[("details", "12")]), t0 + Duration::from_millis(100));
    assert!(scheduler.is_pending());

    // The first deadline (t0 + 500ms) was superseded by the re-arm.
    assert!(!scheduler.poll(t0 + Duration::from_millis(500)));
    assert_eq!(scanner.call_count(), 0);

    assert!(scheduler.poll(t0 + Duration::from_millis(600)));
    assert_eq!(scanner.call_count(), 1);
    assert_eq!(scanner.last_call(), Some(fields(&[("details", "12")])));
    assert!(!scheduler.is_pending());
}

#[test]
fn immediate_scan_cancels_the_pending_debounced_one() {
    init_logging();
    let scanner = RecordingScanner::default();
    let mut scheduler = ScanScheduler::new(scanner.clone(), ScanOptions::default());
    let t0 = Instant::now();

    scheduler.scan_fields(fields(&[("details", "x")]), t0);
    scheduler.scan_fields_now(fields(&[("details", "y")]));

    assert_eq!(scanner.call_count(), 1);
    assert_eq!(scanner.last_call(), Some(fields(&[("details", "y")])));
    assert!(!scheduler.is_pending());

    // The originally scheduled debounced call never fires.
    assert!(!scheduler.poll(t0 + Duration::from_secs(10)));
    assert_eq!(scanner.call_count(), 1);
}

#[test]
fn published_results_aggregate_across_fields() {
    init_logging();
    let mut scheduler = ScanScheduler::new(RecordingScanner::default(), ScanOptions::default());

    scheduler.scan_fields_now(fields(&[
        ("title", "the secret plan"),
        ("details", "secret secret"),
        ("notes", "nothing here"),
    ]));

    assert!(scheduler.has_findings());
    assert_eq!(scheduler.warning_count(), 3);
    assert_eq!(scheduler.results().len(), 2);
    assert!(!scheduler.results().contains_key("notes"));

    let title = &scheduler.results()["title"];
    assert_eq!(title.warning_count(), 1);
    assert_eq!(title.findings[0].kind, "secret");
    assert_eq!(title.findings[0].offset, 4);
}

#[test]
fn new_scan_replaces_previous_results_wholesale() {
    init_logging();
    let mut scheduler = ScanScheduler::new(RecordingScanner::default(), ScanOptions::default());

    scheduler.scan_fields_now(fields(&[("title", "secret")]));
    assert!(scheduler.has_findings());

    scheduler.scan_fields_now(fields(&[("title", "clean now")]));
    assert!(!scheduler.has_findings());
    assert_eq!(scheduler.warning_count(), 0);
    assert!(scheduler.results().is_empty());
}

#[test]
fn disabled_scheduler_ignores_requests_but_keeps_results() {
    init_logging();
    let scanner = RecordingScanner::default();
    let mut scheduler = ScanScheduler::new(scanner.clone(), ScanOptions::default());
    let t0 = Instant::now();

    scheduler.scan_fields_now(fields(&[("title", "secret")]));
    assert_eq!(scheduler.warning_count(), 1);

    scheduler.set_enabled(false);
    scheduler.scan_fields(fields(&[("title", "another secret")]), t0);
    assert!(!scheduler.is_pending());
    assert!(!scheduler.poll(t0 + Duration::from_secs(1)));
    assert_eq!(scanner.call_count(), 1);

    // Disabling does not clear what was already published.
    assert_eq!(scheduler.warning_count(), 1);
    assert!(scheduler.has_findings());
}

#[test]
fn disabling_cancels_an_armed_deadline() {
    init_logging();
    let scanner = RecordingScanner::default();
    let mut scheduler = ScanScheduler::new(scanner.clone(), ScanOptions::default());
    let t0 = Instant::now();

    scheduler.scan_fields(fields(&[("title", "secret")]), t0);
    scheduler.set_enabled(false);

    assert!(!scheduler.poll(t0 + Duration::from_secs(1)));
    assert_eq!(scanner.call_count(), 0);
}

#[test]
fn clear_results_resets_state_and_cancels_pending_scan() {
    init_logging();
    let scanner = RecordingScanner::default();
    let mut scheduler = ScanScheduler::new(scanner.clone(), ScanOptions::default());
    let t0 = Instant::now();

    scheduler.scan_fields_now(fields(&[("title", "secret")]));
    scheduler.scan_fields(fields(&[("title", "more secret")]), t0);
    scheduler.clear_results();

    assert!(!scheduler.is_pending());
    assert!(!scheduler.has_findings());
    assert_eq!(scheduler.warning_count(), 0);
    assert!(scheduler.results().is_empty());
    assert!(!scheduler.poll(t0 + Duration::from_secs(1)));
    assert_eq!(scanner.call_count(), 1);
}

#[test]
fn custom_debounce_window_is_honoured() {
    init_logging();
    let scanner = RecordingScanner::default();
    let options = ScanOptions {
        debounce: Duration::from_millis(50),
        ..ScanOptions::default()
    };
    let mut scheduler = ScanScheduler::new(scanner.clone(), options);
    let t0 = Instant::now();

    scheduler.scan_fields(fields(&[("title", "x")]), t0);
    assert!(!scheduler.poll(t0 + Duration::from_millis(49)));
    assert!(scheduler.poll(t0 + Duration::from_millis(50)));
    assert_eq!(scanner.call_count(), 1);
}
