use std::collections::BTreeMap;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use caseport_core::{DraftManager, DraftOptions, ScanOptions, ScanScheduler};
use caseport_engine::{FileDraftStore, PiiMatcher};
use chrono::TimeDelta;
use portal_logging::portal_info;
use serde::{Deserialize, Serialize};

use super::input;
use super::logging::{self, LogDestination};
use super::settings::ShellSettings;

const STORAGE_KEY: &str = "case_report.draft";
const TICK_INTERVAL: Duration = Duration::from_millis(75);

pub enum ShellEvent {
    Line(String),
    Tick,
    Eof,
}

/// The case-report form this shell edits. The draft payload persisted under
/// [`STORAGE_KEY`] is exactly this struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ReportForm {
    title: String,
    details: String,
}

impl ReportForm {
    fn fields(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("title".to_string(), self.title.clone()),
            ("details".to_string(), self.details.clone()),
        ])
    }

    fn is_empty(&self) -> bool {
        self.title.is_empty() && self.details.is_empty()
    }
}

pub fn run_app() -> anyhow::Result<()> {
    let settings = ShellSettings::load();
    // Terminal output is the UI here; logs go to the configured file.
    logging::initialize(LogDestination::File, &settings.log_file);

    let store =
        FileDraftStore::open(settings.drafts_dir.clone()).context("open draft store")?;

    let scan_options = ScanOptions {
        enabled: settings.scan_enabled,
        debounce: Duration::from_millis(settings.scan_debounce_ms),
    };
    let scheduler = ScanScheduler::new(PiiMatcher::new(), scan_options);

    let mut draft_options = DraftOptions::new(STORAGE_KEY);
    draft_options.debounce = Duration::from_millis(settings.autosave_debounce_ms);
    draft_options.expiration = TimeDelta::days(settings.draft_expiration_days);
    draft_options.has_content = Arc::new(|form: &ReportForm| !form.is_empty());
    let drafts = DraftManager::new(store, draft_options);

    let (event_tx, event_rx) = mpsc::channel::<ShellEvent>();

    // Background tick to drive the debounce timers.
    let tick_tx = event_tx.clone();
    thread::spawn(move || {
        while tick_tx.send(ShellEvent::Tick).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });
    input::spawn_stdin_reader(event_tx);

    let mut shell = PortalShell::new(scheduler, drafts);
    shell.greet();

    while let Ok(event) = event_rx.recv() {
        match event {
            ShellEvent::Line(line) => {
                if shell.handle_line(line.trim()) == Flow::Quit {
                    break;
                }
            }
            ShellEvent::Tick => shell.on_tick(Instant::now()),
            ShellEvent::Eof => break,
        }
    }

    portal_info!("Shell loop finished");
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct PortalShell {
    form: ReportForm,
    record_id: Option<String>,
    scheduler: ScanScheduler<PiiMatcher>,
    drafts: DraftManager<ReportForm, FileDraftStore>,
}

impl PortalShell {
    fn new(
        scheduler: ScanScheduler<PiiMatcher>,
        drafts: DraftManager<ReportForm, FileDraftStore>,
    ) -> Self {
        Self {
            form: ReportForm::default(),
            record_id: None,
            scheduler,
            drafts,
        }
    }

    fn greet(&self) {
        println!(
            "Caseport case-report shell. Commands: title <text>, details <text>, \
             :restore, :discard, :submit, :status, :quit"
        );
        if let Some(draft) = self.drafts.pending_draft() {
            let saved = draft.saved_at.with_timezone(&chrono::Local);
            println!(
                "Found an unsaved draft from {}. Use :restore to continue it or :discard to drop it.",
                saved.format("%Y-%m-%d %H:%M")
            );
        }
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        match line {
            "" => {}
            ":quit" => return Flow::Quit,
            ":submit" => self.submit(),
            ":discard" => {
                self.drafts.discard_draft();
                println!("Draft discarded.");
            }
            ":restore" => self.restore(),
            ":status" => self.status(),
            _ => {
                if let Some(rest) = line.strip_prefix("title ") {
                    self.form.title = rest.to_string();
                    self.note_edit();
                } else if let Some(rest) = line.strip_prefix("details ") {
                    self.form.details = rest.to_string();
                    self.note_edit();
                } else {
                    println!(
                        "Unrecognized input. Try: title <text>, details <text>, \
                         :restore, :discard, :submit, :status, :quit"
                    );
                }
            }
        }
        Flow::Continue
    }

    fn on_tick(&mut self, now: Instant) {
        if self.scheduler.poll(now) {
            self.print_warnings();
        }
        self.drafts.poll(now);
    }

    fn note_edit(&mut self) {
        let now = Instant::now();
        self.scheduler.scan_fields(self.form.fields(), now);
        self.drafts
            .note_change(self.form.clone(), self.record_id.clone(), now);
    }

    fn restore(&mut self) {
        match self.drafts.restore_draft() {
            Some(draft) => {
                self.form = draft.payload;
                self.record_id = draft.record_id;
                // Applying the restored payload counts as a change; the
                // manager's one-shot skip keeps it from re-saving instantly.
                self.drafts
                    .note_change(self.form.clone(), self.record_id.clone(), Instant::now());
                println!("Draft restored: title={:?}", self.form.title);
            }
            None => println!("No draft to restore."),
        }
    }

    fn submit(&mut self) {
        // Save-time validation skips the debounce entirely.
        self.scheduler.scan_fields_now(self.form.fields());
        if self.scheduler.has_findings() {
            self.print_warnings();
            println!("Submitting anyway; review the warnings above.");
        }
        self.drafts.clear_draft();
        portal_info!("Report submitted: title={:?}", self.form.title);
        println!("Report submitted. Draft cleared.");
        self.form = ReportForm::default();
        self.record_id = None;
        self.scheduler.clear_results();
    }

    fn status(&self) {
        println!(
            "scan pending: {}, warnings: {}, autosave scheduled: {}, restore prompt: {}",
            self.scheduler.is_pending(),
            self.scheduler.warning_count(),
            self.drafts.is_save_scheduled(),
            self.drafts.prompt_open(),
        );
    }

    fn print_warnings(&self) {
        if !self.scheduler.has_findings() {
            return;
        }
        println!(
            "Possible sensitive content ({} warning(s)):",
            self.scheduler.warning_count()
        );
        for (field, report) in self.scheduler.results() {
            for finding in &report.findings {
                println!("  {}: {} at byte {}", field, finding.kind, finding.offset);
            }
        }
    }
}
