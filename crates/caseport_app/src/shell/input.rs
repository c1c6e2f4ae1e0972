use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use super::app::ShellEvent;

/// Forward stdin lines into the shell event channel from a background
/// thread, so the main loop can stay on `recv` and keep ticking.
pub(crate) fn spawn_stdin_reader(event_tx: mpsc::Sender<ShellEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(text) => {
                    if event_tx.send(ShellEvent::Line(text)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = event_tx.send(ShellEvent::Eof);
    });
}
