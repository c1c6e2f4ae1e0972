use std::fs;
use std::path::{Path, PathBuf};

use portal_logging::{portal_info, portal_warn};
use serde::Deserialize;

const SETTINGS_FILENAME: &str = "caseport.ron";

/// Shell settings read from `./caseport.ron`.
///
/// A missing file falls back to defaults; an unreadable one is reported and
/// ignored, never fatal.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    /// Quiet period before the PII scan runs, in milliseconds.
    pub scan_debounce_ms: u64,
    /// Whether keystrokes trigger PII scanning at all.
    pub scan_enabled: bool,
    /// Quiet period before a draft autosave, in milliseconds.
    pub autosave_debounce_ms: u64,
    /// Drafts older than this many days are dropped instead of offered.
    pub draft_expiration_days: i64,
    /// Directory holding draft entries.
    pub drafts_dir: PathBuf,
    /// File the shell logs to.
    pub log_file: PathBuf,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            scan_debounce_ms: 500,
            scan_enabled: true,
            autosave_debounce_ms: 1000,
            draft_expiration_days: 7,
            drafts_dir: PathBuf::from("./drafts"),
            log_file: PathBuf::from("./portal.log"),
        }
    }
}

impl ShellSettings {
    pub fn load() -> Self {
        Self::load_from(Path::new(SETTINGS_FILENAME))
    }

    fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Self::default();
            }
            Err(err) => {
                portal_warn!("Failed to read settings from {:?}: {}", path, err);
                return Self::default();
            }
        };

        match ron::from_str(&content) {
            Ok(settings) => {
                portal_info!("Loaded settings from {:?}", path);
                settings
            }
            Err(err) => {
                portal_warn!("Failed to parse settings from {:?}: {}", path, err);
                Self::default()
            }
        }
    }
}
