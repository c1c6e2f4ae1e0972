use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use portal_logging::{portal_debug, portal_info, portal_warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::debounce::Debounce;
use crate::store::DraftStore;

/// A persisted snapshot of in-progress form data.
///
/// Exactly one draft exists per storage key; every save replaces the prior
/// entry wholesale (last write wins, no merge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft<T> {
    pub payload: T,
    /// Identifier of the record being edited; `None` means a new record.
    pub record_id: Option<String>,
    pub saved_at: DateTime<Utc>,
}

type ContentPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
type UtcSource = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Configuration for [`DraftManager`].
pub struct DraftOptions<T> {
    /// Storage key this form persists under. The key namespace is owned by
    /// the caller, typically one key per form type.
    pub storage_key: String,
    /// Quiet period after the last change before a snapshot is persisted.
    pub debounce: Duration,
    /// Drafts older than this at load time are deleted instead of offered.
    pub expiration: TimeDelta,
    /// Gate deciding whether a snapshot is worth persisting. Defaults to
    /// always-true, so even empty forms are persisted unless the caller
    /// opts into a stricter predicate.
    pub has_content: ContentPredicate<T>,
    /// Wall-clock source for `saved_at` stamps and expiry checks.
    pub utc_now: UtcSource,
}

// Manual impl: the derived one would demand `T: Clone` even though `T` only
// appears behind `Arc`.
impl<T> Clone for DraftOptions<T> {
    fn clone(&self) -> Self {
        Self {
            storage_key: self.storage_key.clone(),
            debounce: self.debounce,
            expiration: self.expiration,
            has_content: self.has_content.clone(),
            utc_now: self.utc_now.clone(),
        }
    }
}

impl<T> DraftOptions<T> {
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
            debounce: Duration::from_millis(1000),
            expiration: TimeDelta::days(7),
            has_content: Arc::new(|_| true),
            utc_now: Arc::new(Utc::now),
        }
    }
}

/// Auto-saves an in-progress form to a durable store on a debounce timer and
/// offers a restore/discard decision for a draft found at load time.
///
/// Construction reads the store exactly once. Corrupt or expired entries are
/// deleted and treated as absent; a valid entry opens the restore prompt.
/// Autosave is best-effort: write failures are logged and swallowed, and
/// editing is never interrupted. The host drives persistence by calling
/// [`DraftManager::poll`] on its tick loop.
pub struct DraftManager<T, S> {
    store: S,
    options: DraftOptions<T>,
    timer: Debounce,
    snapshot: Option<(T, Option<String>)>,
    pending: Option<Draft<T>>,
    prompt_open: bool,
    skip_next_save: bool,
}

impl<T, S> DraftManager<T, S>
where
    T: Serialize + DeserializeOwned,
    S: DraftStore,
{
    pub fn new(store: S, options: DraftOptions<T>) -> Self {
        let timer = Debounce::new(options.debounce);
        let mut manager = Self {
            store,
            options,
            timer,
            snapshot: None,
            pending: None,
            prompt_open: false,
            skip_next_save: false,
        };
        manager.load_pending();
        manager
    }

    /// Records the latest form snapshot and (re-)arms the autosave timer.
    ///
    /// The first change after a restore consumes the one-shot skip flag and
    /// does not schedule a save, so the just-restored snapshot is not
    /// immediately re-persisted as if it were new.
    pub fn note_change(&mut self, payload: T, record_id: Option<String>, now: Instant) {
        if self.skip_next_save {
            self.skip_next_save = false;
            return;
        }
        self.snapshot = Some((payload, record_id));
        self.timer.arm(now);
    }

    /// Host tick entry: persists the latest snapshot once the quiet period
    /// has elapsed. Returns true only when an entry was written.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.timer.fire(now) {
            return false;
        }
        let Some((payload, record_id)) = self.snapshot.take() else {
            return false;
        };
        if !(self.options.has_content)(&payload) {
            portal_debug!(
                "Skipping autosave under {:?}: nothing worth persisting",
                self.options.storage_key
            );
            return false;
        }
        let draft = Draft {
            payload,
            record_id,
            saved_at: (self.options.utc_now)(),
        };
        let raw = match serde_json::to_string(&draft) {
            Ok(raw) => raw,
            Err(err) => {
                portal_warn!(
                    "Failed to serialize draft under {:?}: {}",
                    self.options.storage_key,
                    err
                );
                return false;
            }
        };
        if let Err(err) = self.store.set(&self.options.storage_key, &raw) {
            portal_warn!("Autosave under {:?} failed: {}", self.options.storage_key, err);
            return false;
        }
        portal_debug!("Autosaved draft under {:?}", self.options.storage_key);
        true
    }

    /// Hands the pending draft back to the caller, arms the one-shot skip
    /// flag and closes the prompt. Returns `None` (and changes nothing) when
    /// no draft is pending.
    pub fn restore_draft(&mut self) -> Option<Draft<T>> {
        let draft = self.pending.take()?;
        self.prompt_open = false;
        self.skip_next_save = true;
        portal_info!("Restored draft under {:?}", self.options.storage_key);
        Some(draft)
    }

    /// Deletes the storage entry and closes the prompt. Idempotent; valid in
    /// any state.
    pub fn discard_draft(&mut self) {
        self.store.remove(&self.options.storage_key);
        self.pending = None;
        self.prompt_open = false;
    }

    /// Deletes the storage entry and drops any save still scheduled, without
    /// touching prompt state. For explicit lifecycle events: successful
    /// submission or user-initiated cancel.
    pub fn clear_draft(&mut self) {
        self.store.remove(&self.options.storage_key);
        self.timer.cancel();
        self.snapshot = None;
    }

    pub fn prompt_open(&self) -> bool {
        self.prompt_open
    }

    pub fn pending_draft(&self) -> Option<&Draft<T>> {
        self.pending.as_ref()
    }

    /// True exactly while an autosave is scheduled but not yet executed.
    pub fn is_save_scheduled(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load_pending(&mut self) {
        let key = self.options.storage_key.clone();
        let Some(raw) = self.store.get(&key) else {
            return;
        };
        let draft: Draft<T> = match serde_json::from_str(&raw) {
            Ok(draft) => draft,
            Err(err) => {
                // Corrupt data is never surfaced; drop it and move on.
                portal_warn!("Removing unreadable draft under {:?}: {}", key, err);
                self.store.remove(&key);
                return;
            }
        };
        let age = (self.options.utc_now)() - draft.saved_at;
        if age > self.options.expiration {
            portal_info!(
                "Removing expired draft under {:?} (saved {})",
                key,
                draft.saved_at
            );
            self.store.remove(&key);
            return;
        }
        self.pending = Some(draft);
        self.prompt_open = true;
    }
}
