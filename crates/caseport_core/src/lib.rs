//! Caseport core: client-side scan scheduling and draft recovery.
mod debounce;
mod draft;
mod findings;
mod scan;
mod store;

pub use debounce::Debounce;
pub use draft::{Draft, DraftManager, DraftOptions};
pub use findings::{FieldReport, FieldScanner, Finding};
pub use scan::{ScanOptions, ScanScheduler};
pub use store::{DraftStore, MemoryStore, StoreError};
