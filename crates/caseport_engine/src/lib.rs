//! Caseport engine: concrete collaborators behind the core seams.
mod pii;
mod store;

pub use pii::{PiiKind, PiiMatcher};
pub use store::{ensure_store_dir, entry_filename, FileDraftStore, PersistError};
