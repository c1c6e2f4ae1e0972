use std::collections::BTreeMap;

/// A single sensitive-content match inside one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Category label owned by the scanner (e.g. "email", "ssn").
    pub kind: String,
    /// The matched text.
    pub excerpt: String,
    /// Byte offset of the match within the field value.
    pub offset: usize,
}

/// Scan outcome for one named field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldReport {
    pub findings: Vec<Finding>,
}

impl FieldReport {
    pub fn warning_count(&self) -> usize {
        self.findings.len()
    }
}

/// Pure field analysis invoked by [`ScanScheduler`](crate::ScanScheduler).
///
/// Implementations must be deterministic and side-effect free; the scheduler
/// does not catch failures. Fields without findings may be omitted from the
/// returned map.
pub trait FieldScanner {
    fn scan(&self, fields: &BTreeMap<String, String>) -> BTreeMap<String, FieldReport>;
}
