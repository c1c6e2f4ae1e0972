use std::collections::BTreeMap;

use caseport_core::{FieldReport, FieldScanner, Finding};
use regex::Regex;

/// Built-in categories of personally identifiable information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiiKind {
    Email,
    UsPhone,
    Ssn,
    CreditCard,
    IpAddress,
}

impl PiiKind {
    /// Stable label carried on findings.
    pub fn label(self) -> &'static str {
        match self {
            PiiKind::Email => "email",
            PiiKind::UsPhone => "us_phone",
            PiiKind::Ssn => "ssn",
            PiiKind::CreditCard => "credit_card",
            PiiKind::IpAddress => "ip_address",
        }
    }
}

/// Pattern-based PII detector implementing the [`FieldScanner`] seam.
///
/// Regexes are compiled once at construction and reused for every scan.
/// Credit-card candidates are confirmed with a Luhn checksum before they are
/// reported, so arbitrary digit runs do not show up as card numbers.
pub struct PiiMatcher {
    rules: Vec<(PiiKind, Regex)>,
}

impl PiiMatcher {
    pub fn new() -> Self {
        let rules = vec![
            (
                PiiKind::Email,
                compile(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}"),
            ),
            (
                PiiKind::UsPhone,
                compile(r"(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b"),
            ),
            (PiiKind::Ssn, compile(r"\b\d{3}-\d{2}-\d{4}\b")),
            (PiiKind::CreditCard, compile(r"\b\d(?:[ \-]?\d){12,18}\b")),
            (
                PiiKind::IpAddress,
                compile(
                    r"\b(?:25[0-5]|2[0-4]\d|1?\d?\d)(?:\.(?:25[0-5]|2[0-4]\d|1?\d?\d)){3}\b",
                ),
            ),
        ];
        Self { rules }
    }
}

impl Default for PiiMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldScanner for PiiMatcher {
    fn scan(&self, fields: &BTreeMap<String, String>) -> BTreeMap<String, FieldReport> {
        let mut reports = BTreeMap::new();
        for (name, value) in fields {
            let mut findings = Vec::new();
            for (kind, pattern) in &self.rules {
                for matched in pattern.find_iter(value) {
                    if *kind == PiiKind::CreditCard && !luhn_valid(matched.as_str()) {
                        continue;
                    }
                    findings.push(Finding {
                        kind: kind.label().to_string(),
                        excerpt: matched.as_str().to_string(),
                        offset: matched.start(),
                    });
                }
            }
            if !findings.is_empty() {
                findings.sort_by_key(|finding| finding.offset);
                reports.insert(name.clone(), FieldReport { findings });
            }
        }
        reports
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in PII pattern")
}

/// Luhn checksum over the digits of `candidate`, separators ignored.
fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luhn_accepts_known_test_numbers() {
        assert!(luhn_valid("4242 4242 4242 4242"));
        assert!(luhn_valid("4111-1111-1111-1111"));
    }

    #[test]
    fn luhn_rejects_plain_digit_runs() {
        assert!(!luhn_valid("1234 5678 9012 3456"));
        assert!(!luhn_valid("123456789"));
    }
}
