//! Two-column `name,email` CSV ingestion.
//!
//! No quoting or escaping: every comma separates a field. A header row is not
//! detected as such; it simply fails the email check like any other bad row.

use std::collections::HashSet;

use shared::{domain::CandidateContact, email::is_valid_email};
use tracing::debug;

/// Parses `text` into candidates, in input order.
///
/// `existing_emails` must hold lowercased addresses. Rows whose email is
/// already known, or already accepted earlier in the same input, are dropped.
pub fn parse_csv_contacts(text: &str, existing_emails: &HashSet<String>) -> Vec<CandidateContact> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut seen: HashSet<String> = HashSet::new();
    let mut results = Vec::new();

    for (line_no, line) in normalized.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split(',').map(str::trim);
        let (Some(raw_name), Some(raw_email)) = (fields.next(), fields.next()) else {
            debug!(line = line_no + 1, "skipping csv row with fewer than two fields");
            continue;
        };

        let email = raw_email.to_lowercase();
        if !is_valid_email(&email) {
            debug!(line = line_no + 1, "skipping csv row with invalid email");
            continue;
        }
        if existing_emails.contains(&email) || !seen.insert(email.clone()) {
            debug!(line = line_no + 1, %email, "skipping duplicate csv email");
            continue;
        }

        let name = if raw_name.is_empty() {
            email.clone()
        } else {
            raw_name.to_string()
        };
        results.push(CandidateContact { name, email });
    }

    results
}

#[cfg(test)]
#[path = "tests/csv_import_tests.rs"]
mod tests;
