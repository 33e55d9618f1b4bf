//! The per-case loop: snapshot, execute, classify, diff, clean up.

use std::collections::BTreeSet;

use postgres::Client;

use crate::console::Console;
use crate::db;
use crate::model::{CaseReport, TestCase};

/// Knobs the loop needs beyond the connection itself.
pub struct RunOpts {
    /// Table watched for created rows.
    pub table: String,
    pub id_column: String,

    /// Phrase in the expected-result text that means "an error is the
    /// correct outcome". Injected so the sheet's wording can change
    /// without touching code.
    pub error_marker: String,
}

/// Runs every case in order against the one shared connection.
/// A case failing, for any reason, never stops the ones after it.
pub fn run(client: &mut Client, opts: &RunOpts, cases: &[TestCase], console: &Console) {
    for case in cases {
        let report = run_case(client, opts, case);
        console.case(&report);
    }
}

fn run_case(client: &mut Client, opts: &RunOpts, case: &TestCase) -> CaseReport {
    let before = db::snapshot_ids(client, &opts.table, &opts.id_column);

    let execution = db::execute_statement(client, &case.sql);
    let expected_error = expects_error(case.expected.as_deref(), &opts.error_marker);
    let mismatch = expected_error != execution.had_error;

    let after = db::snapshot_ids(client, &opts.table, &opts.id_column);
    let created = created_ids(&before, &after);

    let created_rows = if created.is_empty() {
        "No rows affected.".to_string()
    } else {
        match db::fetch_rows(client, &opts.table, &opts.id_column, &created) {
            Ok(rows) => rows,
            Err(err) => format!("fetching created rows failed: {}", err),
        }
    };

    let cleanup = if created.is_empty() {
        "No cleanup performed.".to_string()
    } else {
        match db::cleanup(client, &opts.table, &opts.id_column, &created) {
            Ok(deleted) => format!(
                "Deleted {} row(s) with {} in {:?}.",
                deleted, opts.id_column, created
            ),
            Err(err) => format!(
                "CLEANUP FAILED, rows {:?} may be left behind: {}",
                created, err
            ),
        }
    };

    CaseReport {
        id: case.id.clone(),
        name: case.name.clone(),
        sql: case.sql.clone(),
        steps: case.steps.clone(),
        test_data: case.test_data.clone(),
        expected: case.expected.clone(),
        mismatch,
        execution_result: execution.description,
        created_rows,
        cleanup,
    }
}

/// True when the expected-result text announces an error as the correct
/// outcome. Case-insensitive on both sides.
fn expects_error(expected: Option<&str>, marker: &str) -> bool {
    match expected {
        Some(text) => text.to_lowercase().contains(&marker.to_lowercase()),
        None => false,
    }
}

/// Keys present after the statement but not before: the rows it created.
fn created_ids(before: &BTreeSet<i32>, after: &BTreeSet<i32>) -> BTreeSet<i32> {
    after.difference(before).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "появление ошибки";

    fn set(ids: &[i32]) -> BTreeSet<i32> {
        ids.iter().copied().collect()
    }

    #[test]
    fn marker_in_expected_text_means_error_expected() {
        assert!(expects_error(Some("Ожидается появление ошибки"), MARKER));
        assert!(!expects_error(Some("Товар добавлен"), MARKER));
        assert!(!expects_error(None, MARKER));
    }

    #[test]
    fn marker_match_ignores_case() {
        assert!(expects_error(Some("ПОЯВЛЕНИЕ ОШИБКИ"), MARKER));
        assert!(expects_error(Some("Ожидается появление ошибки"), "ПОЯВЛЕНИЕ ОШИБКИ"));
    }

    #[test]
    fn mismatch_is_the_xor_of_expectation_and_outcome() {
        for (expected, had_error, mismatch) in [
            (Some("Ожидается появление ошибки"), true, false),
            (Some("Ожидается появление ошибки"), false, true),
            (Some("Товар добавлен"), true, true),
            (Some("Товар добавлен"), false, false),
            (None, true, true),
            (None, false, false),
        ] {
            let expected_error = expects_error(expected, MARKER);
            assert_eq!(expected_error != had_error, mismatch);
        }
    }

    #[test]
    fn diff_is_set_subtraction() {
        assert_eq!(set(&[42]), created_ids(&set(&[1, 2, 3]), &set(&[1, 2, 3, 42])));
        assert_eq!(set(&[]), created_ids(&set(&[1, 2, 3]), &set(&[1, 2, 3])));
        assert_eq!(set(&[5, 6]), created_ids(&set(&[]), &set(&[5, 6])));
    }

    #[test]
    fn diff_ignores_rows_that_disappeared() {
        // A DELETE shrinks the table; nothing was created.
        assert_eq!(set(&[]), created_ids(&set(&[1, 2, 3]), &set(&[1])));
    }
}
