//! Postgres gateway: the one connection every case runs through.

use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

use log::debug;
use postgres::{Client, NoTls, SimpleQueryMessage};

use crate::model::ExecutionResult;

/// Constructs a connection parameter set from the config file.
/// This `panic!`s if the mandatory `host` value is missing.
pub fn connection_params(settings: &config::Config) -> postgres::Config {
    let mut params = postgres::Config::new();

    if let Ok(user) = settings.get_string("user") {
        params.user(user.as_str());
        if let Ok(password) = settings.get_string("password") {
            params.password(password);
        }
    };

    if let Ok(dbname) = settings.get_string("dbname") {
        params.dbname(dbname.as_str());
    };

    if let Ok(port) = settings.get_int("port") {
        params.port(port as u16);
    };

    params.host(settings.get_string("host").unwrap().as_str());
    params
}

/// Connects, retrying while the sandbox server finishes booting.
/// Gives up after the last attempt and returns the driver error.
pub fn connect(params: &postgres::Config) -> Result<Client, postgres::Error> {
    const ATTEMPTS: u32 = 10;

    let mut attempt = 0;
    loop {
        attempt += 1;
        match params.connect(NoTls) {
            Ok(client) => return Ok(client),
            Err(err) if attempt < ATTEMPTS => {
                debug!("connect attempt {} failed: {}", attempt, err);
                thread::sleep(Duration::from_millis(500));
            }
            Err(err) => return Err(err),
        }
    }
}

/// Runs one arbitrary statement and describes what came back.
///
/// A database error here is a classifiable outcome, not a failure. An
/// empty statement (extraction came up dry) is classified as an error
/// without a round trip: Postgres itself would accept it as a no-op.
pub fn execute_statement(client: &mut Client, sql: &str) -> ExecutionResult {
    if sql.trim().is_empty() {
        return ExecutionResult {
            had_error: true,
            description: "empty statement, nothing was sent to the database".to_string(),
        };
    }

    match client.simple_query(sql) {
        Ok(messages) => ExecutionResult {
            had_error: false,
            description: describe_messages(&messages),
        },
        Err(err) => ExecutionResult {
            had_error: true,
            description: format!("database error: {}", err),
        },
    }
}

/// Row set if the statement produced one, `Affected N row(s).` if not.
fn describe_messages(messages: &[SimpleQueryMessage]) -> String {
    let mut lines = Vec::new();
    let mut saw_result_set = false;
    let mut affected = None;

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(_) => saw_result_set = true,
            SimpleQueryMessage::Row(row) => {
                saw_result_set = true;
                lines.push(format!("[row {}] {}", lines.len() + 1, describe_row(row)));
            }
            SimpleQueryMessage::CommandComplete(count) => affected = Some(*count),
            _ => {}
        }
    }

    if !lines.is_empty() {
        lines.join("\n")
    } else if saw_result_set {
        "(no rows)".to_string()
    } else {
        format!("Affected {} row(s).", affected.unwrap_or(0))
    }
}

fn describe_row(row: &postgres::row::SimpleQueryRow) -> String {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{}={}", col.name(), row.get(i).unwrap_or("NULL")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// All primary keys currently in the target table.
///
/// Best-effort on purpose: any failure (the table may simply not exist
/// yet) degrades to an empty set and never propagates. Callers rely on
/// a missing table reading as "no rows".
pub fn snapshot_ids(client: &mut Client, table: &str, id_column: &str) -> BTreeSet<i32> {
    let mut ids = BTreeSet::new();
    let query = format!("SELECT {} FROM {}", id_column, table);
    let rows = match client.query(query.as_str(), &[]) {
        Ok(rows) => rows,
        Err(_) => return ids,
    };
    for row in &rows {
        if let Ok(id) = row.try_get::<_, i32>(0) {
            ids.insert(id);
        }
    }
    ids
}

/// Full rows for the given keys, one `col=value` line per row.
pub fn fetch_rows(
    client: &mut Client,
    table: &str,
    id_column: &str,
    ids: &BTreeSet<i32>,
) -> Result<String, postgres::Error> {
    let query = format!(
        "SELECT * FROM {} WHERE {} IN ({})",
        table,
        id_column,
        id_list(ids)
    );
    let messages = client.simple_query(&query)?;

    let mut lines = Vec::new();
    for message in &messages {
        if let SimpleQueryMessage::Row(row) = message {
            lines.push(describe_row(row));
        }
    }
    Ok(lines.join("\n"))
}

/// Deletes the created rows and reports how many went away. An empty
/// set issues no statement at all.
///
/// Errors propagate: rows left behind would poison the next case's
/// baseline, so a failed delete has to be visible.
pub fn cleanup(
    client: &mut Client,
    table: &str,
    id_column: &str,
    ids: &BTreeSet<i32>,
) -> Result<u64, postgres::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let statement = format!(
        "DELETE FROM {} WHERE {} IN ({})",
        table,
        id_column,
        id_list(ids)
    );
    client.execute(statement.as_str(), &[])
}

/// Renders `1,2,3`. Deterministic because the set is ordered.
fn id_list(ids: &BTreeSet<i32>) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_is_ordered_and_comma_separated() {
        let ids: BTreeSet<i32> = [42, 3, 17].into_iter().collect();
        assert_eq!(id_list(&ids), "3,17,42");
    }

    #[test]
    fn id_list_of_one() {
        let ids: BTreeSet<i32> = [42].into_iter().collect();
        assert_eq!(id_list(&ids), "42");
    }
}
