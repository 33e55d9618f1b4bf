//! Case-sheet loading.
//!
//! The sheet is a CSV file with a header row; columns are matched by
//! name, so their order does not matter and missing columns just leave
//! the corresponding fields empty. The SQL statement each case runs is
//! embedded somewhere in its free-text steps cell.

use std::io::Read;
use std::path::Path;

use log::warn;
use regex::Regex;

use crate::error::RunResult;
use crate::model::TestCase;

const COL_ID: &str = "ID";
const COL_NAME: &str = "Название";
const COL_STEPS: &str = "Шаги";
const COL_EXPECTED: &str = "Ожидаемый результат";
const COL_TEST_DATA: &str = "Тестовые данные";

/// First statement keyword through the first following terminator.
/// `(?s)` so a statement may span lines inside the cell.
const SQL_PATTERN: &str = r"(?is)(INSERT|UPDATE|DELETE|SELECT|CREATE|ALTER).*?;";

/// Reads the whole sheet into an ordered case list.
///
/// An unreadable or malformed file is fatal for the run. A steps cell
/// without a recognizable statement is not: the case keeps an empty
/// statement and fails at execution time, which is itself output.
pub fn load_cases(path: &Path) -> RunResult<Vec<TestCase>> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    parse_cases(reader)
}

fn parse_cases<R: Read>(mut reader: csv::Reader<R>) -> RunResult<Vec<TestCase>> {
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let id_col = column(COL_ID);
    let name_col = column(COL_NAME);
    let steps_col = column(COL_STEPS);
    let expected_col = column(COL_EXPECTED);
    let test_data_col = column(COL_TEST_DATA);

    let statement = Regex::new(SQL_PATTERN).expect("statement pattern is valid");

    let mut cases = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |col: Option<usize>| -> Option<String> {
            col.and_then(|i| record.get(i))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let id = cell(id_col);
        let steps = cell(steps_col);

        let sql = match extract_sql(steps.as_deref(), &statement) {
            Some(sql) => sql,
            None => {
                warn!(
                    "case {}: no SQL statement found in steps",
                    id.as_deref().unwrap_or("?")
                );
                String::new()
            }
        };

        cases.push(TestCase {
            id,
            name: cell(name_col),
            steps,
            test_data: cell(test_data_col),
            expected: cell(expected_col),
            sql,
        });
    }
    Ok(cases)
}

/// Takes the first matching statement only; a steps cell holding
/// several statements loses everything after the first terminator.
fn extract_sql(steps: Option<&str>, statement: &Regex) -> Option<String> {
    let steps = steps?;
    statement.find(steps).map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Regex {
        Regex::new(SQL_PATTERN).unwrap()
    }

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn extracts_statement_up_to_terminator() {
        let steps = "Выполнить запрос: INSERT INTO FOOD VALUES (1); проверить вывод";
        assert_eq!(
            extract_sql(Some(steps), &pattern()),
            Some("INSERT INTO FOOD VALUES (1);".to_string())
        );
    }

    #[test]
    fn extraction_is_case_insensitive_and_spans_lines() {
        let steps = "шаг 1\nselect *\nfrom food;\nшаг 2";
        assert_eq!(
            extract_sql(Some(steps), &pattern()),
            Some("select *\nfrom food;".to_string())
        );
    }

    #[test]
    fn only_the_first_statement_is_taken() {
        let steps = "DELETE FROM FOOD; DROP TABLE FOOD;";
        assert_eq!(
            extract_sql(Some(steps), &pattern()),
            Some("DELETE FROM FOOD;".to_string())
        );
    }

    #[test]
    fn no_keyword_means_no_statement() {
        assert_eq!(extract_sql(Some("открыть консоль"), &pattern()), None);
        assert_eq!(extract_sql(None, &pattern()), None);
    }

    #[test]
    fn extraction_is_deterministic() {
        let steps = "UPDATE FOOD SET FOOD_NAME = 'x'; и ещё раз SELECT 1;";
        let first = extract_sql(Some(steps), &pattern());
        assert_eq!(first, extract_sql(Some(steps), &pattern()));
        assert_eq!(first, Some("UPDATE FOOD SET FOOD_NAME = 'x';".to_string()));
    }

    #[test]
    fn parses_columns_by_header_name_in_any_order() {
        let sheet = "Название,ID,Шаги,Ожидаемый результат,Тестовые данные\n\
                     Список,7,SELECT * FROM FOOD;,Список товаров,нет\n";
        let cases = parse_cases(reader(sheet)).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].id.as_deref(), Some("7"));
        assert_eq!(cases[0].name.as_deref(), Some("Список"));
        assert_eq!(cases[0].sql, "SELECT * FROM FOOD;");
        assert_eq!(cases[0].expected.as_deref(), Some("Список товаров"));
        assert_eq!(cases[0].test_data.as_deref(), Some("нет"));
    }

    #[test]
    fn missing_columns_leave_fields_empty() {
        let sheet = "ID,Шаги\n1,SELECT 1;\n";
        let cases = parse_cases(reader(sheet)).unwrap();
        assert_eq!(cases[0].name, None);
        assert_eq!(cases[0].expected, None);
        assert_eq!(cases[0].test_data, None);
        assert_eq!(cases[0].sql, "SELECT 1;");
    }

    #[test]
    fn unextractable_steps_yield_an_empty_statement() {
        let sheet = "ID,Шаги\n1,никакого запроса здесь нет\n";
        let cases = parse_cases(reader(sheet)).unwrap();
        assert_eq!(cases[0].sql, "");
    }

    #[test]
    fn rereading_yields_the_same_sequence() {
        let sheet = "ID,Шаги\n1,SELECT 1;\n2,SELECT 2;\n";
        let first: Vec<String> = parse_cases(reader(sheet))
            .unwrap()
            .into_iter()
            .map(|c| c.sql)
            .collect();
        let second: Vec<String> = parse_cases(reader(sheet))
            .unwrap()
            .into_iter()
            .map(|c| c.sql)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["SELECT 1;", "SELECT 2;"]);
    }
}
