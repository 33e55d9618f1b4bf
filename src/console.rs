//! Console rendering of case reports. Mismatched cases go out in red.

use chrono::Local;
use owo_colors::OwoColorize;

use crate::model::CaseReport;

const FRAME: &str = "========================";
const RULE: &str = "-----------------------------";

pub struct Console {
    color: bool,
}

impl Console {
    pub fn new(color: bool) -> Console {
        Console { color }
    }

    /// Run header, before the first case.
    pub fn run_header(&self, case_count: usize) {
        let line = format!(
            "Found {} case(s), run started {}",
            case_count,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        if self.color {
            println!("{}", line.magenta());
        } else {
            println!("{}", line);
        }
    }

    /// One finished case, as a delimited block.
    pub fn case(&self, report: &CaseReport) {
        println!();
        println!("{}", self.frame_line(report.mismatch, FRAME));
        self.field(report.mismatch, "ID", optional(&report.id));
        self.field(report.mismatch, "Name", optional(&report.name));
        let sql = if report.sql.is_empty() {
            "<empty>"
        } else {
            report.sql.as_str()
        };
        self.field(report.mismatch, "SQL", sql);
        self.field(report.mismatch, "Steps", optional(&report.steps));
        self.field(report.mismatch, "Test data", optional(&report.test_data));
        self.field(report.mismatch, "Expected", optional(&report.expected));
        println!("{}", self.frame_line(report.mismatch, RULE));

        println!("\n{}", self.bold("Actual result:"));
        println!("{}", report.execution_result);

        println!("\n{}", self.bold("Created rows:"));
        println!("{}", report.created_rows);

        println!("\n{}", self.bold("Cleanup:"));
        println!("{}", report.cleanup);
        println!("{}", FRAME);
    }

    /// Field line; the whole line turns red when the case mismatched.
    fn field(&self, mismatch: bool, label: &str, value: &str) {
        let label = format!("{}:", label);
        if mismatch {
            println!("{} {}", self.bold_red(&label), self.red(value));
        } else {
            println!("{} {}", self.bold(&label), value);
        }
    }

    fn frame_line(&self, mismatch: bool, line: &str) -> String {
        if mismatch {
            self.red(line)
        } else {
            line.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn bold_red(&self, text: &str) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }
}

fn optional(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("NULL")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_mode_adds_no_escape_codes() {
        let console = Console::new(false);
        assert_eq!(console.bold("x"), "x");
        assert_eq!(console.red("x"), "x");
        assert_eq!(console.bold_red("x"), "x");
    }

    #[test]
    fn color_mode_wraps_in_escape_codes() {
        let console = Console::new(true);
        assert!(console.bold("x").contains('\u{1b}'));
        assert!(console.red("x").contains("31"));
    }

    #[test]
    fn absent_fields_render_as_null() {
        assert_eq!(optional(&None), "NULL");
        assert_eq!(optional(&Some("x".to_string())), "x");
    }
}
