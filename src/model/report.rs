/// What running one statement produced.
pub struct ExecutionResult {
    pub had_error: bool,

    /// Rendered row set, `Affected N row(s).`, or the error text.
    pub description: String,
}

/// Everything the presentation layer needs about one finished case.
///
/// Lives from the end of the case's iteration until it is rendered,
/// then dropped.
pub struct CaseReport {
    pub id: Option<String>,
    pub name: Option<String>,
    pub sql: String,
    pub steps: Option<String>,
    pub test_data: Option<String>,
    pub expected: Option<String>,

    /// Expected outcome and actual outcome disagree.
    pub mismatch: bool,

    pub execution_result: String,
    pub created_rows: String,
    pub cleanup: String,
}
