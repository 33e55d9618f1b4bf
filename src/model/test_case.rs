/// One row of the case sheet.
///
/// Built once by the source, read-only afterwards. Absent cells stay
/// `None` and are never validated.
pub struct TestCase {
    pub id: Option<String>,

    pub name: Option<String>,

    pub steps: Option<String>,
    pub test_data: Option<String>,
    pub expected: Option<String>,

    /// Statement dug out of `steps`; empty when extraction failed.
    pub sql: String,
}
