use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local};

/// Separator between input and expected output in suite definition text
pub const CASE_SEPARATOR: &str = "==>";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One (input, expected output) pair plus the outcome of its latest execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    input: String,
    expected_output: String,
    pub actual_output: Option<String>,
    pub passed: bool,
    pub error_message: Option<String>,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
            actual_output: None,
            passed: false,
            error_message: None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    /// Clears the outcome of the previous run
    pub fn reset(&mut self) {
        self.actual_output = None;
        self.passed = false;
        self.error_message = None;
    }

    /// Renders the case as one suite definition line, text taken literally
    pub fn to_definition_line(&self) -> String {
        format!("{} {CASE_SEPARATOR} {}", self.input, self.expected_output)
    }
}

/// Outcome of one submission in one suite run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramResult {
    pub program_name: String,
    pub compiled: bool,
    pub passed: usize,
    pub failed: usize,
}

impl ProgramResult {
    pub fn pass_percentage(&self) -> f64 {
        percentage(self.passed, self.failed)
    }
}

#[derive(Debug, Clone)]
pub struct TestSuite {
    name: String,
    pub description: String,
    cases: Vec<TestCase>,
    created: DateTime<Local>,
    pub last_run: Option<DateTime<Local>>,
    passed_count: usize,
    failed_count: usize,
    program_results: BTreeMap<String, ProgramResult>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_cases(name, Vec::new())
    }

    pub fn with_cases(name: impl Into<String>, cases: Vec<TestCase>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            cases,
            created: Local::now(),
            last_run: None,
            passed_count: 0,
            failed_count: 0,
            program_results: BTreeMap::new(),
        }
    }

    /// Parses suite definition text: one `input ==> expected` case per line
    ///
    /// Blank lines, `#` comments and lines without the separator are skipped.
    /// Both sides are trimmed and otherwise kept verbatim, backslashes included.
    pub fn from_definition(name: impl Into<String>, text: &str) -> Self {
        let cases = text
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    return None;
                }
                let (input, expected) = trimmed.split_once(CASE_SEPARATOR)?;
                Some(TestCase::new(input.trim(), expected.trim()))
            })
            .collect();
        Self::with_cases(name, cases)
    }

    /// Serializes the cases back into suite definition text
    pub fn to_definition(&self) -> String {
        self.cases
            .iter()
            .map(|case| case.to_definition_line() + "\n")
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created(&self) -> DateTime<Local> {
        self.created
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn cases_mut(&mut self) -> &mut [TestCase] {
        &mut self.cases
    }

    pub fn add_case(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    /// Replaces the case at `index`; the previous outcome is discarded with it
    pub fn replace_case(&mut self, index: usize, case: TestCase) -> bool {
        match self.cases.get_mut(index) {
            Some(slot) => {
                *slot = case;
                true
            }
            None => false,
        }
    }

    pub fn remove_case(&mut self, index: usize) -> Option<TestCase> {
        (index < self.cases.len()).then(|| self.cases.remove(index))
    }

    /// Removes the first case with the given payload
    pub fn remove_matching(&mut self, input: &str, expected_output: &str) -> bool {
        let position = self
            .cases
            .iter()
            .position(|c| c.input == input && c.expected_output == expected_output);
        position.map(|idx| self.cases.remove(idx)).is_some()
    }

    pub fn total_count(&self) -> usize {
        self.cases.len()
    }

    pub fn passed_count(&self) -> usize {
        self.passed_count
    }

    pub fn failed_count(&self) -> usize {
        self.failed_count
    }

    /// Recounts pass/fail over the cases that hold an actual output
    pub fn update_statistics(&mut self) {
        let executed = self.cases.iter().filter(|c| c.actual_output.is_some());
        let (passed, failed): (Vec<_>, Vec<_>) = executed.partition(|c| c.passed);
        self.passed_count = passed.len();
        self.failed_count = failed.len();
    }

    pub fn reset_all_test_cases(&mut self) {
        self.cases.iter_mut().for_each(TestCase::reset);
        self.passed_count = 0;
        self.failed_count = 0;
        self.last_run = None;
        self.program_results.clear();
    }

    pub fn pass_percentage(&self) -> f64 {
        percentage(self.passed_count, self.failed_count)
    }

    pub fn all_tests_passed(&self) -> bool {
        self.failed_count == 0 && self.passed_count == self.cases.len()
    }

    pub fn store_program_result(&mut self, result: ProgramResult) {
        self.program_results
            .insert(result.program_name.clone(), result);
    }

    pub fn program_results(&self) -> &BTreeMap<String, ProgramResult> {
        &self.program_results
    }

    /// Multi-line summary with statistics
    pub fn to_detailed_string(&self) -> String {
        let mut out = format!("Test Suite: {}\n", self.name);
        if !self.description.is_empty() {
            out.push_str(&format!("Description: {}\n", self.description));
        }
        out.push_str(&format!("Total Test Cases: {}\n", self.total_count()));
        if let Some(last_run) = self.last_run {
            out.push_str(&format!("Last Run: {}\n", last_run.format(DATE_FORMAT)));
            out.push_str(&format!("Passed: {}\n", self.passed_count));
            out.push_str(&format!("Failed: {}\n", self.failed_count));
            out.push_str(&format!("Pass Rate: {:.1}%\n", self.pass_percentage()));
        }
        out.push_str(&format!("Created: {}\n", self.created.format(DATE_FORMAT)));
        out
    }
}

impl fmt::Display for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TestSuite{{{}, cases={}}}", self.name, self.cases.len())
    }
}

fn percentage(passed: usize, failed: usize) -> f64 {
    let total = passed + failed;
    if total == 0 {
        return 0.0;
    }
    passed as f64 * 100.0 / total as f64
}
