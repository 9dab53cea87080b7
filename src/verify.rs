use crate::normalize::{normalize, normalize_opt};
use crate::suite::TestCase;

/// Compares normalized output with normalized expectation
///
/// Exact string equality after [`normalize`]: no partial credit, no numeric
/// tolerance. Two empty texts compare equal.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize(actual) == normalize(expected)
}

/// Records `actual_output` on the case and sets its pass flag
///
/// The raw text is stored for display; only the comparison is normalized.
/// A missing output is compared as empty.
pub fn evaluate(case: &mut TestCase, actual_output: Option<&str>) -> bool {
    let passed = normalize_opt(actual_output) == normalize(case.expected_output());
    case.actual_output = Some(actual_output.unwrap_or_default().to_string());
    case.passed = passed;
    case.error_message = None;
    passed
}

/// Records a failed execution on the case
pub fn record_failure(case: &mut TestCase, message: impl Into<String>) {
    case.actual_output = Some(String::new());
    case.passed = false;
    case.error_message = Some(message.into());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_ending_style_is_ignored() {
        let mut case = TestCase::new("", "5\r\n");
        assert!(evaluate(&mut case, Some("5\n")));
        assert_eq!(case.actual_output.as_deref(), Some("5\n"));
    }

    #[test]
    fn test_mismatch_fails() {
        let mut case = TestCase::new("3 4", "7");
        assert!(!evaluate(&mut case, Some("8")));
        assert!(!case.passed);
        assert!(!outputs_match("7.0", "7"));
        assert!(!outputs_match("1 2", "1  2"));
    }

    #[test]
    fn test_empty_versus_empty_passes() {
        let mut case = TestCase::new("", "");
        assert!(evaluate(&mut case, None));
        assert_eq!(case.actual_output.as_deref(), Some(""));
    }

    #[test]
    fn test_evaluate_is_deterministic_and_overwrites() {
        let mut case = TestCase::new("x", "ok");
        for _ in 0..3 {
            assert!(evaluate(&mut case, Some(" ok ")));
        }
        assert!(!evaluate(&mut case, Some("nope")));
        assert_eq!(case.actual_output.as_deref(), Some("nope"));
    }

    #[test]
    fn test_failure_is_recorded() {
        let mut case = TestCase::new("x", "ok");
        record_failure(&mut case, "failed to start");
        assert!(!case.passed);
        assert_eq!(case.error_message.as_deref(), Some("failed to start"));
        assert!(case.actual_output.is_some());

        assert!(evaluate(&mut case, Some("ok")));
        assert!(case.error_message.is_none());
    }
}
