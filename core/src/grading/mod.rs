//! Answer comparison for the imaging-study homework
//!
//! The grader diffs a student-submitted JSON object against a fixed
//! reference [`AnswerKey`], field by field. Every comparison yields a
//! [`FieldVerdict`]; the score is the number of `Match` verdicts over the
//! fields the reference key defines. Fields only the student supplies are
//! never graded.

pub mod key;

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub use key::AnswerKey;

/// Outcome of comparing a single field across submission and reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldVerdict {
    /// Values agree under the configured comparison rules
    Match,
    /// Both sides supplied a value but they disagree
    Mismatch,
    /// Only the submission lacks the field
    SubmissionMissingKey,
    /// Only the reference key lacks the field
    ReferenceMissingKey,
    /// Neither side has the field
    BothMissingKey,
}

impl FieldVerdict {
    /// Returns whether this verdict earns a point
    pub fn is_match(&self) -> bool {
        matches!(self, FieldVerdict::Match)
    }
}

/// How to grade a field whose reference value is JSON `null`
///
/// The shipped answer key encodes `"Age": null`. Compared literally, the
/// null renders as the string `None` and mismatches any concrete age, which
/// is almost certainly not what the key author intended ("any age
/// accepted"). Rather than silently change the key's semantics, the policy
/// is an explicit configuration choice; `Literal` reproduces the original
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullFieldPolicy {
    /// Compare the null's string form (`None`) like any other value
    #[default]
    Literal,
    /// Award a Match for any value the submission supplies
    AcceptAny,
}

/// A single graded field
#[derive(Debug, Clone, Serialize)]
pub struct FieldGrade {
    pub field: String,
    pub verdict: FieldVerdict,
}

/// Full result of grading one submission
#[derive(Debug, Clone, Serialize)]
pub struct GradeReport {
    pub verdicts: Vec<FieldGrade>,
    pub score: usize,
    pub max_score: usize,
}

/// Field-by-field comparator against a reference answer key
///
/// Holds the key and the comparison configuration; comparisons are pure
/// functions of the submission, the key, and that configuration.
#[derive(Debug, Clone)]
pub struct AnswerComparator {
    key: AnswerKey,
    case_sensitive: bool,
    null_policy: NullFieldPolicy,
}

impl AnswerComparator {
    /// Creates a comparator with the given key and configuration
    pub fn new(key: AnswerKey, case_sensitive: bool, null_policy: NullFieldPolicy) -> Self {
        Self {
            key,
            case_sensitive,
            null_policy,
        }
    }

    /// Creates a case-insensitive comparator with literal null handling
    ///
    /// This matches how the assignment was originally graded.
    pub fn with_key(key: AnswerKey) -> Self {
        Self::new(key, false, NullFieldPolicy::Literal)
    }

    /// Returns the reference key this comparator grades against
    pub fn key(&self) -> &AnswerKey {
        &self.key
    }

    /// Compares a single field of the submission against the reference key
    ///
    /// Missing keys on either side are modeled as verdicts, never as
    /// errors. Present values are coerced to their grading string form and
    /// compared, case-insensitively unless configured otherwise.
    pub fn compare_field(&self, submission: &Map<String, Value>, field: &str) -> FieldVerdict {
        let submitted = submission.get(field);
        let expected = self.key.get(field);

        match (submitted, expected) {
            (None, None) => FieldVerdict::BothMissingKey,
            (Some(_), None) => FieldVerdict::ReferenceMissingKey,
            (None, Some(_)) => FieldVerdict::SubmissionMissingKey,
            (Some(submitted), Some(expected)) => {
                if expected.is_null()
                    && matches!(self.null_policy, NullFieldPolicy::AcceptAny)
                {
                    return FieldVerdict::Match;
                }
                let mut submitted = grading_repr(submitted);
                let mut expected = grading_repr(expected);
                if !self.case_sensitive {
                    submitted = submitted.to_lowercase();
                    expected = expected.to_lowercase();
                }
                if submitted == expected {
                    FieldVerdict::Match
                } else {
                    FieldVerdict::Mismatch
                }
            }
        }
    }

    /// Grades every field the reference key defines
    ///
    /// Submission-only fields are ignored: the key determines the full set
    /// of graded fields.
    pub fn grade(&self, submission: &Map<String, Value>) -> GradeReport {
        let verdicts: Vec<FieldGrade> = self
            .key
            .fields()
            .map(|field| {
                let verdict = self.compare_field(submission, field);
                if !verdict.is_match() {
                    debug!("{:?} on grading {}", verdict, field);
                }
                FieldGrade {
                    field: field.to_string(),
                    verdict,
                }
            })
            .collect();
        let score = verdicts.iter().filter(|g| g.verdict.is_match()).count();
        GradeReport {
            verdicts,
            score,
            max_score: self.key.len(),
        }
    }

    /// Counts the fields graded as Match
    ///
    /// Bounded by the number of fields in the reference key.
    pub fn score(&self, submission: &Map<String, Value>) -> usize {
        self.grade(submission).score
    }
}

/// Coerces a JSON value to the string form the answer key was authored
/// against
///
/// The reference key predates this tool and uses the conventions of its
/// original authoring environment: null renders as `None` and booleans as
/// `True`/`False`. Numbers and strings render as themselves; composite
/// values fall back to their compact JSON form.
pub fn grading_repr(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads a student's answer file
///
/// Returns `None` when the file is missing, unreadable, or not a JSON
/// object. A broken submission must not abort the grading run; it simply
/// earns no points.
pub fn load_submission<P: AsRef<Path>>(path: P) -> Option<Map<String, Value>> {
    let path = path.as_ref();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("{} could not be read: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            debug!("{} is not a JSON object", path.display());
            None
        }
        Err(e) => {
            debug!("{} is not a valid JSON file: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn comparator(key: Value) -> AnswerComparator {
        AnswerComparator::with_key(AnswerKey::new(object(key)))
    }

    #[test]
    fn test_match_case_insensitive() {
        let cmp = comparator(json!({"Modality": "CT"}));
        let submission = object(json!({"Modality": "ct"}));
        assert_eq!(
            cmp.compare_field(&submission, "Modality"),
            FieldVerdict::Match
        );
    }

    #[test]
    fn test_mismatch_case_sensitive() {
        let key = AnswerKey::new(object(json!({"Modality": "CT"})));
        let cmp = AnswerComparator::new(key, true, NullFieldPolicy::Literal);
        let submission = object(json!({"Modality": "ct"}));
        assert_eq!(
            cmp.compare_field(&submission, "Modality"),
            FieldVerdict::Mismatch
        );
    }

    #[test]
    fn test_number_matches_string_form() {
        // Submitted "512" vs reference 512: both coerce to "512"
        let cmp = comparator(json!({"NumRows": 512}));
        let submission = object(json!({"NumRows": "512"}));
        assert_eq!(
            cmp.compare_field(&submission, "NumRows"),
            FieldVerdict::Match
        );
    }

    #[rstest]
    #[case(json!({}), json!({}), FieldVerdict::BothMissingKey)]
    #[case(json!({"f": 1}), json!({}), FieldVerdict::ReferenceMissingKey)]
    #[case(json!({}), json!({"f": 1}), FieldVerdict::SubmissionMissingKey)]
    #[case(json!({"f": 1}), json!({"f": 1}), FieldVerdict::Match)]
    #[case(json!({"f": 1}), json!({"f": 2}), FieldVerdict::Mismatch)]
    fn test_verdict_matrix(
        #[case] submission: Value,
        #[case] key: Value,
        #[case] expected: FieldVerdict,
    ) {
        let cmp = comparator(key);
        assert_eq!(cmp.compare_field(&object(submission), "f"), expected);
    }

    #[test]
    fn test_score_scenario_modality_rows() {
        let cmp = comparator(json!({"Modality": "CT", "NumRows": 512}));
        let submission = object(json!({"Modality": "ct", "NumRows": "512"}));
        assert_eq!(cmp.score(&submission), 2);
    }

    #[test]
    fn test_score_empty_submission() {
        let cmp = comparator(json!({"Modality": "CT"}));
        let submission = object(json!({}));
        assert_eq!(
            cmp.compare_field(&submission, "Modality"),
            FieldVerdict::SubmissionMissingKey
        );
        assert_eq!(cmp.score(&submission), 0);
    }

    #[test]
    fn test_score_ignores_submission_only_fields() {
        let cmp = comparator(json!({"Modality": "CT"}));
        let submission = object(json!({"Modality": "CT", "Extra": "ignored"}));
        assert_eq!(cmp.score(&submission), 1);
        assert_eq!(cmp.grade(&submission).max_score, 1);
    }

    #[test]
    fn test_score_bounded_and_monotonic() {
        let cmp = comparator(json!({"a": "1", "b": "2", "c": "3"}));
        let mut submission = object(json!({"a": "1"}));
        let before = cmp.score(&submission);
        assert!(before <= cmp.key().len());

        // Adding a correct field never decreases the score
        submission.insert("b".to_string(), json!("2"));
        let after = cmp.score(&submission);
        assert!(after >= before);
        assert_eq!(after, 2);
    }

    #[test]
    fn test_null_reference_literal_mismatch() {
        // "None" vs "45" under the literal policy
        let cmp = comparator(json!({"Age": null}));
        let submission = object(json!({"Age": "45"}));
        assert_eq!(cmp.compare_field(&submission, "Age"), FieldVerdict::Mismatch);
    }

    #[test]
    fn test_null_reference_literal_matches_null() {
        let cmp = comparator(json!({"Age": null}));
        let submission = object(json!({"Age": null}));
        assert_eq!(cmp.compare_field(&submission, "Age"), FieldVerdict::Match);
    }

    #[test]
    fn test_null_reference_accept_any() {
        let key = AnswerKey::new(object(json!({"Age": null})));
        let cmp = AnswerComparator::new(key, false, NullFieldPolicy::AcceptAny);
        let submission = object(json!({"Age": "45"}));
        assert_eq!(cmp.compare_field(&submission, "Age"), FieldVerdict::Match);

        // The field still has to be present
        let empty = object(json!({}));
        assert_eq!(
            cmp.compare_field(&empty, "Age"),
            FieldVerdict::SubmissionMissingKey
        );
    }

    #[test]
    fn test_grading_repr() {
        assert_eq!(grading_repr(&json!(null)), "None");
        assert_eq!(grading_repr(&json!(true)), "True");
        assert_eq!(grading_repr(&json!(false)), "False");
        assert_eq!(grading_repr(&json!(512)), "512");
        assert_eq!(grading_repr(&json!(-929)), "-929");
        assert_eq!(grading_repr(&json!("CT")), "CT");
    }

    #[test]
    fn test_load_submission_valid() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"Modality\": \"CT\"}}").unwrap();
        let submission = load_submission(file.path()).unwrap();
        assert_eq!(submission.get("Modality"), Some(&json!("CT")));
    }

    #[test]
    fn test_load_submission_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(load_submission(file.path()).is_none());
    }

    #[test]
    fn test_load_submission_non_object() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        assert!(load_submission(file.path()).is_none());
    }

    #[test]
    fn test_load_submission_missing_file() {
        assert!(load_submission("/nonexistent/answers.json").is_none());
    }

    #[test]
    fn test_malformed_submission_scores_zero() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{broken").unwrap();
        let cmp = comparator(json!({"Modality": "CT"}));
        let score = match load_submission(file.path()) {
            Some(submission) => cmp.score(&submission),
            None => 0,
        };
        assert_eq!(score, 0);
    }
}
