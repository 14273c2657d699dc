use crate::grading::{FieldVerdict, GradeReport};
use std::fmt;

/// Text report formatter for a grading run
pub struct TextReport<'a> {
    report: &'a GradeReport,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(report: &'a GradeReport) -> Self {
        Self { report }
    }
}

fn verdict_label(verdict: FieldVerdict) -> &'static str {
    match verdict {
        FieldVerdict::Match => "correct",
        FieldVerdict::Mismatch => "incorrect",
        FieldVerdict::SubmissionMissingKey => "missing from submission",
        FieldVerdict::ReferenceMissingKey => "missing from answer key",
        FieldVerdict::BothMissingKey => "missing from both",
    }
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grading Report")?;
        writeln!(f, "==============")?;
        writeln!(f)?;
        for grade in &self.report.verdicts {
            writeln!(f, "{:<20} {}", grade.field, verdict_label(grade.verdict))?;
        }
        writeln!(f)?;
        writeln!(f, "Score: {} / {}", self.report.score, self.report.max_score)?;
        Ok(())
    }
}
