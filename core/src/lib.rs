pub mod api;
pub mod cli;
pub mod error;
pub mod grading;
pub mod pacs;
pub mod types;

pub use api::{
    apply_replacements, fetch_instance_info, save_instance_info, student_study_uid,
    ReplacementPlan, RetrievedStudy,
};
pub use cli::report::TextReport;
pub use error::{GradeError, Result};
pub use grading::{
    load_submission, AnswerComparator, AnswerKey, FieldVerdict, GradeReport, NullFieldPolicy,
};
pub use pacs::{DirectoryPacs, ModificationRequest, ModificationTarget, PacsCapability};
pub use types::*;
