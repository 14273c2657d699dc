pub mod report;

use crate::grading::NullFieldPolicy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for studygrade
#[derive(Parser, Debug)]
#[command(name = "studygrade")]
#[command(about = "Autograder for the PACS imaging-study homework")]
#[command(version)]
pub struct Cli {
    /// Path to the student JSON answer file
    #[arg(value_name = "SUBMISSION")]
    pub submission: PathBuf,

    /// Grade against a JSON answer key instead of the built-in one
    #[arg(long, value_name = "FILE")]
    pub answer_key: Option<PathBuf>,

    /// Compare answers case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// How to grade fields whose reference value is null
    #[arg(long, default_value = "literal")]
    pub null_policy: NullPolicyArg,

    /// Output format
    #[arg(short, long, default_value = "score")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Just the integer score
    Score,
    /// Per-field verdict report
    Text,
    /// JSON report
    Json,
}

/// Null-reference grading policy options
#[derive(Debug, Clone, ValueEnum)]
pub enum NullPolicyArg {
    /// Compare the null's string form like any other value
    Literal,
    /// Award any present value for a null reference field
    AcceptAny,
}

impl From<NullPolicyArg> for NullFieldPolicy {
    fn from(arg: NullPolicyArg) -> Self {
        match arg {
            NullPolicyArg::Literal => NullFieldPolicy::Literal,
            NullPolicyArg::AcceptAny => NullFieldPolicy::AcceptAny,
        }
    }
}
