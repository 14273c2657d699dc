use clap::Parser;
use log::debug;
use serde_json::Map;
use std::process;
use studygrade_core::cli::{Cli, OutputFormat};
use studygrade_core::{load_submission, AnswerComparator, AnswerKey, TextReport};

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    let key = match &cli.answer_key {
        Some(path) => match AnswerKey::from_file(path) {
            Ok(key) => key,
            Err(e) => {
                eprintln!("Error: failed to load answer key: {}", e);
                process::exit(1);
            }
        },
        None => AnswerKey::homework_reference(),
    };
    let comparator =
        AnswerComparator::new(key, cli.case_sensitive, cli.null_policy.clone().into());

    // A missing or malformed submission earns no points but is never fatal
    let submission = match load_submission(&cli.submission) {
        Some(submission) => submission,
        None => {
            debug!("{} is not a valid JSON file", cli.submission.display());
            Map::new()
        }
    };

    let report = comparator.grade(&submission);
    match cli.format {
        OutputFormat::Score => println!("{}", report.score),
        OutputFormat::Text => println!("{}", TextReport::new(&report)),
        OutputFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: failed to serialize report: {}", e);
                process::exit(1);
            }
        },
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}
