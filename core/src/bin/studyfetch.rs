use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process;
use studygrade_core::{
    apply_replacements, fetch_instance_info, save_instance_info, student_study_uid,
    DirectoryPacs, PacsCapability, ReplacementPlan,
};

/// Instructor tool: retrieve the answer record for the assignment's study
/// and push the anonymization rewrite back to the store
#[derive(Parser, Debug)]
#[command(name = "studyfetch")]
#[command(about = "Retrieve study info from a DICOM directory and anonymize the second study")]
#[command(version)]
struct Cli {
    /// Directory containing the DICOM files
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// 8-digit student ID woven into the anonymized identifiers
    #[arg(long)]
    student_id: u32,

    /// Patient to retrieve the answer record for
    #[arg(long, default_value = "A034518")]
    patient_id: String,

    /// Series number of the graded instance
    #[arg(long, default_value_t = 4)]
    series_number: i32,

    /// Instance number of the graded instance
    #[arg(long, default_value_t = 130)]
    instance_number: i32,

    /// Where to save the retrieved study info
    #[arg(short, long, default_value = "study_info.json")]
    output: PathBuf,

    /// Patient whose study receives the anonymization rewrite
    #[arg(long, default_value = "3142537564")]
    modify_patient_id: String,

    /// Skip the modification step
    #[arg(long)]
    no_modify: bool,

    /// Overwrite original files instead of writing modified copies
    #[arg(long)]
    discard_source: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    if !(10000000..=99999999).contains(&cli.student_id) {
        eprintln!("Error: student ID must be an 8-digit number");
        process::exit(1);
    }

    let pacs = match DirectoryPacs::open(&cli.directory) {
        Ok(pacs) => pacs,
        Err(e) => {
            error!("Failed to open store: {}", e);
            eprintln!("Error: failed to open {}: {}", cli.directory.display(), e);
            process::exit(1);
        }
    };

    // Retrieve the requested information about the existing study and
    // save the answer record.
    let retrieved = match fetch_instance_info(
        &pacs,
        &cli.patient_id,
        cli.series_number,
        cli.instance_number,
    ) {
        Ok(Some(retrieved)) => retrieved,
        Ok(None) => {
            eprintln!("Error: patient {} not found", cli.patient_id);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: query for {} failed: {}", cli.patient_id, e);
            process::exit(1);
        }
    };

    if let Err(e) = save_instance_info(&retrieved.info, &cli.output) {
        eprintln!("Error: failed to save {}: {}", cli.output.display(), e);
        process::exit(1);
    }

    if cli.no_modify {
        info!("Done!");
        return;
    }

    if let Err(e) = anonymize_second_study(&pacs, &cli) {
        eprintln!(
            "Error: modification for {} failed: {}",
            cli.modify_patient_id, e
        );
        process::exit(1);
    }
    info!("Done!");
}

/// Rewrites identifying metadata on the second patient's study
fn anonymize_second_study(pacs: &DirectoryPacs, cli: &Cli) -> studygrade_core::Result<()> {
    let patient = pacs
        .find_patient(&cli.modify_patient_id)?
        .ok_or_else(|| {
            studygrade_core::GradeError::PatientNotFound(cli.modify_patient_id.clone())
        })?;
    let study = pacs.studies(&patient)?.into_iter().next().ok_or_else(|| {
        studygrade_core::GradeError::PatientNotFound(format!(
            "{} has no studies",
            cli.modify_patient_id
        ))
    })?;
    let series = pacs.series(&study)?.into_iter().next().ok_or_else(|| {
        studygrade_core::GradeError::SeriesNotFound(format!("study {} has no series", study.id))
    })?;

    let new_study_uid = student_study_uid(&study.id, cli.student_id)?;

    let mut plan = ReplacementPlan {
        force: true,
        keep_source: !cli.discard_source,
        ..Default::default()
    };
    plan.patient_replace
        .insert("PatientSex".to_string(), "O".to_string());
    plan.patient_replace
        .insert("PatientID".to_string(), "8675309".to_string());
    plan.study_replace.insert(
        "AccessionNumber".to_string(),
        format!("EAS5850-{}", cli.student_id),
    );
    plan.study_replace
        .insert("StudyInstanceUID".to_string(), new_study_uid);
    plan.study_replace
        .insert("StudyDate".to_string(), "20221231".to_string());
    plan.study_replace.insert(
        "ReferringPhysicianName".to_string(),
        "Doctor^Spock".to_string(),
    );

    let jobs = apply_replacements(pacs, &patient, &study, &series, &plan)?;
    info!("Submitted {} modification job(s)", jobs.len());
    Ok(())
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
