//! High-level retrieval and modification flows
//!
//! Ties the capability interface together into the two operations the
//! homework scripts perform: assembling an [`InstanceInfo`] answer record
//! for one study instance, and pushing anonymization-style tag
//! replacements back to the store.

use crate::error::{GradeError, Result};
use crate::pacs::{ModificationRequest, ModificationTarget, PacsCapability};
use crate::types::{Instance, InstanceInfo, JobHandle, Patient, Series, Study, StudyInfo};
use chrono::{Local, NaiveDate};
use log::info;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::OnceLock;

/// Everything retrieved for one instance lookup
///
/// The handles are kept alongside the answer record so callers can issue
/// follow-up modification requests against the same resources.
#[derive(Debug, Clone)]
pub struct RetrievedStudy {
    pub info: InstanceInfo,
    pub patient: Patient,
    pub study: Study,
    pub series: Series,
    pub instance: Instance,
}

/// Retrieves the answer record for a patient study instance
///
/// Looks up the patient, takes their first study, selects the series with
/// the requested SeriesNumber and the instance with the requested
/// InstanceNumber, and assembles the 13 answer fields including pixel
/// statistics. An unknown patient ID yields `Ok(None)`; a missing series
/// or instance within a found study is an error.
pub fn fetch_instance_info<P: PacsCapability>(
    pacs: &P,
    patient_id: &str,
    series_number: i32,
    instance_number: i32,
) -> Result<Option<RetrievedStudy>> {
    let patient = match pacs.find_patient(patient_id)? {
        Some(patient) => patient,
        None => return Ok(None),
    };

    let studies = pacs.studies(&patient)?;
    let study = studies
        .into_iter()
        .next()
        .ok_or_else(|| GradeError::PatientNotFound(format!("{} has no studies", patient_id)))?;
    let study_info = StudyInfo {
        study_instance_uid: study
            .tag("StudyInstanceUID")
            .unwrap_or_default()
            .to_string(),
        description: study.tag("StudyDescription").map(str::to_string),
        num_series: 0,
    };

    let all_series = pacs.series(&study)?;
    let num_series = all_series.len();
    let series = all_series
        .into_iter()
        .find(|s| s.series_number() == Some(series_number))
        .ok_or_else(|| {
            GradeError::SeriesNotFound(format!(
                "no series numbered {} in study {}",
                series_number, study_info.study_instance_uid
            ))
        })?;

    let instance = pacs
        .instances(&series)?
        .into_iter()
        .find(|i| i.instance_number() == Some(instance_number))
        .ok_or_else(|| {
            GradeError::InstanceNotFound(format!(
                "no instance numbered {} in series {}",
                instance_number, series.id
            ))
        })?;

    let stats = pacs.pixel_stats(&instance)?;
    let age = patient_age(&patient, Local::now().date_naive());

    let info = InstanceInfo {
        age,
        sex: patient.tag("PatientSex").unwrap_or_default().to_string(),
        study_description: study_info.description.clone(),
        modality: series.tag("Modality").unwrap_or_default().to_string(),
        manufacturer: series.tag("Manufacturer").unwrap_or_default().to_string(),
        patient_id: patient.tag("PatientID").unwrap_or(patient_id).to_string(),
        num_series,
        study_instance_uid: study_info.study_instance_uid.clone(),
        num_rows: stats.rows,
        num_cols: stats.cols,
        min_pixel_val: stats.min,
        max_pixel_val: stats.max,
        mean_pixel_val: stats.mean,
    };

    Ok(Some(RetrievedStudy {
        info,
        patient,
        study,
        series,
        instance,
    }))
}

/// Computes the patient's age string for the answer record
///
/// Prefers the years elapsed since PatientBirthDate; when the birth date
/// is absent or unparseable, falls back to the PatientAge tag (DICOM AS,
/// e.g. `045Y`).
fn patient_age(patient: &Patient, today: NaiveDate) -> String {
    if let Some(birth) = patient
        .tag("PatientBirthDate")
        .and_then(parse_dicom_date)
    {
        return calculate_age(birth, today).to_string();
    }
    patient
        .tag("PatientAge")
        .and_then(parse_age_string)
        .map(|years| years.to_string())
        .unwrap_or_default()
}

/// Calculates age in whole years at `today` for the given birth date
pub fn calculate_age(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    today.years_since(birth_date).unwrap_or(0) as i32
}

/// Parses a DICOM DA value (`YYYYMMDD`)
pub fn parse_dicom_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d").ok()
}

/// Parses a DICOM AS value (`045Y`, `030M`, ...) into whole years
pub fn parse_age_string(s: &str) -> Option<i32> {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| {
        Regex::new(r"^(\d+)([DWMY])?$").expect("Failed to compile regex")
    });
    let captures = re.captures(s.trim())?;
    let amount: i32 = captures.get(1)?.as_str().parse().ok()?;
    let years = match captures.get(2).map(|m| m.as_str()) {
        Some("D") => amount / 365,
        Some("W") => amount / 52,
        Some("M") => amount / 12,
        _ => amount,
    };
    Some(years)
}

/// Saves an answer record to a JSON file with 2-space indentation
pub fn save_instance_info<P: AsRef<Path>>(info: &InstanceInfo, savepath: P) -> Result<()> {
    let savepath = savepath.as_ref();
    let file = File::create(savepath)?;
    serde_json::to_writer_pretty(BufWriter::new(file), info)?;
    info!("Saved instance info to {}", savepath.display());
    Ok(())
}

/// Tag replacements for each level of the hierarchy
#[derive(Debug, Clone, Default)]
pub struct ReplacementPlan {
    pub patient_replace: BTreeMap<String, String>,
    pub study_replace: BTreeMap<String, String>,
    pub series_replace: BTreeMap<String, String>,
    pub force: bool,
    pub keep_source: bool,
}

/// Submits the plan's non-empty replacement sets to the store
///
/// Series replacements go first, then study, then patient, so broader
/// rewrites land last. Levels with an empty replacement map are skipped.
pub fn apply_replacements<P: PacsCapability>(
    pacs: &P,
    patient: &Patient,
    study: &Study,
    series: &Series,
    plan: &ReplacementPlan,
) -> Result<Vec<JobHandle>> {
    let mut jobs = Vec::new();
    let levels = [
        (
            ModificationTarget::Series(series.id.clone()),
            &plan.series_replace,
        ),
        (
            ModificationTarget::Study(study.id.clone()),
            &plan.study_replace,
        ),
        (
            ModificationTarget::Patient(patient.id.clone()),
            &plan.patient_replace,
        ),
    ];
    for (target, replace) in levels {
        if replace.is_empty() {
            continue;
        }
        let request = ModificationRequest {
            replace: replace.clone(),
            force: plan.force,
            keep_source: plan.keep_source,
        };
        jobs.push(pacs.submit_modification(&target, &request)?);
    }
    Ok(jobs)
}

/// Rewrites the leading digits of a StudyInstanceUID with a student ID
///
/// The anonymized UID keeps the original's first `len(student_id)`
/// characters' worth of positions but fills them from the student ID, as
/// the assignment hand-out prescribes.
pub fn student_study_uid(original: &str, student_id: u32) -> Result<String> {
    let id = student_id.to_string();
    if original.len() < id.len() {
        return Err(GradeError::InvalidValue(format!(
            "StudyInstanceUID {} shorter than student ID",
            original
        )));
    }
    Ok(format!("{}{}", &original[..id.len()], id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PixelStats, TagMap};
    use std::cell::RefCell;

    /// In-memory store with a single patient/study/series/instance chain
    struct FakePacs {
        patient_id: String,
        submitted: RefCell<Vec<(ModificationTarget, ModificationRequest)>>,
    }

    impl FakePacs {
        fn new(patient_id: &str) -> Self {
            Self {
                patient_id: patient_id.to_string(),
                submitted: RefCell::new(Vec::new()),
            }
        }
    }

    impl PacsCapability for FakePacs {
        fn find_patient(&self, patient_id: &str) -> Result<Option<Patient>> {
            if patient_id != self.patient_id {
                return Ok(None);
            }
            let mut tags = TagMap::new();
            tags.insert("PatientID".to_string(), patient_id.to_string());
            tags.insert("PatientSex".to_string(), "F".to_string());
            tags.insert("PatientBirthDate".to_string(), "19600102".to_string());
            Ok(Some(Patient {
                id: patient_id.to_string(),
                tags,
            }))
        }

        fn studies(&self, _patient: &Patient) -> Result<Vec<Study>> {
            let mut tags = TagMap::new();
            tags.insert("StudyInstanceUID".to_string(), "1.2.3".to_string());
            tags.insert(
                "StudyDescription".to_string(),
                "CT ABD PELVIS".to_string(),
            );
            Ok(vec![Study {
                id: "1.2.3".to_string(),
                tags,
            }])
        }

        fn series(&self, _study: &Study) -> Result<Vec<Series>> {
            let mut tags = TagMap::new();
            tags.insert("SeriesInstanceUID".to_string(), "1.2.3.1".to_string());
            tags.insert("SeriesNumber".to_string(), "4".to_string());
            tags.insert("Modality".to_string(), "CT".to_string());
            tags.insert("Manufacturer".to_string(), "TOSHIBA".to_string());
            Ok(vec![Series {
                id: "1.2.3.1".to_string(),
                tags,
            }])
        }

        fn instances(&self, _series: &Series) -> Result<Vec<Instance>> {
            let mut tags = TagMap::new();
            tags.insert("SOPInstanceUID".to_string(), "1.2.3.1.1".to_string());
            tags.insert("InstanceNumber".to_string(), "130".to_string());
            Ok(vec![Instance {
                id: "1.2.3.1.1".to_string(),
                tags,
            }])
        }

        fn pixel_stats(&self, _instance: &Instance) -> Result<PixelStats> {
            Ok(PixelStats {
                rows: 512,
                cols: 512,
                min: -2048.0,
                max: 1863.0,
                mean: -929.0,
            })
        }

        fn submit_modification(
            &self,
            target: &ModificationTarget,
            request: &ModificationRequest,
        ) -> Result<JobHandle> {
            self.submitted
                .borrow_mut()
                .push((target.clone(), request.clone()));
            Ok(JobHandle {
                id: format!("modify-{}", target.id()),
                state: crate::types::JobState::Completed,
            })
        }
    }

    #[test]
    fn test_fetch_instance_info() {
        let pacs = FakePacs::new("A034518");
        let retrieved = fetch_instance_info(&pacs, "A034518", 4, 130)
            .unwrap()
            .unwrap();

        assert_eq!(retrieved.info.patient_id, "A034518");
        assert_eq!(retrieved.info.sex, "F");
        assert_eq!(retrieved.info.modality, "CT");
        assert_eq!(retrieved.info.manufacturer, "TOSHIBA");
        assert_eq!(retrieved.info.num_series, 1);
        assert_eq!(retrieved.info.study_instance_uid, "1.2.3");
        assert_eq!(retrieved.info.num_rows, 512);
        assert_eq!(retrieved.info.min_pixel_val, -2048.0);
        assert!(!retrieved.info.age.is_empty());
    }

    #[test]
    fn test_fetch_unknown_patient_is_none() {
        let pacs = FakePacs::new("A034518");
        assert!(fetch_instance_info(&pacs, "NOBODY", 4, 130)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_fetch_missing_series_is_error() {
        let pacs = FakePacs::new("A034518");
        assert!(fetch_instance_info(&pacs, "A034518", 99, 130).is_err());
    }

    #[test]
    fn test_fetch_missing_instance_is_error() {
        let pacs = FakePacs::new("A034518");
        assert!(fetch_instance_info(&pacs, "A034518", 4, 999).is_err());
    }

    #[test]
    fn test_apply_replacements_order_and_skip() {
        let pacs = FakePacs::new("A034518");
        let retrieved = fetch_instance_info(&pacs, "A034518", 4, 130)
            .unwrap()
            .unwrap();

        let mut plan = ReplacementPlan {
            force: true,
            keep_source: true,
            ..Default::default()
        };
        plan.patient_replace
            .insert("PatientSex".to_string(), "O".to_string());
        plan.study_replace
            .insert("StudyDate".to_string(), "20221231".to_string());
        // series_replace left empty and must be skipped

        let jobs = apply_replacements(
            &pacs,
            &retrieved.patient,
            &retrieved.study,
            &retrieved.series,
            &plan,
        )
        .unwrap();
        assert_eq!(jobs.len(), 2);

        let submitted = pacs.submitted.borrow();
        assert!(matches!(submitted[0].0, ModificationTarget::Study(_)));
        assert!(matches!(submitted[1].0, ModificationTarget::Patient(_)));
        assert!(submitted[0].1.force);
    }

    #[test]
    fn test_calculate_age() {
        let birth = NaiveDate::from_ymd_opt(1960, 1, 2).unwrap();
        let before_birthday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let after_birthday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(calculate_age(birth, before_birthday), 63);
        assert_eq!(calculate_age(birth, after_birthday), 64);
    }

    #[test]
    fn test_parse_dicom_date() {
        assert_eq!(
            parse_dicom_date("19600102"),
            NaiveDate::from_ymd_opt(1960, 1, 2)
        );
        assert_eq!(parse_dicom_date("not a date"), None);
    }

    #[test]
    fn test_parse_age_string() {
        assert_eq!(parse_age_string("045Y"), Some(45));
        assert_eq!(parse_age_string("18M"), Some(1));
        assert_eq!(parse_age_string("62"), Some(62));
        assert_eq!(parse_age_string("Y045"), None);
    }

    #[test]
    fn test_student_study_uid() {
        let original = "1.3.6.1.4.1.14519.5.2.1.99.1071.28052166218470275068707230421869";
        let rewritten = student_study_uid(original, 12345678).unwrap();
        assert!(rewritten.starts_with("1.3.6.1."));
        assert!(rewritten.ends_with("12345678"));
        assert_eq!(rewritten.len(), 16);

        assert!(student_study_uid("1.2", 12345678).is_err());
    }

    #[test]
    fn test_save_instance_info() {
        let pacs = FakePacs::new("A034518");
        let retrieved = fetch_instance_info(&pacs, "A034518", 4, 130)
            .unwrap()
            .unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("study_info.json");
        save_instance_info(&retrieved.info, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["PatientID"], "A034518");
        assert_eq!(value["NumRows"], 512);
    }
}
