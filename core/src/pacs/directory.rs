//! File-backed implementation of the PACS capability interface
//!
//! Serves patients, studies, series, and instances from a flat directory
//! of DICOM files, grouping by PatientID, StudyInstanceUID, and
//! SeriesInstanceUID. Modification requests rewrite tags in the affected
//! files; with `keep_source` the rewritten copies land in a `modified/`
//! subdirectory and the originals stay untouched.

use crate::error::{GradeError, Result};
use crate::pacs::tags::{
    get_f64_value, get_string_value, get_u16_value, modifiable_tag, ACCESSION_NUMBER,
    BITS_ALLOCATED, COLUMNS, INSTANCE_NUMBER, MANUFACTURER, MODALITY, PATIENT_AGE,
    PATIENT_BIRTH_DATE, PATIENT_ID, PATIENT_NAME, PATIENT_SEX, PIXEL_DATA, PIXEL_REPRESENTATION,
    REFERRING_PHYSICIAN_NAME, RESCALE_INTERCEPT, RESCALE_SLOPE, ROWS, SERIES_DESCRIPTION,
    SERIES_INSTANCE_UID, SERIES_NUMBER, SOP_INSTANCE_UID, STUDY_DATE, STUDY_DESCRIPTION,
    STUDY_INSTANCE_UID,
};
use crate::pacs::{ModificationRequest, ModificationTarget, PacsCapability};
use crate::types::{
    Instance, JobHandle, JobState, Patient, PixelStats, Series, Study, TagMap,
};
use dicom_core::value::{PrimitiveValue, Value as DicomValue};
use dicom_core::{DataElement, Tag};
use dicom_object::{open_file, InMemDicomObject};
use log::{info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Keywords indexed for every instance at store construction
const INDEXED_KEYWORDS: &[(&str, Tag)] = &[
    ("PatientID", PATIENT_ID),
    ("PatientName", PATIENT_NAME),
    ("PatientSex", PATIENT_SEX),
    ("PatientBirthDate", PATIENT_BIRTH_DATE),
    ("PatientAge", PATIENT_AGE),
    ("StudyInstanceUID", STUDY_INSTANCE_UID),
    ("StudyDescription", STUDY_DESCRIPTION),
    ("StudyDate", STUDY_DATE),
    ("AccessionNumber", ACCESSION_NUMBER),
    ("ReferringPhysicianName", REFERRING_PHYSICIAN_NAME),
    ("SeriesInstanceUID", SERIES_INSTANCE_UID),
    ("SeriesNumber", SERIES_NUMBER),
    ("SeriesDescription", SERIES_DESCRIPTION),
    ("Modality", MODALITY),
    ("Manufacturer", MANUFACTURER),
    ("SOPInstanceUID", SOP_INSTANCE_UID),
    ("InstanceNumber", INSTANCE_NUMBER),
    ("Rows", ROWS),
    ("Columns", COLUMNS),
];

const PATIENT_KEYWORDS: &[&str] = &[
    "PatientID",
    "PatientName",
    "PatientSex",
    "PatientBirthDate",
    "PatientAge",
];

const STUDY_KEYWORDS: &[&str] = &[
    "StudyInstanceUID",
    "StudyDescription",
    "StudyDate",
    "AccessionNumber",
    "ReferringPhysicianName",
];

const SERIES_KEYWORDS: &[&str] = &[
    "SeriesInstanceUID",
    "SeriesNumber",
    "SeriesDescription",
    "Modality",
    "Manufacturer",
];

const INSTANCE_KEYWORDS: &[&str] = &["SOPInstanceUID", "InstanceNumber", "Rows", "Columns"];

/// One DICOM file as indexed at store construction
#[derive(Debug, Clone)]
struct IndexedInstance {
    path: PathBuf,
    patient_id: String,
    study_uid: String,
    series_uid: String,
    sop_uid: String,
    tags: TagMap,
}

impl IndexedInstance {
    fn series_number(&self) -> Option<i32> {
        self.tags
            .get("SeriesNumber")
            .and_then(|s| s.trim().parse().ok())
    }

    fn instance_number(&self) -> Option<i32> {
        self.tags
            .get("InstanceNumber")
            .and_then(|s| s.trim().parse().ok())
    }
}

/// PACS capability backed by a directory of DICOM files
#[derive(Debug)]
pub struct DirectoryPacs {
    root: PathBuf,
    index: Vec<IndexedInstance>,
}

impl DirectoryPacs {
    /// Indexes a directory of DICOM files
    ///
    /// Files are recognized by a `.dcm`/`.dicom` extension or, for files
    /// without an extension, by the DICM magic at offset 128. Unreadable
    /// files and files missing hierarchy identifiers are skipped with a
    /// warning. The index is a snapshot: modifications submitted through
    /// this store are not reflected until it is reopened.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(GradeError::InvalidValue(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut index = Vec::new();
        for path in collect_dicom_files(root)? {
            match index_file(&path) {
                Ok(indexed) => index.push(indexed),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        info!(
            "Indexed {} instances under {}",
            index.len(),
            root.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            index,
        })
    }

    /// Number of indexed instances
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns whether the store holds no instances
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn instances_of_patient(&self, patient_id: &str) -> Vec<&IndexedInstance> {
        self.index
            .iter()
            .filter(|i| i.patient_id == patient_id)
            .collect()
    }

    fn find_by_sop_uid(&self, sop_uid: &str) -> Result<&IndexedInstance> {
        self.index
            .iter()
            .find(|i| i.sop_uid == sop_uid)
            .ok_or_else(|| GradeError::InstanceNotFound(sop_uid.to_string()))
    }

    fn affected_files(&self, target: &ModificationTarget) -> Vec<&IndexedInstance> {
        self.index
            .iter()
            .filter(|i| match target {
                ModificationTarget::Patient(id) => i.patient_id == *id,
                ModificationTarget::Study(id) => i.study_uid == *id,
                ModificationTarget::Series(id) => i.series_uid == *id,
            })
            .collect()
    }
}

impl PacsCapability for DirectoryPacs {
    fn find_patient(&self, patient_id: &str) -> Result<Option<Patient>> {
        let instances = self.instances_of_patient(patient_id);
        match instances.first() {
            None => Ok(None),
            Some(first) => Ok(Some(Patient {
                id: patient_id.to_string(),
                tags: subset(&first.tags, PATIENT_KEYWORDS),
            })),
        }
    }

    fn studies(&self, patient: &Patient) -> Result<Vec<Study>> {
        let instances = self.instances_of_patient(&patient.id);
        let uids: BTreeSet<&str> = instances.iter().map(|i| i.study_uid.as_str()).collect();
        Ok(uids
            .into_iter()
            .filter_map(|uid| {
                instances
                    .iter()
                    .find(|i| i.study_uid == uid)
                    .map(|first| Study {
                        id: uid.to_string(),
                        tags: subset(&first.tags, STUDY_KEYWORDS),
                    })
            })
            .collect())
    }

    fn series(&self, study: &Study) -> Result<Vec<Series>> {
        let instances: Vec<&IndexedInstance> = self
            .index
            .iter()
            .filter(|i| i.study_uid == study.id)
            .collect();
        let uids: BTreeSet<&str> = instances.iter().map(|i| i.series_uid.as_str()).collect();
        let mut series: Vec<Series> = uids
            .into_iter()
            .filter_map(|uid| {
                instances
                    .iter()
                    .find(|i| i.series_uid == uid)
                    .map(|first| Series {
                        id: uid.to_string(),
                        tags: subset(&first.tags, SERIES_KEYWORDS),
                    })
            })
            .collect();
        series.sort_by_key(|s| (s.series_number(), s.id.clone()));
        Ok(series)
    }

    fn instances(&self, series: &Series) -> Result<Vec<Instance>> {
        let mut instances: Vec<Instance> = self
            .index
            .iter()
            .filter(|i| i.series_uid == series.id)
            .map(|i| Instance {
                id: i.sop_uid.clone(),
                tags: subset(&i.tags, INSTANCE_KEYWORDS),
            })
            .collect();
        instances.sort_by_key(|i| (i.instance_number(), i.id.clone()));
        Ok(instances)
    }

    fn pixel_stats(&self, instance: &Instance) -> Result<PixelStats> {
        let indexed = self.find_by_sop_uid(&instance.id)?;
        let obj = open_file(&indexed.path)?;
        compute_pixel_stats(&obj)
    }

    fn submit_modification(
        &self,
        target: &ModificationTarget,
        request: &ModificationRequest,
    ) -> Result<JobHandle> {
        if request.touches_identifiers() && !request.force {
            return Err(GradeError::InvalidValue(
                "replacing identifier tags requires force".to_string(),
            ));
        }

        // Resolve every keyword up front so a bad request changes nothing
        let mut replacements = Vec::with_capacity(request.replace.len());
        for (keyword, value) in &request.replace {
            let (tag, vr) = modifiable_tag(keyword).ok_or_else(|| {
                GradeError::InvalidValue(format!("cannot modify tag {}", keyword))
            })?;
            replacements.push((tag, vr, value.as_str()));
        }

        let affected = self.affected_files(target);
        if affected.is_empty() {
            return Err(GradeError::InvalidValue(format!(
                "modification target not found: {}",
                target.id()
            )));
        }

        let output_dir = self.root.join("modified");
        if request.keep_source {
            fs::create_dir_all(&output_dir)?;
        }

        for indexed in &affected {
            let mut obj = open_file(&indexed.path)?;
            for (tag, vr, value) in &replacements {
                obj.put(DataElement::new(*tag, *vr, PrimitiveValue::from(*value)));
            }
            let destination = if request.keep_source {
                let name = indexed.path.file_name().ok_or_else(|| {
                    GradeError::InvalidValue(format!(
                        "no file name for {}",
                        indexed.path.display()
                    ))
                })?;
                output_dir.join(name)
            } else {
                indexed.path.clone()
            };
            obj.write_to_file(&destination)?;
        }
        info!(
            "Modified {} instance(s) for target {}",
            affected.len(),
            target.id()
        );

        Ok(JobHandle {
            id: format!("modify-{}", target.id()),
            state: JobState::Completed,
        })
    }
}

fn subset(tags: &TagMap, keywords: &[&str]) -> TagMap {
    keywords
        .iter()
        .filter_map(|&k| tags.get(k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

fn index_file(path: &Path) -> Result<IndexedInstance> {
    let obj = open_file(path)?;
    let mut tag_map = TagMap::new();
    for (keyword, tag) in INDEXED_KEYWORDS {
        if let Some(value) = get_string_value(&obj, *tag) {
            tag_map.insert(keyword.to_string(), value);
        }
    }

    let required = |keyword: &str| -> Result<String> {
        tag_map
            .get(keyword)
            .cloned()
            .ok_or_else(|| GradeError::DicomError(format!("missing {}", keyword)))
    };

    Ok(IndexedInstance {
        path: path.to_path_buf(),
        patient_id: required("PatientID")?,
        study_uid: required("StudyInstanceUID")?,
        series_uid: required("SeriesInstanceUID")?,
        sop_uid: required("SOPInstanceUID")?,
        tags: tag_map,
    })
}

fn collect_dicom_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension() {
                if ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom") {
                    files.push(path);
                }
            } else if is_dicom_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Checks for the standard DICOM header: 128-byte preamble followed by
/// the 4-byte "DICM" magic
fn is_dicom_file(path: &Path) -> bool {
    let mut file = match fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read(&mut buffer) {
        Ok(n) if n >= 132 => &buffer[128..132] == b"DICM",
        _ => false,
    }
}

/// Decodes uncompressed pixel data and computes its statistics
///
/// Supports 8- and 16-bit samples, signed or unsigned per
/// PixelRepresentation, with RescaleSlope/RescaleIntercept applied.
fn compute_pixel_stats(obj: &InMemDicomObject) -> Result<PixelStats> {
    let rows = get_u16_value(obj, ROWS)
        .ok_or_else(|| GradeError::InvalidValue("missing Rows".to_string()))?;
    let cols = get_u16_value(obj, COLUMNS)
        .ok_or_else(|| GradeError::InvalidValue("missing Columns".to_string()))?;
    let signed = get_u16_value(obj, PIXEL_REPRESENTATION).unwrap_or(0) == 1;
    let bits_allocated = get_u16_value(obj, BITS_ALLOCATED).unwrap_or(16);
    let slope = get_f64_value(obj, RESCALE_SLOPE).unwrap_or(1.0);
    let intercept = get_f64_value(obj, RESCALE_INTERCEPT).unwrap_or(0.0);

    let elem = obj
        .element(PIXEL_DATA)
        .map_err(|e| GradeError::DicomError(format!("{}", e)))?;
    let values: Vec<f64> = match elem.value() {
        // 16-bit data can surface as raw bytes depending on the VR used
        DicomValue::Primitive(PrimitiveValue::U8(bytes)) if bits_allocated == 16 => {
            if bytes.len() % 2 != 0 {
                return Err(GradeError::UnsupportedPixelData(
                    "odd byte length for 16-bit pixel data".to_string(),
                ));
            }
            bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .map(|w| if signed { w as i16 as f64 } else { w as f64 })
                .collect()
        }
        DicomValue::Primitive(PrimitiveValue::U8(bytes)) => {
            if signed {
                bytes.iter().map(|&b| b as i8 as f64).collect()
            } else {
                bytes.iter().map(|&b| b as f64).collect()
            }
        }
        DicomValue::Primitive(PrimitiveValue::U16(words)) => {
            if signed {
                words.iter().map(|&w| w as i16 as f64).collect()
            } else {
                words.iter().map(|&w| w as f64).collect()
            }
        }
        DicomValue::Primitive(PrimitiveValue::I16(words)) => {
            words.iter().map(|&w| w as f64).collect()
        }
        _ => {
            return Err(GradeError::UnsupportedPixelData(
                "pixel data is not uncompressed 8- or 16-bit samples".to_string(),
            ))
        }
    };
    if values.is_empty() {
        return Err(GradeError::UnsupportedPixelData(
            "empty pixel data".to_string(),
        ));
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for raw in &values {
        let v = raw * slope + intercept;
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }

    Ok(PixelStats {
        rows,
        cols,
        min,
        max,
        mean: sum / values.len() as f64,
    })
}
