use dicom_core::{Tag, VR};
use dicom_object::InMemDicomObject;

// Patient Tags
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
pub const PATIENT_AGE: Tag = Tag(0x0010, 0x1010);

// Study Tags
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
pub const REFERRING_PHYSICIAN_NAME: Tag = Tag(0x0008, 0x0090);

// Series Tags
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
pub const SERIES_DESCRIPTION: Tag = Tag(0x0008, 0x103E);
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);

// Instance Tags
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);

// Pixel Tags
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
pub const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
pub const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

/// Keyword, tag, and VR for every tag a modification request may replace
///
/// Requests address tags by keyword (the way job-based modification APIs
/// do); the VR is needed to write the replacement element back out.
pub const MODIFIABLE_TAGS: &[(&str, Tag, VR)] = &[
    ("PatientName", PATIENT_NAME, VR::PN),
    ("PatientID", PATIENT_ID, VR::LO),
    ("PatientSex", PATIENT_SEX, VR::CS),
    ("PatientBirthDate", PATIENT_BIRTH_DATE, VR::DA),
    ("PatientAge", PATIENT_AGE, VR::AS),
    ("StudyInstanceUID", STUDY_INSTANCE_UID, VR::UI),
    ("StudyDescription", STUDY_DESCRIPTION, VR::LO),
    ("StudyDate", STUDY_DATE, VR::DA),
    ("AccessionNumber", ACCESSION_NUMBER, VR::SH),
    ("ReferringPhysicianName", REFERRING_PHYSICIAN_NAME, VR::PN),
    ("SeriesInstanceUID", SERIES_INSTANCE_UID, VR::UI),
    ("SeriesNumber", SERIES_NUMBER, VR::IS),
    ("SeriesDescription", SERIES_DESCRIPTION, VR::LO),
    ("Modality", MODALITY, VR::CS),
    ("Manufacturer", MANUFACTURER, VR::LO),
    ("InstanceNumber", INSTANCE_NUMBER, VR::IS),
];

/// Resolves a modifiable tag keyword to its tag and VR
pub fn modifiable_tag(keyword: &str) -> Option<(Tag, VR)> {
    MODIFIABLE_TAGS
        .iter()
        .find(|(kw, _, _)| *kw == keyword)
        .map(|(_, tag, vr)| (*tag, *vr))
}

/// Keywords that identify resources; replacing them requires `force`
pub const IDENTIFIER_KEYWORDS: &[&str] = &[
    "PatientID",
    "StudyInstanceUID",
    "SeriesInstanceUID",
    "SOPInstanceUID",
];

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to string
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim().to_string())
}

/// Helper to get u16 value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to u16
pub fn get_u16_value(dcm: &InMemDicomObject, tag: Tag) -> Option<u16> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<u16>().ok())
}

/// Helper to get f64 value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to f64
pub fn get_f64_value(dcm: &InMemDicomObject, tag: Tag) -> Option<f64> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_float64().ok())
}
