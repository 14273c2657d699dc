use serde::Serialize;

/// Pixel statistics for one instance
///
/// Min/max/mean are reported after rescale slope and intercept have been
/// applied, so CT values land in Hounsfield units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelStats {
    pub rows: u16,
    pub cols: u16,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Study-level summary gathered while assembling an answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyInfo {
    pub study_instance_uid: String,
    pub description: Option<String>,
    pub num_series: usize,
}

/// The answer fields for one patient study instance
///
/// Serializes with the exact JSON field names the assignment hand-out
/// specifies, which is what students diff their own output against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceInfo {
    #[serde(rename = "Age")]
    pub age: String,

    #[serde(rename = "Sex")]
    pub sex: String,

    #[serde(rename = "StudyDescription")]
    pub study_description: Option<String>,

    #[serde(rename = "Modality")]
    pub modality: String,

    #[serde(rename = "Manufacturer")]
    pub manufacturer: String,

    #[serde(rename = "PatientID")]
    pub patient_id: String,

    #[serde(rename = "NumSeries")]
    pub num_series: usize,

    #[serde(rename = "StudyInstanceUID")]
    pub study_instance_uid: String,

    #[serde(rename = "NumRows")]
    pub num_rows: u16,

    #[serde(rename = "NumCols")]
    pub num_cols: u16,

    #[serde(rename = "MinPixelVal")]
    pub min_pixel_val: f64,

    #[serde(rename = "MaxPixelVal")]
    pub max_pixel_val: f64,

    #[serde(rename = "MeanPixelVal")]
    pub mean_pixel_val: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_info_field_names() {
        let info = InstanceInfo {
            age: "62".to_string(),
            sex: "F".to_string(),
            study_description: None,
            modality: "CT".to_string(),
            manufacturer: "TOSHIBA".to_string(),
            patient_id: "A034518".to_string(),
            num_series: 1,
            study_instance_uid: "1.2.3".to_string(),
            num_rows: 512,
            num_cols: 512,
            min_pixel_val: -2048.0,
            max_pixel_val: 1863.0,
            mean_pixel_val: -929.4,
        };

        let value = serde_json::to_value(&info).unwrap();
        let obj = value.as_object().unwrap();
        for name in [
            "Age",
            "Sex",
            "StudyDescription",
            "Modality",
            "Manufacturer",
            "PatientID",
            "NumSeries",
            "StudyInstanceUID",
            "NumRows",
            "NumCols",
            "MinPixelVal",
            "MaxPixelVal",
            "MeanPixelVal",
        ] {
            assert!(obj.contains_key(name), "missing field {}", name);
        }
        assert_eq!(obj["StudyDescription"], serde_json::Value::Null);
    }
}
