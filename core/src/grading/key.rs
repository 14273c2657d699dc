//! Reference answer keys

use crate::error::Result;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// Ordered mapping from field name to expected value
///
/// Fixed at authoring time and never mutated during a grading run. Values
/// may be strings, integers, or null; a null value flags a field whose
/// intended grading semantics are configured separately (see
/// [`NullFieldPolicy`](super::NullFieldPolicy)).
#[derive(Debug, Clone)]
pub struct AnswerKey {
    fields: Map<String, Value>,
}

impl AnswerKey {
    /// Creates a key from a JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Loads a key from a JSON file
    ///
    /// Unlike student submissions, a broken key file is a hard error: the
    /// grader cannot run without a usable reference.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let value: Value = serde_json::from_str(&contents)?;
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(format!(
                "answer key {} is not a JSON object",
                path.as_ref().display()
            )
            .into()),
        }
    }

    /// The reference key for parts (3) and (4) of the homework
    ///
    /// Note the key drift against [`InstanceInfo`](crate::types::InstanceInfo)
    /// output: the pixel fields are snake_case here (`num_rows`,
    /// `min_pixel_value`, ...) while the fetch tool writes `NumRows`,
    /// `MinPixelVal`, and so on. The grader reproduces the key as
    /// authored; the missing-key verdicts make the drift visible instead
    /// of hiding it.
    pub fn homework_reference() -> Self {
        let fields = json!({
            "Age": null,
            "Sex": "F",
            "StudyDescription": "CT ABD PELVIS(WITH CHEST IMAGES) W IV CON",
            "Modality": "CT",
            "Manufacturer": "TOSHIBA",
            "PatientID": "A034518",
            "NumSeries": 1,
            "StudyInstanceUID":
                "1.3.6.1.4.1.14519.5.2.1.99.1071.28052166218470275068707230421869",
            "num_rows": 512,
            "num_cols": 512,
            "min_pixel_value": -2048,
            "max_pixel_value": 1863,
            "mean_pixel_value": -929,
        });
        match fields {
            Value::Object(fields) => Self { fields },
            _ => unreachable!(),
        }
    }

    /// Looks up the expected value for a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns whether the key defines a field
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterates the field names in authoring order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of graded fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the key has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
