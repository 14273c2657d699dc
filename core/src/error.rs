use thiserror::Error;

/// Result type for studygrade operations
pub type Result<T> = std::result::Result<T, GradeError>;

/// Error types for studygrade operations
#[derive(Error, Debug)]
pub enum GradeError {
    /// DICOM reading or writing error
    #[error("DICOM error: {0}")]
    DicomError(String),

    /// No patient matched the requested ID
    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    /// No series matched the requested series number
    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    /// No instance matched the requested instance number
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    /// Invalid tag or argument value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Pixel data in a form the directory store cannot decode
    #[error("Unsupported pixel data: {0}")]
    UnsupportedPixelData(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// Helper conversions
impl From<String> for GradeError {
    fn from(s: String) -> Self {
        GradeError::InvalidValue(s)
    }
}

impl From<&str> for GradeError {
    fn from(s: &str) -> Self {
        GradeError::InvalidValue(s.to_string())
    }
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for GradeError {
    fn from(e: dicom_object::ReadError) -> Self {
        GradeError::DicomError(format!("{}", e))
    }
}

impl From<dicom_object::WriteError> for GradeError {
    fn from(e: dicom_object::WriteError) -> Self {
        GradeError::DicomError(format!("{}", e))
    }
}

impl From<dicom_core::value::ConvertValueError> for GradeError {
    fn from(e: dicom_core::value::ConvertValueError) -> Self {
        GradeError::InvalidValue(format!("{}", e))
    }
}
