use std::collections::BTreeMap;

/// Main DICOM tags exposed on a store handle, keyed by tag keyword
pub type TagMap = BTreeMap<String, String>;

/// Handle to a patient in the backing store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    /// Store identifier (the PatientID for a directory store)
    pub id: String,
    /// Patient-level main DICOM tags
    pub tags: TagMap,
}

/// Handle to a study in the backing store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Study {
    /// Store identifier (the StudyInstanceUID for a directory store)
    pub id: String,
    /// Study-level main DICOM tags
    pub tags: TagMap,
}

/// Handle to a series in the backing store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// Store identifier (the SeriesInstanceUID for a directory store)
    pub id: String,
    /// Series-level main DICOM tags
    pub tags: TagMap,
}

/// Handle to a single instance in the backing store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Store identifier (the SOPInstanceUID for a directory store)
    pub id: String,
    /// Instance-level main DICOM tags
    pub tags: TagMap,
}

impl Patient {
    /// Looks up a main tag by keyword
    pub fn tag(&self, keyword: &str) -> Option<&str> {
        self.tags.get(keyword).map(String::as_str)
    }
}

impl Study {
    pub fn tag(&self, keyword: &str) -> Option<&str> {
        self.tags.get(keyword).map(String::as_str)
    }
}

impl Series {
    pub fn tag(&self, keyword: &str) -> Option<&str> {
        self.tags.get(keyword).map(String::as_str)
    }

    /// Parses the SeriesNumber tag, if present and numeric
    pub fn series_number(&self) -> Option<i32> {
        self.tag("SeriesNumber").and_then(|s| s.trim().parse().ok())
    }
}

impl Instance {
    pub fn tag(&self, keyword: &str) -> Option<&str> {
        self.tags.get(keyword).map(String::as_str)
    }

    /// Parses the InstanceNumber tag, if present and numeric
    pub fn instance_number(&self) -> Option<i32> {
        self.tag("InstanceNumber")
            .and_then(|s| s.trim().parse().ok())
    }
}

/// Completion state of a modification job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Completed,
    Failed,
}

/// Handle to a submitted modification job
///
/// A directory-backed store applies modifications synchronously, so the
/// handle it returns is already in a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
    pub state: JobState,
}
