//! Narrow capability interface over an imaging store
//!
//! The grading and reporting code never talks to a concrete PACS client;
//! it goes through [`PacsCapability`], which covers exactly what the
//! homework needs: patient lookup, hierarchy traversal, pixel statistics,
//! and job-based metadata modification. [`DirectoryPacs`] implements the
//! interface over a local directory of DICOM files.

pub mod directory;
pub mod tags;

use crate::error::Result;
use crate::types::{Instance, JobHandle, Patient, PixelStats, Series, Study};
use std::collections::BTreeMap;

pub use directory::DirectoryPacs;

/// Which resource a modification request addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModificationTarget {
    Patient(String),
    Study(String),
    Series(String),
}

impl ModificationTarget {
    /// The identifier of the addressed resource
    pub fn id(&self) -> &str {
        match self {
            ModificationTarget::Patient(id)
            | ModificationTarget::Study(id)
            | ModificationTarget::Series(id) => id,
        }
    }
}

/// A metadata-modification request
///
/// `replace` maps tag keywords to their new values. Replacing an
/// identifier tag (PatientID, StudyInstanceUID, ...) is rejected unless
/// `force` is set, mirroring the behavior of job-based modification
/// servers. `keep_source` leaves the original resources in place.
#[derive(Debug, Clone, Default)]
pub struct ModificationRequest {
    pub replace: BTreeMap<String, String>,
    pub force: bool,
    pub keep_source: bool,
}

impl ModificationRequest {
    /// Creates a request replacing the given keyword/value pairs
    pub fn replacing<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            replace: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            force: false,
            keep_source: true,
        }
    }

    /// Sets the force flag
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Sets the keep-source flag
    pub fn keep_source(mut self, keep_source: bool) -> Self {
        self.keep_source = keep_source;
        self
    }

    /// Returns whether the request replaces any identifier tag
    pub fn touches_identifiers(&self) -> bool {
        self.replace
            .keys()
            .any(|k| tags::IDENTIFIER_KEYWORDS.contains(&k.as_str()))
    }
}

/// Capability interface for the imaging store backing the assignment
///
/// Implementations must be stateless from the caller's point of view:
/// queries never mutate the store, and only
/// [`submit_modification`](PacsCapability::submit_modification) writes
/// anything.
pub trait PacsCapability {
    /// Finds a patient by PatientID; unknown IDs are `Ok(None)`, not errors
    fn find_patient(&self, patient_id: &str) -> Result<Option<Patient>>;

    /// Lists the studies of a patient
    fn studies(&self, patient: &Patient) -> Result<Vec<Study>>;

    /// Lists the series of a study, ordered by series number
    fn series(&self, study: &Study) -> Result<Vec<Series>>;

    /// Lists the instances of a series, ordered by instance number
    fn instances(&self, series: &Series) -> Result<Vec<Instance>>;

    /// Decodes pixel data for one instance and computes its statistics
    fn pixel_stats(&self, instance: &Instance) -> Result<PixelStats>;

    /// Submits a metadata-modification job against a resource
    fn submit_modification(
        &self,
        target: &ModificationTarget,
        request: &ModificationRequest,
    ) -> Result<JobHandle>;
}
