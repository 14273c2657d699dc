//! Core type definitions for the homework tooling
//!
//! - [`InstanceInfo`]: the 13 answer fields extracted for one study instance
//! - [`StudyInfo`]: study-level summary used while assembling an answer
//! - [`PixelStats`]: decoded pixel statistics for a single instance
//! - [`Patient`], [`Study`], [`Series`], [`Instance`]: store handles
//! - [`JobHandle`]: result of a submitted modification request

mod handles;
mod info;

pub use handles::{Instance, JobHandle, JobState, Patient, Series, Study, TagMap};
pub use info::{InstanceInfo, PixelStats, StudyInfo};
