use crate::series::{SeriesGroup, SeriesKey};
use crate::slice::SliceRecord;

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GroupingError {
    #[error("slice still collides after {attempts} attempts, last tried series {key}")]
    RetryLimitExceeded { key: SeriesKey, attempts: u32 },
}

/// Identity of a patient within a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PatientKey {
    pub patient_name: String,
    pub patient_id: String,
}

impl PatientKey {
    pub fn for_slice(slice: &SliceRecord) -> Self {
        Self {
            patient_name: slice.patient_name.clone(),
            patient_id: slice.patient_id.clone(),
        }
    }
}

/// Series of one patient.
#[derive(Debug, Clone)]
pub struct PatientGroup {
    key: PatientKey,
    groups: Vec<SeriesGroup>,
    index: HashMap<SeriesKey, usize>,
    total_slices: usize,
    representative: Option<SliceRecord>,
    max_retries: u32,
}

impl PatientGroup {
    /// `max_retries` bounds how many extra series a single colliding slice
    /// may probe before giving up.
    pub fn new(key: PatientKey, max_retries: u32) -> Self {
        Self {
            key,
            groups: Vec::new(),
            index: HashMap::new(),
            total_slices: 0,
            representative: None,
            max_retries,
        }
    }

    /// Place `slice` into the first series under its nominal key that has
    /// room for it, creating that series if needed.
    ///
    /// Every attempt counts towards [`PatientGroup::total_slices`], so a
    /// slice that collides once is counted twice.
    pub fn add_file(&mut self, slice: &SliceRecord) -> Result<SeriesKey, GroupingError> {
        if self.representative.is_none() {
            self.representative = Some(slice.clone());
        }

        let mut key = SeriesKey::for_slice(slice, 0);
        for attempt in 0..=self.max_retries {
            key.disambiguation_index = attempt;
            self.total_slices += 1;

            let position = match self.index.get(&key) {
                Some(&position) => position,
                None => {
                    self.index.insert(key.clone(), self.groups.len());
                    self.groups
                        .push(SeriesGroup::new(key.clone(), slice.series_description.clone()));
                    self.groups.len() - 1
                }
            };

            let group = &mut self.groups[position];
            if group.add(slice) {
                group.update_z_spacing();
                debug!(file = ?slice.file_reference, series = %key, "slice admitted");
                return Ok(key);
            }

            warn!(
                file = ?slice.file_reference,
                series = %key,
                "duplicate slice position, trying next series index"
            );
        }

        Err(GroupingError::RetryLimitExceeded {
            key,
            attempts: self.max_retries + 1,
        })
    }

    /// Series sorted by title, descending; equal titles keep creation order.
    pub fn groups(&self) -> Vec<&SeriesGroup> {
        let mut groups: Vec<&SeriesGroup> = self.groups.iter().collect();
        groups.sort_by(|a, b| b.title().cmp(a.title()));
        groups
    }

    pub fn group(&self, key: &SeriesKey) -> Option<&SeriesGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    pub fn key(&self) -> &PatientKey {
        &self.key
    }

    pub fn patient_name(&self) -> &str {
        &self.key.patient_name
    }

    /// Admission attempts, including collision retries.
    pub fn total_slices(&self) -> usize {
        self.total_slices
    }

    pub fn series_count(&self) -> usize {
        self.groups.len()
    }

    /// The first slice handed to this patient.
    pub fn representative(&self) -> Option<&SliceRecord> {
        self.representative.as_ref()
    }
}

/// Aggregation context for one scan: patients keyed by name and id.
#[derive(Debug, Clone)]
pub struct PatientGrouper {
    patients: Vec<PatientGroup>,
    index: HashMap<PatientKey, usize>,
    max_retries: u32,
}

impl PatientGrouper {
    pub fn new(max_retries: u32) -> Self {
        Self {
            patients: Vec::new(),
            index: HashMap::new(),
            max_retries,
        }
    }

    pub fn add_file(&mut self, slice: &SliceRecord) -> Result<SeriesKey, GroupingError> {
        let key = PatientKey::for_slice(slice);
        let position = match self.index.get(&key) {
            Some(&position) => position,
            None => {
                self.index.insert(key.clone(), self.patients.len());
                self.patients
                    .push(PatientGroup::new(key, self.max_retries));
                self.patients.len() - 1
            }
        };
        self.patients[position].add_file(slice)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Patients sorted by name; equal names keep discovery order.
    pub fn into_patients(self) -> Vec<PatientGroup> {
        let mut patients = self.patients;
        patients.sort_by(|a, b| a.patient_name().cmp(b.patient_name()));
        patients
    }
}

/// Key of a node in the patient/series hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Patient(PatientKey),
    Series(SeriesKey),
}

/// Node of the patient/series hierarchy a [`GroupKey`] resolves to.
#[derive(Debug, Clone, Copy)]
pub enum GroupRef<'a> {
    Patient(&'a PatientGroup),
    Series(&'a SeriesGroup),
}

impl<'a> GroupRef<'a> {
    /// The series to open for this node: itself, or a patient's first series.
    pub fn series(self) -> Option<&'a SeriesGroup> {
        match self {
            GroupRef::Series(group) => Some(group),
            GroupRef::Patient(patient) => patient.groups().into_iter().next(),
        }
    }
}

/// Look `key` up among `patients`.
pub fn resolve<'a>(patients: &'a [PatientGroup], key: &GroupKey) -> Option<GroupRef<'a>> {
    match key {
        GroupKey::Patient(key) => patients
            .iter()
            .find(|patient| patient.key() == key)
            .map(GroupRef::Patient),
        GroupKey::Series(key) => patients
            .iter()
            .find_map(|patient| patient.group(key))
            .map(GroupRef::Series),
    }
}

/// The series with the most frames across all patients.
///
/// Ties go to the series encountered last, walking patients in order and
/// each patient's series in [`PatientGroup::groups`] order.
pub fn select_largest_series(patients: &[PatientGroup]) -> Option<&SeriesGroup> {
    patients
        .iter()
        .flat_map(PatientGroup::groups)
        .max_by_key(|group| group.slice_count())
}
