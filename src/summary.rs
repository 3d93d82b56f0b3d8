use crate::coordinator::ScanResult;
use crate::enums::OrientationLabel;
use crate::series::SeriesKey;
use crate::series_sorter::SeriesSorter;

use serde::Serialize;
use std::path::PathBuf;

/// Serializable view of a finished scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    pub patients: Vec<PatientSummary>,
    /// Key of the default reconstruction candidate.
    pub default_series: Option<SeriesKey>,
    pub skipped_files: usize,
    pub failed_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSummary {
    pub patient_name: String,
    pub patient_id: String,
    pub total_slices: usize,
    pub series: Vec<SeriesSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub title: String,
    pub study_id: String,
    pub series_number: String,
    pub orientation: OrientationLabel,
    pub disambiguation_index: u32,
    pub slice_count: u64,
    pub z_spacing: f64,
    pub irregular_spacing: bool,
    pub files: Vec<PathBuf>,
}

impl ScanSummary {
    /// Summarize `result`, ordering each series with `sorter`.
    pub fn new(result: &ScanResult, sorter: SeriesSorter<'_>) -> Self {
        let patients = result
            .patients
            .iter()
            .map(|patient| PatientSummary {
                patient_name: patient.key().patient_name.clone(),
                patient_id: patient.key().patient_id.clone(),
                total_slices: patient.total_slices(),
                series: patient
                    .groups()
                    .into_iter()
                    .map(|group| {
                        let sorted = sorter.sort_series(group);
                        SeriesSummary {
                            title: sorted.title.clone(),
                            study_id: sorted.key.study_id.clone(),
                            series_number: sorted.key.series_number.clone(),
                            orientation: sorted.key.orientation_label,
                            disambiguation_index: sorted.key.disambiguation_index,
                            slice_count: group.slice_count(),
                            z_spacing: sorted.z_spacing,
                            irregular_spacing: sorted.slices_dif_distance,
                            files: sorted
                                .file_list()
                                .into_iter()
                                .map(PathBuf::from)
                                .collect(),
                        }
                    })
                    .collect(),
            })
            .collect();

        Self {
            patients,
            default_series: result.largest_series().map(|group| group.key().clone()),
            skipped_files: result.skipped_files,
            failed_files: result.file_errors.iter().map(|e| e.path.clone()).collect(),
        }
    }
}
