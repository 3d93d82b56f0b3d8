//! Test utilities for integration tests.
//!
//! Provides an in-memory [`TagExtractor`] so scans can run without DICOM
//! files on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dicom_dictionary_std::tags;
use dicom_grouper::{
    CancelToken, ExtractError, ExtractedTags, FileList, OrientationLabel, TagExtractor, TagMap,
};

// =============================================================================
// Slice Fixtures
// =============================================================================

/// Header values of one fake slice.
#[derive(Debug, Clone)]
pub struct FakeSlice {
    pub patient: &'static str,
    pub series_number: &'static str,
    pub title: &'static str,
    pub orientation: OrientationLabel,
    pub position: [f64; 3],
    pub instance: i64,
    pub image_type: &'static str,
    pub thickness: f64,
}

impl FakeSlice {
    pub fn axial(patient: &'static str, series_number: &'static str, instance: i64, z: f64) -> Self {
        Self {
            patient,
            series_number,
            title: "AXIAL SERIES",
            orientation: OrientationLabel::Axial,
            position: [0.0, 0.0, z],
            instance,
            image_type: "ORIGINAL\\PRIMARY\\AXIAL",
            thickness: 1.0,
        }
    }

    pub fn titled(mut self, title: &'static str) -> Self {
        self.title = title;
        self
    }

    fn tags(&self) -> TagMap {
        let [x, y, z] = self.position;
        let cosines = match self.orientation {
            OrientationLabel::Coronal => "1\\0\\0\\0\\0\\-1",
            OrientationLabel::Sagittal => "0\\1\\0\\0\\0\\-1",
            _ => "1\\0\\0\\0\\1\\0",
        };
        [
            (tags::PATIENT_NAME, self.patient.to_string()),
            (tags::PATIENT_ID, format!("{}-ID", self.patient)),
            (tags::STUDY_ID, "1".to_string()),
            (tags::SERIES_NUMBER, self.series_number.to_string()),
            (tags::SERIES_DESCRIPTION, self.title.to_string()),
            (tags::IMAGE_POSITION_PATIENT, format!("{x}\\{y}\\{z}")),
            (tags::IMAGE_ORIENTATION_PATIENT, cosines.to_string()),
            (tags::INSTANCE_NUMBER, self.instance.to_string()),
            (tags::IMAGE_TYPE, self.image_type.to_string()),
            (tags::SLICE_THICKNESS, self.thickness.to_string()),
        ]
        .into_iter()
        .collect()
    }
}

// =============================================================================
// In-Memory Extractor
// =============================================================================

/// Serves fake slices by path; unknown paths are treated as non-images.
#[derive(Default)]
pub struct MemoryExtractor {
    slices: HashMap<PathBuf, FakeSlice>,
    cancel_at: Option<(PathBuf, CancelToken)>,
}

impl MemoryExtractor {
    /// Register `slices` under generated paths, returning the paths in order.
    pub fn with_slices(slices: Vec<FakeSlice>) -> (Self, Vec<PathBuf>) {
        let mut extractor = Self::default();
        let paths = slices
            .into_iter()
            .enumerate()
            .map(|(i, slice)| {
                let path = PathBuf::from(format!("scan/{i:04}.dcm"));
                extractor.slices.insert(path.clone(), slice);
                path
            })
            .collect();
        (extractor, paths)
    }

    /// Request cancellation while extracting `path`.
    pub fn cancel_at(mut self, path: PathBuf, token: CancelToken) -> Self {
        self.cancel_at = Some((path, token));
        self
    }
}

impl TagExtractor for MemoryExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedTags, ExtractError> {
        if let Some((cancel_path, token)) = &self.cancel_at {
            if cancel_path == path {
                token.cancel();
            }
        }

        let slice = self
            .slices
            .get(path)
            .ok_or_else(|| ExtractError::NotAnImage(path.to_path_buf()))?;
        Ok(ExtractedTags {
            tags: slice.tags(),
            orientation_label: slice.orientation,
            thumbnail_path: None,
            dicom_path: path.to_path_buf(),
        })
    }
}

pub fn file_list(paths: &[PathBuf]) -> FileList {
    FileList::from_paths(paths.to_vec())
}
