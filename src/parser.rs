use crate::enums::OrientationLabel;
use crate::slice::{SliceRecord, TagMap};

use dicom::object::OpenFileOptions;
use dicom_dictionary_std::tags;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Media Storage SOP Class of a DICOMDIR index file.
const MEDIA_STORAGE_DIRECTORY: &str = "1.2.840.10008.1.3.10";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{} is not a readable DICOM file: {source}", path.display())]
    NotDicom {
        path: PathBuf,
        #[source]
        source: dicom::object::ReadError,
    },

    #[error("{} is a DICOMDIR index, not an image", .0.display())]
    DicomDir(PathBuf),

    #[error("{} has no image pixel module", .0.display())]
    NotAnImage(PathBuf),
}

/// Raw header of one image file plus the fields computed alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTags {
    pub tags: TagMap,
    pub orientation_label: OrientationLabel,
    pub thumbnail_path: Option<PathBuf>,
    pub dicom_path: PathBuf,
}

impl ExtractedTags {
    pub fn into_slice_record(self) -> SliceRecord {
        let mut record = SliceRecord::from_tags(&self.tags, self.orientation_label, self.dicom_path);
        record.thumbnail_path = self.thumbnail_path;
        record
    }
}

/// Reads the header tags of an image file.
pub trait TagExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedTags, ExtractError>;
}

/// [`TagExtractor`] backed by dicom-rs, reading only up to the pixel data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomTagExtractor;

impl TagExtractor for DicomTagExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedTags, ExtractError> {
        let dicom_object = OpenFileOptions::new()
            .read_until(tags::PIXEL_DATA)
            .open_file(path)
            .map_err(|source| ExtractError::NotDicom {
                path: path.to_path_buf(),
                source,
            })?;

        if dicom_object
            .meta()
            .media_storage_sop_class_uid
            .trim_end_matches(['\0', ' '])
            == MEDIA_STORAGE_DIRECTORY
        {
            return Err(ExtractError::DicomDir(path.to_path_buf()));
        }

        // Reports, presentation states and key object selections carry no
        // image dimensions.
        if dicom_object.element(tags::ROWS).is_err()
            || dicom_object.element(tags::COLUMNS).is_err()
        {
            return Err(ExtractError::NotAnImage(path.to_path_buf()));
        }

        let tags_map: TagMap = dicom_object
            .iter()
            .filter_map(|element| {
                let value = element.to_str().ok()?;
                Some((element.header().tag, value.trim().to_string()))
            })
            .collect();

        let orientation_label = dicom_object
            .element(tags::IMAGE_ORIENTATION_PATIENT)
            .ok()
            .and_then(|element| element.to_multi_float64().ok())
            .and_then(|values| <[f64; 6]>::try_from(values.as_slice()).ok())
            .map(|cosines| OrientationLabel::from_direction_cosines(&cosines))
            .unwrap_or_default();

        Ok(ExtractedTags {
            tags: tags_map,
            orientation_label,
            thumbnail_path: None,
            dicom_path: path.to_path_buf(),
        })
    }
}
