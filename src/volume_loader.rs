use crate::coordinator::ScanResult;
use crate::selection::{SelectionError, SliceSelection};
use crate::series::SeriesGroup;
use crate::sorter::SpatialSorter;
use crate::volume::Volume;

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use ndarray::{Array2, Array3, s};
use rayon::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Scan found no series to load")]
    NoSeries,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Missing spacing information")]
    MissingSpacing,

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load the default reconstruction candidate of a finished scan: its
    /// series with the most frames.
    pub fn load_default(
        result: &ScanResult,
        sorter: Option<&dyn SpatialSorter>,
        selection: &SliceSelection,
    ) -> Result<Volume, VolumeLoaderError> {
        let series = result.largest_series().ok_or(VolumeLoaderError::NoSeries)?;
        Self::load_series(series, sorter, selection)
    }

    /// Load a series, ordering its files for reconstruction and keeping the
    /// selected subset.
    ///
    /// # Errors
    ///
    /// Returns error if the selection leaves too few slices, no slice can be
    /// decoded or dimensions are inconsistent
    pub fn load_series(
        series: &SeriesGroup,
        sorter: Option<&dyn SpatialSorter>,
        selection: &SliceSelection,
    ) -> Result<Volume, VolumeLoaderError> {
        let files = selection.apply(&series.ordered_file_list(sorter))?;
        let z_spacing = (series.z_spacing() * selection.spacing_factor()) as f32;
        info!(series = %series.key(), files = files.len(), z_spacing, "loading volume");

        Self::load_from_file_paths(&files, z_spacing)
    }

    /// Load a volume from file paths already in reconstruction order
    pub fn load_from_file_paths(
        paths: &[PathBuf],
        z_spacing: f32,
    ) -> Result<Volume, VolumeLoaderError> {
        let dicom_objects = paths
            .par_iter()
            .map(open_file)
            .collect::<Result<Vec<_>, _>>()?;

        let images: Vec<_> = dicom_objects
            .par_iter()
            .filter_map(Self::decode_image)
            .collect();

        if images.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }
        if images.len() < dicom_objects.len() {
            debug!(
                decoded = images.len(),
                files = dicom_objects.len(),
                "some slices had no decodable pixel data"
            );
        }

        Self::validate_dimensions(&images)?;

        let volume_array = Self::build_volume_array(&images);
        let (x_spacing, y_spacing) =
            Self::get_pixel_spacing(&dicom_objects).ok_or(VolumeLoaderError::MissingSpacing)?;

        Ok(Volume::new(volume_array, (x_spacing, y_spacing, z_spacing)))
    }

    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<u16>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
        pixel_data
            .to_ndarray_with_options::<u16>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    fn validate_dimensions(images: &[Array2<u16>]) -> Result<(), VolumeLoaderError> {
        let first_dim = images[0].dim();
        if images.iter().any(|img| img.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(images: &[Array2<u16>]) -> Array3<u16> {
        let (height, width) = images[0].dim();
        let depth = images.len();
        let mut volume = Array3::<u16>::zeros((depth, height, width));

        for (i, image) in images.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(image);
        }

        volume
    }

    /// In-plane spacing as (x, y). Pixel Spacing lists the row step (y) first.
    fn get_pixel_spacing(dicom_objects: &[FileDicomObject<InMemDicomObject>]) -> Option<(f32, f32)> {
        dicom_objects.iter().find_map(|dicom_object| {
            let pixel_spacing = dicom_object
                .element(tags::PIXEL_SPACING)
                .ok()?
                .to_multi_float32()
                .ok()?;

            match pixel_spacing.as_slice() {
                [row, column, ..] => Some((*column, *row)),
                _ => None,
            }
        })
    }
}
