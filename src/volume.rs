use crate::enums::OrientationLabel;

use ndarray::{Array3, ArrayView2, s};

/// Slices of one series stacked in reconstruction order.
#[derive(Debug, Default)]
pub struct Volume {
    pub data: Array3<u16>,
    /// Pixel spacing along x and y, then the slice spacing, in mm.
    pub spacing: (f32, f32, f32),
}

impl Volume {
    pub fn new(data: Array3<u16>, spacing: (f32, f32, f32)) -> Self {
        Self { data, spacing }
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<u16> {
        &self.data
    }

    /// View the plane at `index` perpendicular to the given orientation's
    /// axis, assuming the slices were acquired axially.
    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: OrientationLabel,
    ) -> Option<ArrayView2<'_, u16>> {
        if !self.is_valid_index(index, orientation) {
            return None;
        }
        let slice = match orientation {
            OrientationLabel::Axial => self.data.slice(s![index, .., ..]),
            OrientationLabel::Coronal => self.data.slice(s![.., index, ..]),
            OrientationLabel::Sagittal => self.data.slice(s![.., .., index]),
            OrientationLabel::Oblique | OrientationLabel::Unknown => return None,
        };
        Some(slice)
    }

    fn is_valid_index(&self, index: usize, orientation: OrientationLabel) -> bool {
        let dim = self.data.dim();
        let max_index = match orientation {
            OrientationLabel::Axial => dim.0,
            OrientationLabel::Coronal => dim.1,
            OrientationLabel::Sagittal => dim.2,
            OrientationLabel::Oblique | OrientationLabel::Unknown => 0,
        };
        index < max_index
    }
}
