use serde::Serialize;
use std::fmt;

/// Cosine above which a direction counts as aligned with a patient axis.
const OBLIQUITY_THRESHOLD: f64 = 0.8;

/// Anatomical plane a slice was acquired in.
///
/// Derived from the Image Orientation (Patient) direction cosines. The
/// variant order is only used to give [`crate::SeriesKey`] a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrientationLabel {
    Sagittal,
    Coronal,
    Axial,
    Oblique,
    #[default]
    Unknown,
}

impl OrientationLabel {
    /// Index of the patient axis slices of this orientation are stacked
    /// along: x for sagittal, y for coronal, z otherwise.
    pub fn axis(self) -> usize {
        match self {
            OrientationLabel::Sagittal => 0,
            OrientationLabel::Coronal => 1,
            OrientationLabel::Axial | OrientationLabel::Oblique | OrientationLabel::Unknown => 2,
        }
    }

    /// Classify a slice from its row and column direction cosines.
    pub fn from_direction_cosines(cosines: &[f64; 6]) -> Self {
        let row = major_axis(&cosines[0..3]);
        let column = major_axis(&cosines[3..6]);

        match (row, column) {
            (Some(0), Some(1)) | (Some(1), Some(0)) => OrientationLabel::Axial,
            (Some(0), Some(2)) | (Some(2), Some(0)) => OrientationLabel::Coronal,
            (Some(1), Some(2)) | (Some(2), Some(1)) => OrientationLabel::Sagittal,
            _ => OrientationLabel::Oblique,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrientationLabel::Sagittal => "SAGITTAL",
            OrientationLabel::Coronal => "CORONAL",
            OrientationLabel::Axial => "AXIAL",
            OrientationLabel::Oblique => "OBLIQUE",
            OrientationLabel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for OrientationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn major_axis(direction: &[f64]) -> Option<usize> {
    let abs: Vec<f64> = direction.iter().map(|c| c.abs()).collect();
    (0..3).find(|&i| {
        abs[i] > OBLIQUITY_THRESHOLD && (0..3).filter(|&j| j != i).all(|j| abs[i] > abs[j])
    })
}
