use crate::enums::OrientationLabel;
use crate::patient::PatientGroup;
use crate::series::{SeriesGroup, SeriesKey};
use crate::slice::SliceRecord;
use crate::sorter::{SpatialSorter, ZSPACING_TOLERANCE};
use crate::spacing::{ZSpacingEstimator, round2};

use tracing::debug;

/// A slice placed in its series, with the per-slice thickness check.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSlice {
    pub record: SliceRecord,
    /// Whether the nominal slice thickness matches the series spacing.
    pub thickness_equal_zspacing: bool,
}

/// A fully ordered series with its batch spacing estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct SortedSeries {
    pub key: SeriesKey,
    pub title: String,
    pub slices: Vec<SortedSlice>,
    pub z_spacing: f64,
    /// Consecutive slices are not evenly spaced.
    pub slices_dif_distance: bool,
}

impl SortedSeries {
    pub fn file_list(&self) -> Vec<&std::path::Path> {
        self.slices
            .iter()
            .map(|slice| slice.record.file_reference.as_path())
            .collect()
    }
}

/// Orders every series of a finished scan and estimates spacing over the
/// whole series rather than its first two slices.
#[derive(Clone, Copy, Default)]
pub struct SeriesSorter<'a> {
    sorter: Option<&'a dyn SpatialSorter>,
}

impl<'a> SeriesSorter<'a> {
    pub fn new(sorter: Option<&'a dyn SpatialSorter>) -> Self {
        Self { sorter }
    }

    /// Sort all series of all patients, patients and series in result order.
    pub fn sort_all(&self, patients: &[PatientGroup]) -> Vec<SortedSeries> {
        patients
            .iter()
            .flat_map(PatientGroup::groups)
            .map(|group| self.sort_series(group))
            .collect()
    }

    pub fn sort_series(&self, group: &SeriesGroup) -> SortedSeries {
        let orientation = group.key().orientation_label;
        let ordered = self.order(group, orientation);

        let estimate = ZSpacingEstimator::estimate(&ordered, orientation);
        if estimate.is_irregular() {
            debug!(series = %group.key(), steps = ?estimate.steps, "uneven slice spacing");
        }

        let slices = ordered
            .into_iter()
            .map(|record| SortedSlice {
                thickness_equal_zspacing: round2(record.slice_thickness) == estimate.z_spacing,
                record: record.clone(),
            })
            .collect();

        SortedSeries {
            key: group.key().clone(),
            title: group.title().to_string(),
            slices,
            z_spacing: estimate.z_spacing,
            slices_dif_distance: estimate.is_irregular(),
        }
    }

    fn order<'g>(&self, group: &'g SeriesGroup, orientation: OrientationLabel) -> Vec<&'g SliceRecord> {
        if orientation == OrientationLabel::Coronal {
            let mut members: Vec<&SliceRecord> = group.slices().iter().collect();
            members.sort_by(|a, b| a.position_text.cmp(&b.position_text));
            return members;
        }

        let members: Vec<&SliceRecord> = group.slices().iter().collect();
        self.sorter
            .and_then(|sorter| sorter.sort(&members, ZSPACING_TOLERANCE))
            .map(|order| order.into_iter().map(|i| members[i]).collect())
            .unwrap_or_else(|| group.ordered_slices())
    }
}
