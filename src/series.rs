use crate::enums::OrientationLabel;
use crate::slice::{Position, SliceRecord};
use crate::sorter::{SpatialSorter, ZSPACING_TOLERANCE};
use crate::spacing::{DEFAULT_Z_SPACING, ZSpacingEstimator};

use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::path::PathBuf;
use tracing::trace;

/// Manufacturer whose breast-CT series are ordered by file name.
const FILENAME_ORDERED_MANUFACTURER: &str = "Koning";

/// Identity of one acquisition series within a scan.
///
/// `disambiguation_index` is 0 for the first series seen under a nominal key
/// and only grows when two slices collide on the same position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SeriesKey {
    pub patient_name: String,
    pub study_id: String,
    pub series_number: String,
    pub orientation_label: OrientationLabel,
    pub disambiguation_index: u32,
}

impl SeriesKey {
    pub fn for_slice(slice: &SliceRecord, disambiguation_index: u32) -> Self {
        Self {
            patient_name: slice.patient_name.clone(),
            study_id: slice.study_id.clone(),
            series_number: slice.series_number.clone(),
            orientation_label: slice.orientation_label,
            disambiguation_index,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}#{}",
            self.patient_name,
            self.study_id,
            self.series_number,
            self.orientation_label,
            self.disambiguation_index
        )
    }
}

/// Deduplication key of a slice within its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Position([u64; 3]),
    Instance(i64),
}

impl Slot {
    pub fn of(slice: &SliceRecord) -> Self {
        if slice.is_derived() {
            Slot::Instance(slice.instance_number)
        } else {
            Slot::Position(position_bits(&slice.position))
        }
    }
}

fn position_bits(position: &Position) -> [u64; 3] {
    // +0.0 and -0.0 must land in the same slot.
    position.map(|v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
}

/// Slices of one acquisition series, at most one per [`Slot`].
#[derive(Debug, Clone)]
pub struct SeriesGroup {
    key: SeriesKey,
    title: String,
    slices: Vec<SliceRecord>,
    slots: HashMap<Slot, usize>,
    slice_count: u64,
    z_spacing: f64,
    representative: Option<SliceRecord>,
}

impl SeriesGroup {
    pub fn new(key: SeriesKey, title: impl Into<String>) -> Self {
        Self {
            key,
            title: title.into(),
            slices: Vec::new(),
            slots: HashMap::new(),
            slice_count: 0,
            z_spacing: DEFAULT_Z_SPACING,
            representative: None,
        }
    }

    /// Admit `slice` into the group.
    ///
    /// Derived slices always succeed, replacing any slice with the same
    /// instance number. Other slices are rejected with `false`, leaving the
    /// group untouched, when their position is already taken.
    pub fn add(&mut self, slice: &SliceRecord) -> bool {
        match self.slots.entry(Slot::of(slice)) {
            Entry::Occupied(entry) => {
                if !slice.is_derived() {
                    trace!(file = ?slice.file_reference, series = %self.key, "position already taken");
                    return false;
                }
                self.slices[*entry.get()] = slice.clone();
            }
            Entry::Vacant(entry) => {
                entry.insert(self.slices.len());
                self.slices.push(slice.clone());
            }
        }

        self.slice_count += u64::from(slice.frame_count);
        if self.representative.is_none() {
            self.representative = Some(slice.clone());
        }
        true
    }

    /// Members sorted by instance number, ties kept in admission order.
    pub fn ordered_slices(&self) -> Vec<&SliceRecord> {
        let mut ordered: Vec<&SliceRecord> = self.slices.iter().collect();
        ordered.sort_by_key(|slice| slice.instance_number);
        ordered
    }

    /// Recompute `z_spacing` from the first two slices in instance order.
    pub fn update_z_spacing(&mut self) {
        let ordered = self.ordered_slices();
        self.z_spacing = ZSpacingEstimator::two_sample(&ordered, self.key.orientation_label);
    }

    /// The middle slice in instance order.
    pub fn dicom_sample(&self) -> Option<&SliceRecord> {
        let ordered = self.ordered_slices();
        ordered.get(ordered.len() / 2).copied()
    }

    /// File references in slot admission order.
    pub fn file_list(&self) -> Vec<PathBuf> {
        self.slices
            .iter()
            .map(|slice| slice.file_reference.clone())
            .collect()
    }

    /// File references in reconstruction order.
    ///
    /// Non-coronal series are spatially sorted when a sorter is available and
    /// succeeds; otherwise slot order is kept. Series from
    /// [`FILENAME_ORDERED_MANUFACTURER`] are finally sorted by path.
    pub fn ordered_file_list(&self, sorter: Option<&dyn SpatialSorter>) -> Vec<PathBuf> {
        let mut files = match sorter {
            Some(sorter) if self.key.orientation_label != OrientationLabel::Coronal => {
                let members: Vec<&SliceRecord> = self.slices.iter().collect();
                match sorter.sort(&members, ZSPACING_TOLERANCE) {
                    Some(order) => order
                        .into_iter()
                        .map(|i| members[i].file_reference.clone())
                        .collect(),
                    None => self.file_list(),
                }
            }
            _ => self.file_list(),
        };

        if self
            .representative
            .as_ref()
            .is_some_and(|slice| slice.manufacturer == FILENAME_ORDERED_MANUFACTURER)
        {
            files.sort();
        }

        files
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    /// Series description of the first slice.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn slices(&self) -> &[SliceRecord] {
        &self.slices
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Frames admitted, multi-frame slices counting once per frame.
    pub fn slice_count(&self) -> u64 {
        self.slice_count
    }

    pub fn z_spacing(&self) -> f64 {
        self.z_spacing
    }

    /// The first slice ever admitted.
    pub fn representative(&self) -> Option<&SliceRecord> {
        self.representative.as_ref()
    }
}
