use crate::enums::OrientationLabel;

use dicom::core::Tag;
use dicom_dictionary_std::tags;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Patient coordinates (mm) of the first transmitted voxel of a slice.
pub type Position = [f64; 3];

/// Position assumed when a slice carries none or an unparseable one.
pub const DEFAULT_POSITION: Position = [1.0, 1.0, 1.0];

/// Title given to series without a usable description.
pub const UNNAMED_SERIES: &str = "unnamed";

/// Raw tag values of one file, keyed by group then element.
///
/// Values are the textual rendering of each element, multiple values joined
/// with a backslash as in the DICOM encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagMap {
    groups: BTreeMap<u16, BTreeMap<u16, String>>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: Tag, value: impl Into<String>) {
        self.groups
            .entry(tag.group())
            .or_default()
            .insert(tag.element(), value.into());
    }

    pub fn get(&self, tag: Tag) -> Option<&str> {
        self.groups
            .get(&tag.group())?
            .get(&tag.element())
            .map(String::as_str)
    }

    /// Value of `tag`, trimmed, or `None` when absent or blank.
    fn text(&self, tag: Tag) -> Option<&str> {
        self.get(tag).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Into<String>> FromIterator<(Tag, S)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (Tag, S)>>(iter: I) -> Self {
        let mut map = TagMap::new();
        for (tag, value) in iter {
            map.insert(tag, value);
        }
        map
    }
}

/// Typed view over the header of one acquired slice.
///
/// All missing-field defaults are applied when the record is built, so code
/// downstream never has to re-derive them.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceRecord {
    pub patient_name: String,
    pub patient_id: String,
    pub study_id: String,
    pub series_number: String,
    pub series_description: String,
    pub orientation_label: OrientationLabel,
    pub position: Position,
    /// Image Position (Patient) as written in the file, with `,` decimals
    /// rewritten to `.`.
    pub position_text: String,
    pub image_orientation: Option<[f64; 6]>,
    pub instance_number: i64,
    pub image_type_flags: BTreeSet<String>,
    pub frame_count: u32,
    pub slice_thickness: f64,
    pub manufacturer: String,
    pub file_reference: PathBuf,
    pub thumbnail_path: Option<PathBuf>,
}

impl SliceRecord {
    /// An empty record for `file_reference` with every field at its default.
    pub fn new(file_reference: impl Into<PathBuf>) -> Self {
        Self {
            patient_name: String::new(),
            patient_id: String::new(),
            study_id: String::new(),
            series_number: String::new(),
            series_description: UNNAMED_SERIES.to_string(),
            orientation_label: OrientationLabel::Unknown,
            position: DEFAULT_POSITION,
            position_text: String::new(),
            image_orientation: None,
            instance_number: 0,
            image_type_flags: BTreeSet::new(),
            frame_count: 1,
            slice_thickness: 0.0,
            manufacturer: String::new(),
            file_reference: file_reference.into(),
            thumbnail_path: None,
        }
    }

    /// Build a record from the raw tags of a file.
    pub fn from_tags(
        tags_map: &TagMap,
        orientation_label: OrientationLabel,
        file_reference: impl Into<PathBuf>,
    ) -> Self {
        let text = |tag| tags_map.text(tag).map(str::to_string).unwrap_or_default();

        let position_text = tags_map
            .text(tags::IMAGE_POSITION_PATIENT)
            .map(|v| v.replace(',', "."))
            .unwrap_or_default();

        let series_description = match tags_map.text(tags::SERIES_DESCRIPTION) {
            Some(v) if v != "None" => v.to_string(),
            _ => UNNAMED_SERIES.to_string(),
        };

        Self {
            patient_name: text(tags::PATIENT_NAME),
            patient_id: text(tags::PATIENT_ID),
            study_id: text(tags::STUDY_ID),
            series_number: text(tags::SERIES_NUMBER),
            series_description,
            orientation_label,
            position: parse_position(&position_text).unwrap_or(DEFAULT_POSITION),
            image_orientation: tags_map
                .text(tags::IMAGE_ORIENTATION_PATIENT)
                .and_then(parse_orientation),
            instance_number: tags_map
                .text(tags::INSTANCE_NUMBER)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            image_type_flags: tags_map
                .text(tags::IMAGE_TYPE)
                .map(|v| {
                    v.split('\\')
                        .map(str::trim)
                        .filter(|flag| !flag.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            frame_count: tags_map
                .text(tags::NUMBER_OF_FRAMES)
                .and_then(|v| v.parse().ok())
                .filter(|&n: &u32| n >= 1)
                .unwrap_or(1),
            slice_thickness: tags_map
                .text(tags::SLICE_THICKNESS)
                .and_then(|v| v.replace(',', ".").parse().ok())
                .unwrap_or(0.0),
            manufacturer: text(tags::MANUFACTURER),
            position_text,
            file_reference: file_reference.into(),
            thumbnail_path: None,
        }
    }

    /// Derived images may share positions with their originals and are
    /// deduplicated by instance number instead.
    pub fn is_derived(&self) -> bool {
        self.image_type_flags.contains("DERIVED")
    }

    /// Position projected on the axis the slice orientation stacks along.
    pub fn axis_position(&self, orientation: OrientationLabel) -> f64 {
        self.position[orientation.axis()]
    }
}

fn parse_numbers(text: &str) -> Option<Vec<f64>> {
    text.split('\\')
        .map(|v| v.trim().replace(',', ".").parse::<f64>().ok())
        .collect()
}

fn parse_position(text: &str) -> Option<Position> {
    let values = parse_numbers(text)?;
    <[f64; 3]>::try_from(values.as_slice())
        .ok()
        .filter(|p| p.iter().all(|v| v.is_finite()))
}

fn parse_orientation(text: &str) -> Option<[f64; 6]> {
    let values = parse_numbers(text)?;
    <[f64; 6]>::try_from(values.as_slice()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tags() -> TagMap {
        [
            (tags::PATIENT_NAME, "DOE^JOHN "),
            (tags::PATIENT_ID, "123"),
            (tags::STUDY_ID, "7"),
            (tags::SERIES_NUMBER, "3"),
            (tags::SERIES_DESCRIPTION, "CHEST"),
            (tags::IMAGE_POSITION_PATIENT, "-10,5\\20\\30.25"),
            (tags::IMAGE_ORIENTATION_PATIENT, "1\\0\\0\\0\\1\\0"),
            (tags::INSTANCE_NUMBER, "12"),
            (tags::IMAGE_TYPE, "ORIGINAL\\PRIMARY\\AXIAL"),
            (tags::NUMBER_OF_FRAMES, "4"),
            (tags::SLICE_THICKNESS, "1.5"),
            (tags::MANUFACTURER, "Koning"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn reads_typed_fields_from_tags() {
        let record = SliceRecord::from_tags(&sample_tags(), OrientationLabel::Axial, "a.dcm");

        assert_eq!(record.patient_name, "DOE^JOHN");
        assert_eq!(record.series_description, "CHEST");
        assert_eq!(record.position, [-10.5, 20.0, 30.25]);
        assert_eq!(record.position_text, "-10.5\\20\\30.25");
        assert_eq!(record.image_orientation, Some([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]));
        assert_eq!(record.instance_number, 12);
        assert!(record.image_type_flags.contains("ORIGINAL"));
        assert!(!record.is_derived());
        assert_eq!(record.frame_count, 4);
        assert_eq!(record.slice_thickness, 1.5);
        assert_eq!(record.manufacturer, "Koning");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let record = SliceRecord::from_tags(&TagMap::new(), OrientationLabel::Unknown, "b.dcm");

        assert_eq!(record.position, DEFAULT_POSITION);
        assert_eq!(record.instance_number, 0);
        assert_eq!(record.frame_count, 1);
        assert!(record.image_type_flags.is_empty());
        assert_eq!(record.series_description, UNNAMED_SERIES);
        assert_eq!(record.manufacturer, "");
    }

    #[test]
    fn garbled_values_fall_back_to_defaults() {
        let tags_map: TagMap = [
            (tags::IMAGE_POSITION_PATIENT, "1\\two\\3"),
            (tags::INSTANCE_NUMBER, "n/a"),
            (tags::NUMBER_OF_FRAMES, "0"),
            (tags::SERIES_DESCRIPTION, "None"),
        ]
        .into_iter()
        .collect();
        let record = SliceRecord::from_tags(&tags_map, OrientationLabel::Axial, "c.dcm");

        assert_eq!(record.position, DEFAULT_POSITION);
        assert_eq!(record.instance_number, 0);
        assert_eq!(record.frame_count, 1);
        assert_eq!(record.series_description, UNNAMED_SERIES);
    }

    #[test]
    fn derived_flag_is_detected() {
        let tags_map: TagMap = [(tags::IMAGE_TYPE, "DERIVED\\SECONDARY")].into_iter().collect();
        let record = SliceRecord::from_tags(&tags_map, OrientationLabel::Axial, "d.dcm");
        assert!(record.is_derived());
    }
}
