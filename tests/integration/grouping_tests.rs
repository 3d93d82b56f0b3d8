//! Grouping behaviour of complete scans.

use dicom_grouper::{
    GroupKey, GroupRef, IppSorter, ScanConfig, ScanCoordinator, ScanEvent, ScanResult, ScanState,
    SeriesSorter,
};

use super::test_utils::{FakeSlice, MemoryExtractor, file_list};

fn scan(slices: Vec<FakeSlice>) -> ScanResult {
    let (extractor, paths) = MemoryExtractor::with_slices(slices);
    let mut coordinator = ScanCoordinator::new(extractor, ScanConfig::default());
    let grouper = coordinator.grouper();
    let mut events = Vec::new();

    let state = coordinator.run(grouper, file_list(&paths), &mut events);
    assert_eq!(state, ScanState::Completed);

    events
        .into_iter()
        .find_map(|event| match event {
            ScanEvent::Result(result) => Some(result),
            _ => None,
        })
        .expect("completed scan should deliver a result")
}

#[test]
fn distinct_positions_form_one_series() {
    let result = scan(vec![
        FakeSlice::axial("DOE", "1", 3, 2.0),
        FakeSlice::axial("DOE", "1", 1, 0.0),
        FakeSlice::axial("DOE", "1", 2, 1.0),
    ]);

    assert_eq!(result.patients.len(), 1);
    let groups = result.patients[0].groups();
    assert_eq!(groups.len(), 1);

    let series = groups[0];
    assert_eq!(series.slice_count(), 3);
    assert_eq!(series.z_spacing(), 1.0);
    let instances: Vec<i64> = series
        .ordered_slices()
        .iter()
        .map(|slice| slice.instance_number)
        .collect();
    assert_eq!(instances, vec![1, 2, 3]);

    let sorted = SeriesSorter::new(Some(&IppSorter)).sort_series(series);
    assert!(!sorted.slices_dif_distance);
}

#[test]
fn duplicate_positions_split_the_series() {
    let result = scan(vec![
        FakeSlice::axial("DOE", "1", 1, 0.0),
        FakeSlice::axial("DOE", "1", 2, 1.0),
        FakeSlice::axial("DOE", "1", 3, 0.0),
        FakeSlice::axial("DOE", "1", 4, 1.0),
    ]);

    let patient = &result.patients[0];
    assert_eq!(patient.total_slices(), 6);

    let mut keys: Vec<_> = patient.groups().iter().map(|g| g.key().clone()).collect();
    keys.sort();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].disambiguation_index, 0);
    assert_eq!(keys[1].disambiguation_index, 1);
    assert_eq!(keys[0].series_number, keys[1].series_number);
    assert_eq!(keys[0].orientation_label, keys[1].orientation_label);
    assert!(patient.groups().iter().all(|group| group.slice_count() == 2));
}

#[test]
fn derived_images_share_positions() {
    let derived = |instance, z| FakeSlice {
        image_type: "DERIVED\\SECONDARY",
        ..FakeSlice::axial("DOE", "1", instance, z)
    };
    let result = scan(vec![derived(1, 0.0), derived(2, 0.0), derived(3, 0.0)]);

    let groups = result.patients[0].groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
}

#[test]
fn irregular_spacing_is_detected_in_batch() {
    let result = scan(vec![
        FakeSlice::axial("DOE", "1", 1, 0.0),
        FakeSlice::axial("DOE", "1", 2, 1.0),
        FakeSlice::axial("DOE", "1", 3, 3.0),
    ]);

    let sorted = SeriesSorter::new(Some(&IppSorter)).sort_all(&result.patients);
    assert_eq!(sorted.len(), 1);
    assert_eq!(sorted[0].z_spacing, 1.5);
    assert!(sorted[0].slices_dif_distance);
}

#[test]
fn hierarchy_is_ordered_and_largest_series_is_default() {
    let mut slices = Vec::new();
    for (patient, series, title, count) in [
        ("ZED", "1", "BRAIN", 5),
        ("AMY", "1", "ABDOMEN", 12),
        ("AMY", "2", "CHEST", 3),
    ] {
        for i in 0..count {
            slices.push(FakeSlice::axial(patient, series, i + 1, i as f64).titled(title));
        }
    }
    let result = scan(slices);

    let names: Vec<&str> = result.patients.iter().map(|p| p.patient_name()).collect();
    assert_eq!(names, vec!["AMY", "ZED"]);

    let titles: Vec<&str> = result.patients[0].groups().iter().map(|g| g.title()).collect();
    assert_eq!(titles, vec!["CHEST", "ABDOMEN"]);

    let largest = result.largest_series().unwrap();
    assert_eq!(largest.slice_count(), 12);
    assert_eq!(largest.title(), "ABDOMEN");
}

#[test]
fn patient_key_opens_first_series() {
    let result = scan(vec![
        FakeSlice::axial("DOE", "1", 1, 0.0).titled("ABDOMEN"),
        FakeSlice::axial("DOE", "2", 1, 0.0).titled("CHEST"),
    ]);

    let key = GroupKey::Patient(result.patients[0].key().clone());
    assert!(matches!(result.resolve(&key), Some(GroupRef::Patient(_))));
    assert_eq!(result.series_to_open(&key).unwrap().title(), "CHEST");
}
