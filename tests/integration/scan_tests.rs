//! Progress and cancellation of scans on the worker pool.

use futures::StreamExt;

use dicom_grouper::{CancelToken, ScanConfig, ScanCoordinator, ScanEvent, ScanState, spawn_scan};

use super::test_utils::{FakeSlice, MemoryExtractor, file_list};

fn slices(count: i64) -> Vec<FakeSlice> {
    (0..count)
        .map(|i| FakeSlice::axial("DOE", "1", i + 1, i as f64))
        .collect()
}

#[tokio::test]
async fn spawned_scan_streams_progress_and_result() {
    let (extractor, paths) = MemoryExtractor::with_slices(slices(4));
    let coordinator = ScanCoordinator::new(extractor, ScanConfig::default());

    let handle = spawn_scan(coordinator, file_list(&paths));
    let events: Vec<ScanEvent> = handle.events.collect().await;
    assert_eq!(handle.task.await.unwrap(), ScanState::Completed);

    let progress: Vec<(usize, usize)> = events
        .iter()
        .filter_map(|event| match event {
            ScanEvent::Progress { processed, total } => Some((*processed, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);

    assert!(matches!(events.last(), Some(ScanEvent::Finished)));
    let ScanEvent::Result(result) = &events[events.len() - 2] else {
        panic!("result should precede the terminal event");
    };
    assert_eq!(result.largest_series().unwrap().slice_count(), 4);
}

#[tokio::test]
async fn cancelled_scan_delivers_no_result() {
    let token = CancelToken::new();
    let (extractor, paths) = MemoryExtractor::with_slices(slices(10));
    let extractor = extractor.cancel_at(paths[2].clone(), token.clone());
    let coordinator =
        ScanCoordinator::new(extractor, ScanConfig::default()).with_cancel_token(token);

    let handle = spawn_scan(coordinator, file_list(&paths));
    let events: Vec<ScanEvent> = handle.events.collect().await;
    assert_eq!(handle.task.await.unwrap(), ScanState::Cancelled);

    assert_eq!(events.len(), 4);
    assert!(matches!(events[2], ScanEvent::Progress { processed: 3, total: 10 }));
    assert!(matches!(events[3], ScanEvent::Finished));
    assert!(!events.iter().any(|event| matches!(event, ScanEvent::Result(_))));
}

#[tokio::test]
async fn non_images_are_counted_as_skipped() {
    let (extractor, mut paths) = MemoryExtractor::with_slices(slices(2));
    paths.push("scan/README".into());
    let coordinator = ScanCoordinator::new(extractor, ScanConfig::default());

    let handle = spawn_scan(coordinator, file_list(&paths));
    let events: Vec<ScanEvent> = handle.events.collect().await;

    let result = events
        .into_iter()
        .find_map(|event| match event {
            ScanEvent::Result(result) => Some(result),
            _ => None,
        })
        .unwrap();
    assert_eq!(result.skipped_files, 1);
    assert_eq!(result.series_count(), 1);
}
