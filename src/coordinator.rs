use crate::config::ScanConfig;
use crate::parser::TagExtractor;
use crate::patient::{
    GroupKey, GroupRef, GroupingError, PatientGroup, PatientGrouper, resolve,
    select_largest_series,
};
use crate::series::SeriesGroup;
use crate::source::FileSource;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of a [`ScanCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Completed,
    Cancelled,
}

/// Messages delivered to the consumer of a scan.
#[derive(Debug)]
pub enum ScanEvent {
    /// `processed` of `total` files handled so far.
    Progress { processed: usize, total: usize },
    /// Terminal marker, sent once after completion or cancellation.
    Finished,
    /// The finished hierarchy. Never sent for a cancelled scan.
    Result(ScanResult),
}

/// Receives the events of a scan.
pub trait ScanSink {
    fn send(&mut self, event: ScanEvent);
}

impl<F: FnMut(ScanEvent)> ScanSink for F {
    fn send(&mut self, event: ScanEvent) {
        self(event)
    }
}

impl ScanSink for Vec<ScanEvent> {
    fn send(&mut self, event: ScanEvent) {
        self.push(event);
    }
}

/// Cooperative cancellation flag shared between a scan and its consumer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A file that could not be placed in the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct FileError {
    pub path: PathBuf,
    pub error: GroupingError,
}

/// Hierarchy built by a completed scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Patients sorted by name.
    pub patients: Vec<PatientGroup>,
    /// Files that were not recognized as images.
    pub skipped_files: usize,
    pub file_errors: Vec<FileError>,
}

impl ScanResult {
    /// The default reconstruction candidate: the series with most frames.
    pub fn largest_series(&self) -> Option<&SeriesGroup> {
        select_largest_series(&self.patients)
    }

    pub fn resolve(&self, key: &GroupKey) -> Option<GroupRef<'_>> {
        resolve(&self.patients, key)
    }

    /// The series to open when the user picks `key`.
    pub fn series_to_open(&self, key: &GroupKey) -> Option<&SeriesGroup> {
        self.resolve(key)?.series()
    }

    pub fn series_count(&self) -> usize {
        self.patients.iter().map(PatientGroup::series_count).sum()
    }
}

/// Drives one scan: extracts each file, groups it, reports progress and
/// honors cancellation between files.
pub struct ScanCoordinator<E> {
    extractor: E,
    config: ScanConfig,
    cancel: CancelToken,
    state: ScanState,
}

impl<E: TagExtractor> ScanCoordinator<E> {
    pub fn new(extractor: E, config: ScanConfig) -> Self {
        Self {
            extractor,
            config,
            cancel: CancelToken::new(),
            state: ScanState::Idle,
        }
    }

    /// Share an existing cancellation token instead of a fresh one.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Token that stops the scan after the file in progress.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    /// Build a fresh aggregation context with this coordinator's limits.
    pub fn grouper(&self) -> PatientGrouper {
        PatientGrouper::new(self.config.max_collision_retries)
    }

    /// Scan every file of `source` into `grouper`.
    ///
    /// Emits a progress event after each file. On completion the result is
    /// sent followed by [`ScanEvent::Finished`]; on cancellation only
    /// [`ScanEvent::Finished`] is sent and `grouper` is dropped.
    pub fn run<S, K>(&mut self, mut grouper: PatientGrouper, source: S, sink: &mut K) -> ScanState
    where
        S: FileSource,
        K: ScanSink + ?Sized,
    {
        self.state = ScanState::Scanning;
        let total = source.total();
        info!(total, "scan started");

        let mut skipped_files = 0;
        let mut file_errors = Vec::new();

        if self.cancel.is_cancelled() {
            return self.cancelled(0, sink);
        }

        for (processed, path) in (1..).zip(source) {
            match self.extractor.extract(&path) {
                Ok(extracted) => {
                    let slice = extracted.into_slice_record();
                    if let Err(error) = grouper.add_file(&slice) {
                        warn!(file = ?path, %error, "slice could not be grouped");
                        file_errors.push(FileError { path, error });
                    }
                }
                Err(error) => {
                    debug!(%error, "skipping file");
                    skipped_files += 1;
                }
            }

            sink.send(ScanEvent::Progress { processed, total });

            if self.cancel.is_cancelled() {
                return self.cancelled(processed, sink);
            }
        }

        let result = ScanResult {
            patients: grouper.into_patients(),
            skipped_files,
            file_errors,
        };
        info!(
            patients = result.patients.len(),
            series = result.series_count(),
            skipped = result.skipped_files,
            errors = result.file_errors.len(),
            "scan completed"
        );

        self.state = ScanState::Completed;
        sink.send(ScanEvent::Result(result));
        sink.send(ScanEvent::Finished);
        self.state
    }

    fn cancelled<K: ScanSink + ?Sized>(&mut self, processed: usize, sink: &mut K) -> ScanState {
        info!(processed, "scan cancelled");
        self.state = ScanState::Cancelled;
        sink.send(ScanEvent::Finished);
        self.state
    }
}

/// A scan running on the blocking thread pool.
pub struct ScanHandle {
    pub events: UnboundedReceiver<ScanEvent>,
    pub cancel: CancelToken,
    pub task: JoinHandle<ScanState>,
}

/// Run `coordinator` over `source` off the async executor.
///
/// Must be called from within a tokio runtime.
pub fn spawn_scan<E, S>(mut coordinator: ScanCoordinator<E>, source: S) -> ScanHandle
where
    E: TagExtractor + Send + 'static,
    S: FileSource + Send + 'static,
{
    let (sender, events) = mpsc::unbounded();
    let cancel = coordinator.cancel_token();
    let mut sink = channel_sink(sender, coordinator.cancel_token());
    let task = tokio::task::spawn_blocking(move || {
        let grouper = coordinator.grouper();
        coordinator.run(grouper, source, &mut sink)
    });

    ScanHandle {
        events,
        cancel,
        task,
    }
}

/// Forward events to `sender`, cancelling the scan once the receiver is gone.
fn channel_sink(
    sender: UnboundedSender<ScanEvent>,
    cancel: CancelToken,
) -> impl FnMut(ScanEvent) + Send + 'static {
    move |event| {
        if sender.unbounded_send(event).is_err() && !cancel.is_cancelled() {
            debug!("scan events receiver dropped, cancelling");
            cancel.cancel();
        }
    }
}
