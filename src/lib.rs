//! # DICOM-grouper library
//!
//! This crate turns an unordered pile of DICOM slices into the hierarchy a
//! reconstruction needs: patients, their acquisition series, and the slices
//! of each series in spatial order with their inter-slice spacing.

//!
//! This library is part of the dicom-rs ecosystem and leverages its
//! components to read slice headers. Each file is reduced to a typed
//! [`SliceRecord`] and placed by a [`PatientGrouper`]:
//!  - Slices sharing patient, study, series number and orientation form a
//!    series
//!  - Two ordinary slices at the same position split the series into
//!    disambiguated siblings instead of overwriting each other
//!  - Derived images are deduplicated by instance number
//!
//!  Scans run one file at a time on a worker, reporting progress through
//!  [`ScanEvent`]s and stopping cooperatively on a [`CancelToken`]. The
//!  series with the most frames is the default reconstruction candidate and
//!  can be loaded into a [`Volume`] with [`VolumeLoader`].
//!
//! # Examples
//!
//! ## Scanning a directory
//!
//! To group all files below the dicom/ directory and print the largest
//! series.
//!
//! ```no_run
//! # use dicom_grouper::{DicomTagExtractor, FileList, ScanConfig, ScanCoordinator, ScanEvent};
//! let config = ScanConfig::default();
//! let source = FileList::discover("dicom", config.recursive)
//!     .expect("should have listed the directory");
//! let mut coordinator = ScanCoordinator::new(DicomTagExtractor, config);
//! let grouper = coordinator.grouper();
//! let mut events = Vec::new();
//! coordinator.run(grouper, source, &mut events);
//!
//! for event in events {
//!     if let ScanEvent::Result(result) = event {
//!         if let Some(series) = result.largest_series() {
//!             println!("{} ({} slices)", series.title(), series.slice_count());
//!         }
//!     }
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod enums;
pub mod parser;
pub mod patient;
pub mod selection;
pub mod series;
pub mod series_sorter;
pub mod slice;
pub mod sorter;
pub mod source;
pub mod spacing;
pub mod summary;
pub mod volume;
pub mod volume_loader;

pub use config::{Cli, ScanConfig};
pub use coordinator::{
    CancelToken, FileError, ScanCoordinator, ScanEvent, ScanHandle, ScanResult, ScanSink,
    ScanState, spawn_scan,
};
pub use enums::OrientationLabel;
pub use parser::{DicomTagExtractor, ExtractError, ExtractedTags, TagExtractor};
pub use patient::{
    GroupKey, GroupRef, GroupingError, PatientGroup, PatientGrouper, PatientKey,
    select_largest_series,
};
pub use selection::{SelectionError, SliceSelection};
pub use series::{SeriesGroup, SeriesKey, Slot};
pub use series_sorter::{SeriesSorter, SortedSeries, SortedSlice};
pub use slice::{DEFAULT_POSITION, Position, SliceRecord, TagMap};
pub use sorter::{IppSorter, SpatialSorter, ZSPACING_TOLERANCE};
pub use source::{FileList, FileSource, SourceError};
pub use spacing::{SpacingEstimate, ZSpacingEstimator};
pub use summary::{PatientSummary, ScanSummary, SeriesSummary};
pub use volume::Volume;
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
