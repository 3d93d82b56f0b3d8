//! Integration tests for DICOM grouper.
//!
//! These tests drive whole scans through an in-memory tag extractor:
//! - Grouping, collision splitting and ordering of the final hierarchy
//! - Batch spacing estimates and irregularity flags
//! - Progress, completion and cancellation on the worker pool

mod integration {
    pub mod test_utils;

    pub mod grouping_tests;
    pub mod scan_tests;
}
