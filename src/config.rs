//! Scan configuration and command-line arguments.
//!
//! Every CLI option can also be set through an environment variable with
//! the `DICOM_GROUPER_` prefix:
//!
//! - `DICOM_GROUPER_MAX_COLLISION_RETRIES` - extra series a colliding slice
//!   may probe (default: 64)
//! - `DICOM_GROUPER_NO_RECURSIVE` - only scan the top-level directory
//! - `DICOM_GROUPER_INTERVAL` - slices skipped between loaded slices

use clap::Parser;
use std::path::PathBuf;

/// Default bound on collision retries for one slice.
pub const DEFAULT_MAX_COLLISION_RETRIES: u32 = 64;

/// Limits and switches of a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Extra disambiguation indices a slice may try after its first
    /// collision before it is reported as ungroupable.
    pub max_collision_retries: u32,
    pub recursive: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_collision_retries: DEFAULT_MAX_COLLISION_RETRIES,
            recursive: true,
        }
    }
}

/// Group a directory of DICOM slices into patients and series.
#[derive(Parser, Debug, Clone)]
#[command(name = "dicom-grouper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan.
    pub path: PathBuf,

    /// Do not descend into subdirectories.
    #[arg(long, env = "DICOM_GROUPER_NO_RECURSIVE")]
    pub no_recursive: bool,

    /// Extra series a slice with a duplicate position may try.
    #[arg(long, default_value_t = DEFAULT_MAX_COLLISION_RETRIES, env = "DICOM_GROUPER_MAX_COLLISION_RETRIES")]
    pub max_collision_retries: u32,

    /// Print the hierarchy as JSON.
    #[arg(long)]
    pub json: bool,

    /// Load the largest series into a volume after scanning.
    #[arg(long)]
    pub load_volume: bool,

    /// Slices skipped between two loaded slices.
    #[arg(long, default_value_t = 0, env = "DICOM_GROUPER_INTERVAL")]
    pub interval: usize,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            max_collision_retries: self.max_collision_retries,
            recursive: !self.no_recursive,
        }
    }
}
