use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("not enough slices to reconstruct: {available} selected with interval {interval}")]
    MissingFilesForReconstruction { available: usize, interval: usize },
}

/// Which slices of an ordered series to hand to reconstruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceSelection {
    /// Slices skipped between two kept slices.
    pub interval: usize,
    /// Inclusive index range into the ordered file list.
    pub range: Option<(usize, usize)>,
}

impl SliceSelection {
    pub fn every(interval: usize) -> Self {
        Self {
            interval,
            range: None,
        }
    }

    pub fn with_range(mut self, first: usize, last: usize) -> Self {
        self.range = Some((first.min(last), first.max(last)));
        self
    }

    /// Factor the series z spacing grows by after subsampling.
    pub fn spacing_factor(&self) -> f64 {
        (self.interval + 1) as f64
    }

    /// Apply the selection to an ordered file list.
    ///
    /// A range that is empty or out of bounds selects the whole list. Fails
    /// when fewer than two slices per interval step would remain.
    pub fn apply(&self, files: &[PathBuf]) -> Result<Vec<PathBuf>, SelectionError> {
        let window = match self.range {
            Some((first, last)) if first != last && last < files.len() => &files[first..=last],
            _ => files,
        };

        let step = self.interval + 1;
        if window.len() as f64 / step as f64 <= 1.0 {
            return Err(SelectionError::MissingFilesForReconstruction {
                available: window.len(),
                interval: self.interval,
            });
        }

        Ok(window.iter().step_by(step).cloned().collect())
    }
}
