use crate::enums::OrientationLabel;
use crate::slice::SliceRecord;

/// Spacing reported for series with fewer than two slices, or whose slices
/// do not advance along the stacking axis.
pub const DEFAULT_Z_SPACING: f64 = 1.0;

/// Result of estimating the spacing over a whole ordered series.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacingEstimate {
    /// Mean distance between consecutive slices, rounded to 2 decimals.
    pub z_spacing: f64,
    /// Distinct consecutive distances, rounded to 2 decimals, ascending.
    pub steps: Vec<f64>,
}

impl SpacingEstimate {
    /// More than one distinct step means the slices are unevenly spaced.
    pub fn is_irregular(&self) -> bool {
        self.steps.len() > 1
    }
}

pub struct ZSpacingEstimator;

impl ZSpacingEstimator {
    /// Distance between the first two slices along the orientation axis.
    ///
    /// Cheap enough to recompute after every admission; use
    /// [`ZSpacingEstimator::estimate`] when the whole series is available.
    pub fn two_sample(slices: &[&SliceRecord], orientation: OrientationLabel) -> f64 {
        match slices {
            [first, second, ..] => positive_or_default(
                (second.axis_position(orientation) - first.axis_position(orientation)).abs(),
            ),
            _ => DEFAULT_Z_SPACING,
        }
    }

    /// Mean and distinct values of all consecutive distances along the
    /// orientation axis.
    pub fn estimate(slices: &[&SliceRecord], orientation: OrientationLabel) -> SpacingEstimate {
        if slices.len() < 2 {
            return SpacingEstimate {
                z_spacing: DEFAULT_Z_SPACING,
                steps: Vec::new(),
            };
        }

        let distances: Vec<f64> = slices
            .windows(2)
            .map(|pair| {
                (pair[1].axis_position(orientation) - pair[0].axis_position(orientation)).abs()
            })
            .collect();

        let mean = distances.iter().sum::<f64>() / distances.len() as f64;

        let mut steps: Vec<f64> = distances.iter().copied().map(round2).collect();
        steps.sort_by(f64::total_cmp);
        steps.dedup();

        SpacingEstimate {
            z_spacing: positive_or_default(round2(mean)),
            steps,
        }
    }
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn positive_or_default(spacing: f64) -> f64 {
    if spacing.is_finite() && spacing > 0.0 {
        spacing
    } else {
        DEFAULT_Z_SPACING
    }
}
