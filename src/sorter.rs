use crate::slice::SliceRecord;

use std::cmp::Ordering;

/// Tolerance handed to the spatial sorter when ordering a series.
pub const ZSPACING_TOLERANCE: f64 = 1e-10;

/// Largest per-component difference between two sets of direction cosines
/// still considered the same orientation.
const COSINE_TOLERANCE: f64 = 1e-3;

/// Orders slices of one series along their stacking direction.
///
/// Returns a permutation of indices into `slices`, or `None` when the sorter
/// cannot improve on the input order.
pub trait SpatialSorter: Send + Sync {
    fn sort(&self, slices: &[&SliceRecord], tolerance: f64) -> Option<Vec<usize>>;
}

/// Sorts by Image Position (Patient) projected on the slice normal.
#[derive(Debug, Clone, Copy, Default)]
pub struct IppSorter;

impl SpatialSorter for IppSorter {
    fn sort(&self, slices: &[&SliceRecord], tolerance: f64) -> Option<Vec<usize>> {
        let first = slices.first()?.image_orientation?;

        for slice in &slices[1..] {
            let cosines = slice.image_orientation?;
            if cosines
                .iter()
                .zip(first.iter())
                .any(|(a, b)| (a - b).abs() > COSINE_TOLERANCE)
            {
                return None;
            }
        }

        let normal = cross(&first[0..3], &first[3..6]);
        let distances: Vec<f64> = slices
            .iter()
            .map(|slice| dot(&slice.position, &normal))
            .collect();

        let mut order: Vec<usize> = (0..slices.len()).collect();
        order.sort_by(|&a, &b| {
            distances[a]
                .partial_cmp(&distances[b])
                .unwrap_or(Ordering::Equal)
        });

        // Two slices at the same depth leave the order undefined.
        let ambiguous = order
            .windows(2)
            .any(|pair| (distances[pair[1]] - distances[pair[0]]).abs() <= tolerance);
        if ambiguous {
            return None;
        }

        Some(order)
    }
}

fn cross(a: &[f64], b: &[f64]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
