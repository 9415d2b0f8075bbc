//! Per-Channel Connected Component Labeling
//!
//! Each channel slice `[dim1, dim2]` is labeled on its own with
//! 4-connectivity. Components are numbered in raster order of their first
//! sample, then shifted by the running total of earlier channels so that
//! ids are unique across the whole volume before any cross-channel merge.

use ndarray::{Array2, ArrayView2, ArrayViewMut2, Axis};

use crate::volume::{LabelVolume, Mask};

/// Output of per-channel labeling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLabels {
    /// Globally unique component ids, 0 = background
    pub labels: LabelVolume,
    /// Highest id assigned up to and including each channel
    pub max_ids: Vec<usize>,
}

impl ChannelLabels {
    /// Total number of components over all channels
    pub fn n_components(&self) -> usize {
        self.max_ids.last().copied().unwrap_or(0)
    }

    /// Number of components found in channel `ch`
    pub fn components_in(&self, ch: usize) -> usize {
        let start = if ch == 0 { 0 } else { self.max_ids[ch - 1] };
        self.max_ids[ch] - start
    }
}

/// Label every channel independently and offset ids to be volume-unique
pub fn label_per_channel(mask: &Mask) -> ChannelLabels {
    let mut labels = LabelVolume::zeros(mask.raw_dim());
    let mut max_ids = Vec::with_capacity(mask.len_of(Axis(0)));
    let mut offset = 0;

    for (slice, out) in mask.outer_iter().zip(labels.outer_iter_mut()) {
        offset += label_slice_into(slice, out, offset);
        max_ids.push(offset);
    }

    ChannelLabels { labels, max_ids }
}

/// Label one 2-D slice, ids starting at 1
///
/// Returns the label image and the number of components.
pub fn label_slice(slice: ArrayView2<bool>) -> (Array2<usize>, usize) {
    let mut out = Array2::zeros(slice.raw_dim());
    let n = label_slice_into(slice, out.view_mut(), 0);
    (out, n)
}

/// Flood-fill labeling of `slice` into `out`, numbering from `offset + 1`
fn label_slice_into(slice: ArrayView2<bool>, mut out: ArrayViewMut2<usize>, offset: usize) -> usize {
    let (rows, cols) = slice.dim();
    let mut n_components = 0;
    let mut queue: Vec<(usize, usize)> = Vec::new();

    for r in 0..rows {
        for c in 0..cols {
            if !slice[[r, c]] || out[[r, c]] != 0 {
                continue;
            }

            n_components += 1;
            let id = offset + n_components;
            out[[r, c]] = id;
            queue.clear();
            queue.push((r, c));

            while let Some((y, x)) = queue.pop() {
                let neighbours = [
                    (y.wrapping_sub(1), x),
                    (y + 1, x),
                    (y, x.wrapping_sub(1)),
                    (y, x + 1),
                ];
                for (ny, nx) in neighbours {
                    if ny < rows && nx < cols && slice[[ny, nx]] && out[[ny, nx]] == 0 {
                        out[[ny, nx]] = id;
                        queue.push((ny, nx));
                    }
                }
            }
        }
    }

    n_components
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_all_false_has_no_clusters() {
        let mask = Mask::from_elem((3, 4, 5), false);
        let out = label_per_channel(&mask);
        assert!(out.labels.iter().all(|&l| l == 0));
        assert_eq!(out.n_components(), 0);
        assert_eq!(out.max_ids, vec![0, 0, 0]);
    }

    #[test]
    fn test_four_connectivity_only() {
        // diagonal neighbours are separate components
        let slice = array![
            [true, false, true],
            [false, true, false],
            [true, true, false]
        ];
        let (labels, n) = label_slice(slice.view());
        assert_eq!(n, 3);
        assert_eq!(labels, array![[1, 0, 2], [0, 3, 0], [3, 3, 0]]);
    }

    #[test]
    fn test_raster_order_ids() {
        // the U shape gets a single id even though its arms start separately
        let slice = array![
            [true, false, true],
            [true, false, true],
            [true, true, true]
        ];
        let (labels, n) = label_slice(slice.view());
        assert_eq!(n, 1);
        assert!(labels.iter().all(|&l| l == 0 || l == 1));
    }

    #[test]
    fn test_offsets_across_channels() {
        let mut mask = Array3::from_elem((3, 1, 5), false);
        // channel 0: two components
        mask[[0, 0, 0]] = true;
        mask[[0, 0, 2]] = true;
        // channel 1: none
        // channel 2: one component
        mask[[2, 0, 3]] = true;
        mask[[2, 0, 4]] = true;

        let out = label_per_channel(&mask);
        assert_eq!(out.max_ids, vec![2, 2, 3]);
        assert_eq!(out.components_in(0), 2);
        assert_eq!(out.components_in(1), 0);
        assert_eq!(out.components_in(2), 1);
        assert_eq!(out.labels[[0, 0, 0]], 1);
        assert_eq!(out.labels[[0, 0, 2]], 2);
        assert_eq!(out.labels[[2, 0, 3]], 3);
        assert_eq!(out.labels[[2, 0, 4]], 3);
    }

    #[test]
    fn test_labeling_is_deterministic() {
        let mask = Array3::from_shape_fn((4, 6, 7), |(c, i, j)| (c * 7 + i * 3 + j * 5) % 4 == 0);
        let a = label_per_channel(&mask);
        let b = label_per_channel(&mask);
        assert_eq!(a, b);
    }
}
