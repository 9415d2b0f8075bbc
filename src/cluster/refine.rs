//! Mask and Label Refinement
//!
//! Post-processing passes that clean a threshold mask before labeling, or
//! inspect and rewrite a labeled volume afterwards:
//!
//! - neighbour-count erosion removes isolated single-sample spikes
//! - channel support keeps samples backed by enough adjacent channels
//! - blob pruning drops small components that would bridge real clusters
//! - relabeling and pairwise spread operate on labeled volumes

use std::collections::HashMap;

use ndarray::{Array2, Axis, Zip};
use serde::{Deserialize, Serialize};

use super::labeling::label_slice;
use crate::adjacency::AdjacencyMatrix;
use crate::error::{ClusterError, Result};
use crate::volume::{LabelVolume, Mask};

/// Within-channel neighbourhood used for neighbour counting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighbourKernel {
    /// Up, down, left, right
    Cross,
    /// All 8 surrounding samples
    #[default]
    Square,
}

impl NeighbourKernel {
    fn offsets(self) -> &'static [(isize, isize)] {
        const CROSS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        const SQUARE: [(isize, isize); 8] = [
            (-1, -1), (-1, 0), (-1, 1),
            (0, -1),           (0, 1),
            (1, -1),  (1, 0),  (1, 1),
        ];
        match self {
            NeighbourKernel::Cross => &CROSS,
            NeighbourKernel::Square => &SQUARE,
        }
    }
}

/// Keep only samples with at least `min_neighbors` true neighbours in the same channel
///
/// Counts are taken on the input mask, so one pass never cascades.
pub fn erode_by_neighbor_count(mask: &Mask, min_neighbors: usize, kernel: NeighbourKernel) -> Mask {
    let (_, rows, cols) = mask.dim();
    let mut out = mask.clone();

    for (slice, mut target) in mask.outer_iter().zip(out.outer_iter_mut()) {
        for r in 0..rows {
            for c in 0..cols {
                if !slice[[r, c]] {
                    continue;
                }
                let count = kernel
                    .offsets()
                    .iter()
                    .filter(|&&(dr, dc)| {
                        let (nr, nc) = (r as isize + dr, c as isize + dc);
                        nr >= 0
                            && nc >= 0
                            && (nr as usize) < rows
                            && (nc as usize) < cols
                            && slice[[nr as usize, nc as usize]]
                    })
                    .count();
                if count < min_neighbors {
                    target[[r, c]] = false;
                }
            }
        }
    }

    out
}

/// Keep a sample only if at least `min_channels` adjacent channels are also true there
///
/// `min_channels == 0` returns the mask unchanged and needs no adjacency.
pub fn require_min_channel_support(
    mask: &Mask,
    adjacency: Option<&AdjacencyMatrix>,
    min_channels: usize,
) -> Result<Mask> {
    if min_channels == 0 {
        return Ok(mask.clone());
    }
    let adjacency = adjacency.ok_or(ClusterError::MissingAdjacency(min_channels))?;
    check_channels(mask.len_of(Axis(0)), adjacency)?;

    let mut out = mask.clone();
    for (ch, mut target) in out.outer_iter_mut().enumerate() {
        let mut support = Array2::<usize>::zeros(target.raw_dim());
        for ngb in adjacency.neighbors(ch) {
            Zip::from(&mut support)
                .and(&mask.index_axis(Axis(0), ngb))
                .for_each(|s, &m| *s += m as usize);
        }
        Zip::from(&mut target)
            .and(&support)
            .for_each(|t, &s| *t = *t && s >= min_channels);
    }

    Ok(out)
}

/// Zero out every within-channel component smaller than `min_size` samples
pub fn prune_small_blobs(mask: &Mask, min_size: usize) -> Mask {
    let mut out = mask.clone();
    if min_size <= 1 {
        return out;
    }

    for (slice, mut target) in mask.outer_iter().zip(out.outer_iter_mut()) {
        let (labels, n) = label_slice(slice);
        if n == 0 {
            continue;
        }
        let mut sizes = vec![0usize; n + 1];
        for &l in labels.iter() {
            sizes[l] += 1;
        }
        Zip::from(&mut target)
            .and(&labels)
            .for_each(|t, &l| {
                if l != 0 && sizes[l] < min_size {
                    *t = false;
                }
            });
    }

    out
}

/// Remap cluster ids; ids missing from `mapping` are left as they are
///
/// Each sample is looked up once, so mappings never chain.
pub fn relabel(labels: &LabelVolume, mapping: &HashMap<usize, usize>) -> LabelVolume {
    labels.mapv(|l| mapping.get(&l).copied().unwrap_or(l))
}

/// Per adjacent channel pair, the number of positions clustered in both
///
/// Symmetric; non-adjacent pairs and the diagonal are zero.
pub fn pairwise_spread(labels: &LabelVolume, adjacency: &AdjacencyMatrix) -> Result<Array2<usize>> {
    let n_chan = labels.len_of(Axis(0));
    check_channels(n_chan, adjacency)?;

    let mut spread = Array2::zeros((n_chan, n_chan));
    for (i, j) in adjacency.edges() {
        let a = labels.index_axis(Axis(0), i);
        let b = labels.index_axis(Axis(0), j);
        let shared = a
            .iter()
            .zip(b.iter())
            .filter(|&(&la, &lb)| la != 0 && lb != 0)
            .count();
        spread[[i, j]] = shared;
        spread[[j, i]] = shared;
    }

    Ok(spread)
}

/// Mask refinement applied before labeling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Minimum same-channel neighbours a sample needs (None disables erosion)
    pub min_neighbors: Option<usize>,
    /// Kernel used for neighbour counting
    pub kernel: NeighbourKernel,
    /// Minimum number of adjacent channels that must also be above threshold
    pub min_channels: usize,
    /// Minimum within-channel component size
    pub min_blob_size: usize,
}

impl RefineConfig {
    /// Does this config change anything?
    pub fn is_noop(&self) -> bool {
        self.min_neighbors.unwrap_or(0) == 0 && self.min_channels == 0 && self.min_blob_size <= 1
    }

    /// Apply erosion, channel support and blob pruning in that order
    pub fn apply(&self, mask: &Mask, adjacency: Option<&AdjacencyMatrix>) -> Result<Mask> {
        let mut out = match self.min_neighbors {
            Some(n) if n > 0 => erode_by_neighbor_count(mask, n, self.kernel),
            _ => mask.clone(),
        };
        out = require_min_channel_support(&out, adjacency, self.min_channels)?;
        Ok(prune_small_blobs(&out, self.min_blob_size))
    }
}

fn check_channels(n_chan: usize, adjacency: &AdjacencyMatrix) -> Result<()> {
    if adjacency.n_channels() != n_chan {
        return Err(ClusterError::shape(
            "adjacency vs volume channels",
            &[n_chan],
            &[adjacency.n_channels()],
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency;
    use crate::volume::count_true;
    use ndarray::array;

    fn single_channel(slice: Array2<bool>) -> Mask {
        slice.insert_axis(Axis(0))
    }

    #[test]
    fn test_erosion_removes_isolated_spike() {
        let mask = single_channel(array![
            [true, false, false, false],
            [false, false, true, true],
            [false, false, true, true]
        ]);
        let eroded = erode_by_neighbor_count(&mask, 1, NeighbourKernel::Square);
        assert!(!eroded[[0, 0, 0]]);
        assert_eq!(count_true(&eroded), 4);
    }

    #[test]
    fn test_erosion_kernel_matters() {
        // a diagonal pair only sees each other through the square kernel
        let mask = single_channel(array![[true, false], [false, true]]);
        assert_eq!(count_true(&erode_by_neighbor_count(&mask, 1, NeighbourKernel::Square)), 2);
        assert_eq!(count_true(&erode_by_neighbor_count(&mask, 1, NeighbourKernel::Cross)), 0);
    }

    #[test]
    fn test_channel_support() {
        let adj = adjacency::grid(1, 3);
        let mut mask = Mask::from_elem((3, 1, 2), false);
        mask[[0, 0, 0]] = true;
        mask[[1, 0, 0]] = true;
        mask[[2, 0, 0]] = true;
        mask[[2, 0, 1]] = true;

        let kept = require_min_channel_support(&mask, Some(&adj), 2).unwrap();
        // only the middle channel has two supporting neighbours
        assert!(kept[[1, 0, 0]]);
        assert_eq!(count_true(&kept), 1);

        let kept = require_min_channel_support(&mask, Some(&adj), 1).unwrap();
        assert_eq!(count_true(&kept), 3);
        assert!(!kept[[2, 0, 1]]);
    }

    #[test]
    fn test_channel_support_requires_adjacency() {
        let mask = Mask::from_elem((2, 1, 1), true);
        assert!(matches!(
            require_min_channel_support(&mask, None, 1),
            Err(ClusterError::MissingAdjacency(1))
        ));
        assert_eq!(require_min_channel_support(&mask, None, 0).unwrap(), mask);
    }

    #[test]
    fn test_prune_small_blobs() {
        let mut slice = Array2::from_elem((4, 8), false);
        // 3-sample blob
        slice[[0, 0]] = true;
        slice[[0, 1]] = true;
        slice[[1, 0]] = true;
        // 6-sample blob
        for c in 4..7 {
            slice[[2, c]] = true;
            slice[[3, c]] = true;
        }
        let mask = single_channel(slice);

        let pruned = prune_small_blobs(&mask, 5);
        assert!(!pruned[[0, 0, 0]] && !pruned[[0, 0, 1]] && !pruned[[0, 1, 0]]);
        assert_eq!(count_true(&pruned), 6);
        for c in 4..7 {
            assert!(pruned[[0, 2, c]] && pruned[[0, 3, c]]);
        }
    }

    #[test]
    fn test_relabel_does_not_chain() {
        let labels = array![[[1, 2, 3, 0]]];
        let mapping = HashMap::from([(1, 2), (2, 5)]);
        assert_eq!(relabel(&labels, &mapping), array![[[2, 5, 3, 0]]]);
    }

    #[test]
    fn test_pairwise_spread() {
        let adj = adjacency::grid(1, 3);
        let labels = array![
            [[1, 1, 0, 0]],
            [[0, 1, 1, 0]],
            [[2, 2, 2, 2]]
        ];
        let spread = pairwise_spread(&labels, &adj).unwrap();
        assert_eq!(spread[[0, 1]], 1);
        assert_eq!(spread[[1, 0]], 1);
        assert_eq!(spread[[1, 2]], 2);
        // 0 and 2 are not adjacent
        assert_eq!(spread[[0, 2]], 0);
        assert_eq!(spread[[0, 0]], 0);
    }

    #[test]
    fn test_refine_config_order() {
        let adj = adjacency::grid(1, 2);
        let mut mask = Mask::from_elem((2, 3, 3), false);
        mask.index_axis_mut(Axis(0), 0).fill(true);
        mask[[1, 1, 1]] = true;

        let config = RefineConfig {
            min_neighbors: Some(1),
            kernel: NeighbourKernel::Cross,
            ..Default::default()
        };
        assert!(!config.is_noop());
        let out = config.apply(&mask, Some(&adj)).unwrap();
        assert_eq!(count_true(&out), 9);
        assert!(RefineConfig::default().is_noop());
    }
}
