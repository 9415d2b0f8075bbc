//! Cross-Channel Cluster Merging
//!
//! After per-channel labeling, a cluster that spans neighbouring channels
//! still carries one id per channel. Two ids belong to the same cluster
//! when adjacent channels are both labeled at the same `(dim1, dim2)`
//! position. Merging always keeps the smaller id.
//!
//! Two strategies give identical output:
//!
//! - `Rescan`: every link immediately relabels the larger id across the
//!   whole volume. O(C² · V) worst case, simple, fine for EEG-sized data.
//! - `UnionFind`: links are collected into a disjoint-set forest whose
//!   roots are the minimum ids, and the volume is relabeled once at the end.

use std::collections::HashMap;

use ndarray::Axis;
use serde::{Deserialize, Serialize};

use crate::adjacency::AdjacencyMatrix;
use crate::error::{ClusterError, Result};
use crate::volume::LabelVolume;

/// How cross-channel links are resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Relabel the whole volume on every link
    #[default]
    Rescan,
    /// Disjoint-set forest with a single final relabel
    UnionFind,
}

/// Merge ids across adjacent channels in place
pub fn merge(labels: &mut LabelVolume, adjacency: &AdjacencyMatrix) -> Result<()> {
    merge_with(labels, adjacency, MergeStrategy::Rescan)
}

/// Merge ids across adjacent channels with an explicit strategy
pub fn merge_with(
    labels: &mut LabelVolume,
    adjacency: &AdjacencyMatrix,
    strategy: MergeStrategy,
) -> Result<()> {
    let n_chan = labels.len_of(Axis(0));
    if adjacency.n_channels() != n_chan {
        return Err(ClusterError::shape(
            "adjacency vs labels",
            &[n_chan, n_chan],
            &[adjacency.n_channels(), adjacency.n_channels()],
        ));
    }

    match strategy {
        MergeStrategy::Rescan => merge_rescan(labels, adjacency),
        MergeStrategy::UnionFind => merge_union_find(labels, adjacency),
    }
    Ok(())
}

fn merge_rescan(labels: &mut LabelVolume, adjacency: &AdjacencyMatrix) {
    let n_chan = labels.len_of(Axis(0));
    // the last channel has no unchecked neighbours left
    for ch in 0..n_chan.saturating_sub(1) {
        let occupied: Vec<usize> = labels
            .index_axis(Axis(0), ch)
            .iter()
            .enumerate()
            .filter(|(_, &l)| l != 0)
            .map(|(i, _)| i)
            .collect();
        if occupied.is_empty() {
            continue;
        }

        for ngb in adjacency.neighbors(ch).filter(|&n| n > ch) {
            for &flat in &occupied {
                let (i, j) = unravel(flat, labels.len_of(Axis(2)));
                let a = labels[[ch, i, j]];
                let b = labels[[ngb, i, j]];
                if b != 0 && a != b {
                    let (keep, drop) = (a.min(b), a.max(b));
                    labels.mapv_inplace(|l| if l == drop { keep } else { l });
                }
            }
        }
    }
}

fn merge_union_find(labels: &mut LabelVolume, adjacency: &AdjacencyMatrix) {
    let max_id = labels.iter().copied().max().unwrap_or(0);
    if max_id == 0 {
        return;
    }

    let mut forest = MinUnionFind::new(max_id + 1);
    for (ch, ngb) in adjacency.edges() {
        let a = labels.index_axis(Axis(0), ch);
        let b = labels.index_axis(Axis(0), ngb);
        for (&la, &lb) in a.iter().zip(b.iter()) {
            if la != 0 && lb != 0 && la != lb {
                forest.union(la, lb);
            }
        }
    }

    let mut roots: HashMap<usize, usize> = HashMap::new();
    labels.mapv_inplace(|l| {
        if l == 0 {
            0
        } else {
            *roots.entry(l).or_insert_with(|| forest.find(l))
        }
    });
}

#[inline]
fn unravel(flat: usize, cols: usize) -> (usize, usize) {
    (flat / cols, flat % cols)
}

/// Disjoint sets whose representative is always the smallest member
struct MinUnionFind {
    parent: Vec<usize>,
}

impl MinUnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    fn union(&mut self, x: usize, y: usize) {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx != ry {
            let (keep, drop) = (rx.min(ry), rx.max(ry));
            self.parent[drop] = keep;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency;
    use crate::cluster::label_per_channel;
    use crate::volume::{channel_extent, Mask};
    use ndarray::Array3;

    fn two_channel_spot() -> Mask {
        let mut mask = Mask::from_elem((2, 1, 3), false);
        mask[[0, 0, 1]] = true;
        mask[[1, 0, 1]] = true;
        mask
    }

    #[test]
    fn test_adjacent_channels_merge() {
        let adj = AdjacencyMatrix::empty(2).with_edge(0, 1, true).unwrap();
        let mut labels = label_per_channel(&two_channel_spot()).labels;
        assert_eq!(labels[[0, 0, 1]], 1);
        assert_eq!(labels[[1, 0, 1]], 2);

        merge(&mut labels, &adj).unwrap();
        assert_eq!(labels[[0, 0, 1]], 1);
        assert_eq!(labels[[1, 0, 1]], 1);
        assert_eq!(channel_extent(&labels.mapv(|l| l == 1)), 2);
    }

    #[test]
    fn test_non_adjacent_channels_stay_apart() {
        let adj = AdjacencyMatrix::empty(2);
        let mut labels = label_per_channel(&two_channel_spot()).labels;
        merge(&mut labels, &adj).unwrap();
        assert_eq!(labels[[0, 0, 1]], 1);
        assert_eq!(labels[[1, 0, 1]], 2);
    }

    #[test]
    fn test_chain_merges_transitively() {
        // channels 0-1-2 in a line, 0 and 2 not adjacent; overlap only via 1
        let adj = adjacency::grid(1, 3);
        let mut mask = Mask::from_elem((3, 1, 4), false);
        mask[[0, 0, 0]] = true;
        mask[[1, 0, 0]] = true;
        mask[[1, 0, 1]] = true;
        mask[[1, 0, 2]] = true;
        mask[[2, 0, 2]] = true;
        mask[[2, 0, 3]] = true;

        let mut labels = label_per_channel(&mask).labels;
        merge(&mut labels, &adj).unwrap();
        let ids: std::collections::BTreeSet<usize> =
            labels.iter().copied().filter(|&l| l != 0).collect();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let adj = adjacency::grid(2, 2);
        let mask = Array3::from_shape_fn((4, 5, 6), |(c, i, j)| (c + i * 2 + j) % 3 != 0);
        let mut labels = label_per_channel(&mask).labels;
        merge(&mut labels, &adj).unwrap();
        let once = labels.clone();
        merge(&mut labels, &adj).unwrap();
        assert_eq!(labels, once);
    }

    #[test]
    fn test_strategies_agree() {
        let adj = adjacency::grid(2, 3);
        let mask = Array3::from_shape_fn((6, 7, 5), |(c, i, j)| (c * 5 + i * 7 + j * 3) % 5 < 2);
        let labeled = label_per_channel(&mask).labels;

        let mut rescan = labeled.clone();
        merge_with(&mut rescan, &adj, MergeStrategy::Rescan).unwrap();
        let mut forest = labeled;
        merge_with(&mut forest, &adj, MergeStrategy::UnionFind).unwrap();
        assert_eq!(rescan, forest);
    }

    #[test]
    fn test_channel_count_mismatch() {
        let mut labels = LabelVolume::zeros((3, 1, 1));
        let adj = AdjacencyMatrix::empty(2);
        assert!(matches!(
            merge(&mut labels, &adj),
            Err(ClusterError::ShapeMismatch { .. })
        ));
    }
}
