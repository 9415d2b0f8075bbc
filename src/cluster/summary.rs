//! Cluster Summaries
//!
//! Turns a merged label volume plus the statistic it was thresholded from
//! into a list of clusters with their summary statistic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::volume::{LabelVolume, Mask, StatVolume};

/// Sign of the threshold exceedance a cluster was formed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tail {
    Positive,
    Negative,
}

impl Tail {
    /// +1.0 or -1.0
    pub fn sign(self) -> f64 {
        match self {
            Tail::Positive => 1.0,
            Tail::Negative => -1.0,
        }
    }
}

/// Cluster-level summary statistic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterStat {
    /// Sum of member statistic values ("cluster mass")
    #[default]
    Sum,
    /// Mean of member statistic values
    Mean,
    /// Member count, signed by tail
    Size,
}

/// One connected cluster after cross-channel merging
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Id in the merged label volume
    pub id: usize,
    /// Tail the cluster was thresholded in
    pub tail: Tail,
    /// Member samples
    pub mask: Mask,
    /// Summary statistic
    pub statistic: f64,
    /// Number of member samples
    pub size: usize,
    /// Number of distinct channels touched
    pub n_channels: usize,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    size: usize,
    channels: Vec<usize>,
}

/// Summary statistic of every cluster in `labels`, ordered by id
///
/// Cheaper than `extract_clusters` since no member masks are built; the
/// permutation loop only needs these numbers.
pub fn cluster_statistics(labels: &LabelVolume, stat: &StatVolume, tail: Tail, kind: ClusterStat) -> Vec<f64> {
    accumulate(labels, stat)
        .into_values()
        .map(|acc| summarize(&acc, tail, kind))
        .collect()
}

/// Full clusters, ordered by id
pub fn extract_clusters(labels: &LabelVolume, stat: &StatVolume, tail: Tail, kind: ClusterStat) -> Vec<Cluster> {
    accumulate(labels, stat)
        .into_iter()
        .map(|(id, acc)| Cluster {
            id,
            tail,
            mask: labels.mapv(|l| l == id),
            statistic: summarize(&acc, tail, kind),
            size: acc.size,
            n_channels: acc.channels.len(),
        })
        .collect()
}

fn accumulate(labels: &LabelVolume, stat: &StatVolume) -> BTreeMap<usize, Accumulator> {
    let mut clusters: BTreeMap<usize, Accumulator> = BTreeMap::new();
    for ((ch, i, j), &id) in labels.indexed_iter() {
        if id == 0 {
            continue;
        }
        let acc = clusters.entry(id).or_default();
        acc.sum += stat[[ch, i, j]];
        acc.size += 1;
        // indexed_iter walks channels in order, so a channel shows up contiguously
        if acc.channels.last() != Some(&ch) {
            acc.channels.push(ch);
        }
    }
    clusters
}

fn summarize(acc: &Accumulator, tail: Tail, kind: ClusterStat) -> f64 {
    match kind {
        ClusterStat::Sum => acc.sum,
        ClusterStat::Mean => acc.sum / acc.size as f64,
        ClusterStat::Size => tail.sign() * acc.size as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_extract_clusters() {
        let labels: LabelVolume = array![[[1, 1, 0]], [[0, 1, 2]]];
        let stat = array![[[2.0, 3.0, 0.1]], [[0.0, 2.5, 4.0]]];

        let clusters = extract_clusters(&labels, &stat, Tail::Positive, ClusterStat::Sum);
        assert_eq!(clusters.len(), 2);

        let first = &clusters[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.size, 3);
        assert_eq!(first.n_channels, 2);
        assert_relative_eq!(first.statistic, 7.5);
        assert!(first.mask[[1, 0, 1]]);
        assert!(!first.mask[[1, 0, 2]]);

        assert_eq!(clusters[1].n_channels, 1);
        assert_relative_eq!(clusters[1].statistic, 4.0);
    }

    #[test]
    fn test_summary_kinds() {
        let labels: LabelVolume = array![[[3, 3, 3, 3]]];
        let stat = array![[[-2.0, -3.0, -4.0, -3.0]]];

        let sum = cluster_statistics(&labels, &stat, Tail::Negative, ClusterStat::Sum);
        let mean = cluster_statistics(&labels, &stat, Tail::Negative, ClusterStat::Mean);
        let size = cluster_statistics(&labels, &stat, Tail::Negative, ClusterStat::Size);
        assert_relative_eq!(sum[0], -12.0);
        assert_relative_eq!(mean[0], -3.0);
        assert_relative_eq!(size[0], -4.0);
    }

    #[test]
    fn test_no_clusters() {
        let labels = LabelVolume::zeros((2, 3, 4));
        let stat = StatVolume::zeros((2, 3, 4));
        assert!(cluster_statistics(&labels, &stat, Tail::Positive, ClusterStat::Sum).is_empty());
    }
}
