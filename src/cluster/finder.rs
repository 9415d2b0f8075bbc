//! Cluster Finder: Threshold → Refine → Label → Merge
//!
//! Bundles the parameters that have to stay identical between the observed
//! pass and every permutation, so both go through exactly the same steps.

use serde::{Deserialize, Serialize};

use super::labeling::label_per_channel;
use super::merge::{merge_with, MergeStrategy};
use super::refine::RefineConfig;
use super::summary::{cluster_statistics, extract_clusters, Cluster, ClusterStat, Tail};
use crate::adjacency::AdjacencyMatrix;
use crate::error::{ClusterError, Result};
use crate::volume::{above, below, LabelVolume, StatVolume};

/// Which tails are tested
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tails {
    /// Positive and negative clusters, two-sided p-values
    #[default]
    Both,
    /// Only `stat > threshold`
    Positive,
    /// Only `stat < -threshold`
    Negative,
}

impl Tails {
    /// Tails searched, positive first
    pub fn tails(self) -> &'static [Tail] {
        match self {
            Tails::Both => &[Tail::Positive, Tail::Negative],
            Tails::Positive => &[Tail::Positive],
            Tails::Negative => &[Tail::Negative],
        }
    }

    pub fn is_two_sided(self) -> bool {
        self == Tails::Both
    }
}

/// Most extreme cluster statistic per tail, 0.0 when a tail has no cluster
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TailExtrema {
    pub positive: f64,
    pub negative: f64,
}

/// Cluster search over a statistic volume
#[derive(Debug, Clone)]
pub struct ClusterFinder<'a> {
    adjacency: &'a AdjacencyMatrix,
    threshold: f64,
    tails: Tails,
    refine: RefineConfig,
    strategy: MergeStrategy,
    stat: ClusterStat,
}

impl<'a> ClusterFinder<'a> {
    /// Finder with default tails, no refinement and the rescan merge
    pub fn new(adjacency: &'a AdjacencyMatrix, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ClusterError::invalid(
                "threshold",
                format!("must be a finite non-negative magnitude, got {threshold}"),
            ));
        }
        Ok(Self {
            adjacency,
            threshold,
            tails: Tails::default(),
            refine: RefineConfig::default(),
            strategy: MergeStrategy::default(),
            stat: ClusterStat::default(),
        })
    }

    pub fn tails(mut self, tails: Tails) -> Self {
        self.tails = tails;
        self
    }

    pub fn refine(mut self, refine: RefineConfig) -> Self {
        self.refine = refine;
        self
    }

    pub fn strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn cluster_stat(mut self, stat: ClusterStat) -> Self {
        self.stat = stat;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn selected_tails(&self) -> Tails {
        self.tails
    }

    /// Merged labels of a single tail
    pub fn label_tail(&self, stat: &StatVolume, tail: Tail) -> Result<LabelVolume> {
        let n_chan = stat.shape()[0];
        if n_chan != self.adjacency.n_channels() {
            return Err(ClusterError::shape(
                "statistic channels vs adjacency",
                &[self.adjacency.n_channels()],
                &[n_chan],
            ));
        }

        let mut mask = match tail {
            Tail::Positive => above(stat, self.threshold),
            Tail::Negative => below(stat, -self.threshold),
        };
        if !self.refine.is_noop() {
            mask = self.refine.apply(&mask, Some(self.adjacency))?;
        }

        let mut labels = label_per_channel(&mask).labels;
        merge_with(&mut labels, self.adjacency, self.strategy)?;
        Ok(labels)
    }

    /// One label volume for all selected tails
    ///
    /// Negative-tail ids are shifted past the largest positive id.
    pub fn label(&self, stat: &StatVolume) -> Result<LabelVolume> {
        let mut combined = LabelVolume::zeros(stat.raw_dim());
        let mut offset = 0;
        for &tail in self.tails.tails() {
            let labels = self.label_tail(stat, tail)?;
            let max_id = labels.iter().copied().max().unwrap_or(0);
            combined.zip_mut_with(&labels, |c, &l| {
                if l != 0 {
                    *c = l + offset;
                }
            });
            offset += max_id;
        }
        Ok(combined)
    }

    /// All clusters of the selected tails, positive tail first, each ordered by id
    pub fn find(&self, stat: &StatVolume) -> Result<Vec<Cluster>> {
        let mut clusters = Vec::new();
        for &tail in self.tails.tails() {
            let labels = self.label_tail(stat, tail)?;
            clusters.extend(extract_clusters(&labels, stat, tail, self.stat));
        }
        Ok(clusters)
    }

    /// Largest positive and smallest negative cluster statistic
    pub fn extrema(&self, stat: &StatVolume) -> Result<TailExtrema> {
        let mut extrema = TailExtrema::default();
        for &tail in self.tails.tails() {
            let labels = self.label_tail(stat, tail)?;
            let stats = cluster_statistics(&labels, stat, tail, self.stat);
            match tail {
                Tail::Positive => {
                    extrema.positive = stats.into_iter().fold(0.0, f64::max);
                }
                Tail::Negative => {
                    extrema.negative = stats.into_iter().fold(0.0, f64::min);
                }
            }
        }
        Ok(extrema)
    }
}
