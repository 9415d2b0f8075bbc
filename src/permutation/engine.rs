//! Permutation Engine: Cluster-Level Inference
//!
//! ## Protocol
//!
//! 1. Compute the observed statistic from the un-permuted labels
//! 2. Find observed clusters; stop here if there are none
//! 3. For each permutation: shuffle the labels, recompute the statistic,
//!    find clusters the same way, keep only the most extreme cluster
//!    statistic per tail
//! 4. Score every observed cluster against those maxima
//!
//! Permutations are independent and run on a rayon pool. Each one draws
//! its shuffle from its own ChaCha stream seeded up front from the master
//! seed, so the null distribution does not depend on scheduling.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::config::PermutationConfig;
use super::null::NullDistribution;
use super::progress::{CancelToken, ProgressSink};
use crate::adjacency::AdjacencyMatrix;
use crate::cluster::{ClusterFinder, TailExtrema, Tail};
use crate::error::{ClusterError, Result};
use crate::stats::StatisticFn;
use crate::volume::{Mask, Observations, StatVolume};

/// An observed cluster with its corrected p-value
#[derive(Debug, Clone)]
pub struct ClusterResult {
    /// Member samples, shaped like the statistic volume
    pub mask: Mask,
    /// Cluster-level summary statistic
    pub statistic: f64,
    /// Family-wise corrected p-value
    pub p_value: f64,
    /// Tail the cluster was found in
    pub tail: Tail,
    /// Number of member samples
    pub size: usize,
    /// Number of distinct channels touched
    pub n_channels: usize,
}

/// Outcome of a permutation test
#[derive(Debug, Clone)]
pub struct PermutationResult {
    /// Observed statistic volume
    pub statistic: StatVolume,
    /// Observed clusters, ascending by p-value
    pub clusters: Vec<ClusterResult>,
    /// Null distribution (empty when no cluster was observed)
    pub null: NullDistribution,
}

impl PermutationResult {
    /// No cluster survived thresholding
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Permutations that were actually run
    pub fn n_permutations(&self) -> usize {
        self.null.len()
    }

    /// Clusters with `p_value < alpha`
    pub fn significant(&self, alpha: f64) -> impl Iterator<Item = &ClusterResult> {
        self.clusters.iter().filter(move |c| c.p_value < alpha)
    }

    pub fn into_clusters(self) -> Vec<ClusterResult> {
        self.clusters
    }
}

/// Runs cluster-based permutation tests with a fixed configuration
pub struct PermutationEngine<'a> {
    config: PermutationConfig,
    progress: Option<&'a dyn ProgressSink>,
    cancel: CancelToken,
}

impl<'a> PermutationEngine<'a> {
    pub fn new(config: PermutationConfig) -> Self {
        Self {
            config,
            progress: None,
            cancel: CancelToken::default(),
        }
    }

    /// Report finished permutations to `sink`
    pub fn with_progress(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Stop early once `token` is cancelled
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &PermutationConfig {
        &self.config
    }

    /// Run the test on `data` `[obs, channel, dim1, dim2]` with one label per observation
    pub fn run<S>(
        &self,
        data: &Observations,
        labels: &[f64],
        adjacency: &AdjacencyMatrix,
        statistic: &S,
    ) -> Result<PermutationResult>
    where
        S: StatisticFn + ?Sized,
    {
        self.config.validate()?;
        let expected = validate_inputs(data, labels, adjacency)?;

        let finder = ClusterFinder::new(adjacency, self.config.threshold)?
            .tails(self.config.tail)
            .refine(self.config.refine.clone())
            .strategy(self.config.merge_strategy)
            .cluster_stat(self.config.cluster_stat);

        info!(
            n_obs = labels.len(),
            shape = ?expected,
            threshold = self.config.threshold,
            n_permutations = self.config.n_permutations,
            "starting cluster permutation test"
        );

        let observed = compute_statistic(statistic, data, labels, &expected)?;
        let clusters = finder.find(&observed)?;
        if clusters.is_empty() {
            info!("no clusters above threshold, skipping permutations");
            return Ok(PermutationResult {
                statistic: observed,
                clusters: Vec::new(),
                null: NullDistribution::default(),
            });
        }
        debug!(n_clusters = clusters.len(), "observed clusters");

        let null = match self.config.n_threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()?
                .install(|| self.build_null(&finder, data, labels, statistic, &expected))?,
            None => self.build_null(&finder, data, labels, statistic, &expected)?,
        };

        let two_sided = self.config.tail.is_two_sided();
        let mut results: Vec<ClusterResult> = clusters
            .into_iter()
            .map(|c| ClusterResult {
                p_value: null.p_value(c.statistic, c.tail, two_sided),
                mask: c.mask,
                statistic: c.statistic,
                tail: c.tail,
                size: c.size,
                n_channels: c.n_channels,
            })
            .collect();
        results.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));

        info!(
            n_clusters = results.len(),
            min_p = results.first().map(|c| c.p_value),
            "cluster permutation test finished"
        );

        Ok(PermutationResult {
            statistic: observed,
            clusters: results,
            null,
        })
    }

    fn build_null<S>(
        &self,
        finder: &ClusterFinder<'_>,
        data: &Observations,
        labels: &[f64],
        statistic: &S,
        expected: &[usize],
    ) -> Result<NullDistribution>
    where
        S: StatisticFn + ?Sized,
    {
        let total = self.config.n_permutations;
        let mut master = StdRng::seed_from_u64(self.config.seed);
        let seeds: Vec<u64> = (0..total).map(|_| master.random()).collect();
        let completed = AtomicUsize::new(0);

        let extrema: Vec<Option<TailExtrema>> = seeds
            .par_iter()
            .map(|&seed| -> Result<Option<TailExtrema>> {
                if self.cancel.is_cancelled() {
                    return Ok(None);
                }

                let mut shuffled = labels.to_vec();
                shuffled.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
                let stat = compute_statistic(statistic, data, &shuffled, expected)?;
                let extrema = finder.extrema(&stat)?;

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(sink) = self.progress {
                    sink.on_permutation(done, total);
                }
                Ok(Some(extrema))
            })
            .collect::<Result<_>>()?;

        let finished = extrema.iter().filter(|e| e.is_some()).count();
        if finished < total {
            warn!(completed = finished, requested = total, "permutation run cancelled");
            return Err(ClusterError::Cancelled {
                completed: finished,
                requested: total,
            });
        }

        let mut null = NullDistribution::with_capacity(total);
        for e in extrema.into_iter().flatten() {
            null.push(e);
        }
        Ok(null)
    }
}

/// Run a permutation test with default settings apart from threshold, count and seed
pub fn permutation_cluster_test<S>(
    data: &Observations,
    labels: &[f64],
    adjacency: &AdjacencyMatrix,
    statistic: &S,
    threshold: f64,
    n_permutations: usize,
    seed: u64,
) -> Result<Vec<ClusterResult>>
where
    S: StatisticFn + ?Sized,
{
    let config = PermutationConfig::new(threshold, n_permutations).with_seed(seed);
    PermutationEngine::new(config)
        .run(data, labels, adjacency, statistic)
        .map(PermutationResult::into_clusters)
}

/// Expected statistic shape `[channel, dim1, dim2]`
fn validate_inputs(data: &Observations, labels: &[f64], adjacency: &AdjacencyMatrix) -> Result<Vec<usize>> {
    let shape = data.shape();
    if labels.len() != shape[0] {
        return Err(ClusterError::shape("labels vs observations", &[shape[0]], &[labels.len()]));
    }
    if adjacency.n_channels() != shape[1] {
        return Err(ClusterError::shape(
            "adjacency vs data channels",
            &[shape[1], shape[1]],
            &[adjacency.n_channels(), adjacency.n_channels()],
        ));
    }
    Ok(shape[1..].to_vec())
}

fn compute_statistic<S>(statistic: &S, data: &Observations, labels: &[f64], expected: &[usize]) -> Result<StatVolume>
where
    S: StatisticFn + ?Sized,
{
    let stat = statistic.compute(data, labels).map_err(ClusterError::Statistic)?;
    if stat.shape() != expected {
        return Err(ClusterError::shape("statistic volume", expected, stat.shape()));
    }
    Ok(stat)
}
