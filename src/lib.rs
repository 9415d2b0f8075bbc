//! # cluster-perm
//!
//! Cluster-based permutation statistics for multi-channel, time and
//! frequency resolved measurements such as EEG/MEG sensor data.
//!
//! ## Problem
//!
//! A t-value or regression coefficient computed at every channel × time ×
//! frequency sample means thousands of correlated tests. Cluster-based
//! permutation testing controls the family-wise error rate by testing
//! contiguous above-threshold regions instead of single samples.
//!
//! ## Methodology
//!
//! 1. **Adjacency**: a symmetric channel neighbourhood, built from a
//!    montage neighbour table or explicit lists
//!
//! 2. **Clusters**: per-channel connected components (4-connectivity),
//!    merged across adjacent channels that overlap at the same sample
//!
//! 3. **Inference**: the labels are shuffled many times; the most extreme
//!    cluster statistic per permutation and tail forms the null
//!    distribution every observed cluster is scored against
//!
//! ## References
//!
//! - Maris & Oostenveld, "Nonparametric statistical testing of EEG- and
//!   MEG-data", J Neurosci Methods 164 (2007)
//! - Nichols & Holmes, "Nonparametric permutation tests for functional
//!   neuroimaging", Hum Brain Mapp 15 (2002)

pub mod adjacency;
pub mod cluster;
pub mod error;
pub mod permutation;
pub mod simulate;
pub mod stats;
pub mod volume;

pub use error::{ClusterError, Result, StatisticError};

// Re-exports from adjacency
pub use adjacency::{AdjacencyMatrix, NeighbourTable, TopologyStore};

// Re-exports from cluster
pub use cluster::{
    label_per_channel,
    Cluster,
    ClusterFinder,
    ClusterStat,
    MergeStrategy,
    RefineConfig,
    Tail,
    Tails,
};

// Re-exports from permutation
pub use permutation::{
    permutation_cluster_test,
    CancelToken,
    ClusterResult,
    NullDistribution,
    PermutationConfig,
    PermutationEngine,
    PermutationResult,
    ProgressSink,
};

// Re-exports from stats
pub use stats::{IndependentTTest, RegressionT, StatisticFn};

// Re-exports from volume
pub use volume::{LabelVolume, Mask, Observations, StatVolume};
