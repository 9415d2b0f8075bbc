//! Permutation Module: Cluster-Based Permutation Testing
//!
//! Corrects for the many correlated tests made when a statistic is
//! computed at every channel × time × frequency sample.
//!
//! ## Procedure
//!
//! Under H₀ the observation labels are exchangeable. Shuffling them and
//! recomputing the cluster search yields, per permutation, the largest
//! positive cluster statistic S⁺ and the smallest negative one S⁻. For an
//! observed cluster with statistic s:
//!
//!   p = min(1, 2 · #{S⁺ > s} / N)   for s > 0
//!   p = min(1, 2 · #{S⁻ < s} / N)   for s < 0
//!
//! Single-tail runs drop the factor 2. Using only the per-permutation
//! maximum is what makes the correction family-wise.

mod config;
mod engine;
mod null;
mod progress;

pub use config::PermutationConfig;
pub use engine::{permutation_cluster_test, ClusterResult, PermutationEngine, PermutationResult};
pub use null::NullDistribution;
pub use progress::{CancelToken, LogProgress, NoProgress, ProgressSink};
