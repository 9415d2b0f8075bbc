//! Permutation test configuration.

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterStat, MergeStrategy, RefineConfig, Tails};
use crate::error::{ClusterError, Result};

/// Parameters of a cluster-based permutation test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermutationConfig {
    /// Cluster-forming threshold magnitude
    pub threshold: f64,
    /// Tails to test
    pub tail: Tails,
    /// Number of permutations
    pub n_permutations: usize,
    /// Seed of the permutation stream
    pub seed: u64,
    /// Cluster-level summary statistic
    pub cluster_stat: ClusterStat,
    /// Cross-channel merge strategy
    pub merge_strategy: MergeStrategy,
    /// Mask refinement applied before labeling
    pub refine: RefineConfig,
    /// Worker threads (None uses the global rayon pool)
    pub n_threads: Option<usize>,
}

impl Default for PermutationConfig {
    fn default() -> Self {
        Self {
            threshold: 2.0,
            tail: Tails::Both,
            n_permutations: 1000,
            seed: 0,
            cluster_stat: ClusterStat::Sum,
            merge_strategy: MergeStrategy::Rescan,
            refine: RefineConfig::default(),
            n_threads: None,
        }
    }
}

impl PermutationConfig {
    /// Config with the given threshold and permutation count
    pub fn new(threshold: f64, n_permutations: usize) -> Self {
        Self {
            threshold,
            n_permutations,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_tail(mut self, tail: Tails) -> Self {
        self.tail = tail;
        self
    }

    pub fn with_refine(mut self, refine: RefineConfig) -> Self {
        self.refine = refine;
        self
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ClusterError::invalid(
                "threshold",
                format!("must be a finite non-negative magnitude, got {}", self.threshold),
            ));
        }
        if self.n_permutations == 0 {
            return Err(ClusterError::invalid("n_permutations", "must be at least 1"));
        }
        if self.n_threads == Some(0) {
            return Err(ClusterError::invalid("n_threads", "must be at least 1 when set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_partial() {
        let config = PermutationConfig::from_json_str(
            r#"{"threshold": 3.5, "tail": "positive", "refine": {"min_blob_size": 4}}"#,
        )
        .unwrap();
        assert_eq!(config.threshold, 3.5);
        assert_eq!(config.tail, Tails::Positive);
        assert_eq!(config.refine.min_blob_size, 4);
        assert_eq!(config.n_permutations, 1000);
        assert_eq!(config.merge_strategy, MergeStrategy::Rescan);
    }

    #[test]
    fn test_validate() {
        assert!(PermutationConfig::default().validate().is_ok());
        assert!(PermutationConfig::new(2.0, 0).validate().is_err());
        assert!(PermutationConfig::new(f64::INFINITY, 10).validate().is_err());
        assert!(matches!(
            PermutationConfig::from_json_str(r#"{"threshold": "high"}"#),
            Err(ClusterError::Config(_))
        ));
    }
}
