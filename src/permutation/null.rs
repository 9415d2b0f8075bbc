//! Max-Statistic Null Distribution
//!
//! Each permutation contributes exactly one value per tail: the most
//! extreme cluster statistic it produced. Comparing an observed cluster
//! against the distribution of these maxima controls the family-wise
//! error rate over all clusters at once.

use crate::cluster::{Tail, TailExtrema};

/// Per-tail extrema, one entry per permutation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NullDistribution {
    /// Largest positive cluster statistic per permutation (0.0 if none)
    pub positive: Vec<f64>,
    /// Smallest negative cluster statistic per permutation (0.0 if none)
    pub negative: Vec<f64>,
}

impl NullDistribution {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            positive: Vec::with_capacity(n),
            negative: Vec::with_capacity(n),
        }
    }

    /// Append one permutation's extrema
    pub fn push(&mut self, extrema: TailExtrema) {
        self.positive.push(extrema.positive);
        self.negative.push(extrema.negative);
    }

    /// Number of permutations recorded
    pub fn len(&self) -> usize {
        self.positive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty()
    }

    /// Fraction of null extrema more extreme than `statistic` in its tail
    ///
    /// Strict comparison: ties with the observed value do not count.
    pub fn exceedance(&self, statistic: f64, tail: Tail) -> f64 {
        if self.is_empty() {
            return 1.0;
        }
        let hits = match tail {
            Tail::Positive => self.positive.iter().filter(|&&v| v > statistic).count(),
            Tail::Negative => self.negative.iter().filter(|&&v| v < statistic).count(),
        };
        hits as f64 / self.len() as f64
    }

    /// Corrected p-value of an observed cluster
    ///
    /// Two-sided tests double the one-tail exceedance and clamp at 1.
    pub fn p_value(&self, statistic: f64, tail: Tail, two_sided: bool) -> f64 {
        let p = self.exceedance(statistic, tail);
        if two_sided {
            (2.0 * p).min(1.0)
        } else {
            p
        }
    }

    /// Null quantile of the positive tail (e.g. 0.95 for a one-sided 5 % cutoff)
    pub fn positive_quantile(&self, q: f64) -> Option<f64> {
        quantile(&self.positive, q)
    }

    /// Null quantile of the negative tail (e.g. 0.05 for a one-sided 5 % cutoff)
    pub fn negative_quantile(&self, q: f64) -> Option<f64> {
        quantile(&self.negative, q)
    }
}

fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
    Some(sorted[idx])
}
