//! Stats Module: Mass-Univariate Statistics per Sample
//!
//! The permutation engine only needs a function mapping observations and
//! per-observation labels to a statistic volume. Anything implementing
//! `StatisticFn` works, closures included:
//!
//! ```text
//!   data   [obs, channel, dim1, dim2]  ──┐
//!                                         ├──▶ StatVolume [channel, dim1, dim2]
//!   labels [obs]                        ──┘
//! ```
//!
//! Two common choices are provided: an independent-samples t-test on a
//! binary label and the slope t-value of a simple linear regression on a
//! continuous predictor.

mod regression;
mod ttest;

pub use regression::RegressionT;
pub use ttest::IndependentTTest;

use crate::error::{ClusterError, StatisticError};
use crate::volume::{Observations, StatVolume};

/// Statistic computed independently at every (channel, dim1, dim2) sample
///
/// Must be pure: the engine calls it once for the observed labels and
/// once per permutation, possibly from several threads at once.
pub trait StatisticFn: Sync {
    fn compute(&self, data: &Observations, labels: &[f64]) -> Result<StatVolume, StatisticError>;
}

impl<F> StatisticFn for F
where
    F: Fn(&Observations, &[f64]) -> Result<StatVolume, StatisticError> + Sync,
{
    fn compute(&self, data: &Observations, labels: &[f64]) -> Result<StatVolume, StatisticError> {
        self(data, labels)
    }
}

/// Reject label vectors that do not line up with the observation axis
pub(crate) fn check_labels(data: &Observations, labels: &[f64]) -> Result<(), StatisticError> {
    let n_obs = data.shape()[0];
    if labels.len() != n_obs {
        return Err(ClusterError::shape("labels vs observations", &[n_obs], &[labels.len()]).into());
    }
    Ok(())
}

/// t from a difference and its standard error
///
/// A zero standard error yields 0 for a zero difference and a signed
/// infinity otherwise.
pub(crate) fn t_value(diff: f64, se: f64) -> f64 {
    if se > 0.0 {
        diff / se
    } else if diff == 0.0 {
        0.0
    } else {
        diff.signum() * f64::INFINITY
    }
}
