//! Independent-samples Student t-test with pooled variance.

use ndarray::Zip;

use super::{check_labels, t_value, StatisticFn};
use crate::error::{ClusterError, StatisticError};
use crate::volume::{Observations, StatVolume};

/// Two-sample t-test, group 1 = nonzero label, group 0 = zero label
///
/// Positive t means group 1 has the larger mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndependentTTest;

impl StatisticFn for IndependentTTest {
    fn compute(&self, data: &Observations, labels: &[f64]) -> Result<StatVolume, StatisticError> {
        check_labels(data, labels)?;

        let n1 = labels.iter().filter(|&&l| l != 0.0).count();
        let n0 = labels.len() - n1;
        if n0 < 2 || n1 < 2 {
            return Err(ClusterError::invalid(
                "labels",
                format!("t-test needs at least 2 observations per group, got {n0} and {n1}"),
            )
            .into());
        }

        let (_, c, d1, d2) = data.dim();
        let counts = [n0 as f64, n1 as f64];

        let mut mean = [StatVolume::zeros((c, d1, d2)), StatVolume::zeros((c, d1, d2))];
        for (obs, &label) in data.outer_iter().zip(labels) {
            mean[usize::from(label != 0.0)] += &obs;
        }
        for (m, &n) in mean.iter_mut().zip(&counts) {
            m.mapv_inplace(|s| s / n);
        }

        // squared deviations from the group mean, second pass
        let mut dev = [StatVolume::zeros((c, d1, d2)), StatVolume::zeros((c, d1, d2))];
        for (obs, &label) in data.outer_iter().zip(labels) {
            let g = usize::from(label != 0.0);
            Zip::from(&mut dev[g])
                .and(&mean[g])
                .and(&obs)
                .for_each(|d, &m, &v| *d += (v - m).powi(2));
        }

        let df = counts[0] + counts[1] - 2.0;
        let scale = 1.0 / counts[0] + 1.0 / counts[1];

        let mut t = StatVolume::zeros((c, d1, d2));
        Zip::from(&mut t)
            .and(&mean[0])
            .and(&dev[0])
            .and(&mean[1])
            .and(&dev[1])
            .for_each(|t, &m0, &dev0, &m1, &dev1| {
                let pooled = (dev0 + dev1) / df;
                *t = t_value(m1 - m0, (pooled * scale).sqrt());
            });

        Ok(t)
    }
}
