//! Simple Linear Regression Slope t-Values
//!
//! For each sample y regressed on the predictor x with an intercept:
//!
//!   b   = Σ(x - x̄) y / Sxx
//!   RSS = Σ(y - ȳ)² - b² Sxx
//!   t   = b / sqrt(RSS / (n - 2) / Sxx)
//!
//! Sums run over y centred on its per-sample mean.

use ndarray::Zip;

use super::{check_labels, t_value, StatisticFn};
use crate::error::{ClusterError, StatisticError};
use crate::volume::{Observations, StatVolume};

/// Slope t-value of `sample ~ 1 + label`
#[derive(Debug, Clone, Copy, Default)]
pub struct RegressionT;

impl StatisticFn for RegressionT {
    fn compute(&self, data: &Observations, labels: &[f64]) -> Result<StatVolume, StatisticError> {
        check_labels(data, labels)?;

        let n = labels.len();
        if n < 3 {
            return Err(ClusterError::invalid(
                "labels",
                format!("regression needs at least 3 observations, got {n}"),
            )
            .into());
        }

        let x_mean = labels.iter().sum::<f64>() / n as f64;
        let sxx: f64 = labels.iter().map(|x| (x - x_mean).powi(2)).sum();
        if sxx <= 0.0 {
            return Err(ClusterError::invalid("labels", "predictor is constant").into());
        }

        let (_, c, d1, d2) = data.dim();
        let nf = n as f64;

        let mut y_mean = StatVolume::zeros((c, d1, d2));
        for obs in data.outer_iter() {
            y_mean += &obs;
        }
        y_mean.mapv_inplace(|s| s / nf);

        // second pass on centred y
        let mut syy = StatVolume::zeros((c, d1, d2));
        let mut sxy = StatVolume::zeros((c, d1, d2));
        for (obs, &x) in data.outer_iter().zip(labels) {
            let xc = x - x_mean;
            Zip::from(&mut syy)
                .and(&mut sxy)
                .and(&y_mean)
                .and(&obs)
                .for_each(|syy, sxy, &m, &y| {
                    let yc = y - m;
                    *syy += yc * yc;
                    *sxy += xc * yc;
                });
        }

        let mut t = StatVolume::zeros((c, d1, d2));
        Zip::from(&mut t)
            .and(&syy)
            .and(&sxy)
            .for_each(|t, &syy, &sxy| {
                let slope = sxy / sxx;
                let rss = (syy - slope * slope * sxx).max(0.0);
                let se = (rss / (nf - 2.0) / sxx).sqrt();
                *t = t_value(slope, se);
            });

        Ok(t)
    }
}
