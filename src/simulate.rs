//! Synthetic Sensor Data: Two-Condition Designs with a Planted Effect
//!
//! Generates `[obs, channel, time, freq]` data of Gaussian noise with an
//! additive effect in one rectangular channel × time × freq region for
//! observations of condition 1. Used for demos, benchmarks and tests where
//! the true cluster is known.

use ndarray::Array4;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::error::{ClusterError, Result};
use crate::volume::Observations;

/// Planted effect region, half-open ranges
#[derive(Debug, Clone)]
pub struct EffectRegion {
    pub channels: Vec<usize>,
    pub times: std::ops::Range<usize>,
    pub freqs: std::ops::Range<usize>,
    /// Added to condition-1 observations inside the region
    pub amplitude: f64,
}

/// Two-condition design with alternating labels 0, 1, 0, 1, ...
#[derive(Debug, Clone)]
pub struct TwoConditionDesign {
    pub n_obs: usize,
    pub n_channels: usize,
    pub n_times: usize,
    pub n_freqs: usize,
    pub noise_std: f64,
    pub effect: Option<EffectRegion>,
}

impl TwoConditionDesign {
    pub fn new(n_obs: usize, n_channels: usize, n_times: usize, n_freqs: usize) -> Self {
        Self {
            n_obs,
            n_channels,
            n_times,
            n_freqs,
            noise_std: 1.0,
            effect: None,
        }
    }

    pub fn with_effect(mut self, effect: EffectRegion) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn with_noise(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    /// Condition label of every observation
    pub fn labels(&self) -> Vec<f64> {
        (0..self.n_obs).map(|o| (o % 2) as f64).collect()
    }

    /// Draw one data set from `seed`
    pub fn generate(&self, seed: u64) -> Result<Observations> {
        let normal = Normal::new(0.0, self.noise_std).map_err(|e| {
            ClusterError::invalid("noise_std", e.to_string())
        })?;
        if let Some(effect) = &self.effect {
            if let Some(&index) = effect.channels.iter().find(|&&c| c >= self.n_channels) {
                return Err(ClusterError::ChannelOutOfRange {
                    index,
                    n_channels: self.n_channels,
                });
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let shape = (self.n_obs, self.n_channels, self.n_times, self.n_freqs);
        let mut data = Array4::from_shape_simple_fn(shape, || normal.sample(&mut rng));

        if let Some(effect) = &self.effect {
            for o in (0..self.n_obs).filter(|o| o % 2 == 1) {
                for &c in &effect.channels {
                    for t in effect.times.clone().filter(|&t| t < self.n_times) {
                        for f in effect.freqs.clone().filter(|&f| f < self.n_freqs) {
                            data[[o, c, t, f]] += effect.amplitude;
                        }
                    }
                }
            }
        }

        Ok(data)
    }
}
