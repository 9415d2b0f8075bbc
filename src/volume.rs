//! Volume Types: Fixed-Rank Arrays for Channel × Time × Frequency Data
//!
//! Every volume in this crate carries a channel axis followed by exactly
//! two non-spatial axes:
//!
//! ```text
//!   StatVolume   [channel, dim1, dim2]   f64
//!   Mask         [channel, dim1, dim2]   bool
//!   LabelVolume  [channel, dim1, dim2]   usize  (0 = background)
//!   Observations [obs, channel, dim1, dim2]
//! ```
//!
//! Channel × time data is lifted once at the boundary by inserting a
//! length-1 `dim2` axis. 4-connectivity along a length-1 axis adds no
//! neighbours, so 2-D data goes through the same code path unchanged.

use ndarray::{Array2, Array3, Array4, ArrayView2, ArrayView3, Axis};

/// Statistic value per (channel, dim1, dim2) sample
pub type StatVolume = Array3<f64>;

/// Threshold mask per sample
pub type Mask = Array3<bool>;

/// Cluster ids per sample, 0 marks background
pub type LabelVolume = Array3<usize>;

/// Raw observations: `[observation, channel, dim1, dim2]`
pub type Observations = Array4<f64>;

/// Lift a `[channel, time]` array into a `[channel, time, 1]` volume
pub fn lift_channel_time<T: Clone>(values: ArrayView2<T>) -> Array3<T> {
    values.to_owned().insert_axis(Axis(2))
}

/// Lift `[observation, channel, time]` data into `[observation, channel, time, 1]`
pub fn lift_observations(values: ArrayView3<f64>) -> Observations {
    values.to_owned().insert_axis(Axis(3))
}

/// Drop the trivial last axis of a lifted volume
///
/// Returns `None` when `dim2` is not of length 1.
pub fn flatten_channel_time<T: Clone>(volume: &Array3<T>) -> Option<Array2<T>> {
    if volume.len_of(Axis(2)) != 1 {
        return None;
    }
    Some(volume.index_axis(Axis(2), 0).to_owned())
}

/// Mask of samples strictly above `threshold`
pub fn above(stat: &StatVolume, threshold: f64) -> Mask {
    stat.mapv(|v| v > threshold)
}

/// Mask of samples strictly below `threshold`
pub fn below(stat: &StatVolume, threshold: f64) -> Mask {
    stat.mapv(|v| v < threshold)
}

/// Number of `true` samples in a mask
pub fn count_true(mask: &Mask) -> usize {
    mask.iter().filter(|&&m| m).count()
}

/// Number of distinct channels with at least one `true` sample
pub fn channel_extent(mask: &Mask) -> usize {
    mask.outer_iter()
        .filter(|slice| slice.iter().any(|&m| m))
        .count()
}
