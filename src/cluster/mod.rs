//! Cluster Module: Spatio-Temporal Connected Components
//!
//! A cluster is a maximal set of above-threshold samples that are
//! contiguous both inside a channel (4-connectivity over the non-spatial
//! axes) and across channels (same position in two adjacent channels).
//!
//! ## Pipeline
//!
//! ```text
//!   StatVolume ──threshold──▶ Mask ──refine──▶ Mask
//!        │                                      │
//!        │                             label_per_channel
//!        │                                      ▼
//!        │                       LabelVolume (ids unique per volume)
//!        │                                      │
//!        │                               merge (adjacency)
//!        ▼                                      ▼
//!   cluster statistics ◀──────────────── merged LabelVolume
//! ```
//!
//! `ClusterFinder` runs the whole chain with one set of parameters.

mod finder;
mod labeling;
mod merge;
mod refine;
mod summary;

pub use finder::{ClusterFinder, TailExtrema, Tails};
pub use labeling::{label_per_channel, label_slice, ChannelLabels};
pub use merge::{merge, merge_with, MergeStrategy};
pub use refine::{
    erode_by_neighbor_count,
    pairwise_spread,
    prune_small_blobs,
    relabel,
    require_min_channel_support,
    NeighbourKernel,
    RefineConfig,
};
pub use summary::{cluster_statistics, extract_clusters, Cluster, ClusterStat, Tail};
