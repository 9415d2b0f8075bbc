//! Adjacency Module: Spatial Neighbourhood of Sensor Channels
//!
//! Cluster detection needs to know which channels are physically close
//! enough for their above-threshold regions to count as one cluster.
//! That relation is an `AdjacencyMatrix`: symmetric, zero diagonal,
//! built once per montage and shared read-only afterwards.
//!
//! Matrices come either from explicit neighbour lists or from a stored
//! montage neighbour table resolved by name through a `TopologyStore`.

mod matrix;
mod topology;

pub use matrix::AdjacencyMatrix;
pub use topology::{NeighbourEntry, NeighbourTable, TopologyStore, TOPOLOGY_DIR_ENV};

/// Adjacency for `channel_names` from a montage name or table path
///
/// Searches the directory named by `CLUSTER_PERM_TOPOLOGY_DIR`. Use a
/// `TopologyStore` directly to control the search path.
pub fn build_from_named_topology<S: AsRef<str>>(
    name_or_path: &str,
    channel_names: &[S],
) -> crate::Result<AdjacencyMatrix> {
    TopologyStore::from_env().build_from_named_topology(name_or_path, channel_names)
}

/// Adjacency from neighbour lists aligned with `channel_names`
pub fn from_neighbor_lists<S: AsRef<str>, N: AsRef<str>>(
    channel_names: &[S],
    neighbor_lists: &[Vec<N>],
) -> crate::Result<AdjacencyMatrix> {
    AdjacencyMatrix::from_neighbor_lists(channel_names, neighbor_lists)
}

/// Adjacency of a rectangular sensor grid (4-neighbour lattice)
///
/// Channel `r * cols + c` sits at row `r`, column `c`.
pub fn grid(rows: usize, cols: usize) -> AdjacencyMatrix {
    let n = rows * cols;
    let conn = ndarray::Array2::from_shape_fn((n, n), |(a, b)| {
        let (ra, ca) = (a / cols, a % cols);
        let (rb, cb) = (b / cols, b % cols);
        ra.abs_diff(rb) + ca.abs_diff(cb) == 1
    });
    AdjacencyMatrix::from_symmetric_unchecked(conn)
}
