//! Channel Adjacency Matrix
//!
//! A symmetric boolean C×C relation with an empty diagonal. Once built it
//! is never mutated in place; edits produce a new snapshot.

use std::collections::HashMap;

use ndarray::{Array2, ArrayView2};

use crate::error::{ClusterError, Result};

/// Symmetric channel adjacency with zero diagonal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyMatrix {
    conn: Array2<bool>,
}

impl AdjacencyMatrix {
    /// Validate and wrap a dense boolean matrix
    pub fn new(conn: Array2<bool>) -> Result<Self> {
        let (rows, cols) = conn.dim();
        if rows != cols {
            return Err(ClusterError::NonSquareAdjacency { rows, cols });
        }

        for i in 0..rows {
            if conn[[i, i]] {
                return Err(ClusterError::SelfAdjacent(i));
            }
            for j in i + 1..rows {
                if conn[[i, j]] != conn[[j, i]] {
                    return Err(ClusterError::AsymmetricAdjacency { row: i, col: j });
                }
            }
        }

        Ok(Self { conn })
    }

    /// Wrap a matrix the caller built symmetric with an empty diagonal
    pub(crate) fn from_symmetric_unchecked(conn: Array2<bool>) -> Self {
        debug_assert!(conn.is_square());
        Self { conn }
    }

    /// Build from an integer-weighted matrix, nonzero meaning adjacent
    pub fn from_weighted(weights: ArrayView2<i64>) -> Result<Self> {
        Self::new(weights.mapv(|w| w != 0))
    }

    /// Matrix without any edges
    pub fn empty(n_channels: usize) -> Self {
        Self {
            conn: Array2::from_elem((n_channels, n_channels), false),
        }
    }

    /// Build from explicit neighbour lists aligned with `channel_names`
    ///
    /// Neighbour names that are not among `channel_names` are ignored. The
    /// relation is symmetrized and self references are dropped.
    pub fn from_neighbor_lists<S, N>(channel_names: &[S], neighbor_lists: &[Vec<N>]) -> Result<Self>
    where
        S: AsRef<str>,
        N: AsRef<str>,
    {
        if channel_names.len() != neighbor_lists.len() {
            return Err(ClusterError::NeighbourListLength {
                names: channel_names.len(),
                lists: neighbor_lists.len(),
            });
        }

        let index = channel_index(channel_names)?;
        let mut conn = Array2::from_elem((channel_names.len(), channel_names.len()), false);

        for (i, neighbours) in neighbor_lists.iter().enumerate() {
            for name in neighbours {
                let name: &str = name.as_ref();
                if let Some(&j) = index.get(name) {
                    if i != j {
                        conn[[i, j]] = true;
                        conn[[j, i]] = true;
                    }
                }
            }
        }

        Ok(Self { conn })
    }

    /// Number of channels
    pub fn n_channels(&self) -> usize {
        self.conn.nrows()
    }

    /// Are channels `i` and `j` neighbours?
    pub fn is_adjacent(&self, i: usize, j: usize) -> bool {
        self.conn[[i, j]]
    }

    /// Neighbours of channel `ch` in ascending order
    pub fn neighbors(&self, ch: usize) -> impl Iterator<Item = usize> + '_ {
        self.conn
            .row(ch)
            .into_iter()
            .enumerate()
            .filter(|(_, &adj)| adj)
            .map(|(j, _)| j)
    }

    /// Number of neighbours of channel `ch`
    pub fn degree(&self, ch: usize) -> usize {
        self.neighbors(ch).count()
    }

    /// Every unordered adjacent pair `(i, j)` with `i < j`
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let n = self.n_channels();
        let mut edges = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                if self.conn[[i, j]] {
                    edges.push((i, j));
                }
            }
        }
        edges
    }

    /// New snapshot with the edge `(i, j)` switched on or off
    pub fn with_edge(&self, i: usize, j: usize, adjacent: bool) -> Result<Self> {
        let n = self.n_channels();
        for index in [i, j] {
            if index >= n {
                return Err(ClusterError::ChannelOutOfRange { index, n_channels: n });
            }
        }
        if i == j {
            return Err(ClusterError::SelfAdjacent(i));
        }

        let mut conn = self.conn.clone();
        conn[[i, j]] = adjacent;
        conn[[j, i]] = adjacent;
        Ok(Self { conn })
    }

    /// Adjacency restricted to a subset of channels, in the given order
    pub fn select(&self, channels: &[usize]) -> Result<Self> {
        let n = self.n_channels();
        if let Some(&index) = channels.iter().find(|&&c| c >= n) {
            return Err(ClusterError::ChannelOutOfRange { index, n_channels: n });
        }
        let k = channels.len();
        let conn = Array2::from_shape_fn((k, k), |(a, b)| {
            channels[a] != channels[b] && self.conn[[channels[a], channels[b]]]
        });
        Ok(Self { conn })
    }

    /// Borrow the dense matrix
    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.conn.view()
    }

    /// Consume into the dense matrix
    pub fn into_inner(self) -> Array2<bool> {
        self.conn
    }
}

/// Map channel name to position, rejecting duplicate names
pub(crate) fn channel_index<S: AsRef<str>>(channel_names: &[S]) -> Result<HashMap<&str, usize>> {
    let names: Vec<&str> = channel_names.iter().map(|n| n.as_ref()).collect();
    let mut index = HashMap::with_capacity(names.len());
    for (i, &name) in names.iter().enumerate() {
        if index.insert(name, i).is_some() {
            return Err(ClusterError::AmbiguousChannel {
                name: name.to_string(),
                count: names.iter().filter(|&&n| n == name).count(),
            });
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_invariants(adj: &AdjacencyMatrix) {
        let n = adj.n_channels();
        for i in 0..n {
            assert!(!adj.is_adjacent(i, i));
            for j in 0..n {
                assert_eq!(adj.is_adjacent(i, j), adj.is_adjacent(j, i));
            }
        }
    }

    #[test]
    fn test_new_rejects_asymmetric() {
        let conn = array![[false, true], [false, false]];
        assert!(matches!(
            AdjacencyMatrix::new(conn),
            Err(ClusterError::AsymmetricAdjacency { row: 0, col: 1 })
        ));
    }

    #[test]
    fn test_new_rejects_diagonal_and_non_square() {
        let diag = array![[true, false], [false, false]];
        assert!(matches!(AdjacencyMatrix::new(diag), Err(ClusterError::SelfAdjacent(0))));

        let rect = Array2::from_elem((2, 3), false);
        assert!(matches!(
            AdjacencyMatrix::new(rect),
            Err(ClusterError::NonSquareAdjacency { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn test_from_weighted() {
        let w = array![[0, 3, 0], [3, 0, 1], [0, 1, 0]];
        let adj = AdjacencyMatrix::from_weighted(w.view()).unwrap();
        assert_eq!(adj.edges(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_neighbor_lists_symmetrized() {
        let names = ["Fz", "Cz", "Pz"];
        // one-sided listing and a self reference
        let lists = vec![vec!["Cz", "Fz"], vec![], vec!["Cz", "Oz"]];
        let adj = AdjacencyMatrix::from_neighbor_lists(&names, &lists).unwrap();

        assert_invariants(&adj);
        assert!(adj.is_adjacent(0, 1));
        assert!(adj.is_adjacent(1, 2));
        assert!(!adj.is_adjacent(0, 2));
        assert_eq!(adj.neighbors(1).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(adj.degree(1), 2);
    }

    #[test]
    fn test_neighbor_lists_length_and_duplicates() {
        let lists: Vec<Vec<&str>> = vec![vec![]];
        assert!(matches!(
            AdjacencyMatrix::from_neighbor_lists(&["A", "B"], &lists),
            Err(ClusterError::NeighbourListLength { names: 2, lists: 1 })
        ));

        let lists: Vec<Vec<&str>> = vec![vec![], vec![]];
        assert!(matches!(
            AdjacencyMatrix::from_neighbor_lists(&["A", "A"], &lists),
            Err(ClusterError::AmbiguousChannel { .. })
        ));
    }

    #[test]
    fn test_with_edge_returns_new_snapshot() {
        let adj = AdjacencyMatrix::empty(3);
        let edited = adj.with_edge(0, 2, true).unwrap();

        assert!(!adj.is_adjacent(0, 2));
        assert!(edited.is_adjacent(0, 2));
        assert!(edited.is_adjacent(2, 0));
        assert_invariants(&edited);

        assert!(adj.with_edge(1, 1, true).is_err());
        assert!(adj.with_edge(0, 5, true).is_err());
    }

    #[test]
    fn test_select_reorders() {
        let adj = AdjacencyMatrix::empty(4)
            .with_edge(0, 3, true)
            .unwrap();
        let sub = adj.select(&[3, 1, 0]).unwrap();
        assert_eq!(sub.n_channels(), 3);
        assert!(sub.is_adjacent(0, 2));
        assert!(!sub.is_adjacent(0, 1));
    }
}
