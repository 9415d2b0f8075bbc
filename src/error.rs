//! Error types for cluster detection and permutation testing.

use std::path::PathBuf;

use thiserror::Error;

/// Error returned by a user supplied statistic function.
pub type StatisticError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ClusterError>;

/// Everything that can go wrong while building adjacency, refining masks
/// or running a permutation test.
#[derive(Error, Debug)]
pub enum ClusterError {
    /// Named montage could not be resolved to a neighbour table
    #[error("could not find neighbour table for topology {name:?} (searched {searched:?})")]
    TopologyNotFound {
        /// Requested name or path
        name: String,
        /// Directories that were searched
        searched: Vec<PathBuf>,
    },

    /// Neighbour table file could not be read
    #[error("failed to read neighbour table {path:?}: {source}")]
    TopologyIo {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Neighbour table file is not valid JSON in the expected layout
    #[error("failed to parse neighbour table {path:?}: {source}")]
    TopologyParse {
        /// File that failed
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Requested channel has no entry in the neighbour table
    #[error("channel {0:?} was not found in neighbours")]
    ChannelNotFound(String),

    /// Requested channel has more than one entry in the neighbour table
    #[error("found {count} neighbours entries for channel name {name:?}")]
    AmbiguousChannel {
        /// Channel name
        name: String,
        /// Number of matching entries
        count: usize,
    },

    /// Neighbour lists and channel names disagree in length
    #[error("got {names} channel names but {lists} neighbour lists")]
    NeighbourListLength {
        /// Number of channel names
        names: usize,
        /// Number of neighbour lists
        lists: usize,
    },

    /// Adjacency matrix is not square
    #[error("adjacency matrix must be square, got {rows}x{cols}")]
    NonSquareAdjacency {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// Adjacency matrix is not symmetric
    #[error("adjacency matrix is not symmetric at ({row}, {col})")]
    AsymmetricAdjacency {
        /// Row of the first offending entry
        row: usize,
        /// Column of the first offending entry
        col: usize,
    },

    /// Adjacency matrix marks a channel as its own neighbour
    #[error("adjacency matrix has a nonzero diagonal at channel {0}")]
    SelfAdjacent(usize),

    /// Channel index outside the matrix
    #[error("channel index {index} out of range for {n_channels} channels")]
    ChannelOutOfRange {
        /// Offending index
        index: usize,
        /// Number of channels
        n_channels: usize,
    },

    /// Channel support filtering was requested without adjacency
    #[error("min_channels = {0} requires an adjacency matrix")]
    MissingAdjacency(usize),

    /// Array shapes disagree
    #[error("shape mismatch in {what}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// What was being compared
        what: &'static str,
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Parameter outside its valid range
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Config could not be deserialized
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Worker pool could not be created
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Run was interrupted through its cancel token
    #[error("permutation run cancelled after {completed} of {requested} permutations")]
    Cancelled {
        /// Permutations that had finished
        completed: usize,
        /// Permutations requested
        requested: usize,
    },

    /// Error raised by the statistic function, passed through untouched
    #[error(transparent)]
    Statistic(StatisticError),
}

impl ClusterError {
    pub(crate) fn shape(what: &'static str, expected: &[usize], got: &[usize]) -> Self {
        ClusterError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ClusterError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
