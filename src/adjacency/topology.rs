//! Neighbour Tables: Named Montage Topologies
//!
//! A neighbour table lists, for each channel label of a montage, the
//! labels of its spatial neighbours:
//!
//! ```text
//! [
//!   {"label": "Fz", "neighblabel": ["AFz", "F1", "F2", "FCz"]},
//!   ...
//! ]
//! ```
//!
//! Tables live as `<montage>_neighbours.json` files in one or more search
//! directories and are cached after the first load.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::matrix::channel_index;
use super::AdjacencyMatrix;
use crate::error::{ClusterError, Result};

/// Environment variable naming the default topology directory
pub const TOPOLOGY_DIR_ENV: &str = "CLUSTER_PERM_TOPOLOGY_DIR";

const TABLE_SUFFIX: &str = "_neighbours.json";

/// One entry of a neighbour table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighbourEntry {
    /// Channel label
    pub label: String,
    /// Labels of adjacent channels
    #[serde(rename = "neighblabel", default)]
    pub neighbours: Vec<String>,
}

/// Montage neighbour table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeighbourTable {
    pub entries: Vec<NeighbourEntry>,
}

impl NeighbourTable {
    pub fn new(entries: Vec<NeighbourEntry>) -> Self {
        Self { entries }
    }

    /// Parse a table from its JSON text
    pub fn from_json_str(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Read a table from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ClusterError::TopologyIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|source| ClusterError::TopologyParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The single entry labelled `name`
    pub fn entry(&self, name: &str) -> Result<&NeighbourEntry> {
        let mut matches = self.entries.iter().filter(|e| e.label == name);
        match (matches.next(), matches.count()) {
            (None, _) => Err(ClusterError::ChannelNotFound(name.to_string())),
            (Some(entry), 0) => Ok(entry),
            (Some(_), rest) => Err(ClusterError::AmbiguousChannel {
                name: name.to_string(),
                count: rest + 1,
            }),
        }
    }

    /// Adjacency restricted and ordered to exactly `channel_names`
    pub fn adjacency<S: AsRef<str>>(&self, channel_names: &[S]) -> Result<AdjacencyMatrix> {
        let n = channel_names.len();
        let position = channel_index(channel_names)?;

        let mut conn = Array2::from_elem((n, n), false);
        for (i, name) in channel_names.iter().enumerate() {
            let entry = self.entry(name.as_ref())?;
            for neighbour in &entry.neighbours {
                if let Some(&j) = position.get(neighbour.as_str()) {
                    if i != j {
                        conn[[i, j]] = true;
                        conn[[j, i]] = true;
                    }
                }
            }
        }

        AdjacencyMatrix::new(conn)
    }
}

/// Resolves montage names to neighbour tables with a per-path cache
#[derive(Debug, Default)]
pub struct TopologyStore {
    search_dirs: Vec<PathBuf>,
    cache: RwLock<HashMap<PathBuf, Arc<NeighbourTable>>>,
}

impl TopologyStore {
    /// Store searching the given directories in order
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Store searching the directory named by `CLUSTER_PERM_TOPOLOGY_DIR`, if set
    pub fn from_env() -> Self {
        let dirs = std::env::var_os(TOPOLOGY_DIR_ENV)
            .map(|dir| vec![PathBuf::from(dir)])
            .unwrap_or_default();
        Self::new(dirs)
    }

    /// Add a search directory
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Path of the table for `name_or_path`
    ///
    /// An existing file path wins; otherwise the first `*_neighbours.json`
    /// file whose name contains `name_or_path` is used.
    pub fn resolve(&self, name_or_path: &str) -> Result<PathBuf> {
        let direct = Path::new(name_or_path);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        for dir in &self.search_dirs {
            let Ok(listing) = fs::read_dir(dir) else {
                continue;
            };
            let mut candidates: Vec<PathBuf> = listing
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.ends_with(TABLE_SUFFIX) && n.contains(name_or_path))
                        .unwrap_or(false)
                })
                .collect();
            candidates.sort();
            if let Some(found) = candidates.into_iter().next() {
                return Ok(found);
            }
        }

        Err(ClusterError::TopologyNotFound {
            name: name_or_path.to_string(),
            searched: self.search_dirs.clone(),
        })
    }

    /// Load (or fetch from cache) the table for `name_or_path`
    pub fn table(&self, name_or_path: &str) -> Result<Arc<NeighbourTable>> {
        let path = self.resolve(name_or_path)?;

        if let Some(table) = self.cache.read().get(&path) {
            return Ok(Arc::clone(table));
        }

        debug!(path = %path.display(), "loading neighbour table");
        let table = Arc::new(NeighbourTable::load(&path)?);
        self.cache.write().insert(path, Arc::clone(&table));
        Ok(table)
    }

    /// Adjacency for `channel_names` from the named montage
    pub fn build_from_named_topology<S: AsRef<str>>(
        &self,
        name_or_path: &str,
        channel_names: &[S],
    ) -> Result<AdjacencyMatrix> {
        self.table(name_or_path)?.adjacency(channel_names)
    }

    /// Number of cached tables
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}
