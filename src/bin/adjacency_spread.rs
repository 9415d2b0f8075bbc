//! Adjacency Spread: How Strongly Neighbouring Channels Co-Cluster
//!
//! Labels clusters in one synthetic statistic volume and counts, for
//! every adjacent channel pair, the samples clustered in both channels.
//! Pairs with very high counts dominate merging; pairs with none suggest
//! the threshold or the montage neighbourhood is too tight.
//!
//! Usage:
//!   adjacency_spread                          4×4 grid montage
//!   adjacency_spread <topology> <ch1,ch2,..>  named neighbour table
//!                                             (see CLUSTER_PERM_TOPOLOGY_DIR)

use cluster_perm::adjacency::{self, TopologyStore};
use cluster_perm::cluster::{pairwise_spread, ClusterFinder, RefineConfig};
use cluster_perm::simulate::{EffectRegion, TwoConditionDesign};
use cluster_perm::{AdjacencyMatrix, ClusterError, IndependentTTest, StatisticFn};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("═══════════════════════════════════════════════════════════════");
    println!("  Adjacency Spread Diagnostic");
    println!("═══════════════════════════════════════════════════════════════\n");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (adj, names): (AdjacencyMatrix, Vec<String>) = match args.as_slice() {
        [topology, channels] => {
            let names: Vec<String> = channels.split(',').map(|s| s.trim().to_string()).collect();
            let store = TopologyStore::from_env();
            (store.build_from_named_topology(topology, &names)?, names)
        }
        _ => {
            let names = (0..16).map(|i| format!("E{}", i + 1)).collect();
            (adjacency::grid(4, 4), names)
        }
    };
    info!(n_channels = adj.n_channels(), n_edges = adj.edges().len(), "adjacency ready");

    let n_chan = adj.n_channels();
    let design = TwoConditionDesign::new(30, n_chan, 50, 1).with_effect(EffectRegion {
        channels: (0..n_chan).take(n_chan / 2 + 1).collect(),
        times: 15..30,
        freqs: 0..1,
        amplitude: 1.0,
    });
    let data = design.generate(7)?;
    let stat = IndependentTTest
        .compute(&data, &design.labels())
        .map_err(ClusterError::Statistic)?;

    let finder = ClusterFinder::new(&adj, 2.0)?.refine(RefineConfig {
        min_blob_size: 3,
        ..Default::default()
    });
    let labels = finder.label(&stat)?;
    let spread = pairwise_spread(&labels, &adj)?;

    let mut pairs: Vec<(usize, usize, usize)> = adj
        .edges()
        .into_iter()
        .map(|(i, j)| (i, j, spread[[i, j]]))
        .collect();
    pairs.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));

    println!("Adjacent pairs by shared clustered samples:");
    println!("─────────────────────────────────────────────────────────────");
    for (i, j, count) in pairs.iter().take(12) {
        println!("  {:>6} ─ {:<6} {:>4}  {}", names[*i], names[*j], count, "█".repeat(*count / 2));
    }

    let silent = pairs.iter().filter(|p| p.2 == 0).count();
    println!("\n  {} of {} adjacent pairs never co-cluster", silent, pairs.len());

    println!("\n═══════════════════════════════════════════════════════════════");
    println!("  Analysis Complete");
    println!("═══════════════════════════════════════════════════════════════");

    Ok(())
}
