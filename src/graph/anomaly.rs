//! Anomaly flagging over the built graph.
//!
//! Runs as a second pass after the full build: the statistics are
//! corpus-relative, so no flag can be decided while edges are still
//! being inserted. The threshold is `mean + k * stddev` with a
//! configurable `k` (policy, not a hard constant).

use std::collections::BTreeMap;

use serde::Serialize;

use super::NodeStats;

/// Flags attached to nodes (or edge pairs) with unusual volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnomalyFlag {
    /// Inter-party degree exceeds `mean + k * stddev` over all nodes.
    HighVolume,
    /// Anomalously high out-degree with zero in-degree: a sender
    /// nobody answers.
    Unreciprocated,
    /// A (sender, recipient) pair with an anomalous number of parallel
    /// edges.
    Burst,
}

impl std::fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighVolume => write!(f, "high-volume"),
            Self::Unreciprocated => write!(f, "unreciprocated"),
            Self::Burst => write!(f, "burst"),
        }
    }
}

/// Assign node flags in place and return the burst-flagged pairs.
///
/// All statistics use inter-party (non-self) degrees, so a node that
/// only ever mails itself contributes zero and can never be flagged.
pub fn apply_flags(
    nodes: &mut BTreeMap<String, NodeStats>,
    pair_counts: &BTreeMap<(String, String), u64>,
    k: f64,
) -> Vec<(String, String)> {
    let degrees: Vec<f64> = nodes
        .values()
        .map(|s| s.connector_degree() as f64)
        .collect();
    let degree_cutoff = cutoff(&degrees, k);

    let out_degrees: Vec<f64> = nodes
        .values()
        .map(|s| (s.out_degree - s.self_loops) as f64)
        .collect();
    let out_cutoff = cutoff(&out_degrees, k);

    for stats in nodes.values_mut() {
        if (stats.connector_degree() as f64) > degree_cutoff {
            stats.flags.push(AnomalyFlag::HighVolume);
        }
        let out_nonself = (stats.out_degree - stats.self_loops) as f64;
        if out_nonself > out_cutoff && stats.in_degree == 0 {
            stats.flags.push(AnomalyFlag::Unreciprocated);
        }
    }

    let pair_volumes: Vec<f64> = pair_counts
        .iter()
        .filter(|((from, to), _)| from != to)
        .map(|(_, count)| *count as f64)
        .collect();
    let pair_cutoff = cutoff(&pair_volumes, k);

    pair_counts
        .iter()
        .filter(|((from, to), count)| from != to && (**count as f64) > pair_cutoff)
        .map(|(pair, _)| pair.clone())
        .collect()
}

/// `mean + k * stddev` (population standard deviation).
fn cutoff(values: &[f64], k: f64) -> f64 {
    if values.is_empty() {
        return f64::INFINITY;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    mean + k * variance.sqrt()
}
