//! The directed communication multigraph and its derived statistics.
//!
//! Built once per analysis run from a fixed filtered record set and
//! never mutated afterwards; a new filter range requires a fresh build.
//! Node identity is the normalized address. One directed edge exists
//! per (sender, recipient) pair per message, so parallel edges are
//! expected and carry the index of their originating record.

pub mod anomaly;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{Result, SleuthError};
use crate::model::record::MessageRecord;

pub use anomaly::AnomalyFlag;

/// One message instance from `from` to `to`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    /// Index of the originating record in the filtered record set.
    pub record: usize,
}

/// Per-node running counters, maintained during the single build pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeStats {
    /// Edges leaving this node (self-loops included).
    pub out_degree: u64,
    /// Edges entering this node (self-loops included).
    pub in_degree: u64,
    /// Messages this node participated in, as sender or recipient.
    pub messages: u64,
    /// Edges where this node is both endpoints.
    pub self_loops: u64,
    /// Anomaly flags assigned after the full build.
    pub flags: Vec<AnomalyFlag>,
}

impl NodeStats {
    /// Raw total degree, self-loops included.
    pub fn total_degree(&self) -> u64 {
        self.out_degree + self.in_degree
    }

    /// Degree counting only inter-party edges. A self-loop contributes
    /// one to out-degree and one to in-degree, so it is subtracted
    /// twice. This is the quantity connector ranking and anomaly
    /// statistics are computed over.
    pub fn connector_degree(&self) -> u64 {
        self.total_degree() - 2 * self.self_loops
    }
}

/// The built graph. Read-only after construction.
#[derive(Debug, Serialize)]
pub struct CommunicationGraph {
    nodes: BTreeMap<String, NodeStats>,
    edges: Vec<Edge>,
    /// (sender, recipient) pairs whose parallel-edge count is anomalous.
    burst_pairs: Vec<(String, String)>,
}

/// Fold the filtered record set into a [`CommunicationGraph`].
///
/// Deterministic: the same record sequence always produces identical
/// node sets, edge lists, degrees, and rankings. Fails with
/// [`SleuthError::EmptyCorpus`] when `records` is empty, so callers
/// report "no matching emails" instead of analyzing an empty graph.
pub fn build(records: &[MessageRecord], anomaly_k: f64) -> Result<CommunicationGraph> {
    if records.is_empty() {
        return Err(SleuthError::EmptyCorpus);
    }

    let mut nodes: BTreeMap<String, NodeStats> = BTreeMap::new();
    let mut edges: Vec<Edge> = Vec::new();
    let mut pair_counts: BTreeMap<(String, String), u64> = BTreeMap::new();

    for (idx, record) in records.iter().enumerate() {
        let mut participants: BTreeSet<&str> = BTreeSet::new();

        if !record.sender.is_empty() {
            participants.insert(&record.sender);
        }

        for recipient in &record.recipients {
            participants.insert(recipient);
            if record.sender.is_empty() {
                // Recipient-only node; no edge without a sender
                continue;
            }

            // Running counters: O(1) per edge insertion
            let out = nodes.entry(record.sender.clone()).or_default();
            out.out_degree += 1;
            if *recipient == record.sender {
                out.self_loops += 1;
            }
            nodes.entry(recipient.clone()).or_default().in_degree += 1;

            *pair_counts
                .entry((record.sender.clone(), recipient.clone()))
                .or_default() += 1;

            edges.push(Edge {
                from: record.sender.clone(),
                to: recipient.clone(),
                record: idx,
            });
        }

        for participant in participants {
            nodes.entry(participant.to_string()).or_default().messages += 1;
        }
    }

    // Second pass, only after the full graph exists
    let burst_pairs = anomaly::apply_flags(&mut nodes, &pair_counts, anomaly_k);

    tracing::info!(
        nodes = nodes.len(),
        edges = edges.len(),
        bursts = burst_pairs.len(),
        "Built communication graph"
    );

    Ok(CommunicationGraph {
        nodes,
        edges,
        burst_pairs,
    })
}

impl CommunicationGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All nodes, sorted by address.
    pub fn nodes(&self) -> &BTreeMap<String, NodeStats> {
        &self.nodes
    }

    /// All edges, in record order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, address: &str) -> Option<&NodeStats> {
        self.nodes.get(address)
    }

    /// Connector ranking: nodes by inter-party degree descending, ties
    /// broken by address ascending. Self-only nodes are excluded —
    /// self-loops do not indicate inter-party communication.
    pub fn connectors(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .nodes
            .iter()
            .map(|(addr, stats)| (addr.as_str(), stats.connector_degree()))
            .filter(|(_, degree)| *degree > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked
    }

    /// Nodes carrying at least one anomaly flag, sorted by address.
    pub fn flagged_nodes(&self) -> Vec<(&str, &[AnomalyFlag])> {
        self.nodes
            .iter()
            .filter(|(_, stats)| !stats.flags.is_empty())
            .map(|(addr, stats)| (addr.as_str(), stats.flags.as_slice()))
            .collect()
    }

    /// (sender, recipient) pairs flagged for anomalous message volume.
    pub fn burst_pairs(&self) -> &[(String, String)] {
        &self.burst_pairs
    }
}
