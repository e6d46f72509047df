// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use super::graph_store::{default_graph, DEFAULT_NEXT_NODE_ID};
use crate::model::{EdgeId, Graph, NodeId};
use crate::ops::{validate_connection, ConnectionCandidate, ConnectionRejection};
use crate::store::LoadedFlow;

/// Why a stored edge did not survive loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DroppedEdge {
    DuplicateId,
    Rejected(ConnectionRejection),
}

/// What loading had to change to make the stored flow valid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepairReport {
    /// No nodes were stored, so the default flow was used.
    pub defaulted: bool,
    pub dropped_nodes: Vec<NodeId>,
    pub dropped_edges: Vec<(EdgeId, DroppedEdge)>,
    /// `(stored, effective)` when the stored allocator was missing, behind the used ids, or
    /// exhausted while ids below it were still free.
    pub next_node_id_repaired: Option<(Option<u64>, u64)>,
}

impl RepairReport {
    pub fn changed(&self) -> bool {
        self.defaulted
            || !self.dropped_nodes.is_empty()
            || !self.dropped_edges.is_empty()
            || self.next_node_id_repaired.is_some()
    }
}

/// Rebuilds a graph satisfying every flow invariant from possibly hand-edited records.
///
/// Nodes keep their stored order with later duplicates dropped. Edges are replayed in stored
/// order through the connection validator, so the first of two conflicting edges wins.
pub(crate) fn repair_loaded_flow(
    loaded: LoadedFlow,
    default_message: &str,
) -> (Graph, u64, RepairReport) {
    let mut report = RepairReport::default();

    let stored_nodes = loaded.nodes.unwrap_or_default();
    let mut graph = if stored_nodes.is_empty() {
        report.defaulted = true;
        default_graph(default_message)
    } else {
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut graph = Graph::default();
        for node in stored_nodes {
            if seen.insert(node.id().clone()) {
                graph.nodes_mut().push(node);
            } else {
                tracing::warn!(node_id = %node.id(), "dropping duplicate stored node");
                report.dropped_nodes.push(node.id().clone());
            }
        }
        graph
    };

    for edge in loaded.edges.unwrap_or_default() {
        if graph.contains_edge(edge.id()) {
            tracing::warn!(edge_id = %edge.id(), "dropping duplicate stored edge");
            report
                .dropped_edges
                .push((edge.id().clone(), DroppedEdge::DuplicateId));
            continue;
        }

        let candidate = ConnectionCandidate::new(
            edge.source_node_id().clone(),
            edge.target_node_id().clone(),
        )
        .with_source_handle(edge.source_handle_id().cloned())
        .with_target_handle(edge.target_handle_id().cloned());

        match validate_connection(&graph, &candidate) {
            Ok(()) => graph.edges_mut().push(edge),
            Err(rejection) => {
                tracing::warn!(edge_id = %edge.id(), %rejection, "dropping invalid stored edge");
                report
                    .dropped_edges
                    .push((edge.id().clone(), DroppedEdge::Rejected(rejection)));
            }
        }
    }

    let floor = graph
        .nodes()
        .iter()
        .filter_map(|node| node.id().as_u64())
        .max()
        .map_or(DEFAULT_NEXT_NODE_ID, |max| {
            max.saturating_add(1).max(DEFAULT_NEXT_NODE_ID)
        });
    let next_node_id = match loaded.next_node_id {
        Some(u64::MAX) if floor < u64::MAX => {
            tracing::warn!(floor, "stored node id allocator is exhausted, lowering it");
            report.next_node_id_repaired = Some((Some(u64::MAX), floor));
            floor
        }
        Some(stored) if stored >= floor => stored,
        stored => {
            if stored.is_some() {
                tracing::warn!(?stored, floor, "raising stored node id allocator");
            }
            report.next_node_id_repaired = Some((stored, floor));
            floor
        }
    };

    (graph, next_node_id, report)
}
