// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::model::{Graph, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowNodeDegree {
    pub in_degree: u64,
    pub out_degree: u64,
}

pub fn degrees(graph: &Graph) -> BTreeMap<NodeId, FlowNodeDegree> {
    let mut degrees: BTreeMap<NodeId, FlowNodeDegree> = BTreeMap::new();
    for node in graph.nodes() {
        degrees.entry(node.id().clone()).or_default();
    }

    for edge in graph.edges() {
        let from_degree = degrees.entry(edge.source_node_id().clone()).or_default();
        from_degree.out_degree = from_degree.out_degree.saturating_add(1);

        let to_degree = degrees.entry(edge.target_node_id().clone()).or_default();
        to_degree.in_degree = to_degree.in_degree.saturating_add(1);
    }

    degrees
}

fn outgoing_adjacency(graph: &Graph) -> BTreeMap<&NodeId, Vec<&NodeId>> {
    let mut outgoing: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
    for edge in graph.edges() {
        outgoing
            .entry(edge.source_node_id())
            .or_default()
            .push(edge.target_node_id());
    }
    outgoing
}

/// Whether `to` can be reached from `from` by following one or more edges forward.
///
/// Iterative depth-first search; the visited set keeps diamonds from being re-expanded.
pub fn reaches(graph: &Graph, from: &NodeId, to: &NodeId) -> bool {
    let outgoing = outgoing_adjacency(graph);
    let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
    let mut stack: Vec<&NodeId> = outgoing.get(from).cloned().unwrap_or_default();

    while let Some(current) = stack.pop() {
        if current == to {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = outgoing.get(current) {
            stack.extend(next.iter().copied().filter(|id| !visited.contains(id)));
        }
    }

    false
}

/// Every node reachable from `from` (excluding `from` itself unless it lies on a cycle).
pub fn reachable(graph: &Graph, from: &NodeId) -> Vec<NodeId> {
    let outgoing = outgoing_adjacency(graph);
    let mut visited: BTreeSet<&NodeId> = BTreeSet::new();
    let mut stack: Vec<&NodeId> = outgoing.get(from).cloned().unwrap_or_default();

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = outgoing.get(current) {
            stack.extend(next.iter().copied());
        }
    }

    visited.into_iter().cloned().collect()
}

/// Save gate predicate: at most one node, or every node is an endpoint of some edge.
pub fn is_fully_connected(graph: &Graph) -> bool {
    graph.nodes().len() <= 1 || unconnected_nodes(graph).is_empty()
}

/// Nodes that appear on no edge, in graph order. Empty for graphs of at most one node.
pub fn unconnected_nodes(graph: &Graph) -> Vec<NodeId> {
    if graph.nodes().len() <= 1 {
        return Vec::new();
    }

    let endpoints: BTreeSet<&NodeId> = graph
        .edges()
        .iter()
        .flat_map(|edge| [edge.source_node_id(), edge.target_node_id()])
        .collect();

    graph
        .nodes()
        .iter()
        .map(|node| node.id())
        .filter(|node_id| !endpoints.contains(node_id))
        .cloned()
        .collect()
}

/// Nodes with no incoming edge, in graph order.
pub fn start_nodes(graph: &Graph) -> Vec<NodeId> {
    let degrees = degrees(graph);
    graph
        .nodes()
        .iter()
        .filter(|node| degrees.get(node.id()).is_some_and(|d| d.in_degree == 0))
        .map(|node| node.id().clone())
        .collect()
}

/// Nodes with no outgoing edge, in graph order.
pub fn dead_ends(graph: &Graph) -> Vec<NodeId> {
    let degrees = degrees(graph);
    graph
        .nodes()
        .iter()
        .filter(|node| degrees.get(node.id()).is_some_and(|d| d.out_degree == 0))
        .map(|node| node.id().clone())
        .collect()
}

/// Kahn ordering of the nodes, or `None` when the edges contain a cycle.
pub fn topological_order(graph: &Graph) -> Option<Vec<NodeId>> {
    let outgoing = outgoing_adjacency(graph);
    let mut in_degree: BTreeMap<&NodeId, usize> =
        graph.nodes().iter().map(|node| (node.id(), 0)).collect();
    for edge in graph.edges() {
        *in_degree.entry(edge.target_node_id()).or_default() += 1;
        in_degree.entry(edge.source_node_id()).or_default();
    }

    let mut ready: VecDeque<&NodeId> = graph
        .nodes()
        .iter()
        .map(|node| node.id())
        .filter(|node_id| in_degree.get(node_id) == Some(&0))
        .collect();
    let mut order = Vec::with_capacity(in_degree.len());

    while let Some(node_id) = ready.pop_front() {
        order.push(node_id.clone());
        for next in outgoing.get(node_id).into_iter().flatten() {
            let Some(remaining) = in_degree.get_mut(next) else {
                continue;
            };
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                ready.push_back(*next);
            }
        }
    }

    (order.len() == in_degree.len()).then_some(order)
}

pub fn is_acyclic(graph: &Graph) -> bool {
    topological_order(graph).is_some()
}
