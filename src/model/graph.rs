// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::edge::Edge;
use super::ids::{EdgeId, NodeId};
use super::node::Node;

/// An ordered node/edge snapshot.
///
/// The graph itself does not enforce the flow invariants; `GraphStore` only commits graphs that
/// went through the connection validator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    pub(crate) fn edges_mut(&mut self) -> &mut Vec<Edge> {
        &mut self.edges
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id() == node_id)
    }

    pub fn edge(&self, edge_id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id() == edge_id)
    }

    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.node(node_id).is_some()
    }

    pub fn contains_edge(&self, edge_id: &EdgeId) -> bool {
        self.edge(edge_id).is_some()
    }

    pub fn outgoing<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.source_node_id() == node_id)
    }

    pub fn incident<'a>(&'a self, node_id: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.touches(node_id))
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        (self.nodes, self.edges)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::fixtures::chain;
    use crate::model::NodeId;

    #[test]
    fn lookup_and_adjacency_follow_edge_direction() {
        let graph = chain(&["A", "B", "C"]);
        let b = NodeId::new("2").expect("node id");

        assert_eq!(graph.node(&b).map(|node| node.text()), Some("B"));
        assert_eq!(graph.outgoing(&b).count(), 1);
        assert_eq!(graph.incident(&b).count(), 2);
        assert!(!graph.contains_node(&NodeId::new("9").expect("node id")));
    }
}
