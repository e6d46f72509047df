// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::repair::{repair_loaded_flow, RepairReport};
use crate::config::NodeConfig;
use crate::model::{Edge, EdgeId, Graph, Node, NodeId, Position};
use crate::ops::{
    allocate_edge_id, validate_connection, validate_message, ConnectionCandidate,
    ConnectionRejection, NodeRejection,
};
use crate::query::flow::is_acyclic;
use crate::store::{PersistedFlow, PersistenceAdapter, StoreError};

/// Next id of a fresh or reset flow (the default node takes `1`).
pub const DEFAULT_NEXT_NODE_ID: u64 = 2;

/// Where the single node of a fresh flow sits.
pub const DEFAULT_NODE_POSITION: Position = Position { x: 250.0, y: 5.0 };

/// Operation on an id the graph does not (or no longer) contain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    #[error("node {0} not found")]
    Node(NodeId),
    #[error("edge {0} not found")]
    Edge(EdgeId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateNodeError {
    #[error(transparent)]
    Rejected(#[from] NodeRejection),
    #[error(transparent)]
    NotFound(#[from] NotFound),
}

/// A node removed together with its incident edges.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedNode {
    pub node: Node,
    pub edges: Vec<Edge>,
}

struct NodePlacement {
    rng: StdRng,
    spread_x: f64,
    spread_y: f64,
}

impl NodePlacement {
    fn new(config: &NodeConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            spread_x: config.spread_x,
            spread_y: config.spread_y,
        }
    }

    fn next_position(&mut self) -> Position {
        let x = sample(&mut self.rng, self.spread_x);
        let y = sample(&mut self.rng, self.spread_y);
        Position::new(x, y)
    }
}

fn sample(rng: &mut StdRng, spread: f64) -> f64 {
    if spread > 0.0 {
        rng.gen_range(0.0..spread)
    } else {
        0.0
    }
}

/// Owner of the canonical flow graph.
///
/// Every mutation validates, commits a fresh snapshot and hands it to the persistence adapter.
/// Rejections leave the graph and the id allocator untouched.
pub struct GraphStore {
    graph: Arc<Graph>,
    next_node_id: u64,
    revision: u64,
    default_message: String,
    placement: NodePlacement,
    persistence: Box<dyn PersistenceAdapter>,
}

impl fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.graph.nodes().len())
            .field("edges", &self.graph.edges().len())
            .field("next_node_id", &self.next_node_id)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

impl GraphStore {
    /// Loads the flow from `persistence`, repairing whatever would break the graph invariants.
    ///
    /// A repaired flow is written back right away so storage matches memory.
    pub fn open(
        persistence: Box<dyn PersistenceAdapter>,
        config: &NodeConfig,
    ) -> Result<(Self, RepairReport), StoreError> {
        let loaded = persistence.load()?;
        let (graph, next_node_id, report) = repair_loaded_flow(loaded, &config.default_message);

        let store = Self {
            graph: Arc::new(graph),
            next_node_id,
            revision: 0,
            default_message: config.default_message.clone(),
            placement: NodePlacement::new(config),
            persistence,
        };

        if report.changed() {
            tracing::warn!(
                dropped_nodes = report.dropped_nodes.len(),
                dropped_edges = report.dropped_edges.len(),
                defaulted = report.defaulted,
                "repaired stored flow"
            );
            store.persistence.persist(store.persisted());
        }
        tracing::debug!(
            nodes = store.graph.nodes().len(),
            edges = store.graph.edges().len(),
            next_node_id = store.next_node_id,
            "flow loaded"
        );

        Ok((store, report))
    }

    /// Current snapshot. Cheap to clone and unaffected by later commits.
    pub fn snapshot(&self) -> Arc<Graph> {
        self.graph.clone()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn next_node_id(&self) -> u64 {
        self.next_node_id
    }

    /// Number of commits since the store was opened.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add_node(&mut self, message: &str) -> Result<Node, NodeRejection> {
        validate_message(message)?;

        let node_id = self.allocate_node_id()?;
        let position = self.placement.next_position();
        let node = Node::message(node_id, message, position);

        Arc::make_mut(&mut self.graph).nodes_mut().push(node.clone());
        self.commit("add_node");
        Ok(node)
    }

    pub fn update_node(&mut self, node_id: &NodeId, message: &str) -> Result<(), UpdateNodeError> {
        validate_message(message)?;
        if !self.graph.contains_node(node_id) {
            return Err(NotFound::Node(node_id.clone()).into());
        }

        let graph = Arc::make_mut(&mut self.graph);
        if let Some(node) = graph.nodes_mut().iter_mut().find(|node| node.id() == node_id) {
            node.set_text(message);
        }
        self.commit("update_node");
        Ok(())
    }

    /// Removes the node and every edge touching it in one commit.
    pub fn delete_node(&mut self, node_id: &NodeId) -> Result<DeletedNode, NotFound> {
        let Some(index) = self
            .graph
            .nodes()
            .iter()
            .position(|node| node.id() == node_id)
        else {
            return Err(NotFound::Node(node_id.clone()));
        };

        let graph = Arc::make_mut(&mut self.graph);
        let node = graph.nodes_mut().remove(index);
        let mut removed = Vec::new();
        graph.edges_mut().retain(|edge| {
            if edge.touches(node_id) {
                removed.push(edge.clone());
                false
            } else {
                true
            }
        });
        self.commit("delete_node");

        Ok(DeletedNode {
            node,
            edges: removed,
        })
    }

    pub fn add_edge(&mut self, candidate: ConnectionCandidate) -> Result<Edge, ConnectionRejection> {
        if let Err(rejection) = validate_connection(&self.graph, &candidate) {
            tracing::debug!(
                source = %candidate.source_node_id,
                target = %candidate.target_node_id,
                %rejection,
                "connection rejected"
            );
            return Err(rejection);
        }

        let edge_id = allocate_edge_id(&self.graph, &candidate);
        let edge = candidate.into_edge(edge_id);
        Arc::make_mut(&mut self.graph).edges_mut().push(edge.clone());
        self.commit("add_edge");
        Ok(edge)
    }

    pub fn delete_edge(&mut self, edge_id: &EdgeId) -> Result<Edge, NotFound> {
        let Some(index) = self
            .graph
            .edges()
            .iter()
            .position(|edge| edge.id() == edge_id)
        else {
            return Err(NotFound::Edge(edge_id.clone()));
        };

        let edge = Arc::make_mut(&mut self.graph).edges_mut().remove(index);
        self.commit("delete_edge");
        Ok(edge)
    }

    /// Replaces the flow with the single default node and rewinds the id allocator.
    pub fn reset(&mut self) {
        self.graph = Arc::new(default_graph(&self.default_message));
        self.next_node_id = DEFAULT_NEXT_NODE_ID;
        self.commit("reset");
    }

    /// Blocks until every commit so far has reached storage.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.persistence.flush()
    }

    /// `next_node_id == u64::MAX` means every id has been handed out.
    fn allocate_node_id(&mut self) -> Result<NodeId, NodeRejection> {
        loop {
            let value = self.next_node_id;
            self.next_node_id = value
                .checked_add(1)
                .ok_or(NodeRejection::IdSpaceExhausted)?;
            let node_id = NodeId::numeric(value);
            if !self.graph.contains_node(&node_id) {
                return Ok(node_id);
            }
        }
    }

    fn persisted(&self) -> PersistedFlow {
        PersistedFlow {
            nodes: self.graph.nodes().to_vec(),
            edges: self.graph.edges().to_vec(),
            next_node_id: self.next_node_id,
        }
    }

    fn commit(&mut self, op: &'static str) {
        debug_assert!(is_acyclic(&self.graph), "{op} committed a cyclic graph");
        self.revision = self.revision.saturating_add(1);
        tracing::debug!(
            op,
            revision = self.revision,
            nodes = self.graph.nodes().len(),
            edges = self.graph.edges().len(),
            "commit"
        );
        self.persistence.persist(self.persisted());
    }
}

/// The single-step graph that new and reset flows start from.
pub fn default_graph(default_message: &str) -> Graph {
    Graph::new(
        vec![Node::message(
            NodeId::numeric(1),
            default_message,
            DEFAULT_NODE_POSITION,
        )],
        Vec::new(),
    )
}
