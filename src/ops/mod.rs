// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Connection acceptance and node payload rules.
//!
//! Everything here is a pure decision over a graph snapshot; committing the outcome is the graph
//! store's job.

use crate::model::{Edge, EdgeId, Graph, HandleId, NodeId};
use crate::query::reaches;

/// A connection the user is trying to draw. Not yet part of any graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCandidate {
    pub source_node_id: NodeId,
    pub source_handle_id: Option<HandleId>,
    pub target_node_id: NodeId,
    pub target_handle_id: Option<HandleId>,
}

impl ConnectionCandidate {
    pub fn new(source_node_id: NodeId, target_node_id: NodeId) -> Self {
        Self {
            source_node_id,
            source_handle_id: None,
            target_node_id,
            target_handle_id: None,
        }
    }

    pub fn with_source_handle(mut self, handle_id: Option<HandleId>) -> Self {
        self.source_handle_id = handle_id;
        self
    }

    pub fn with_target_handle(mut self, handle_id: Option<HandleId>) -> Self {
        self.target_handle_id = handle_id;
        self
    }

    pub fn into_edge(self, edge_id: EdgeId) -> Edge {
        Edge::new(
            edge_id,
            self.source_node_id,
            self.source_handle_id,
            self.target_node_id,
            self.target_handle_id,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionRejection {
    #[error("cannot connect: node {node_id} does not exist")]
    UnknownEndpoint { node_id: NodeId },
    #[error("a step cannot connect to itself")]
    SelfLoop,
    #[error("this output already has a connection; remove it first")]
    HandleAlreadyConnected { existing_edge_id: EdgeId },
    #[error("connection would create a loop in the flow")]
    WouldCreateCycle,
}

impl ConnectionRejection {
    /// Stable machine-readable name.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownEndpoint { .. } => "unknown_endpoint",
            Self::SelfLoop => "self_loop",
            Self::HandleAlreadyConnected { .. } => "handle_already_connected",
            Self::WouldCreateCycle => "would_create_cycle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NodeRejection {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("no step ids left to allocate")]
    IdSpaceExhausted,
}

impl NodeRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "empty_message",
            Self::IdSpaceExhausted => "id_space_exhausted",
        }
    }
}

/// Decides whether `candidate` may be added to `graph`.
///
/// Checks run in a fixed order and stop at the first failure: unknown endpoint, self loop,
/// occupied source handle, cycle. The cycle check runs against the existing edges only.
pub fn validate_connection(
    graph: &Graph,
    candidate: &ConnectionCandidate,
) -> Result<(), ConnectionRejection> {
    for node_id in [&candidate.source_node_id, &candidate.target_node_id] {
        if !graph.contains_node(node_id) {
            return Err(ConnectionRejection::UnknownEndpoint {
                node_id: node_id.clone(),
            });
        }
    }

    if candidate.source_node_id == candidate.target_node_id {
        return Err(ConnectionRejection::SelfLoop);
    }

    if let Some(existing) = graph.edges().iter().find(|edge| {
        edge.leaves_through(&candidate.source_node_id, candidate.source_handle_id.as_ref())
    }) {
        return Err(ConnectionRejection::HandleAlreadyConnected {
            existing_edge_id: existing.id().clone(),
        });
    }

    // The candidate closes a loop iff its source is already downstream of its target.
    if reaches(graph, &candidate.target_node_id, &candidate.source_node_id) {
        return Err(ConnectionRejection::WouldCreateCycle);
    }

    Ok(())
}

/// Messages are stored verbatim but must contain something besides whitespace.
pub fn validate_message(message: &str) -> Result<(), NodeRejection> {
    if message.trim().is_empty() {
        return Err(NodeRejection::EmptyMessage);
    }
    Ok(())
}

/// Derives an edge id from the candidate endpoints, suffixing on the rare collision.
pub fn allocate_edge_id(graph: &Graph, candidate: &ConnectionCandidate) -> EdgeId {
    let handle = candidate
        .source_handle_id
        .as_ref()
        .map(HandleId::as_str)
        .unwrap_or("out");
    let base = format!(
        "e{}-{}-{}",
        candidate.source_node_id, handle, candidate.target_node_id
    );

    let mut suffix = 1_u64;
    loop {
        let raw = if suffix == 1 {
            base.clone()
        } else {
            format!("{base}~{suffix}")
        };
        // Node and handle ids are valid id tokens, so the joined form is too.
        if let Ok(edge_id) = EdgeId::new(raw) {
            if !graph.contains_edge(&edge_id) {
                return edge_id;
            }
        }
        suffix = suffix.saturating_add(1);
    }
}
