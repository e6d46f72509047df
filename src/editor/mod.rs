// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The flow editor: one graph store, one selection, one save gate.
//!
//! Edit surfaces (TUI, MCP) translate user input into [`Intent`]s and render the resulting
//! snapshot, selection, save state and [`Outcome`] messages. Intents run one at a time to
//! completion.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::config::NodeConfig;
use crate::model::{EdgeId, Graph, NodeId};
use crate::ops::{ConnectionCandidate, ConnectionRejection, NodeRejection};
use crate::store::{PersistenceAdapter, StoreError};

pub mod graph_store;
pub mod repair;
pub mod save_gate;
pub mod selection;

pub use graph_store::{DeletedNode, GraphStore, NotFound, UpdateNodeError};
pub use repair::{DroppedEdge, RepairReport};
pub use save_gate::{check_save, SaveBlocked, SaveState};
pub use selection::{SelectionController, SelectionState, SelectionTarget};

/// Oldest undrained outcomes are dropped past this many.
const OUTCOME_QUEUE_LIMIT: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    CreateNode { message: String },
    UpdateNode { node_id: NodeId, message: String },
    /// Explicit, confirmed node deletion.
    DeleteNode { node_id: NodeId },
    Connect(ConnectionCandidate),
    DisconnectEdge { edge_id: EdgeId },
    SelectNode { node_id: NodeId },
    SelectEdge { edge_id: EdgeId },
    ClearSelection,
    /// The delete/backspace key. Only removes a selected edge.
    DeleteKey,
    DeleteSelected,
    RequestSave,
    ResetAll,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NodeCreated { node_id: NodeId },
    NodeUpdated { node_id: NodeId },
    NodeDeleted { node_id: NodeId, removed_edges: usize },
    Connected { edge_id: EdgeId },
    Disconnected { edge_id: EdgeId },
    SelectionChanged,
    NodeRejected(NodeRejection),
    ConnectionRejected(ConnectionRejection),
    SaveBlocked(SaveBlocked),
    Saved,
    SaveFailed { reason: String },
    Reset,
    /// Stale or unknown id. Never shown to the user.
    Ignored,
}

impl Outcome {
    /// Whether the outcome carries nothing worth telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Ignored | Self::SelectionChanged)
    }

    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NodeRejected(_)
                | Self::ConnectionRejected(_)
                | Self::SaveBlocked(_)
                | Self::SaveFailed { .. }
        )
    }

    /// Machine-readable rejection reason.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::NodeRejected(rejection) => Some(rejection.code()),
            Self::ConnectionRejected(rejection) => Some(rejection.code()),
            Self::SaveBlocked(_) => Some("not_fully_connected"),
            Self::SaveFailed { .. } => Some("storage_failed"),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeCreated { node_id } => write!(f, "added step {node_id}"),
            Self::NodeUpdated { node_id } => write!(f, "updated step {node_id}"),
            Self::NodeDeleted {
                node_id,
                removed_edges,
            } => match removed_edges {
                0 => write!(f, "deleted step {node_id}"),
                1 => write!(f, "deleted step {node_id} and 1 connection"),
                n => write!(f, "deleted step {node_id} and {n} connections"),
            },
            Self::Connected { edge_id } => write!(f, "connected ({edge_id})"),
            Self::Disconnected { edge_id } => write!(f, "removed connection {edge_id}"),
            Self::SelectionChanged => f.write_str("selection changed"),
            Self::NodeRejected(rejection) => write!(f, "{rejection}"),
            Self::ConnectionRejected(rejection) => write!(f, "{rejection}"),
            Self::SaveBlocked(blocked) => write!(f, "{blocked}"),
            Self::Saved => f.write_str("flow saved"),
            Self::SaveFailed { reason } => write!(f, "save failed: {reason}"),
            Self::Reset => f.write_str("flow reset to the default step"),
            Self::Ignored => f.write_str("ignored"),
        }
    }
}

#[derive(Debug)]
pub struct FlowEditor {
    store: GraphStore,
    selection: SelectionController,
    save_state: SaveState,
    outcomes: VecDeque<Outcome>,
}

impl FlowEditor {
    pub fn open(
        persistence: Box<dyn PersistenceAdapter>,
        config: &NodeConfig,
    ) -> Result<(Self, RepairReport), StoreError> {
        let (store, report) = GraphStore::open(persistence, config)?;
        Ok((Self::from_store(store), report))
    }

    pub fn from_store(store: GraphStore) -> Self {
        Self {
            store,
            selection: SelectionController::default(),
            save_state: SaveState::default(),
            outcomes: VecDeque::new(),
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<Graph> {
        self.store.snapshot()
    }

    pub fn graph(&self) -> &Graph {
        self.store.graph()
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn save_state(&self) -> &SaveState {
        &self.save_state
    }

    /// Drains user-facing messages produced since the last call. Silent outcomes are never queued.
    pub fn take_outcomes(&mut self) -> Vec<Outcome> {
        self.outcomes.drain(..).collect()
    }

    /// Applies one intent to completion.
    pub fn dispatch(&mut self, intent: Intent) -> Outcome {
        let revision = self.store.revision();
        let outcome = self.apply(intent);

        if self.store.revision() != revision {
            self.save_state = SaveState::Editing;
            self.selection.retain_existing(self.store.graph());
        }
        match &outcome {
            Outcome::Saved => self.save_state = SaveState::Saved,
            Outcome::SaveBlocked(blocked) => self.save_state = SaveState::Blocked(blocked.clone()),
            Outcome::SaveFailed { .. } => self.save_state = SaveState::Editing,
            _ => {}
        }

        if outcome.is_rejection() {
            tracing::info!(%outcome, "intent rejected");
        }
        if !outcome.is_silent() {
            if self.outcomes.len() == OUTCOME_QUEUE_LIMIT {
                self.outcomes.pop_front();
            }
            self.outcomes.push_back(outcome.clone());
        }
        outcome
    }

    fn apply(&mut self, intent: Intent) -> Outcome {
        match intent {
            Intent::CreateNode { message } => match self.store.add_node(&message) {
                Ok(node) => Outcome::NodeCreated {
                    node_id: node.id().clone(),
                },
                Err(rejection) => Outcome::NodeRejected(rejection),
            },
            Intent::UpdateNode { node_id, message } => {
                match self.store.update_node(&node_id, &message) {
                    Ok(()) => Outcome::NodeUpdated { node_id },
                    Err(UpdateNodeError::Rejected(rejection)) => Outcome::NodeRejected(rejection),
                    Err(UpdateNodeError::NotFound(_)) => Outcome::Ignored,
                }
            }
            Intent::DeleteNode { node_id } => self.delete_node(&node_id),
            Intent::Connect(candidate) => match self.store.add_edge(candidate) {
                Ok(edge) => Outcome::Connected {
                    edge_id: edge.id().clone(),
                },
                Err(rejection) => Outcome::ConnectionRejected(rejection),
            },
            Intent::DisconnectEdge { edge_id } => self.delete_edge(&edge_id),
            Intent::SelectNode { node_id } => {
                if self.selection.select_node(self.store.graph(), &node_id) {
                    Outcome::SelectionChanged
                } else {
                    Outcome::Ignored
                }
            }
            Intent::SelectEdge { edge_id } => {
                if self.selection.select_edge(self.store.graph(), &edge_id) {
                    Outcome::SelectionChanged
                } else {
                    Outcome::Ignored
                }
            }
            Intent::ClearSelection => {
                if self.selection.state().is_empty() {
                    Outcome::Ignored
                } else {
                    self.selection.clear();
                    Outcome::SelectionChanged
                }
            }
            Intent::DeleteKey => {
                if self.selection.state().selected_edge_id().is_some() {
                    self.delete_selected()
                } else {
                    Outcome::Ignored
                }
            }
            Intent::DeleteSelected => self.delete_selected(),
            Intent::RequestSave => self.request_save(),
            Intent::ResetAll => {
                self.store.reset();
                self.selection.clear();
                Outcome::Reset
            }
        }
    }

    fn delete_node(&mut self, node_id: &NodeId) -> Outcome {
        match self.store.delete_node(node_id) {
            Ok(deleted) => Outcome::NodeDeleted {
                node_id: deleted.node.id().clone(),
                removed_edges: deleted.edges.len(),
            },
            Err(_) => Outcome::Ignored,
        }
    }

    fn delete_edge(&mut self, edge_id: &EdgeId) -> Outcome {
        match self.store.delete_edge(edge_id) {
            Ok(edge) => Outcome::Disconnected {
                edge_id: edge.id().clone(),
            },
            Err(_) => Outcome::Ignored,
        }
    }

    fn delete_selected(&mut self) -> Outcome {
        match self.selection.take() {
            Some(SelectionTarget::Node(node_id)) => self.delete_node(&node_id),
            Some(SelectionTarget::Edge(edge_id)) => self.delete_edge(&edge_id),
            None => Outcome::Ignored,
        }
    }

    fn request_save(&mut self) -> Outcome {
        if let Err(blocked) = check_save(self.store.graph()) {
            return Outcome::SaveBlocked(blocked);
        }
        match self.store.flush() {
            Ok(()) => {
                tracing::info!(
                    nodes = self.store.graph().nodes().len(),
                    edges = self.store.graph().edges().len(),
                    "flow saved"
                );
                Outcome::Saved
            }
            Err(err) => {
                tracing::error!(error = %err, "flow save failed");
                Outcome::SaveFailed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
