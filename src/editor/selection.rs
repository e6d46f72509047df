// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::Serialize;

use crate::model::{EdgeId, Graph, NodeId};

/// At most one node or one edge, never both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SelectionState {
    selected_node_id: Option<NodeId>,
    selected_edge_id: Option<EdgeId>,
}

impl SelectionState {
    pub fn selected_node_id(&self) -> Option<&NodeId> {
        self.selected_node_id.as_ref()
    }

    pub fn selected_edge_id(&self) -> Option<&EdgeId> {
        self.selected_edge_id.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_node_id.is_none() && self.selected_edge_id.is_none()
    }
}

/// What `delete_selected` should remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionTarget {
    Node(NodeId),
    Edge(EdgeId),
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    state: SelectionState,
}

impl SelectionController {
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Returns `false` (and keeps the selection) when the node is not in `graph`.
    pub fn select_node(&mut self, graph: &Graph, node_id: &NodeId) -> bool {
        if !graph.contains_node(node_id) {
            return false;
        }
        self.state = SelectionState {
            selected_node_id: Some(node_id.clone()),
            selected_edge_id: None,
        };
        true
    }

    /// Returns `false` (and keeps the selection) when the edge is not in `graph`.
    pub fn select_edge(&mut self, graph: &Graph, edge_id: &EdgeId) -> bool {
        if !graph.contains_edge(edge_id) {
            return false;
        }
        self.state = SelectionState {
            selected_node_id: None,
            selected_edge_id: Some(edge_id.clone()),
        };
        true
    }

    pub fn clear(&mut self) {
        self.state = SelectionState::default();
    }

    /// Clears the selection and returns what it pointed at.
    pub fn take(&mut self) -> Option<SelectionTarget> {
        let state = std::mem::take(&mut self.state);
        match (state.selected_node_id, state.selected_edge_id) {
            (Some(node_id), _) => Some(SelectionTarget::Node(node_id)),
            (None, Some(edge_id)) => Some(SelectionTarget::Edge(edge_id)),
            (None, None) => None,
        }
    }

    /// Drops a selection whose id no longer exists in `graph`. Returns whether anything changed.
    pub fn retain_existing(&mut self, graph: &Graph) -> bool {
        let stale = self
            .state
            .selected_node_id
            .as_ref()
            .is_some_and(|node_id| !graph.contains_node(node_id))
            || self
                .state
                .selected_edge_id
                .as_ref()
                .is_some_and(|edge_id| !graph.contains_edge(edge_id));
        if stale {
            self.clear();
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::{SelectionController, SelectionTarget};
    use crate::model::fixtures::{chain, isolated};
    use crate::model::{EdgeId, NodeId};

    fn nid(value: &str) -> NodeId {
        NodeId::new(value).expect("node id")
    }

    fn eid(value: &str) -> EdgeId {
        EdgeId::new(value).expect("edge id")
    }

    #[test]
    fn node_and_edge_selection_are_exclusive() {
        let graph = chain(&["A", "B"]);
        let mut selection = SelectionController::default();

        assert!(selection.select_node(&graph, &nid("1")));
        assert!(selection.select_edge(&graph, &eid("e1-2")));
        assert_eq!(selection.state().selected_node_id(), None);
        assert_eq!(selection.state().selected_edge_id(), Some(&eid("e1-2")));

        assert!(selection.select_node(&graph, &nid("2")));
        assert_eq!(selection.state().selected_edge_id(), None);
        assert_eq!(selection.state().selected_node_id(), Some(&nid("2")));
    }

    #[test]
    fn unknown_ids_do_not_change_selection() {
        let graph = chain(&["A", "B"]);
        let mut selection = SelectionController::default();
        selection.select_node(&graph, &nid("1"));

        assert!(!selection.select_node(&graph, &nid("9")));
        assert!(!selection.select_edge(&graph, &eid("nope")));
        assert_eq!(selection.state().selected_node_id(), Some(&nid("1")));
    }

    #[test]
    fn take_clears_and_reports_target() {
        let graph = chain(&["A", "B"]);
        let mut selection = SelectionController::default();
        selection.select_edge(&graph, &eid("e1-2"));

        assert_eq!(selection.take(), Some(SelectionTarget::Edge(eid("e1-2"))));
        assert!(selection.state().is_empty());
        assert_eq!(selection.take(), None);
    }

    #[test]
    fn stale_selection_is_cleared() {
        let graph = chain(&["A", "B"]);
        let mut selection = SelectionController::default();
        selection.select_edge(&graph, &eid("e1-2"));

        assert!(!selection.retain_existing(&graph));
        assert!(selection.retain_existing(&isolated(&["A", "B"])));
        assert!(selection.state().is_empty());
    }
}
