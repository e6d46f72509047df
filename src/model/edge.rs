// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use super::ids::{EdgeId, HandleId, NodeId};

/// A directed connection from a source node's output handle to a target node's input handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    id: EdgeId,
    source_node_id: NodeId,
    #[serde(default)]
    source_handle_id: Option<HandleId>,
    target_node_id: NodeId,
    #[serde(default)]
    target_handle_id: Option<HandleId>,
}

impl Edge {
    pub fn new(
        id: EdgeId,
        source_node_id: NodeId,
        source_handle_id: Option<HandleId>,
        target_node_id: NodeId,
        target_handle_id: Option<HandleId>,
    ) -> Self {
        Self {
            id,
            source_node_id,
            source_handle_id,
            target_node_id,
            target_handle_id,
        }
    }

    pub fn id(&self) -> &EdgeId {
        &self.id
    }

    pub fn source_node_id(&self) -> &NodeId {
        &self.source_node_id
    }

    pub fn source_handle_id(&self) -> Option<&HandleId> {
        self.source_handle_id.as_ref()
    }

    pub fn target_node_id(&self) -> &NodeId {
        &self.target_node_id
    }

    pub fn target_handle_id(&self) -> Option<&HandleId> {
        self.target_handle_id.as_ref()
    }

    pub fn touches(&self, node_id: &NodeId) -> bool {
        &self.source_node_id == node_id || &self.target_node_id == node_id
    }

    /// Whether this edge leaves `node_id` through `handle_id` (`None` is its own handle).
    pub fn leaves_through(&self, node_id: &NodeId, handle_id: Option<&HandleId>) -> bool {
        &self.source_node_id == node_id && self.source_handle_id.as_ref() == handle_id
    }
}
