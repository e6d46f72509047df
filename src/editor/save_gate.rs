// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{Graph, NodeId};
use crate::query::unconnected_nodes;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot save: every step must be connected (unconnected: {})", join_ids(.unconnected))]
pub struct SaveBlocked {
    pub unconnected: Vec<NodeId>,
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter().map(NodeId::as_str).collect::<Vec<_>>().join(", ")
}

/// `Saved` and `Blocked` only last until the next commit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Editing,
    Saved,
    Blocked(SaveBlocked),
}

impl SaveState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Editing => "editing",
            Self::Saved => "saved",
            Self::Blocked(_) => "blocked",
        }
    }
}

/// Save is allowed for graphs of at most one node or where every node sits on some edge.
pub fn check_save(graph: &Graph) -> Result<(), SaveBlocked> {
    let unconnected = unconnected_nodes(graph);
    if unconnected.is_empty() {
        Ok(())
    } else {
        Err(SaveBlocked { unconnected })
    }
}
