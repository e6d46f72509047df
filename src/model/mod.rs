// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A flow is an ordered set of message nodes plus the directed edges between their handles.

pub mod edge;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod graph;
pub mod ids;
pub mod node;

pub use edge::Edge;
pub use graph::Graph;
pub use ids::{EdgeId, HandleId, Id, IdError, NodeId};
pub use node::{Node, NodeKind, NodePayload, Position};
