// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpNode {
    pub node_id: String,
    pub kind: String,
    pub message: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpEdge {
    pub edge_id: String,
    pub source_node_id: String,
    pub source_handle_id: Option<String>,
    pub target_node_id: String,
    pub target_handle_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FlowReadResponse {
    pub revision: u64,
    pub next_node_id: u64,
    pub save_state: String,
    pub nodes: Vec<McpNode>,
    pub edges: Vec<McpEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FlowStatResponse {
    pub revision: u64,
    pub nodes: u64,
    pub edges: u64,
    pub fully_connected: bool,
    pub unconnected_node_ids: Vec<String>,
    pub start_node_ids: Vec<String>,
    pub dead_end_node_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeCreateParams {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeUpdateParams {
    pub node_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NodeDeleteParams {
    pub node_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EdgeConnectParams {
    pub source_node_id: String,
    /// Named output of the source step; omit for its default output.
    pub source_handle_id: Option<String>,
    pub target_node_id: String,
    pub target_handle_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EdgeDisconnectParams {
    pub edge_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SelectionSetParams {
    /// Select this node. Mutually exclusive with `edge_id`; omit both to clear.
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SelectionReadResponse {
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
}

/// Result of any mutating tool.
///
/// `status` is `ok`, `rejected` (with `reason` and a user-facing `message`) or `ignored` (the
/// target id does not exist).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IntentResponse {
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
    pub removed_edges: Option<u64>,
    pub unconnected_node_ids: Vec<String>,
    pub revision: u64,
    pub save_state: String,
}
