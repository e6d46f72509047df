// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio::sync::Mutex;

use crate::editor::{FlowEditor, Intent, Outcome};
use crate::model::{Edge, EdgeId, HandleId, Id, Node, NodeId};
use crate::ops::{ConnectionCandidate, ConnectionRejection};
use crate::query::flow::{dead_ends, start_nodes};
use crate::query::unconnected_nodes;

use super::types::*;

/// MCP front end over a flow editor.
///
/// Clones share the editor; when the TUI runs alongside, it holds the same `Arc`.
#[derive(Clone)]
pub struct FlowdeckMcp {
    editor: Arc<Mutex<FlowEditor>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FlowdeckMcp {
    pub fn new(editor: FlowEditor) -> Self {
        Self::with_shared_editor(Arc::new(Mutex::new(editor)))
    }

    pub fn with_shared_editor(editor: Arc<Mutex<FlowEditor>>) -> Self {
        Self {
            editor,
            tool_router: Self::tool_router(),
        }
    }

    pub fn editor(&self) -> Arc<Mutex<FlowEditor>> {
        self.editor.clone()
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    async fn dispatch(&self, intent: Intent) -> IntentResponse {
        let mut editor = self.editor.lock().await;
        let outcome = editor.dispatch(intent);
        intent_response(&editor, &outcome)
    }

    /// Read every step and connection of the flow, in stored order.
    #[tool(name = "flow.read")]
    async fn flow_read(&self) -> Result<Json<FlowReadResponse>, ErrorData> {
        let editor = self.editor.lock().await;
        let graph = editor.graph();

        Ok(Json(FlowReadResponse {
            revision: editor.store().revision(),
            next_node_id: editor.store().next_node_id(),
            save_state: editor.save_state().label().to_owned(),
            nodes: graph.nodes().iter().map(mcp_node).collect(),
            edges: graph.edges().iter().map(mcp_edge).collect(),
        }))
    }

    /// Summarize the flow: counts, start steps, dead ends and steps that would block a save.
    #[tool(name = "flow.stat")]
    async fn flow_stat(&self) -> Result<Json<FlowStatResponse>, ErrorData> {
        let editor = self.editor.lock().await;
        let graph = editor.graph();
        let unconnected = unconnected_nodes(graph);

        Ok(Json(FlowStatResponse {
            revision: editor.store().revision(),
            nodes: graph.nodes().len() as u64,
            edges: graph.edges().len() as u64,
            fully_connected: unconnected.is_empty(),
            unconnected_node_ids: id_strings(&unconnected),
            start_node_ids: id_strings(&start_nodes(graph)),
            dead_end_node_ids: id_strings(&dead_ends(graph)),
        }))
    }

    /// Add a message step. Blank messages are rejected.
    #[tool(name = "node.create")]
    async fn node_create(
        &self,
        params: Parameters<NodeCreateParams>,
    ) -> Result<Json<IntentResponse>, ErrorData> {
        let NodeCreateParams { message } = params.0;
        Ok(Json(self.dispatch(Intent::CreateNode { message }).await))
    }

    /// Replace the message of an existing step; position and id are kept.
    #[tool(name = "node.update")]
    async fn node_update(
        &self,
        params: Parameters<NodeUpdateParams>,
    ) -> Result<Json<IntentResponse>, ErrorData> {
        let NodeUpdateParams { node_id, message } = params.0;
        let node_id: NodeId = parse_id(&node_id, "node_id")?;
        Ok(Json(
            self.dispatch(Intent::UpdateNode { node_id, message }).await,
        ))
    }

    /// Delete a step together with every connection touching it.
    #[tool(name = "node.delete")]
    async fn node_delete(
        &self,
        params: Parameters<NodeDeleteParams>,
    ) -> Result<Json<IntentResponse>, ErrorData> {
        let node_id: NodeId = parse_id(&params.0.node_id, "node_id")?;
        Ok(Json(self.dispatch(Intent::DeleteNode { node_id }).await))
    }

    /// Connect two steps. Rejected for self loops, an output that is already connected, and
    /// connections that would close a loop.
    #[tool(name = "edge.connect")]
    async fn edge_connect(
        &self,
        params: Parameters<EdgeConnectParams>,
    ) -> Result<Json<IntentResponse>, ErrorData> {
        let EdgeConnectParams {
            source_node_id,
            source_handle_id,
            target_node_id,
            target_handle_id,
        } = params.0;

        let candidate = ConnectionCandidate::new(
            parse_id(&source_node_id, "source_node_id")?,
            parse_id(&target_node_id, "target_node_id")?,
        )
        .with_source_handle(parse_handle(source_handle_id, "source_handle_id")?)
        .with_target_handle(parse_handle(target_handle_id, "target_handle_id")?);

        Ok(Json(self.dispatch(Intent::Connect(candidate)).await))
    }

    /// Remove one connection.
    #[tool(name = "edge.disconnect")]
    async fn edge_disconnect(
        &self,
        params: Parameters<EdgeDisconnectParams>,
    ) -> Result<Json<IntentResponse>, ErrorData> {
        let edge_id: EdgeId = parse_id(&params.0.edge_id, "edge_id")?;
        Ok(Json(self.dispatch(Intent::DisconnectEdge { edge_id }).await))
    }

    /// Read the shared selection (at most one step or one connection).
    #[tool(name = "selection.read")]
    async fn selection_read(&self) -> Result<Json<SelectionReadResponse>, ErrorData> {
        let editor = self.editor.lock().await;
        let selection = editor.selection();

        Ok(Json(SelectionReadResponse {
            node_id: selection.selected_node_id().map(ToString::to_string),
            edge_id: selection.selected_edge_id().map(ToString::to_string),
        }))
    }

    /// Select one step or one connection; pass neither to clear the selection.
    #[tool(name = "selection.set")]
    async fn selection_set(
        &self,
        params: Parameters<SelectionSetParams>,
    ) -> Result<Json<IntentResponse>, ErrorData> {
        let intent = match (params.0.node_id, params.0.edge_id) {
            (Some(_), Some(_)) => {
                return Err(ErrorData::invalid_params(
                    "select either node_id or edge_id, not both",
                    None,
                ))
            }
            (Some(node_id), None) => Intent::SelectNode {
                node_id: parse_id(&node_id, "node_id")?,
            },
            (None, Some(edge_id)) => Intent::SelectEdge {
                edge_id: parse_id(&edge_id, "edge_id")?,
            },
            (None, None) => Intent::ClearSelection,
        };
        Ok(Json(self.dispatch(intent).await))
    }

    /// Save the flow. Blocked while any step has no connection (unless it is the only step).
    #[tool(name = "flow.save")]
    async fn flow_save(&self) -> Result<Json<IntentResponse>, ErrorData> {
        Ok(Json(self.dispatch(Intent::RequestSave).await))
    }

    /// Discard the flow and start over from the single default step.
    #[tool(name = "flow.reset")]
    async fn flow_reset(&self) -> Result<Json<IntentResponse>, ErrorData> {
        Ok(Json(self.dispatch(Intent::ResetAll).await))
    }
}

#[tool_handler]
impl ServerHandler for FlowdeckMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Flowdeck flow editor (tools: flow.read, flow.stat, node.create, node.update, node.delete, edge.connect, edge.disconnect, selection.read, selection.set, flow.save, flow.reset). Rejected edits come back with status=rejected and a reason; unknown ids come back with status=ignored."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn parse_id<T>(raw: &str, field: &str) -> Result<Id<T>, ErrorData> {
    Id::new(raw).map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid {field}: {err}"),
            Some(serde_json::json!({ "field": field, "value": raw })),
        )
    })
}

fn parse_handle(raw: Option<String>, field: &str) -> Result<Option<HandleId>, ErrorData> {
    raw.map(|raw| parse_id(&raw, field)).transpose()
}

fn id_strings<T>(ids: &[Id<T>]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

fn mcp_node(node: &Node) -> McpNode {
    let position = node.position();
    McpNode {
        node_id: node.id().to_string(),
        kind: node.kind().label().to_owned(),
        message: node.text().to_owned(),
        x: position.x,
        y: position.y,
    }
}

fn mcp_edge(edge: &Edge) -> McpEdge {
    McpEdge {
        edge_id: edge.id().to_string(),
        source_node_id: edge.source_node_id().to_string(),
        source_handle_id: edge.source_handle_id().map(ToString::to_string),
        target_node_id: edge.target_node_id().to_string(),
        target_handle_id: edge.target_handle_id().map(ToString::to_string),
    }
}

fn intent_response(editor: &FlowEditor, outcome: &Outcome) -> IntentResponse {
    let status = if matches!(outcome, Outcome::Ignored) {
        "ignored"
    } else if outcome.is_rejection() {
        "rejected"
    } else {
        "ok"
    };

    let (node_id, edge_id, removed_edges) = match outcome {
        Outcome::NodeCreated { node_id } | Outcome::NodeUpdated { node_id } => {
            (Some(node_id.to_string()), None, None)
        }
        Outcome::NodeDeleted {
            node_id,
            removed_edges,
        } => (Some(node_id.to_string()), None, Some(*removed_edges as u64)),
        Outcome::Connected { edge_id } | Outcome::Disconnected { edge_id } => {
            (None, Some(edge_id.to_string()), None)
        }
        Outcome::ConnectionRejected(ConnectionRejection::UnknownEndpoint { node_id }) => {
            (Some(node_id.to_string()), None, None)
        }
        Outcome::ConnectionRejected(ConnectionRejection::HandleAlreadyConnected {
            existing_edge_id,
        }) => (None, Some(existing_edge_id.to_string()), None),
        _ => (None, None, None),
    };

    let unconnected_node_ids = match outcome {
        Outcome::SaveBlocked(blocked) => id_strings(&blocked.unconnected),
        _ => Vec::new(),
    };

    IntentResponse {
        status: status.to_owned(),
        reason: outcome.reason().map(str::to_owned),
        message: (!outcome.is_silent()).then(|| outcome.to_string()),
        node_id,
        edge_id,
        removed_edges,
        unconnected_node_ids,
        revision: editor.store().revision(),
        save_state: editor.save_state().label().to_owned(),
    }
}
