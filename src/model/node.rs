// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use super::ids::NodeId;

/// Free-form canvas coordinates. Stored and round-tripped, never interpreted by the core.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Message,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Message => "message",
        }
    }
}

/// Step payload, tagged by `kind` on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodePayload {
    Message { message: String },
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Message { .. } => NodeKind::Message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    #[serde(flatten)]
    payload: NodePayload,
    position: Position,
}

impl Node {
    pub fn message(id: NodeId, message: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            payload: NodePayload::Message {
                message: message.into(),
            },
            position,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn text(&self) -> &str {
        match &self.payload {
            NodePayload::Message { message } => message,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        match &mut self.payload {
            NodePayload::Message { message } => *message = text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, NodeKind, Position};
    use crate::model::NodeId;

    #[test]
    fn message_node_can_be_constructed_and_updated() {
        let id = NodeId::new("1").expect("node id");
        let mut node = Node::message(id.clone(), "Hello", Position::new(10.0, 20.0));

        assert_eq!(node.id(), &id);
        assert_eq!(node.kind(), NodeKind::Message);
        assert_eq!(node.text(), "Hello");

        node.set_text("World");
        assert_eq!(node.text(), "World");
        assert_eq!(node.position(), Position::new(10.0, 20.0));
    }

    #[test]
    fn message_node_json_carries_kind_tag() {
        let node = Node::message(NodeId::new("3").expect("node id"), "hi", Position::new(1.5, 2.0));
        let json = serde_json::to_value(&node).expect("serialize");

        assert_eq!(json["id"], "3");
        assert_eq!(json["kind"], "message");
        assert_eq!(json["message"], "hi");
        assert_eq!(json["position"]["x"], 1.5);

        let back: Node = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, node);
    }

    #[test]
    fn unknown_node_kind_is_rejected() {
        let raw = r#"{"id":"1","kind":"image","message":"x","position":{"x":0,"y":0}}"#;
        serde_json::from_str::<Node>(raw).unwrap_err();
    }
}
