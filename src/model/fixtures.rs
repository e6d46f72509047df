// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::edge::Edge;
use super::graph::Graph;
use super::ids::{EdgeId, HandleId, NodeId};
use super::node::{Node, Position};

fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn eid(value: &str) -> EdgeId {
    EdgeId::new(value).expect("edge id")
}

fn hid(value: &str) -> HandleId {
    HandleId::new(value).expect("handle id")
}

/// Message nodes `1..=n` with the given texts and no edges.
pub(crate) fn isolated(messages: &[&str]) -> Graph {
    let nodes = messages
        .iter()
        .enumerate()
        .map(|(idx, message)| {
            let offset = idx as f64 * 120.0;
            Node::message(nid(&(idx + 1).to_string()), *message, Position::new(offset, 0.0))
        })
        .collect();
    Graph::new(nodes, Vec::new())
}

/// Message nodes `1..=n` linked `1 -> 2 -> ... -> n` through the default (unnamed) handles.
pub(crate) fn chain(messages: &[&str]) -> Graph {
    let mut graph = isolated(messages);
    for idx in 1..messages.len() {
        let from = idx.to_string();
        let to = (idx + 1).to_string();
        graph.edges_mut().push(Edge::new(
            eid(&format!("e{from}-{to}")),
            nid(&from),
            None,
            nid(&to),
            None,
        ));
    }
    graph
}

/// `1 -yes-> 2`, `1 -no-> 3`, `2 -> 4`, `3 -> 4`.
pub(crate) fn diamond() -> Graph {
    let mut graph = isolated(&["Ask", "Yes", "No", "Bye"]);
    let edges = graph.edges_mut();
    edges.push(Edge::new(eid("e1-yes-2"), nid("1"), Some(hid("yes")), nid("2"), None));
    edges.push(Edge::new(eid("e1-no-3"), nid("1"), Some(hid("no")), nid("3"), None));
    edges.push(Edge::new(eid("e2-4"), nid("2"), None, nid("4"), None));
    edges.push(Edge::new(eid("e3-4"), nid("3"), None, nid("4"), None));
    graph
}
