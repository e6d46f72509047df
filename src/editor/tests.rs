// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::{fixture, rstest};

use super::{FlowEditor, Intent, Outcome, SaveState};
use crate::config::NodeConfig;
use crate::model::{EdgeId, Graph, HandleId, Node, NodeId, Position};
use crate::ops::{ConnectionCandidate, ConnectionRejection, NodeRejection};
use crate::query::flow::is_acyclic;
use crate::store::{DirectWrite, LoadedFlow, MemoryStorage, PersistedFlow, WriteQueue};

struct EditorCtx {
    editor: FlowEditor,
    storage: MemoryStorage,
}

fn node_config() -> NodeConfig {
    NodeConfig {
        seed: Some(7),
        ..NodeConfig::default()
    }
}

#[fixture]
fn ctx() -> EditorCtx {
    let storage = MemoryStorage::recording();
    let (editor, _) = FlowEditor::open(Box::new(DirectWrite::new(storage.clone())), &node_config())
        .expect("open editor");
    EditorCtx { editor, storage }
}

fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn hid(value: &str) -> HandleId {
    HandleId::new(value).expect("handle id")
}

fn create(editor: &mut FlowEditor, message: &str) -> NodeId {
    match editor.dispatch(Intent::CreateNode {
        message: message.to_owned(),
    }) {
        Outcome::NodeCreated { node_id } => node_id,
        other => panic!("unexpected outcome: {other:?}"),
    }
}

fn connect(editor: &mut FlowEditor, from: &NodeId, to: &NodeId) -> Outcome {
    editor.dispatch(Intent::Connect(ConnectionCandidate::new(
        from.clone(),
        to.clone(),
    )))
}

fn connected(editor: &mut FlowEditor, from: &NodeId, to: &NodeId) -> EdgeId {
    match connect(editor, from, to) {
        Outcome::Connected { edge_id } => edge_id,
        other => panic!("unexpected outcome: {other:?}"),
    }
}

/// Default node `1` plus `2` and `3`, linked `1 -> 2 -> 3`.
fn abc(editor: &mut FlowEditor) -> (NodeId, NodeId, NodeId) {
    let a = nid("1");
    let b = create(editor, "B");
    let c = create(editor, "C");
    connected(editor, &a, &b);
    connected(editor, &b, &c);
    (a, b, c)
}

fn assert_flow_invariants(graph: &Graph) {
    let node_ids: BTreeSet<&NodeId> = graph.nodes().iter().map(|node| node.id()).collect();
    assert_eq!(node_ids.len(), graph.nodes().len(), "duplicate node ids");

    let mut handles = BTreeSet::new();
    for edge in graph.edges() {
        assert!(node_ids.contains(edge.source_node_id()), "dangling source");
        assert!(node_ids.contains(edge.target_node_id()), "dangling target");
        assert_ne!(edge.source_node_id(), edge.target_node_id(), "self loop");
        assert!(
            handles.insert((edge.source_node_id(), edge.source_handle_id())),
            "two edges leave through one handle"
        );
    }
    assert!(is_acyclic(graph), "cycle");
}

#[rstest]
fn fresh_flow_is_the_single_default_node(ctx: EditorCtx) {
    let graph = ctx.editor.graph();
    assert_eq!(graph.nodes().len(), 1);
    assert_eq!(graph.nodes()[0].id().as_str(), "1");
    assert!(graph.edges().is_empty());
    assert_eq!(ctx.editor.store().next_node_id(), 2);
}

#[rstest]
fn single_node_flow_saves(mut ctx: EditorCtx) {
    assert_eq!(ctx.editor.dispatch(Intent::RequestSave), Outcome::Saved);
    assert_eq!(ctx.editor.save_state(), &SaveState::Saved);

    let latest = ctx.storage.latest().expect("flow written");
    assert_eq!(latest.nodes.len(), 1);
    assert!(latest.edges.is_empty());
}

#[rstest]
fn cycle_closing_connection_is_rejected(mut ctx: EditorCtx) {
    let (a, _, c) = abc(&mut ctx.editor);
    let before = ctx.editor.snapshot();

    assert_eq!(
        connect(&mut ctx.editor, &c, &a),
        Outcome::ConnectionRejected(ConnectionRejection::WouldCreateCycle)
    );
    assert_eq!(ctx.editor.graph(), before.as_ref());
}

#[rstest]
fn self_connection_is_rejected(mut ctx: EditorCtx) {
    let a = nid("1");
    assert_eq!(
        connect(&mut ctx.editor, &a, &a),
        Outcome::ConnectionRejected(ConnectionRejection::SelfLoop)
    );
    assert!(ctx.editor.graph().edges().is_empty());
}

#[rstest]
fn second_connection_from_one_handle_is_rejected(mut ctx: EditorCtx) {
    let a = nid("1");
    let b = create(&mut ctx.editor, "B");
    let c = create(&mut ctx.editor, "C");
    let first = connected(&mut ctx.editor, &a, &b);

    assert_eq!(
        connect(&mut ctx.editor, &a, &c),
        Outcome::ConnectionRejected(ConnectionRejection::HandleAlreadyConnected {
            existing_edge_id: first,
        })
    );
    assert_eq!(ctx.editor.graph().edges().len(), 1);
}

#[rstest]
fn named_handles_fan_out(mut ctx: EditorCtx) {
    let a = nid("1");
    let b = create(&mut ctx.editor, "B");
    let c = create(&mut ctx.editor, "C");

    for (target, handle) in [(&b, "yes"), (&c, "no")] {
        let candidate = ConnectionCandidate::new(a.clone(), target.clone())
            .with_source_handle(Some(hid(handle)));
        assert!(matches!(
            ctx.editor.dispatch(Intent::Connect(candidate)),
            Outcome::Connected { .. }
        ));
    }
    assert_eq!(ctx.editor.graph().edges().len(), 2);
}

#[rstest]
fn unconnected_nodes_block_save(mut ctx: EditorCtx) {
    let a = nid("1");
    let b = create(&mut ctx.editor, "B");

    match ctx.editor.dispatch(Intent::RequestSave) {
        Outcome::SaveBlocked(blocked) => assert_eq!(blocked.unconnected, vec![a.clone(), b.clone()]),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(matches!(ctx.editor.save_state(), SaveState::Blocked(_)));

    connected(&mut ctx.editor, &a, &b);
    assert_eq!(ctx.editor.save_state(), &SaveState::Editing);
    assert_eq!(ctx.editor.dispatch(Intent::RequestSave), Outcome::Saved);
}

#[rstest]
fn deleting_middle_node_cascades(mut ctx: EditorCtx) {
    let (a, b, c) = abc(&mut ctx.editor);

    assert_eq!(
        ctx.editor.dispatch(Intent::DeleteNode {
            node_id: b.clone()
        }),
        Outcome::NodeDeleted {
            node_id: b,
            removed_edges: 2,
        }
    );

    let graph = ctx.editor.graph();
    let remaining: Vec<&NodeId> = graph.nodes().iter().map(|node| node.id()).collect();
    assert_eq!(remaining, vec![&a, &c]);
    assert!(graph.edges().is_empty());
}

#[rstest]
fn blank_messages_are_rejected_without_allocating(mut ctx: EditorCtx) {
    assert_eq!(
        ctx.editor.dispatch(Intent::CreateNode {
            message: "   ".to_owned()
        }),
        Outcome::NodeRejected(NodeRejection::EmptyMessage)
    );
    assert_eq!(ctx.editor.store().next_node_id(), 2);
    assert_eq!(ctx.editor.store().revision(), 0);

    assert_eq!(
        ctx.editor.dispatch(Intent::UpdateNode {
            node_id: nid("1"),
            message: String::new(),
        }),
        Outcome::NodeRejected(NodeRejection::EmptyMessage)
    );
}

#[rstest]
fn update_replaces_only_the_message(mut ctx: EditorCtx) {
    let before = ctx.editor.graph().nodes()[0].clone();

    assert_eq!(
        ctx.editor.dispatch(Intent::UpdateNode {
            node_id: nid("1"),
            message: "  Welcome ".to_owned(),
        }),
        Outcome::NodeUpdated { node_id: nid("1") }
    );

    let after = &ctx.editor.graph().nodes()[0];
    assert_eq!(after.text(), "  Welcome ");
    assert_eq!(after.position(), before.position());
    assert_eq!(after.id(), before.id());
}

#[rstest]
#[case(Intent::UpdateNode { node_id: NodeId::numeric(9), message: "x".to_owned() })]
#[case(Intent::DeleteNode { node_id: NodeId::numeric(9) })]
#[case(Intent::DisconnectEdge { edge_id: EdgeId::numeric(9) })]
#[case(Intent::SelectNode { node_id: NodeId::numeric(9) })]
#[case(Intent::SelectEdge { edge_id: EdgeId::numeric(9) })]
#[case(Intent::DeleteSelected)]
#[case(Intent::DeleteKey)]
#[case(Intent::ClearSelection)]
fn unknown_targets_are_silently_ignored(mut ctx: EditorCtx, #[case] intent: Intent) {
    let before = ctx.editor.snapshot();
    let writes_before = ctx.storage.write_count();

    assert_eq!(ctx.editor.dispatch(intent), Outcome::Ignored);
    assert_eq!(ctx.editor.graph(), before.as_ref());
    assert!(ctx.editor.take_outcomes().is_empty());
    assert_eq!(ctx.storage.write_count(), writes_before);
}

#[rstest]
fn node_ids_are_never_reused(mut ctx: EditorCtx) {
    let b = create(&mut ctx.editor, "B");
    ctx.editor.dispatch(Intent::DeleteNode { node_id: b.clone() });
    let c = create(&mut ctx.editor, "C");

    assert_eq!(b.as_str(), "2");
    assert_eq!(c.as_str(), "3");
    assert_eq!(ctx.editor.store().next_node_id(), 4);
}

#[test]
fn allocator_at_the_top_of_the_id_space_rejects_instead_of_reusing() {
    let near_top = u64::MAX - 2;
    let storage = MemoryStorage::seeded(LoadedFlow {
        nodes: Some(vec![Node::message(
            NodeId::numeric(near_top),
            "A",
            Position::default(),
        )]),
        edges: None,
        next_node_id: Some(u64::MAX - 1),
    });
    let (mut editor, _) =
        FlowEditor::open(Box::new(DirectWrite::new(storage.clone())), &node_config())
            .expect("open editor");

    assert_eq!(create(&mut editor, "B"), NodeId::numeric(u64::MAX - 1));
    assert_eq!(editor.store().next_node_id(), u64::MAX);

    let revision = editor.store().revision();
    for _ in 0..2 {
        assert_eq!(
            editor.dispatch(Intent::CreateNode {
                message: "C".to_owned(),
            }),
            Outcome::NodeRejected(NodeRejection::IdSpaceExhausted)
        );
    }
    assert_eq!(editor.graph().nodes().len(), 2);
    assert_eq!(editor.store().revision(), revision);
    assert_eq!(editor.store().next_node_id(), u64::MAX);
}

#[rstest]
fn reset_restores_default_flow_and_allocator(mut ctx: EditorCtx) {
    let (_, b, _) = abc(&mut ctx.editor);
    ctx.editor.dispatch(Intent::SelectNode { node_id: b });

    assert_eq!(ctx.editor.dispatch(Intent::ResetAll), Outcome::Reset);

    assert_eq!(ctx.editor.graph().nodes().len(), 1);
    assert!(ctx.editor.graph().edges().is_empty());
    assert_eq!(ctx.editor.store().next_node_id(), 2);
    assert!(ctx.editor.selection().is_empty());
    assert_eq!(
        ctx.storage.latest().map(|flow| flow.next_node_id),
        Some(2)
    );
}

#[rstest]
fn delete_key_only_removes_selected_edges(mut ctx: EditorCtx) {
    let (a, b, _) = abc(&mut ctx.editor);

    ctx.editor.dispatch(Intent::SelectNode { node_id: b.clone() });
    assert_eq!(ctx.editor.dispatch(Intent::DeleteKey), Outcome::Ignored);
    assert!(ctx.editor.graph().contains_node(&b));
    assert_eq!(ctx.editor.selection().selected_node_id(), Some(&b));

    let edge_id = ctx
        .editor
        .graph()
        .outgoing(&a)
        .next()
        .map(|edge| edge.id().clone())
        .expect("edge from a");
    ctx.editor.dispatch(Intent::SelectEdge {
        edge_id: edge_id.clone(),
    });
    assert_eq!(
        ctx.editor.dispatch(Intent::DeleteKey),
        Outcome::Disconnected {
            edge_id: edge_id.clone()
        }
    );
    assert!(!ctx.editor.graph().contains_edge(&edge_id));
    assert!(ctx.editor.selection().is_empty());
}

#[rstest]
fn delete_selected_node_cascades_and_clears(mut ctx: EditorCtx) {
    let (_, b, _) = abc(&mut ctx.editor);
    ctx.editor.dispatch(Intent::SelectNode { node_id: b.clone() });

    assert!(matches!(
        ctx.editor.dispatch(Intent::DeleteSelected),
        Outcome::NodeDeleted { removed_edges: 2, .. }
    ));
    assert!(ctx.editor.selection().is_empty());
    assert!(ctx.editor.graph().edges().is_empty());
}

#[rstest]
fn selection_of_cascaded_edge_is_cleared(mut ctx: EditorCtx) {
    let (a, b, _) = abc(&mut ctx.editor);
    let edge_id = ctx
        .editor
        .graph()
        .outgoing(&a)
        .next()
        .map(|edge| edge.id().clone())
        .expect("edge from a");
    ctx.editor.dispatch(Intent::SelectEdge { edge_id });

    ctx.editor.dispatch(Intent::DeleteNode { node_id: b });
    assert!(ctx.editor.selection().is_empty());
}

#[rstest]
fn outcomes_queue_skips_silent_results(mut ctx: EditorCtx) {
    let b = create(&mut ctx.editor, "B");
    ctx.editor.dispatch(Intent::SelectNode { node_id: b.clone() });
    ctx.editor.dispatch(Intent::DeleteNode {
        node_id: nid("42"),
    });
    connect(&mut ctx.editor, &b, &b);

    let messages: Vec<String> = ctx
        .editor
        .take_outcomes()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        messages,
        vec!["added step 2", "a step cannot connect to itself"]
    );
    assert!(ctx.editor.take_outcomes().is_empty());
}

#[rstest]
fn every_commit_is_persisted_in_order(mut ctx: EditorCtx) {
    abc(&mut ctx.editor);
    let writes = ctx.storage.writes();

    // The first write is the default flow stored on open.
    assert_eq!(writes.len() as u64, ctx.editor.store().revision() + 1);
    let edge_counts: Vec<usize> = writes.iter().map(|flow| flow.edges.len()).collect();
    assert_eq!(edge_counts, vec![0, 0, 0, 1, 2]);
    assert_eq!(writes.last().map(|flow| flow.next_node_id), Some(4));
}

#[rstest]
fn snapshots_are_unaffected_by_later_commits(mut ctx: EditorCtx) {
    let before = ctx.editor.snapshot();
    create(&mut ctx.editor, "B");

    assert_eq!(before.nodes().len(), 1);
    assert_eq!(ctx.editor.graph().nodes().len(), 2);
}

#[test]
fn storage_failure_is_reported_on_save() {
    let storage = MemoryStorage::default();
    let (mut editor, _) =
        FlowEditor::open(Box::new(DirectWrite::new(storage.clone())), &node_config())
            .expect("open editor");
    storage.set_failing(true);

    create(&mut editor, "B");
    connected(&mut editor, &nid("1"), &nid("2"));

    assert!(matches!(
        editor.dispatch(Intent::RequestSave),
        Outcome::SaveFailed { .. }
    ));
    assert_eq!(editor.save_state(), &SaveState::Editing);
    assert_eq!(editor.graph().edges().len(), 1);
}

#[test]
fn recovered_storage_lets_the_flow_save() {
    let storage = MemoryStorage::default();
    let (mut editor, _) =
        FlowEditor::open(Box::new(DirectWrite::new(storage.clone())), &node_config())
            .expect("open editor");

    storage.set_failing(true);
    let b = create(&mut editor, "B");
    storage.set_failing(false);
    editor.dispatch(Intent::DeleteNode { node_id: b });

    let latest = storage.latest().expect("flow written");
    assert_eq!(latest.nodes, editor.graph().nodes());
    assert_eq!(editor.dispatch(Intent::RequestSave), Outcome::Saved);
    assert_eq!(editor.save_state(), &SaveState::Saved);
}

#[test]
fn queued_writes_are_durable_after_save() {
    let storage = MemoryStorage::default();
    let queue = WriteQueue::new(storage.clone()).expect("writer");
    let (mut editor, _) = FlowEditor::open(Box::new(queue), &node_config()).expect("open editor");

    abc(&mut editor);
    assert_eq!(editor.dispatch(Intent::RequestSave), Outcome::Saved);

    let latest = storage.latest().expect("flow written");
    assert_eq!(latest.nodes, editor.graph().nodes());
    assert_eq!(latest.edges, editor.graph().edges());
    assert_eq!(latest.next_node_id, 4);
}

#[test]
fn repaired_flow_is_written_back_on_open() {
    let storage = MemoryStorage::seeded(LoadedFlow {
        next_node_id: Some(1),
        ..LoadedFlow::default()
    });
    let (editor, report) =
        FlowEditor::open(Box::new(DirectWrite::new(storage.clone())), &node_config())
            .expect("open editor");

    assert!(report.defaulted);
    assert_eq!(editor.store().next_node_id(), 2);
    assert_eq!(
        storage.latest().map(|flow| flow.next_node_id),
        Some(2)
    );
}

#[test]
fn valid_stored_flow_is_not_rewritten_on_open() {
    let stored = PersistedFlow {
        nodes: crate::model::fixtures::diamond().nodes().to_vec(),
        edges: crate::model::fixtures::diamond().edges().to_vec(),
        next_node_id: 5,
    };
    let storage = MemoryStorage::seeded(stored.into());
    let (editor, report) =
        FlowEditor::open(Box::new(DirectWrite::new(storage.clone())), &node_config())
            .expect("open editor");

    assert!(!report.changed());
    assert_eq!(editor.graph().edges().len(), 4);
    assert_eq!(storage.write_count(), 0);
}

#[test]
fn random_intent_sequences_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let storage = MemoryStorage::default();
    let (mut editor, _) =
        FlowEditor::open(Box::new(DirectWrite::new(storage.clone())), &node_config())
            .expect("open editor");
    let mut highest_id = 1_u64;

    for step in 0..600 {
        let ids: Vec<NodeId> = editor.graph().nodes().iter().map(|n| n.id().clone()).collect();
        let pick = |rng: &mut StdRng| ids[rng.gen_range(0..ids.len())].clone();

        let intent = match rng.gen_range(0..10) {
            0..=2 => Intent::CreateNode {
                message: format!("step {step}"),
            },
            3..=6 if !ids.is_empty() => {
                let handle = match rng.gen_range(0..3) {
                    0 => None,
                    1 => Some(hid("yes")),
                    _ => Some(hid("no")),
                };
                Intent::Connect(
                    ConnectionCandidate::new(pick(&mut rng), pick(&mut rng))
                        .with_source_handle(handle),
                )
            }
            7 if !ids.is_empty() => Intent::DeleteNode {
                node_id: pick(&mut rng),
            },
            8 => match editor.graph().edges().first() {
                Some(edge) => Intent::DisconnectEdge {
                    edge_id: edge.id().clone(),
                },
                None => Intent::RequestSave,
            },
            _ => Intent::RequestSave,
        };

        if let Outcome::NodeCreated { node_id } = editor.dispatch(intent) {
            let value = node_id.as_u64().expect("numeric id");
            assert!(value > highest_id, "allocator went backwards");
            highest_id = value;
        }
        assert_flow_invariants(editor.graph());
    }

    let latest = storage.latest().expect("flow written");
    assert_eq!(latest.nodes, editor.graph().nodes());
    assert_eq!(latest.edges, editor.graph().edges());
}
