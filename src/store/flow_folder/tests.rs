// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::{FlowFolder, WriteDurability};
use crate::model::fixtures::diamond;
use crate::store::{FlowStorage, LoadedFlow, PersistedFlow, StoreError};

struct FlowFolderTestCtx {
    _tmp: TempDir,
    folder: FlowFolder,
}

impl FlowFolderTestCtx {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let folder = FlowFolder::new(tmp.path().join("flow"));
        Self { _tmp: tmp, folder }
    }
}

#[fixture]
fn ctx() -> FlowFolderTestCtx {
    FlowFolderTestCtx::new()
}

fn diamond_flow() -> PersistedFlow {
    let (nodes, edges) = diamond().into_parts();
    PersistedFlow {
        nodes,
        edges,
        next_node_id: 5,
    }
}

#[rstest]
fn load_from_missing_folder_yields_no_records(ctx: FlowFolderTestCtx) {
    assert_eq!(ctx.folder.load().unwrap(), LoadedFlow::default());
}

#[rstest]
#[case(WriteDurability::BestEffort)]
#[case(WriteDurability::Durable)]
fn save_then_load_returns_the_same_flow(
    ctx: FlowFolderTestCtx,
    #[case] durability: WriteDurability,
) {
    let folder = ctx.folder.clone().with_durability(durability);
    let flow = diamond_flow();

    folder.save(&flow).unwrap();

    assert_eq!(folder.load().unwrap(), LoadedFlow::from(flow));
}

#[rstest]
fn records_are_independent_files(ctx: FlowFolderTestCtx) {
    let folder = &ctx.folder;
    folder.save(&diamond_flow()).unwrap();
    std::fs::remove_file(folder.edges_path()).unwrap();

    let loaded = folder.load().unwrap();
    assert_eq!(loaded.nodes.map(|nodes| nodes.len()), Some(4));
    assert_eq!(loaded.edges, None);
    assert_eq!(loaded.next_node_id, Some(5));
}

#[rstest]
fn next_node_id_is_a_bare_json_number(ctx: FlowFolderTestCtx) {
    let folder = &ctx.folder;
    folder.save(&diamond_flow()).unwrap();

    let raw = std::fs::read_to_string(folder.next_node_id_path()).unwrap();
    assert_eq!(raw.trim(), "5");
}

#[rstest]
fn saved_nodes_carry_kind_tag(ctx: FlowFolderTestCtx) {
    let folder = &ctx.folder;
    folder.save(&diamond_flow()).unwrap();

    let raw = std::fs::read_to_string(folder.nodes_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["kind"], "message");
    assert_eq!(value[0]["id"], "1");
}

#[rstest]
fn save_leaves_no_temp_files_behind(ctx: FlowFolderTestCtx) {
    let folder = &ctx.folder;
    folder.save(&diamond_flow()).unwrap();
    folder.save(&diamond_flow()).unwrap();

    let mut names = std::fs::read_dir(folder.root())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, vec!["edges.json", "next-node-id.json", "nodes.json"]);
}

#[rstest]
fn corrupt_record_is_reported_with_its_path(ctx: FlowFolderTestCtx) {
    let folder = &ctx.folder;
    std::fs::create_dir_all(folder.root()).unwrap();
    std::fs::write(folder.edges_path(), "{ not json").unwrap();

    match folder.load().unwrap_err() {
        StoreError::Json { path, .. } => assert_eq!(path, folder.edges_path()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[cfg(unix)]
#[rstest]
fn save_refuses_to_write_through_symlink(ctx: FlowFolderTestCtx) {
    let folder = &ctx.folder;
    std::fs::create_dir_all(folder.root()).unwrap();
    let outside = folder.root().join("outside.json");
    std::fs::write(&outside, "[]").unwrap();
    std::os::unix::fs::symlink(&outside, folder.nodes_path()).unwrap();

    let err = folder.save(&diamond_flow()).unwrap_err();
    assert!(matches!(err, StoreError::SymlinkRefused { .. }));
    assert_eq!(std::fs::read_to_string(&outside).unwrap(), "[]");
}

#[rstest]
#[case(WriteDurability::BestEffort)]
#[case(WriteDurability::Durable)]
fn failed_save_removes_its_temp_file(
    ctx: FlowFolderTestCtx,
    #[case] durability: WriteDurability,
) {
    let folder = ctx.folder.clone().with_durability(durability);
    std::fs::create_dir_all(folder.nodes_path().join("blocker")).unwrap();

    folder.save(&diamond_flow()).unwrap_err();

    let names = std::fs::read_dir(folder.root())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["nodes.json"]);
}
