// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Durable storage for flows.
//!
//! A flow is persisted as three independent records (`nodes`, `edges`, `next_node_id`).
//! [`FlowStorage`] reads and writes them synchronously; a [`PersistenceAdapter`] sits between the
//! graph store and the storage and decides when the write actually happens.

use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::model::{Edge, Node};

pub mod flow_folder;
pub mod memory;
pub mod write_queue;

pub use flow_folder::{FlowFolder, WriteDurability};
pub use memory::MemoryStorage;
pub use write_queue::WriteQueue;

/// Everything written after a commit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistedFlow {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub next_node_id: u64,
}

/// The records found at startup. Each one may be missing independently.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedFlow {
    pub nodes: Option<Vec<Node>>,
    pub edges: Option<Vec<Edge>>,
    pub next_node_id: Option<u64>,
}

impl From<PersistedFlow> for LoadedFlow {
    fn from(flow: PersistedFlow) -> Self {
        Self {
            nodes: Some(flow.nodes),
            edges: Some(flow.edges),
            next_node_id: Some(flow.next_node_id),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("refusing to write through symlink at {path:?}")]
    SymlinkRefused { path: PathBuf },
    #[error("cannot start the flow writer thread: {source}")]
    WorkerSpawn { source: io::Error },
    #[error("storage unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Synchronous key/value access to the three flow records.
pub trait FlowStorage: Send + Sync + 'static {
    fn load(&self) -> Result<LoadedFlow, StoreError>;
    fn save(&self, flow: &PersistedFlow) -> Result<(), StoreError>;
}

/// What the graph store talks to after every commit.
///
/// `persist` never blocks on storage errors; they are logged, and `flush` hands one back when the
/// newest write failed. Writes issued by one adapter are applied in commit order.
pub trait PersistenceAdapter: Send {
    fn load(&self) -> Result<LoadedFlow, StoreError>;
    fn persist(&self, flow: PersistedFlow);
    /// Blocks until every persisted flow has reached storage.
    fn flush(&self) -> Result<(), StoreError>;
}

/// Writes on the caller's thread before `persist` returns.
#[derive(Debug)]
pub struct DirectWrite<S> {
    storage: S,
    last_error: Mutex<Option<StoreError>>,
}

impl<S: FlowStorage> DirectWrite<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            last_error: Mutex::new(None),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S: FlowStorage> PersistenceAdapter for DirectWrite<S> {
    fn load(&self) -> Result<LoadedFlow, StoreError> {
        self.storage.load()
    }

    fn persist(&self, flow: PersistedFlow) {
        let result = self.storage.save(&flow);
        let mut last_error = self.last_error.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(()) => {
                tracing::trace!(nodes = flow.nodes.len(), edges = flow.edges.len(), "flow written");
                // A full write supersedes earlier failures.
                *last_error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "flow write failed");
                *last_error = Some(err);
            }
        }
    }

    fn flush(&self) -> Result<(), StoreError> {
        match self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
