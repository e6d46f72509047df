// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use super::{FlowStorage, LoadedFlow, PersistedFlow, PersistenceAdapter, StoreError};

#[derive(Debug, Default)]
struct WriteState {
    /// Newest flow not yet picked up by the worker. Older pending flows are replaced.
    pending: Option<PersistedFlow>,
    enqueued: u64,
    written: u64,
    last_error: Option<StoreError>,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct WriteInner {
    state: Mutex<WriteState>,
    cv: Condvar,
}

impl WriteInner {
    fn lock(&self) -> MutexGuard<'_, WriteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, WriteState>) -> MutexGuard<'a, WriteState> {
        self.cv.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }
}

/// Persists flows on a single background thread.
///
/// `persist` returns immediately. Every write is a whole flow, so a commit that arrives while an
/// earlier one is still waiting replaces it; storage only ever moves forward in commit order.
#[derive(Debug)]
pub struct WriteQueue<S: FlowStorage> {
    storage: Arc<S>,
    inner: Arc<WriteInner>,
    worker: Option<JoinHandle<()>>,
}

impl<S: FlowStorage> WriteQueue<S> {
    pub fn new(storage: S) -> Result<Self, StoreError> {
        let storage = Arc::new(storage);
        let inner = Arc::new(WriteInner::default());

        let worker = std::thread::Builder::new()
            .name("flowdeck-writer".to_owned())
            .spawn({
                let storage = storage.clone();
                let inner = inner.clone();
                move || run_worker(storage.as_ref(), &inner)
            })
            .map_err(|source| StoreError::WorkerSpawn { source })?;

        Ok(Self {
            storage,
            inner,
            worker: Some(worker),
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn run_worker<S: FlowStorage>(storage: &S, inner: &WriteInner) {
    loop {
        let (flow, seq) = {
            let mut state = inner.lock();
            loop {
                if let Some(flow) = state.pending.take() {
                    break (flow, state.enqueued);
                }
                if state.shutdown {
                    return;
                }
                state = inner.wait(state);
            }
        };

        let result = storage.save(&flow);

        let mut state = inner.lock();
        state.written = seq;
        match result {
            Ok(()) => {
                tracing::trace!(seq, nodes = flow.nodes.len(), edges = flow.edges.len(), "flow written");
                state.last_error = None;
            }
            Err(err) => {
                tracing::warn!(seq, error = %err, "flow write failed");
                state.last_error = Some(err);
            }
        }
        inner.cv.notify_all();
    }
}

impl<S: FlowStorage> PersistenceAdapter for WriteQueue<S> {
    fn load(&self) -> Result<LoadedFlow, StoreError> {
        self.storage.load()
    }

    fn persist(&self, flow: PersistedFlow) {
        let mut state = self.inner.lock();
        if state.pending.replace(flow).is_some() {
            tracing::trace!(seq = state.enqueued, "coalesced pending flow write");
        }
        state.enqueued = state.enqueued.saturating_add(1);
        self.inner.cv.notify_all();
    }

    fn flush(&self) -> Result<(), StoreError> {
        let mut state = self.inner.lock();
        while state.written < state.enqueued {
            state = self.inner.wait(state);
        }
        match state.last_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<S: FlowStorage> Drop for WriteQueue<S> {
    fn drop(&mut self) {
        {
            let mut state = self.inner.lock();
            state.shutdown = true;
            self.inner.cv.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("flow writer thread panicked");
            }
        }
    }
}
