// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{FlowStorage, LoadedFlow, PersistedFlow, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    initial: LoadedFlow,
    latest: Option<PersistedFlow>,
    write_count: usize,
    /// Every write in order; `None` unless built with [`MemoryStorage::recording`].
    history: Option<Vec<PersistedFlow>>,
    failing: bool,
}

/// In-process storage holding the latest flow. Clones share the same records.
///
/// Backs `--demo` runs. Tests that need to observe write ordering use
/// [`MemoryStorage::recording`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStorage {
    /// Storage whose first `load` returns `initial`.
    pub fn seeded(initial: LoadedFlow) -> Self {
        let storage = Self::default();
        storage.lock().initial = initial;
        storage
    }

    /// Storage that also keeps a copy of every write.
    pub fn recording() -> Self {
        let storage = Self::default();
        storage.lock().history = Some(Vec::new());
        storage
    }

    /// Makes every following `save` fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().write_count
    }

    /// All writes in order. Empty unless this storage is recording.
    pub fn writes(&self) -> Vec<PersistedFlow> {
        self.lock().history.clone().unwrap_or_default()
    }

    pub fn latest(&self) -> Option<PersistedFlow> {
        self.lock().latest.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FlowStorage for MemoryStorage {
    fn load(&self) -> Result<LoadedFlow, StoreError> {
        let state = self.lock();
        Ok(match &state.latest {
            Some(latest) => LoadedFlow::from(latest.clone()),
            None => state.initial.clone(),
        })
    }

    fn save(&self, flow: &PersistedFlow) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.failing {
            return Err(StoreError::Unavailable {
                reason: "memory storage is set to fail".to_owned(),
            });
        }
        if let Some(history) = state.history.as_mut() {
            history.push(flow.clone());
        }
        state.latest = Some(flow.clone());
        state.write_count += 1;
        Ok(())
    }
}
