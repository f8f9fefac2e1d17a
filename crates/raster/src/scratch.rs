//! Scratch store for transient rasters.
//!
//! Intermediate datasets (band subsets, warped outputs) live here under
//! unique names. Every entry is owned by a [`ScratchHandle`]; dropping the
//! handle removes the entry, so entries never outlive the call that made them
//! and two calls never see each other's data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use uuid::Uuid;

use crate::dataset::Dataset;
use crate::error::{RasterError, Result};

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<String, Arc<Dataset>>>,
    allocations: AtomicU64,
    releases: AtomicU64,
}

/// Named storage for transient datasets. Cloning shares the same store.
#[derive(Clone, Default)]
pub struct ScratchStore {
    inner: Arc<Inner>,
}

/// Counters describing store usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScratchStats {
    pub allocations: u64,
    pub releases: u64,
    pub live: usize,
}

impl ScratchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<Dataset>>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a dataset under a fresh name and return the handle that owns it.
    pub fn allocate(&self, prefix: &str, dataset: Dataset) -> ScratchHandle {
        let name = format!("/scratch/{}_{}", prefix, Uuid::new_v4().simple());
        self.entries().insert(name.clone(), Arc::new(dataset));
        self.inner.allocations.fetch_add(1, Ordering::Relaxed);
        debug!(name = %name, "Allocated scratch dataset");

        ScratchHandle {
            name,
            store: self.clone(),
            released: false,
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Dataset>> {
        self.entries().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ScratchStats {
        ScratchStats {
            allocations: self.inner.allocations.load(Ordering::Relaxed),
            releases: self.inner.releases.load(Ordering::Relaxed),
            live: self.len(),
        }
    }

    fn remove(&self, name: &str) -> bool {
        let removed = self.entries().remove(name).is_some();
        if removed {
            self.inner.releases.fetch_add(1, Ordering::Relaxed);
            debug!(name = %name, "Released scratch dataset");
        }
        removed
    }
}

impl std::fmt::Debug for ScratchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchStore")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Owner of one scratch entry. The entry is removed on drop.
#[derive(Debug)]
pub struct ScratchHandle {
    name: String,
    store: ScratchStore,
    released: bool,
}

impl ScratchHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stored dataset, while the entry is alive.
    pub fn dataset(&self) -> Result<Arc<Dataset>> {
        self.store
            .get(&self.name)
            .ok_or_else(|| RasterError::ScratchNotFound(self.name.clone()))
    }

    /// Release the entry now instead of at end of scope.
    pub fn release(mut self) {
        self.release_entry();
    }

    fn release_entry(&mut self) {
        if !self.released {
            self.store.remove(&self.name);
            self.released = true;
        }
    }
}

impl Drop for ScratchHandle {
    fn drop(&mut self) {
        self.release_entry();
    }
}
