use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StreamError;

/// Tracks which batches currently hold a live connection.
///
/// INVARIANT:
/// - At most one lease per batch index at any time
///
/// Shared by every worker of a pipeline run.
#[derive(Clone, Default)]
pub struct LeaseRegistry {
    held: Arc<Mutex<HashSet<usize>>>,
}

impl LeaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the lease for `batch`, failing if it is already held.
    pub fn acquire(&self, batch: usize) -> Result<LeaseGuard, StreamError> {
        if !self.held.lock().insert(batch) {
            return Err(StreamError::LeaseHeld(batch));
        }

        Ok(LeaseGuard {
            batch,
            registry: self.clone(),
        })
    }

    pub fn is_held(&self, batch: usize) -> bool {
        self.held.lock().contains(&batch)
    }

    pub fn active(&self) -> usize {
        self.held.lock().len()
    }
}

/// Released on drop.
pub struct LeaseGuard {
    batch: usize,
    registry: LeaseRegistry,
}

impl LeaseGuard {
    pub fn batch(&self) -> usize {
        self.batch
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        self.registry.held.lock().remove(&self.batch);
    }
}
