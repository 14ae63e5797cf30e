use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FastCGIConnectionID(pub u64);

/// Hands out process-unique connection ids, starting at 1.
#[derive(Debug)]
pub struct FastCGIConnectionIDFactory {
    next_connection_id: AtomicU64,
}

impl Default for FastCGIConnectionIDFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl FastCGIConnectionIDFactory {
    pub fn new() -> Self {
        Self {
            next_connection_id: AtomicU64::new(1),
        }
    }

    pub fn new_connection_id(&self) -> FastCGIConnectionID {
        FastCGIConnectionID(self.next_connection_id.fetch_add(1, Ordering::Relaxed))
    }
}
