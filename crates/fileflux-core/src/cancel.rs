//! Cooperative cancellation.

use crate::error::{FileFluxError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cheaply clonable cancellation flag shared across pipeline stages.
///
/// Stages check the token at page/sheet/chunk granularity and before every
/// suspension point (file reads, decoder calls, model calls). A cancelled
/// run returns [`FileFluxError::Cancelled`] instead of partial values.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Visible to all clones.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` when cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(FileFluxError::Cancelled)
        } else {
            Ok(())
        }
    }
}
