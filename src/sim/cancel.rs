//! Supersession of solve requests.
//!
//! A [`SolveGate`] hands out [`CancelToken`]s stamped with a generation
//! number. Issuing a newer token, or calling [`SolveGate::cancel`], moves the
//! gate forward and cancels every token issued before.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{EngineError, Result};

#[derive(Debug, Default)]
pub struct SolveGate {
    generation: AtomicU64,
}

impl SolveGate {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
        }
    }

    /// Issues a token for a new request, cancelling all earlier ones.
    pub fn issue(gate: &Arc<Self>) -> CancelToken {
        let generation = gate.generation.fetch_add(1, Ordering::SeqCst) + 1;
        CancelToken {
            gate: Arc::clone(gate),
            generation,
        }
    }

    /// Cancels every outstanding token.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Cooperative cancellation flag checked by long-running engine calls.
#[derive(Debug, Clone)]
pub struct CancelToken {
    gate: Arc<SolveGate>,
    generation: u64,
}

impl CancelToken {
    /// Token on a private gate; only cancelled through [`CancelToken::gate`].
    pub fn never() -> Self {
        SolveGate::issue(&Arc::new(SolveGate::new()))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn gate(&self) -> &Arc<SolveGate> {
        &self.gate
    }

    pub fn is_cancelled(&self) -> bool {
        self.gate.generation() != self.generation
    }

    /// Fails with [`EngineError::ComputationCancelled`] once superseded.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(EngineError::ComputationCancelled)
        } else {
            Ok(())
        }
    }
}
