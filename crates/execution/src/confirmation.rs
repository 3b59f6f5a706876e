//! Confirmation of submitted operations.
//!
//! Every user action is recorded as pending and handed to a [`Confirmer`]
//! before it is applied. The simulated confirmer stands in for a real
//! settlement layer by waiting a fixed delay and confirming.

use crate::service::PendingOperation;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Result of asking the settlement layer to confirm an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Operation may be applied.
    Confirmed,
    /// Operation was refused.
    Rejected(String),
}

/// Confirms pending operations.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Waits for the operation to be confirmed or rejected.
    ///
    /// There is no cancellation: once called, the confirmer runs to an outcome.
    async fn confirm(&self, operation: &PendingOperation) -> ConfirmationOutcome;
}

/// Confirms everything after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedConfirmer {
    delay: Duration,
}

impl SimulatedConfirmer {
    /// Creates a confirmer that waits `delay` per operation.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// A confirmer that confirms immediately.
    #[must_use]
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl Confirmer for SimulatedConfirmer {
    async fn confirm(&self, operation: &PendingOperation) -> ConfirmationOutcome {
        debug!(
            operation = %operation.id,
            kind = ?operation.kind,
            delay_ms = self.delay.as_millis() as u64,
            "Awaiting simulated confirmation"
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        ConfirmationOutcome::Confirmed
    }
}
