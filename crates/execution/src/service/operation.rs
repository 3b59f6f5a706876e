//! Pending operations and the single-in-flight rule.

use super::WalletId;
use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use remitlend_domain::enums::ActionKind;
use remitlend_domain::value_objects::Money;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Status of a submitted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationStatus {
    /// Awaiting confirmation.
    Pending,
    /// Confirmed and applied.
    Confirmed,
    /// Refused by the confirmer or by validation at commit time.
    Rejected,
}

/// A user action between submission and settlement.
#[derive(Debug, Clone, Serialize)]
pub struct PendingOperation {
    /// Operation ID.
    pub id: Uuid,
    /// Wallet that submitted it.
    pub wallet: WalletId,
    /// Action kind.
    pub kind: ActionKind,
    /// Amount involved.
    pub amount: Money,
    /// Current status.
    pub status: OperationStatus,
    /// When it was submitted.
    pub submitted_at: DateTime<Utc>,
    /// When it was confirmed or rejected.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PendingOperation {
    /// Creates a new pending operation.
    pub fn new(wallet: WalletId, kind: ActionKind, amount: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet,
            kind,
            amount,
            status: OperationStatus::Pending,
            submitted_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Marks the operation resolved.
    pub fn resolve(&mut self, status: OperationStatus) {
        self.status = status;
        self.resolved_at = Some(Utc::now());
    }
}

type InFlightKey = (WalletId, ActionKind);

/// Set of (wallet, action) pairs currently awaiting confirmation.
#[derive(Debug, Clone, Default)]
pub(crate) struct InFlight {
    keys: Arc<Mutex<HashSet<InFlightKey>>>,
}

impl InFlight {
    /// Claims the slot for `wallet` and `kind`, released when the guard drops.
    pub(crate) fn acquire(&self, wallet: &WalletId, kind: ActionKind) -> ServiceResult<InFlightGuard> {
        let key = (wallet.clone(), kind);
        if !self.lock().insert(key.clone()) {
            return Err(ServiceError::OperationInFlight { kind });
        }
        Ok(InFlightGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<InFlightKey>> {
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases an in-flight slot on drop.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    keys: Arc<Mutex<HashSet<InFlightKey>>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.key);
    }
}
