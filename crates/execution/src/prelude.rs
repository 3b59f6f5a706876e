//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use remitlend_execution::prelude::*;
//! ```

// Config
pub use crate::config::{ConfigError, ServiceConfig};

// Confirmation
pub use crate::confirmation::{ConfirmationOutcome, Confirmer, SimulatedConfirmer};

// Errors
pub use crate::error::{ServiceError, ServiceResult};

// Lifecycle
pub use crate::lifecycle::{
    CollateralRegisteredData, DepositData, EventData, LifecycleEvent, LifecycleEventType,
    LifecycleTracker, LoanRequestedData, PaymentData, SessionActivity, WithdrawalData,
};

// Service
pub use crate::service::{
    LenderUpdate, LendingService, LoanReceipt, OperationStatus, PendingOperation, Session,
    WalletId,
};
