//! Service error types.

use crate::service::WalletId;
use remitlend_domain::LendingError;
use remitlend_domain::entities::LoanId;
use remitlend_domain::enums::ActionKind;
use thiserror::Error;

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures surfaced by the lending service.
///
/// Any error leaves pool, positions and loans exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Accounting rule violated.
    #[error(transparent)]
    Lending(#[from] LendingError),

    /// Wallet has not connected.
    #[error("Wallet {0} is not connected")]
    UnknownSession(WalletId),

    /// Wallet holds no matching collateral token.
    #[error("Wallet {wallet} holds no collateral token #{token_id}")]
    MissingCollateral {
        /// Wallet that requested the loan.
        wallet: WalletId,
        /// Token the request referenced.
        token_id: u64,
    },

    /// Loan does not belong to the wallet.
    #[error("Loan {0} not found")]
    UnknownLoan(LoanId),

    /// Same action is already awaiting confirmation for this wallet.
    #[error("A {kind:?} operation is already pending")]
    OperationInFlight {
        /// Action that is pending.
        kind: ActionKind,
    },

    /// Settlement layer refused the operation.
    #[error("Operation rejected: {reason}")]
    ConfirmationRejected {
        /// Reason given by the confirmer.
        reason: String,
    },
}
