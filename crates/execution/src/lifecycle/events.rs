//! Lifecycle events for wallet activity.

use crate::service::WalletId;
use remitlend_domain::entities::LoanId;
use remitlend_domain::value_objects::{Money, Percent};
use serde::Serialize;
use uuid::Uuid;

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleEventType {
    /// Collateral token was registered for the wallet.
    CollateralRegistered,
    /// Liquidity was deposited into the pool.
    Deposited,
    /// Liquidity was withdrawn from the pool.
    Withdrawn,
    /// A loan was issued.
    LoanRequested,
    /// A loan payment was applied.
    PaymentMade,
}

/// A confirmed change to a wallet's state.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    /// Event ID.
    pub id: Uuid,
    /// Operation that produced the event, if any.
    pub operation_id: Option<Uuid>,
    /// Event type.
    pub event_type: LifecycleEventType,
    /// Wallet the event belongs to.
    pub wallet: WalletId,
    /// Timestamp.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl LifecycleEvent {
    /// Creates a new lifecycle event.
    pub fn new(wallet: WalletId, data: EventData) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation_id: None,
            event_type: data.event_type(),
            wallet,
            timestamp: chrono::Utc::now(),
            data,
        }
    }

    /// Links the event to the operation that produced it.
    #[must_use]
    pub fn with_operation(mut self, operation_id: Uuid) -> Self {
        self.operation_id = Some(operation_id);
        self
    }
}

/// Event-specific data.
#[derive(Debug, Clone, Serialize)]
pub enum EventData {
    /// Collateral registered data.
    CollateralRegistered(CollateralRegisteredData),
    /// Deposit data.
    Deposited(DepositData),
    /// Withdrawal data.
    Withdrawn(WithdrawalData),
    /// Loan issued data.
    LoanRequested(LoanRequestedData),
    /// Payment data.
    PaymentMade(PaymentData),
}

impl EventData {
    /// The event type this payload belongs to.
    pub fn event_type(&self) -> LifecycleEventType {
        match self {
            Self::CollateralRegistered(_) => LifecycleEventType::CollateralRegistered,
            Self::Deposited(_) => LifecycleEventType::Deposited,
            Self::Withdrawn(_) => LifecycleEventType::Withdrawn,
            Self::LoanRequested(_) => LifecycleEventType::LoanRequested,
            Self::PaymentMade(_) => LifecycleEventType::PaymentMade,
        }
    }
}

/// Data for collateral registered event.
#[derive(Debug, Clone, Serialize)]
pub struct CollateralRegisteredData {
    /// Collateral token ID.
    pub token_id: u64,
    /// Reliability score on the token.
    pub reliability_score: u8,
    /// Whether the token is staked.
    pub staked: bool,
}

/// Data for deposit event.
#[derive(Debug, Clone, Serialize)]
pub struct DepositData {
    /// Amount deposited.
    pub amount: Money,
    /// Principal after the deposit.
    pub principal_after: Money,
    /// Pool share after the deposit.
    pub share_after: Percent,
    /// Pool TVL after the deposit.
    pub pool_tvl_after: Money,
}

/// Data for withdrawal event.
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalData {
    /// Amount withdrawn.
    pub amount: Money,
    /// Interest realized by the withdrawal.
    pub interest_realized: Money,
    /// Total value left in the position.
    pub total_value_after: Money,
    /// Pool TVL after the withdrawal.
    pub pool_tvl_after: Money,
}

/// Data for loan issued event.
#[derive(Debug, Clone, Serialize)]
pub struct LoanRequestedData {
    /// Loan ID.
    pub loan_id: LoanId,
    /// Collateral token backing the loan.
    pub collateral_token_id: u64,
    /// Principal.
    pub amount: Money,
    /// Monthly payment.
    pub monthly_payment: Money,
    /// Number of scheduled payments.
    pub total_payments: u32,
}

/// Data for payment event.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentData {
    /// Loan ID.
    pub loan_id: LoanId,
    /// Amount paid.
    pub amount: Money,
    /// Outstanding balance after the payment.
    pub balance_after: Money,
    /// Payments made so far.
    pub payments_made: u32,
}
