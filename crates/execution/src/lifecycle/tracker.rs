//! Lifecycle tracker for wallet history.

use super::{EventData, LifecycleEvent};
use crate::service::WalletId;
use remitlend_domain::value_objects::Money;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Running totals of a wallet's confirmed activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionActivity {
    /// Number of deposits.
    pub deposits: u32,
    /// Number of withdrawals.
    pub withdrawals: u32,
    /// Number of loans issued.
    pub loans_requested: u32,
    /// Number of loan payments.
    pub payments: u32,
    /// Total deposited.
    pub total_deposited: Money,
    /// Total withdrawn.
    pub total_withdrawn: Money,
    /// Total borrowed.
    pub total_borrowed: Money,
    /// Total repaid.
    pub total_repaid: Money,
}

/// Tracks lifecycle events for all wallets.
///
/// Events and activity accumulate in memory for as long as the tracker lives.
pub struct LifecycleTracker {
    /// Events by wallet.
    events: Arc<RwLock<HashMap<WalletId, Vec<LifecycleEvent>>>>,
    /// Activity summaries by wallet.
    activity: Arc<RwLock<HashMap<WalletId, SessionActivity>>>,
}

impl LifecycleTracker {
    /// Creates a new lifecycle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(HashMap::new())),
            activity: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Records a confirmed change to a wallet, linked to its operation when
    /// one produced it.
    ///
    /// History is kept for the life of the tracker and is never pruned.
    pub async fn record(&self, wallet: &WalletId, operation_id: Option<Uuid>, data: EventData) {
        match &data {
            EventData::CollateralRegistered(data) => {
                info!(
                    wallet = %wallet,
                    token_id = data.token_id,
                    score = data.reliability_score,
                    staked = data.staked,
                    "Collateral registered"
                );
            }
            EventData::Deposited(data) => {
                self.update_activity(wallet, |activity| {
                    activity.deposits += 1;
                    activity.total_deposited = activity.total_deposited + data.amount;
                })
                .await;
                info!(
                    wallet = %wallet,
                    amount = %data.amount,
                    principal = %data.principal_after,
                    share = %data.share_after,
                    "Deposit confirmed"
                );
            }
            EventData::Withdrawn(data) => {
                self.update_activity(wallet, |activity| {
                    activity.withdrawals += 1;
                    activity.total_withdrawn = activity.total_withdrawn + data.amount;
                })
                .await;
                info!(
                    wallet = %wallet,
                    amount = %data.amount,
                    interest_realized = %data.interest_realized,
                    remaining = %data.total_value_after,
                    "Withdrawal confirmed"
                );
            }
            EventData::LoanRequested(data) => {
                self.update_activity(wallet, |activity| {
                    activity.loans_requested += 1;
                    activity.total_borrowed = activity.total_borrowed + data.amount;
                })
                .await;
                info!(
                    wallet = %wallet,
                    loan = %data.loan_id,
                    amount = %data.amount,
                    monthly_payment = %data.monthly_payment,
                    payments = data.total_payments,
                    "Loan issued"
                );
            }
            EventData::PaymentMade(data) => {
                self.update_activity(wallet, |activity| {
                    activity.payments += 1;
                    activity.total_repaid = activity.total_repaid + data.amount;
                })
                .await;
                info!(
                    wallet = %wallet,
                    loan = %data.loan_id,
                    amount = %data.amount,
                    balance = %data.balance_after,
                    payments_made = data.payments_made,
                    "Loan payment applied"
                );
            }
        }

        let mut event = LifecycleEvent::new(wallet.clone(), data);
        if let Some(operation_id) = operation_id {
            event = event.with_operation(operation_id);
        }
        self.add_event(wallet, event).await;
    }

    /// Applies `update` to the wallet's activity summary, creating it if needed.
    async fn update_activity<F>(&self, wallet: &WalletId, update: F)
    where
        F: FnOnce(&mut SessionActivity),
    {
        let mut activity = self.activity.write().await;
        update(activity.entry(wallet.clone()).or_default());
    }

    /// Adds an event to the tracker.
    async fn add_event(&self, wallet: &WalletId, event: LifecycleEvent) {
        let mut events = self.events.write().await;
        events.entry(wallet.clone()).or_default().push(event);
    }

    /// Gets all events for a wallet, oldest first.
    pub async fn get_events(&self, wallet: &WalletId) -> Vec<LifecycleEvent> {
        self.events
            .read()
            .await
            .get(wallet)
            .cloned()
            .unwrap_or_default()
    }

    /// Gets the activity summary for a wallet.
    pub async fn get_activity(&self, wallet: &WalletId) -> SessionActivity {
        self.activity
            .read()
            .await
            .get(wallet)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for LifecycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{
        CollateralRegisteredData, DepositData, LifecycleEventType, PaymentData,
    };
    use remitlend_domain::entities::LoanId;
    use remitlend_domain::value_objects::Percent;
    use rust_decimal_macros::dec;

    fn deposit(amount: Money, principal_after: Money) -> EventData {
        EventData::Deposited(DepositData {
            amount,
            principal_after,
            share_after: Percent(dec!(0.8)),
            pool_tvl_after: Money::new(dec!(1260000)).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_lifecycle_tracker() {
        let tracker = LifecycleTracker::new();
        let wallet = WalletId::new("0x73bfaa91");
        let amount = Money::new(dec!(10000)).unwrap();

        tracker
            .record(&wallet, Some(Uuid::new_v4()), deposit(amount, amount))
            .await;
        tracker
            .record(
                &wallet,
                Some(Uuid::new_v4()),
                deposit(amount, Money::new(dec!(20000)).unwrap()),
            )
            .await;

        let events = tracker.get_events(&wallet).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, LifecycleEventType::Deposited);
        assert!(events.iter().all(|e| e.operation_id.is_some()));

        let activity = tracker.get_activity(&wallet).await;
        assert_eq!(activity.deposits, 2);
        assert_eq!(activity.total_deposited.value(), dec!(20000));
        assert_eq!(activity.withdrawals, 0);
    }

    #[tokio::test]
    async fn test_collateral_event_leaves_activity_untouched() {
        let tracker = LifecycleTracker::new();
        let wallet = WalletId::new("0x73bfaa91");

        tracker
            .record(
                &wallet,
                None,
                EventData::CollateralRegistered(CollateralRegisteredData {
                    token_id: 7284,
                    reliability_score: 90,
                    staked: true,
                }),
            )
            .await;
        tracker
            .record(
                &wallet,
                Some(Uuid::new_v4()),
                EventData::PaymentMade(PaymentData {
                    loan_id: LoanId(1000),
                    amount: Money::new(dec!(800)).unwrap(),
                    balance_after: Money::new(dec!(9287.50)).unwrap(),
                    payments_made: 1,
                }),
            )
            .await;

        let events = tracker.get_events(&wallet).await;
        assert_eq!(events.len(), 2);
        assert!(events[0].operation_id.is_none());
        assert_eq!(events[1].event_type, LifecycleEventType::PaymentMade);

        let activity = tracker.get_activity(&wallet).await;
        assert_eq!(activity.payments, 1);
        assert_eq!(activity.total_repaid.value(), dec!(800));
        assert_eq!(activity.deposits, 0);
    }
}
