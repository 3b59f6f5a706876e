//! Lending service.
//!
//! Owns the shared pool and every connected wallet's session. All mutation
//! goes through the operations here: each is validated, submitted as a
//! pending operation, confirmed, re-validated against the state current at
//! commit time and only then applied to pool and session together.

mod operation;
mod session;

pub use operation::{OperationStatus, PendingOperation};
pub use session::{Session, WalletId};

use crate::config::ServiceConfig;
use crate::confirmation::{ConfirmationOutcome, Confirmer, SimulatedConfirmer};
use crate::error::{ServiceError, ServiceResult};
use crate::lifecycle::{
    CollateralRegisteredData, DepositData, EventData, LifecycleEvent, LifecycleTracker,
    LoanRequestedData, PaymentData, SessionActivity, WithdrawalData,
};
use chrono::Utc;
use operation::InFlight;
use remitlend_domain::entities::{CollateralToken, LenderPosition, Loan, LoanId, PoolState};
use remitlend_domain::enums::ActionKind;
use remitlend_domain::math::amortization::{self, LoanAggregate, LoanRequest};
use remitlend_domain::math::{pool_ledger, position_accountant};
use remitlend_domain::metrics::{PortfolioSlice, portfolio};
use remitlend_domain::value_objects::{Money, Percent};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// First identifier handed out to a new loan.
const FIRST_LOAN_ID: u64 = 1000;

/// Pool and position after a deposit or withdrawal.
#[derive(Debug, Clone, Serialize)]
pub struct LenderUpdate {
    /// Operation that produced the update.
    pub operation_id: Uuid,
    /// Pool after the update.
    pub pool: PoolState,
    /// Lender position after the update.
    pub position: LenderPosition,
}

/// Loan after it was issued or paid.
#[derive(Debug, Clone, Serialize)]
pub struct LoanReceipt {
    /// Operation that produced the receipt.
    pub operation_id: Uuid,
    /// Loan after the operation.
    pub loan: Loan,
}

/// Shared state replaced as a unit on commit.
#[derive(Debug, Clone)]
struct Ledger {
    pool: PoolState,
    /// Identifier the next issued loan receives.
    next_loan_id: u64,
}

impl Ledger {
    fn with_pool(&self, pool: PoolState) -> Self {
        Self {
            pool,
            next_loan_id: self.next_loan_id,
        }
    }
}

/// What a validated operation commits.
struct Plan<T> {
    ledger: Ledger,
    session: Session,
    event: EventData,
    value: T,
}

/// Lending service for a single in-memory dashboard.
///
/// Submitted operations and lifecycle events are retained for the life of
/// the service; nothing is pruned.
pub struct LendingService {
    /// Configuration.
    config: ServiceConfig,
    /// Pool and loan counter.
    ledger: Arc<RwLock<Ledger>>,
    /// Sessions by wallet.
    sessions: Arc<RwLock<HashMap<WalletId, Session>>>,
    /// Every submitted operation by id.
    operations: Arc<RwLock<HashMap<Uuid, PendingOperation>>>,
    /// Actions awaiting confirmation.
    in_flight: InFlight,
    /// Event history.
    lifecycle: LifecycleTracker,
    /// Settlement layer.
    confirmer: Arc<dyn Confirmer>,
}

impl LendingService {
    /// Creates a new service around an existing pool.
    pub fn new(config: ServiceConfig, pool: PoolState, confirmer: Arc<dyn Confirmer>) -> Self {
        Self {
            config,
            ledger: Arc::new(RwLock::new(Ledger {
                pool,
                next_loan_id: FIRST_LOAN_ID,
            })),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            operations: Arc::new(RwLock::new(HashMap::new())),
            in_flight: InFlight::default(),
            lifecycle: LifecycleTracker::new(),
            confirmer,
        }
    }

    /// Creates a service that confirms after the configured delay.
    pub fn simulated(config: ServiceConfig, pool: PoolState) -> Self {
        let confirmer = Arc::new(SimulatedConfirmer::new(config.confirmation_delay()));
        Self::new(config, pool, confirmer)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Connects a wallet with an empty lender position.
    ///
    /// Reconnecting an already connected wallet keeps its session.
    pub async fn connect(&self, wallet: WalletId) -> Session {
        self.connect_with_position(wallet, LenderPosition::empty())
            .await
    }

    /// Connects a wallet that already holds a lender position.
    pub async fn connect_with_position(
        &self,
        wallet: WalletId,
        position: LenderPosition,
    ) -> Session {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(wallet.clone())
            .or_insert_with(|| {
                info!(wallet = %wallet, "Wallet connected");
                Session::with_position(position)
            });
        session.clone()
    }

    /// Stores the collateral token minted by the verification flow.
    pub async fn register_collateral(
        &self,
        wallet: &WalletId,
        collateral: CollateralToken,
    ) -> ServiceResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(wallet)
            .ok_or_else(|| ServiceError::UnknownSession(wallet.clone()))?;
        let data = CollateralRegisteredData {
            token_id: collateral.token_id,
            reliability_score: collateral.reliability_score,
            staked: collateral.staked,
        };
        session.collateral = Some(collateral);

        self.lifecycle
            .record(wallet, None, EventData::CollateralRegistered(data))
            .await;
        Ok(())
    }

    /// Deposits into the pool.
    pub async fn deposit(&self, wallet: &WalletId, amount: Money) -> ServiceResult<LenderUpdate> {
        let (operation_id, (pool, position)) = self
            .execute(wallet, ActionKind::Deposit, amount, |ledger, session| {
                let position = position_accountant::deposit(&session.position, &ledger.pool, amount)?;
                let next_pool = pool_ledger::apply_deposit(&ledger.pool, amount)?;
                let event = EventData::Deposited(DepositData {
                    amount,
                    principal_after: position.principal(),
                    share_after: position.share_percentage(),
                    pool_tvl_after: next_pool.total_value_locked(),
                });
                Ok(Plan {
                    ledger: ledger.with_pool(next_pool.clone()),
                    session: Session {
                        position: position.clone(),
                        ..session.clone()
                    },
                    event,
                    value: (next_pool, position),
                })
            })
            .await?;

        Ok(LenderUpdate {
            operation_id,
            pool,
            position,
        })
    }

    /// Withdraws from the pool.
    ///
    /// The lender may withdraw up to their total value. When liquidity is
    /// enforced the pool's idle liquidity must also cover the amount.
    pub async fn withdraw(&self, wallet: &WalletId, amount: Money) -> ServiceResult<LenderUpdate> {
        let enforce_liquidity = self.config.enforce_liquidity;
        let ratio = self.config.interest_redemption_ratio;

        let (operation_id, (pool, position)) = self
            .execute(wallet, ActionKind::Withdraw, amount, |ledger, session| {
                let position = position_accountant::withdraw_with_ratio(
                    &session.position,
                    &ledger.pool,
                    amount,
                    ratio,
                )?;
                if enforce_liquidity {
                    pool_ledger::ensure_liquidity(&ledger.pool, amount)?;
                }
                let next_pool = pool_ledger::apply_withdraw(&ledger.pool, amount)?;
                let event = EventData::Withdrawn(WithdrawalData {
                    amount,
                    interest_realized: session
                        .position
                        .earned_interest()
                        .saturating_sub(position.earned_interest()),
                    total_value_after: position.total_value(),
                    pool_tvl_after: next_pool.total_value_locked(),
                });
                Ok(Plan {
                    ledger: ledger.with_pool(next_pool.clone()),
                    session: Session {
                        position: position.clone(),
                        ..session.clone()
                    },
                    event,
                    value: (next_pool, position),
                })
            })
            .await?;

        Ok(LenderUpdate {
            operation_id,
            pool,
            position,
        })
    }

    /// Requests a loan against the wallet's collateral token.
    ///
    /// New loans go to the front of the wallet's loan list. The loan id is
    /// taken only when the loan is committed, so refused requests leave no
    /// gap in the sequence.
    pub async fn request_loan(
        &self,
        wallet: &WalletId,
        collateral_token_id: u64,
        request: LoanRequest,
    ) -> ServiceResult<LoanReceipt> {
        let policy = self.config.loan_policy.clone();
        let now = Utc::now();

        let (operation_id, loan) = self
            .execute(
                wallet,
                ActionKind::RequestLoan,
                request.amount,
                |ledger, session| {
                    let collateral = session
                        .collateral
                        .as_ref()
                        .filter(|token| token.token_id == collateral_token_id)
                        .ok_or_else(|| ServiceError::MissingCollateral {
                            wallet: wallet.clone(),
                            token_id: collateral_token_id,
                        })?;
                    let loan_id = LoanId(ledger.next_loan_id);
                    let loan = amortization::request_loan(collateral, &request, &policy, loan_id, now)?;

                    let mut next_session = session.clone();
                    next_session.loans.insert(0, loan.clone());
                    Ok(Plan {
                        ledger: Ledger {
                            pool: ledger.pool.clone(),
                            next_loan_id: ledger.next_loan_id + 1,
                        },
                        session: next_session,
                        event: EventData::LoanRequested(LoanRequestedData {
                            loan_id,
                            collateral_token_id: loan.collateral_token_id,
                            amount: loan.principal,
                            monthly_payment: loan.monthly_payment,
                            total_payments: loan.total_payments,
                        }),
                        value: loan,
                    })
                },
            )
            .await?;

        Ok(LoanReceipt { operation_id, loan })
    }

    /// Applies a payment to one of the wallet's loans.
    pub async fn make_payment(
        &self,
        wallet: &WalletId,
        loan_id: LoanId,
        amount: Money,
    ) -> ServiceResult<LoanReceipt> {
        let policy = self.config.loan_policy.clone();

        let (operation_id, loan) = self
            .execute(wallet, ActionKind::MakePayment, amount, |ledger, session| {
                let index = session
                    .loans
                    .iter()
                    .position(|loan| loan.id == loan_id)
                    .ok_or(ServiceError::UnknownLoan(loan_id))?;
                let loan = amortization::apply_payment(&session.loans[index], amount, &policy)?;

                let mut next_session = session.clone();
                next_session.loans[index] = loan.clone();
                Ok(Plan {
                    ledger: ledger.clone(),
                    session: next_session,
                    event: EventData::PaymentMade(PaymentData {
                        loan_id,
                        amount,
                        balance_after: loan.balance,
                        payments_made: loan.payments_made,
                    }),
                    value: loan,
                })
            })
            .await?;

        Ok(LoanReceipt { operation_id, loan })
    }

    /// Current pool snapshot.
    pub async fn pool(&self) -> PoolState {
        self.ledger.read().await.pool.clone()
    }

    /// Current pool utilization.
    pub async fn utilization(&self) -> Percent {
        pool_ledger::utilization(&self.ledger.read().await.pool)
    }

    /// Current session snapshot for a wallet.
    pub async fn session(&self, wallet: &WalletId) -> ServiceResult<Session> {
        self.sessions
            .read()
            .await
            .get(wallet)
            .cloned()
            .ok_or_else(|| ServiceError::UnknownSession(wallet.clone()))
    }

    /// Current lender position for a wallet.
    pub async fn position(&self, wallet: &WalletId) -> ServiceResult<LenderPosition> {
        Ok(self.session(wallet).await?.position)
    }

    /// Principal and interest breakdown of a wallet's position.
    pub async fn portfolio(&self, wallet: &WalletId) -> ServiceResult<[PortfolioSlice; 2]> {
        Ok(portfolio::split(&self.session(wallet).await?.position))
    }

    /// Loans for a wallet, newest first.
    pub async fn loans(&self, wallet: &WalletId) -> ServiceResult<Vec<Loan>> {
        Ok(self.session(wallet).await?.loans)
    }

    /// Loan totals for a wallet.
    pub async fn loan_aggregate(&self, wallet: &WalletId) -> ServiceResult<LoanAggregate> {
        Ok(amortization::aggregate(&self.session(wallet).await?.loans)?)
    }

    /// The wallet's loan with the earliest due date.
    pub async fn next_due_loan(&self, wallet: &WalletId) -> ServiceResult<Option<Loan>> {
        let session = self.session(wallet).await?;
        Ok(amortization::next_due_across_loans(&session.loans).cloned())
    }

    /// Payment progress of one loan.
    pub async fn loan_progress(&self, wallet: &WalletId, loan_id: LoanId) -> ServiceResult<Percent> {
        let session = self.session(wallet).await?;
        let loan = session.loan(loan_id).ok_or(ServiceError::UnknownLoan(loan_id))?;
        Ok(amortization::progress(loan))
    }

    /// Looks up a submitted operation.
    pub async fn operation(&self, id: Uuid) -> Option<PendingOperation> {
        self.operations.read().await.get(&id).cloned()
    }

    /// Events recorded for a wallet, oldest first.
    pub async fn events(&self, wallet: &WalletId) -> Vec<LifecycleEvent> {
        self.lifecycle.get_events(wallet).await
    }

    /// Activity summary for a wallet.
    pub async fn activity(&self, wallet: &WalletId) -> SessionActivity {
        self.lifecycle.get_activity(wallet).await
    }

    /// Runs one user action through validation, confirmation and commit.
    ///
    /// `plan` must not mutate anything: it derives the next ledger and
    /// session from the current ones. It runs once before submission to
    /// reject bad input early and again at commit time against the latest
    /// state.
    async fn execute<T, F>(
        &self,
        wallet: &WalletId,
        kind: ActionKind,
        amount: Money,
        plan: F,
    ) -> ServiceResult<(Uuid, T)>
    where
        F: Fn(&Ledger, &Session) -> ServiceResult<Plan<T>>,
    {
        let _guard = self.in_flight.acquire(wallet, kind).inspect_err(|_| {
            warn!(wallet = %wallet, kind = ?kind, "Operation already pending");
        })?;

        self.check(wallet, &plan).await.inspect_err(|e| {
            debug!(wallet = %wallet, kind = ?kind, error = %e, "Operation refused");
        })?;

        let operation = PendingOperation::new(wallet.clone(), kind, amount);
        let operation_id = operation.id;
        self.operations
            .write()
            .await
            .insert(operation_id, operation.clone());
        debug!(operation = %operation_id, wallet = %wallet, kind = ?kind, amount = %amount, "Operation pending");

        if let ConfirmationOutcome::Rejected(reason) = self.confirmer.confirm(&operation).await {
            resolve(
                &mut *self.operations.write().await,
                operation_id,
                OperationStatus::Rejected,
            );
            warn!(operation = %operation_id, reason = %reason, "Operation rejected");
            return Err(ServiceError::ConfirmationRejected { reason });
        }

        match self.commit(wallet, operation_id, &plan).await {
            Ok(value) => {
                debug!(operation = %operation_id, "Operation confirmed");
                Ok((operation_id, value))
            }
            Err(e) => {
                warn!(operation = %operation_id, error = %e, "Operation failed at commit");
                Err(e)
            }
        }
    }

    /// Dry-runs `plan` against the current state.
    async fn check<T, F>(&self, wallet: &WalletId, plan: &F) -> ServiceResult<()>
    where
        F: Fn(&Ledger, &Session) -> ServiceResult<Plan<T>>,
    {
        let ledger = self.ledger.read().await;
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(wallet)
            .ok_or_else(|| ServiceError::UnknownSession(wallet.clone()))?;
        plan(&ledger, session).map(|_| ())
    }

    /// Runs `plan` against the latest state and applies its result.
    ///
    /// Ledger, session, operation status and lifecycle event change together
    /// under the write locks, so a reader that sees the new state also sees
    /// the confirmed operation and its event. A plan that fails leaves
    /// everything but the operation status untouched.
    async fn commit<T, F>(&self, wallet: &WalletId, operation_id: Uuid, plan: &F) -> ServiceResult<T>
    where
        F: Fn(&Ledger, &Session) -> ServiceResult<Plan<T>>,
    {
        // Lock order: ledger, sessions, operations, then the tracker.
        let mut ledger = self.ledger.write().await;
        let mut sessions = self.sessions.write().await;
        let mut operations = self.operations.write().await;

        let planned = match sessions.get(wallet) {
            Some(session) => plan(&ledger, session),
            None => Err(ServiceError::UnknownSession(wallet.clone())),
        };
        let Plan {
            ledger: next_ledger,
            session: next_session,
            event,
            value,
        } = match planned {
            Ok(planned) => planned,
            Err(e) => {
                resolve(&mut operations, operation_id, OperationStatus::Rejected);
                return Err(e);
            }
        };

        *ledger = next_ledger;
        sessions.insert(wallet.clone(), next_session);
        resolve(&mut operations, operation_id, OperationStatus::Confirmed);
        self.lifecycle.record(wallet, Some(operation_id), event).await;
        Ok(value)
    }
}

fn resolve(operations: &mut HashMap<Uuid, PendingOperation>, id: Uuid, status: OperationStatus) {
    if let Some(operation) = operations.get_mut(&id) {
        operation.resolve(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use remitlend_domain::LendingError;
    use remitlend_domain::enums::PaymentFormula;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn money(value: Decimal) -> Money {
        Money::new(value).unwrap()
    }

    fn instant_service() -> LendingService {
        LendingService::new(
            ServiceConfig::default().with_confirmation_delay(0),
            PoolState::dashboard_seed(),
            Arc::new(SimulatedConfirmer::instant()),
        )
    }

    fn dashboard_position() -> LenderPosition {
        LenderPosition::new(money(dec!(54000)), money(dec!(3180)), Percent(dec!(4.2))).unwrap()
    }

    fn collateral() -> CollateralToken {
        CollateralToken {
            token_id: 7284,
            monthly_flow: money(dec!(2450)),
            reliability_score: 90,
            history_months: 20,
            total_sent: money(dec!(47000)),
            staked: true,
        }
    }

    struct RejectingConfirmer;

    #[async_trait]
    impl Confirmer for RejectingConfirmer {
        async fn confirm(&self, _operation: &PendingOperation) -> ConfirmationOutcome {
            ConfirmationOutcome::Rejected("settlement unavailable".to_string())
        }
    }

    #[tokio::test]
    async fn test_deposit_updates_pool_and_position() {
        let service = instant_service();
        let wallet = WalletId::new("0x9da341c2");
        service
            .connect_with_position(wallet.clone(), dashboard_position())
            .await;

        let update = service.deposit(&wallet, money(dec!(10000))).await.unwrap();

        assert_eq!(update.position.principal().value(), dec!(64000));
        assert_eq!(update.position.share_percentage().0, dec!(5.08));
        assert_eq!(update.pool.total_value_locked().value(), dec!(1260000));
        assert_eq!(service.pool().await, update.pool);
        assert_eq!(service.position(&wallet).await.unwrap(), update.position);

        let op = service.operation(update.operation_id).await.unwrap();
        assert_eq!(op.status, OperationStatus::Confirmed);
        assert_eq!(service.activity(&wallet).await.deposits, 1);

        let [principal, interest] = service.portfolio(&wallet).await.unwrap();
        assert_eq!(principal.value.value(), dec!(64000));
        assert_eq!(interest.value.value(), dec!(3180));
    }

    #[tokio::test]
    async fn test_failed_withdraw_leaves_state_untouched() {
        let service = instant_service();
        let wallet = WalletId::new("0x9da341c2");
        service
            .connect_with_position(wallet.clone(), dashboard_position())
            .await;
        let pool_before = service.pool().await;

        let err = service
            .withdraw(&wallet, money(dec!(60000)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Lending(LendingError::ExceedsBalance { .. })
        ));
        assert_eq!(service.pool().await, pool_before);
        assert_eq!(service.position(&wallet).await.unwrap(), dashboard_position());
        assert!(service.events(&wallet).await.is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_enforces_pool_liquidity() {
        let pool = PoolState::new(money(dec!(1000)), money(dec!(9000)), Percent::ZERO).unwrap();
        let service = LendingService::new(
            ServiceConfig::default(),
            pool.clone(),
            Arc::new(SimulatedConfirmer::instant()),
        );
        let wallet = WalletId::new("0x9da341c2");
        service
            .connect_with_position(wallet.clone(), dashboard_position())
            .await;

        let err = service
            .withdraw(&wallet, money(dec!(2000)))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Lending(LendingError::InsufficientLiquidity {
                requested: money(dec!(2000)),
                available: money(dec!(1000)),
            })
        );
        assert_eq!(service.pool().await, pool);
    }

    #[tokio::test]
    async fn test_unrepresentable_deposit_is_refused() {
        let service = instant_service();
        let wallet = WalletId::new("0x9da341c2");
        service
            .connect_with_position(wallet.clone(), dashboard_position())
            .await;

        let huge = Money::parse_amount("79228162514264337593543950335").unwrap();
        assert_eq!(
            service.deposit(&wallet, huge).await.unwrap_err(),
            ServiceError::Lending(LendingError::InvalidAmount)
        );
        assert_eq!(service.pool().await, PoolState::dashboard_seed());
        assert_eq!(service.position(&wallet).await.unwrap(), dashboard_position());
        assert!(service.events(&wallet).await.is_empty());

        // The service keeps working afterwards.
        service.deposit(&wallet, money(dec!(10))).await.unwrap();
    }

    #[tokio::test]
    async fn test_committed_state_and_event_appear_together() {
        let service = Arc::new(LendingService::new(
            ServiceConfig::default(),
            PoolState::dashboard_seed(),
            Arc::new(SimulatedConfirmer::new(Duration::from_millis(100))),
        ));
        let wallet = WalletId::new("0x9da341c2");
        service
            .connect_with_position(wallet.clone(), dashboard_position())
            .await;

        let pending = {
            let service = Arc::clone(&service);
            let wallet = wallet.clone();
            tokio::spawn(async move { service.deposit(&wallet, money(dec!(500))).await })
        };

        loop {
            if service.position(&wallet).await.unwrap() != dashboard_position() {
                let events = service.events(&wallet).await;
                assert_eq!(events.len(), 1);
                let operation_id = events[0].operation_id.unwrap();
                let op = service.operation(operation_id).await.unwrap();
                assert_eq!(op.status, OperationStatus::Confirmed);
                assert_eq!(service.activity(&wallet).await.deposits, 1);
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let update = pending.await.unwrap().unwrap();
        assert_eq!(update.position.principal().value(), dec!(54500));
    }

    #[tokio::test]
    async fn test_unknown_wallet() {
        let service = instant_service();
        let wallet = WalletId::new("0xdeadbeef");
        assert_eq!(
            service.deposit(&wallet, money(dec!(1))).await.unwrap_err(),
            ServiceError::UnknownSession(wallet.clone())
        );
        assert!(service.position(&wallet).await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_confirmation_marks_operation() {
        let service = LendingService::new(
            ServiceConfig::default(),
            PoolState::dashboard_seed(),
            Arc::new(RejectingConfirmer),
        );
        let wallet = WalletId::new("0x9da341c2");
        service.connect(wallet.clone()).await;

        let err = service.deposit(&wallet, money(dec!(500))).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::ConfirmationRejected {
                reason: "settlement unavailable".to_string()
            }
        );
        assert_eq!(service.pool().await, PoolState::dashboard_seed());
        assert_eq!(service.position(&wallet).await.unwrap(), LenderPosition::empty());
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_refused_while_pending() {
        let service = Arc::new(LendingService::new(
            ServiceConfig::default(),
            PoolState::dashboard_seed(),
            Arc::new(SimulatedConfirmer::new(Duration::from_millis(200))),
        ));
        let wallet = WalletId::new("0x9da341c2");
        service.connect(wallet.clone()).await;

        let first = {
            let service = Arc::clone(&service);
            let wallet = wallet.clone();
            tokio::spawn(async move { service.deposit(&wallet, money(dec!(100))).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = service.deposit(&wallet, money(dec!(100))).await;
        assert_eq!(
            second.unwrap_err(),
            ServiceError::OperationInFlight {
                kind: ActionKind::Deposit
            }
        );

        first.await.unwrap().unwrap();
        assert_eq!(service.position(&wallet).await.unwrap().principal().value(), dec!(100));
        // Slot is released once the first deposit settles.
        service.deposit(&wallet, money(dec!(100))).await.unwrap();
    }

    #[tokio::test]
    async fn test_request_loan_and_pay() {
        let config = ServiceConfig::default().with_loan_policy(amortization::LoanPolicy {
            payment_formula: PaymentFormula::legacy_flat(),
            ..amortization::LoanPolicy::default()
        });
        let service = LendingService::new(
            config,
            PoolState::dashboard_seed(),
            Arc::new(SimulatedConfirmer::instant()),
        );
        let wallet = WalletId::new("0x73bfaa91");
        service.connect(wallet.clone()).await;

        let request = LoanRequest {
            amount: money(dec!(10000)),
            duration_months: 12,
            annual_rate: Percent(dec!(10.5)),
        };
        assert!(matches!(
            service.request_loan(&wallet, 7284, request.clone()).await,
            Err(ServiceError::MissingCollateral { token_id: 7284, .. })
        ));

        service
            .register_collateral(&wallet, collateral())
            .await
            .unwrap();
        let too_long = LoanRequest {
            duration_months: 361,
            ..request.clone()
        };
        assert_eq!(
            service.request_loan(&wallet, 7284, too_long).await.unwrap_err(),
            ServiceError::Lending(LendingError::InvalidTerm)
        );

        let first = service
            .request_loan(&wallet, 7284, request.clone())
            .await
            .unwrap()
            .loan;
        let second = service
            .request_loan(&wallet, 7284, request)
            .await
            .unwrap()
            .loan;

        assert_eq!(first.id, LoanId(1000));
        assert_eq!(second.id, LoanId(1001));
        assert_eq!(first.monthly_payment.value(), dec!(800));

        let loans = service.loans(&wallet).await.unwrap();
        assert_eq!(loans[0].id, second.id);

        let aggregate = service.loan_aggregate(&wallet).await.unwrap();
        assert_eq!(aggregate.total_borrowed.value(), dec!(20000));
        assert_eq!(aggregate.outstanding.value(), dec!(20000));

        // Loans do not move pool liquidity.
        assert_eq!(service.pool().await, PoolState::dashboard_seed());

        let paid = service
            .make_payment(&wallet, first.id, money(dec!(800)))
            .await
            .unwrap()
            .loan;
        assert_eq!(paid.payments_made, 1);
        assert!(paid.balance < first.balance);
        assert_eq!(
            service.loan_progress(&wallet, first.id).await.unwrap().rounded().0,
            dec!(8.33)
        );

        assert_eq!(
            service
                .make_payment(&wallet, LoanId(42), money(dec!(1)))
                .await
                .unwrap_err(),
            ServiceError::UnknownLoan(LoanId(42))
        );

        let activity = service.activity(&wallet).await;
        assert_eq!(activity.loans_requested, 2);
        assert_eq!(activity.payments, 1);
        assert_eq!(service.events(&wallet).await.len(), 4);
    }
}
