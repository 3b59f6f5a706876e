//! Command Line Interface for the remittance lending dashboard.
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use prettytable::{Table, row};
use remitlend_domain::entities::{CollateralToken, LenderPosition, Loan, PoolState};
use remitlend_domain::math::amortization::{self, LoanAggregate, LoanRequest};
use remitlend_domain::math::pool_ledger;
use remitlend_domain::metrics::portfolio;
use remitlend_domain::value_objects::{Money, Percent};
use remitlend_execution::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "remitlend")]
#[command(about = "Remittance-collateralized lending pool CLI", long_about = None)]
struct Cli {
    /// Print JSON snapshots instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    pool: PoolSeed,

    #[command(subcommand)]
    command: Commands,
}

/// Pool the session starts from.
#[derive(Args)]
struct PoolSeed {
    /// Idle liquidity in the pool
    #[arg(long, global = true, default_value = "464000")]
    available: Decimal,

    /// Amount currently lent out
    #[arg(long, global = true, default_value = "786000")]
    borrowed: Decimal,

    /// Current pool APY in percent
    #[arg(long, global = true, default_value = "11.4")]
    apy: Decimal,
}

/// Lender position the wallet connects with.
#[derive(Args)]
struct PositionSeed {
    /// Principal already deposited
    #[arg(long, default_value = "54000")]
    principal: Decimal,

    /// Interest accrued so far
    #[arg(long, default_value = "3180")]
    interest: Decimal,
}

/// Collateral and terms for a new loan.
#[derive(Args)]
struct LoanTerms {
    /// Loan principal
    #[arg(long)]
    amount: Money,

    /// Term in months
    #[arg(long, default_value_t = 12)]
    months: u32,

    /// APR in percent
    #[arg(long, default_value = "12.5")]
    rate: Decimal,

    /// Collateral token id
    #[arg(long, default_value_t = 7284)]
    token_id: u64,

    /// Reliability score on the collateral token
    #[arg(long, default_value_t = 92)]
    score: u8,

    /// Monthly remittance flow backing the token
    #[arg(long, default_value = "2450")]
    monthly_flow: Decimal,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pool totals and utilization
    Pool,
    /// Deposit into the pool
    Deposit {
        /// Amount to deposit
        amount: Money,

        #[command(flatten)]
        position: PositionSeed,
    },
    /// Withdraw from the pool
    Withdraw {
        /// Amount to withdraw
        amount: Money,

        #[command(flatten)]
        position: PositionSeed,
    },
    /// Request a loan against a collateral token
    RequestLoan {
        #[command(flatten)]
        terms: LoanTerms,
    },
    /// Request a loan and make monthly payments on it
    Pay {
        #[command(flatten)]
        terms: LoanTerms,

        /// Number of payments to make
        #[arg(long, default_value_t = 1)]
        payments: u32,

        /// Amount of each payment (defaults to the monthly payment)
        #[arg(long)]
        payment: Option<Money>,
    },
    /// Replay the dashboard scenarios end to end
    Demo,
}

/// Everything printed for one command.
#[derive(Serialize, Default)]
struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pool: Option<PoolState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<LenderPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collateral: Option<CollateralToken>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    loans: Vec<Loan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aggregate: Option<LoanAggregate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::from_env().context("Invalid REMITLEND_* configuration")?;
    let pool = PoolState::new(
        Money::new(cli.pool.available)?,
        Money::new(cli.pool.borrowed)?,
        Percent(cli.pool.apy),
    )?;
    let service = LendingService::simulated(config, pool);
    info!(
        delay_ms = service.config().confirmation_delay_ms,
        enforce_liquidity = service.config().enforce_liquidity,
        "Lending service ready"
    );

    match &cli.command {
        Commands::Pool => {
            let snapshot = Snapshot {
                pool: Some(service.pool().await),
                ..Snapshot::default()
            };
            render(&snapshot, cli.json)?;
        }
        Commands::Deposit { amount, position } => {
            let wallet = connect_lender(&service, "0x9da3b5e7f0c1d2a341c2", position).await?;
            let update = service.deposit(&wallet, *amount).await?;
            render(&lender_snapshot(update), cli.json)?;
        }
        Commands::Withdraw { amount, position } => {
            let wallet = connect_lender(&service, "0x9da3b5e7f0c1d2a341c2", position).await?;
            let update = service.withdraw(&wallet, *amount).await?;
            render(&lender_snapshot(update), cli.json)?;
        }
        Commands::RequestLoan { terms } => {
            let wallet = connect_borrower(&service, "0x73bf2c4e88d1aa91", terms).await?;
            service
                .request_loan(&wallet, terms.token_id, loan_request(terms))
                .await?;
            render(&borrower_snapshot(&service, &wallet).await?, cli.json)?;
        }
        Commands::Pay {
            terms,
            payments,
            payment,
        } => {
            let wallet = connect_borrower(&service, "0x73bf2c4e88d1aa91", terms).await?;
            let loan = service
                .request_loan(&wallet, terms.token_id, loan_request(terms))
                .await?
                .loan;
            let amount = payment.unwrap_or(loan.monthly_payment);
            for _ in 0..*payments {
                service.make_payment(&wallet, loan.id, amount).await?;
            }
            render(&borrower_snapshot(&service, &wallet).await?, cli.json)?;
        }
        Commands::Demo => run_demo(&service, cli.json).await?,
    }

    Ok(())
}

async fn connect_lender(
    service: &LendingService,
    address: &str,
    seed: &PositionSeed,
) -> Result<WalletId> {
    let wallet = WalletId::new(address);
    let principal = Money::new(seed.principal)?;
    let pool = service.pool().await;
    let position = LenderPosition::new(
        principal,
        Money::new(seed.interest)?,
        Percent::ratio(principal.value(), pool.total_value_locked().value()),
    )?;
    service.connect_with_position(wallet.clone(), position).await;
    Ok(wallet)
}

async fn connect_borrower(
    service: &LendingService,
    address: &str,
    terms: &LoanTerms,
) -> Result<WalletId> {
    let wallet = WalletId::new(address);
    service.connect(wallet.clone()).await;
    info!(wallet = %wallet.truncated(), "Borrower connected");
    let monthly_flow = Money::new(terms.monthly_flow)?;
    let collateral = CollateralToken {
        token_id: terms.token_id,
        monthly_flow,
        reliability_score: terms.score,
        history_months: 18,
        total_sent: Money::new(
            monthly_flow
                .value()
                .checked_mul(Decimal::from(18))
                .context("Monthly flow is too large")?,
        )?,
        staked: true,
    };
    service.register_collateral(&wallet, collateral).await?;
    Ok(wallet)
}

fn loan_request(terms: &LoanTerms) -> LoanRequest {
    LoanRequest {
        amount: terms.amount,
        duration_months: terms.months,
        annual_rate: Percent(terms.rate),
    }
}

fn lender_snapshot(update: LenderUpdate) -> Snapshot {
    Snapshot {
        pool: Some(update.pool),
        position: Some(update.position),
        ..Snapshot::default()
    }
}

async fn borrower_snapshot(service: &LendingService, wallet: &WalletId) -> Result<Snapshot> {
    let session = service.session(wallet).await?;
    Ok(Snapshot {
        aggregate: Some(amortization::aggregate(&session.loans)?),
        collateral: session.collateral,
        loans: session.loans,
        ..Snapshot::default()
    })
}

/// Replays the dashboard flows: a lender deposit and withdrawals against the
/// seed position, then a borrower taking two loans and paying one.
async fn run_demo(service: &LendingService, json: bool) -> Result<()> {
    let seed = PositionSeed {
        principal: Decimal::from(54_000),
        interest: Decimal::from(3_180),
    };

    info!("Lender deposits 10,000 into the seed position");
    let depositor = connect_lender(service, "0x9da3b5e7f0c1d2a341c2", &seed).await?;
    let update = service.deposit(&depositor, Money::new(Decimal::from(10_000))?).await?;
    render(&lender_snapshot(update), json)?;

    info!("Second lender withdraws 5,000 from the seed position");
    let withdrawer = connect_lender(service, "0x41c2e0a7d95b3f18", &seed).await?;
    let update = service
        .withdraw(&withdrawer, Money::new(Decimal::from(5_000))?)
        .await?;
    render(&lender_snapshot(update), json)?;

    info!("Second lender tries to withdraw more than their total value");
    if let Err(e) = service
        .withdraw(&withdrawer, Money::new(Decimal::from(60_000))?)
        .await
    {
        println!("Withdrawal refused: {e}");
    }

    let borrower_terms = LoanTerms {
        amount: Money::new(Decimal::from(8_500))?,
        months: 12,
        rate: Decimal::new(125, 1),
        token_id: 7284,
        score: 92,
        monthly_flow: Decimal::from(2_450),
    };
    info!("Borrower registers collateral and takes two loans");
    let borrower = connect_borrower(service, "0x73bf2c4e88d1aa91", &borrower_terms).await?;
    let first = service
        .request_loan(&borrower, borrower_terms.token_id, loan_request(&borrower_terms))
        .await?
        .loan;
    service
        .request_loan(
            &borrower,
            borrower_terms.token_id,
            LoanRequest {
                amount: Money::new(Decimal::from(5_000))?,
                duration_months: 12,
                annual_rate: Percent(Decimal::new(102, 1)),
            },
        )
        .await?;
    service
        .make_payment(&borrower, first.id, first.monthly_payment)
        .await?;
    render(&borrower_snapshot(service, &borrower).await?, json)?;

    if !json {
        let pool = service.pool().await;
        println!("Utilization: {}", pool_ledger::utilization(&pool).rounded());
        if let Some(next) = service.next_due_loan(&borrower).await? {
            println!(
                "Next due: loan {} on {}",
                next.id,
                next.next_due_date.format("%Y-%m-%d")
            );
        }
        let activity = service.activity(&borrower).await;
        println!(
            "Borrower activity: {} loans, {} payments, {} repaid",
            activity.loans_requested, activity.payments, activity.total_repaid
        );
    }
    Ok(())
}

fn render(snapshot: &Snapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }
    if let Some(pool) = &snapshot.pool {
        print_pool(pool);
    }
    if let Some(position) = &snapshot.position {
        print_position(position);
    }
    if let Some(collateral) = &snapshot.collateral {
        print_collateral(collateral)?;
    }
    if !snapshot.loans.is_empty() {
        print_loans(&snapshot.loans);
    }
    if let Some(aggregate) = &snapshot.aggregate {
        print_aggregate(aggregate);
    }
    Ok(())
}

fn print_pool(pool: &PoolState) {
    let mut table = Table::new();
    table.add_row(row!["Pool", ""]);
    table.add_row(row!["Total value locked", r -> pool.total_value_locked()]);
    table.add_row(row!["Total borrowed", r -> pool.total_borrowed()]);
    table.add_row(row!["Available liquidity", r -> pool.available_liquidity()]);
    table.add_row(row!["Utilization", r -> pool.utilization_rate().rounded()]);
    table.add_row(row!["Current APY", r -> pool.current_apy()]);
    table.printstd();
}

fn print_position(position: &LenderPosition) {
    let mut table = Table::new();
    table.add_row(row!["Position", ""]);
    table.add_row(row!["Principal", r -> position.principal()]);
    table.add_row(row!["Earned interest", r -> position.earned_interest()]);
    table.add_row(row!["Total value", r -> position.total_value()]);
    table.add_row(row!["Pool share", r -> position.share_percentage()]);
    for slice in portfolio::split(position) {
        table.add_row(row![format!("  {}", slice.label), r -> slice.percent]);
    }
    table.printstd();
}

fn print_collateral(collateral: &CollateralToken) -> Result<()> {
    let tier = collateral.tier()?;
    let mut table = Table::new();
    table.add_row(row!["Collateral", format!("#{}", collateral.token_id)]);
    table.add_row(row!["Monthly flow", r -> collateral.monthly_flow]);
    table.add_row(row!["History", r -> format!("{} months", collateral.history_months)]);
    table.add_row(row!["Total sent", r -> collateral.total_sent]);
    table.add_row(row!["Reliability", r -> format!("{} ({:?})", collateral.reliability_score, tier)]);
    table.add_row(row!["", tier.description()]);
    table.printstd();
    Ok(())
}

fn print_loans(loans: &[Loan]) {
    let mut table = Table::new();
    table.add_row(row![
        "Loan", "Principal", "Balance", "APR", "Monthly", "Progress", "Next due", "Status"
    ]);
    for loan in loans {
        table.add_row(row![
            loan.id,
            r -> loan.principal,
            r -> loan.balance,
            r -> loan.annual_rate,
            r -> loan.monthly_payment,
            r -> format!(
                "{}/{} ({}, {} left)",
                loan.payments_made,
                loan.total_payments,
                amortization::progress(loan).rounded(),
                loan.remaining_payments()
            ),
            loan.next_due_date.format("%Y-%m-%d"),
            format!("{:?}", loan.status())
        ]);
    }
    table.printstd();
}

fn print_aggregate(aggregate: &LoanAggregate) {
    let mut table = Table::new();
    table.add_row(row!["Loans", ""]);
    table.add_row(row!["Total borrowed", r -> aggregate.total_borrowed]);
    table.add_row(row!["Outstanding", r -> aggregate.outstanding]);
    table.add_row(row!["Monthly payment", r -> aggregate.monthly_payment]);
    table.add_row(row!["All active payments", r -> aggregate.total_monthly_payment]);
    if let Some(next_due) = aggregate.next_due {
        table.add_row(row!["Next due", r -> next_due.format("%Y-%m-%d")]);
    }
    table.printstd();
}
