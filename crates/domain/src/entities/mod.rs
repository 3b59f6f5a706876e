pub mod collateral;
pub mod loan;
pub mod pool;
pub mod position;

// Re-export for easier access
pub use collateral::CollateralToken;
pub use loan::{Loan, LoanId};
pub use pool::PoolState;
pub use position::LenderPosition;
