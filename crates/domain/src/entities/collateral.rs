use crate::error::LendingResult;
use crate::enums::ReliabilityTier;
use crate::metrics::reliability;
use crate::value_objects::Money;
use serde::{Deserialize, Serialize};

/// Verified remittance history, minted by the verification flow.
///
/// Borrowing only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralToken {
    pub token_id: u64,
    pub monthly_flow: Money,
    /// 0-100.
    pub reliability_score: u8,
    pub history_months: u32,
    pub total_sent: Money,
    pub staked: bool,
}

impl CollateralToken {
    pub fn tier(&self) -> LendingResult<ReliabilityTier> {
        reliability::tier_for_score(self.reliability_score)
    }
}
