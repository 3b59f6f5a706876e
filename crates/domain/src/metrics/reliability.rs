use crate::enums::ReliabilityTier;
use crate::error::{LendingError, LendingResult};

/// Maps a 0-100 reliability score onto its APR tier.
pub fn tier_for_score(score: u8) -> LendingResult<ReliabilityTier> {
    match score {
        90..=100 => Ok(ReliabilityTier::Excellent),
        80..=89 => Ok(ReliabilityTier::VeryGood),
        70..=79 => Ok(ReliabilityTier::Good),
        0..=69 => Ok(ReliabilityTier::Fair),
        _ => Err(LendingError::InvalidReliabilityScore(score)),
    }
}

impl ReliabilityTier {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent - unlocks the best liquidity terms.",
            Self::VeryGood => "Very good - qualifies for premium APY tiers.",
            Self::Good => "Good - access standard credit lines immediately.",
            Self::Fair => "Fair - continue building remittance history to unlock more.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier_for_score(100), Ok(ReliabilityTier::Excellent));
        assert_eq!(tier_for_score(90), Ok(ReliabilityTier::Excellent));
        assert_eq!(tier_for_score(89), Ok(ReliabilityTier::VeryGood));
        assert_eq!(tier_for_score(80), Ok(ReliabilityTier::VeryGood));
        assert_eq!(tier_for_score(70), Ok(ReliabilityTier::Good));
        assert_eq!(tier_for_score(69), Ok(ReliabilityTier::Fair));
        assert_eq!(tier_for_score(0), Ok(ReliabilityTier::Fair));
        assert_eq!(
            tier_for_score(101),
            Err(LendingError::InvalidReliabilityScore(101))
        );
    }

    #[test]
    fn test_tiers_order_by_quality() {
        assert!(ReliabilityTier::Excellent > ReliabilityTier::Good);
        assert!(ReliabilityTier::Fair < ReliabilityTier::VeryGood);
    }
}
