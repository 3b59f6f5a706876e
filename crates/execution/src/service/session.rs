//! Per-wallet session state.

use remitlend_domain::entities::{CollateralToken, LenderPosition, Loan, LoanId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletId(pub String);

impl WalletId {
    /// Creates a wallet identifier.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Shortened form for display, e.g. `0x9da3…41c2`.
    pub fn truncated(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 10 {
            return self.0.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the dashboard holds for one connected wallet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    /// Lender position in the shared pool.
    pub position: LenderPosition,
    /// Loans, newest first.
    pub loans: Vec<Loan>,
    /// Collateral token from the verification flow.
    pub collateral: Option<CollateralToken>,
}

impl Session {
    /// Creates a session with an existing lender position.
    pub fn with_position(position: LenderPosition) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Finds a loan by id.
    pub fn loan(&self, id: LoanId) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_wallet() {
        let wallet = WalletId::new("0x9da3b5e7f0c1d2a341c2");
        assert_eq!(wallet.truncated(), "0x9da3…41c2");
        assert_eq!(WalletId::new("0xabc").truncated(), "0xabc");
    }
}
