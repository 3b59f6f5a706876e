//! Service configuration.

use remitlend_domain::enums::PaymentFormula;
use remitlend_domain::math::amortization::LoanPolicy;
use remitlend_domain::math::position_accountant::DEFAULT_INTEREST_REDEMPTION_RATIO;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable for the simulated confirmation delay.
pub const ENV_CONFIRMATION_DELAY_MS: &str = "REMITLEND_CONFIRMATION_DELAY_MS";
/// Environment variable toggling pool liquidity enforcement on withdrawals.
pub const ENV_ENFORCE_LIQUIDITY: &str = "REMITLEND_ENFORCE_LIQUIDITY";
/// Environment variable for the minimum collateral reliability score.
pub const ENV_MIN_RELIABILITY_SCORE: &str = "REMITLEND_MIN_RELIABILITY_SCORE";
/// Environment variable selecting the payment formula (`annuity` or `flat`).
pub const ENV_PAYMENT_FORMULA: &str = "REMITLEND_PAYMENT_FORMULA";
/// Environment variable for the longest loan term, in months.
pub const ENV_MAX_DURATION_MONTHS: &str = "REMITLEND_MAX_DURATION_MONTHS";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value {value:?} for {key}")]
pub struct ConfigError {
    /// Variable name.
    pub key: &'static str,
    /// Rejected value.
    pub value: String,
}

/// Configuration for the lending service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Delay the simulated confirmer waits before confirming, in milliseconds.
    pub confirmation_delay_ms: u64,
    /// Reject withdrawals the pool's idle liquidity cannot cover.
    pub enforce_liquidity: bool,
    /// Share of each withdrawal drawn from accrued interest.
    pub interest_redemption_ratio: Decimal,
    /// Loan issuance and servicing rules.
    pub loan_policy: LoanPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            confirmation_delay_ms: 900,
            enforce_liquidity: true,
            interest_redemption_ratio: DEFAULT_INTEREST_REDEMPTION_RATIO,
            loan_policy: LoanPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Defaults overlaid with any `REMITLEND_*` environment variables.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    ///
    /// # Errors
    /// Returns an error if a value is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_CONFIRMATION_DELAY_MS) {
            config.confirmation_delay_ms = parse(ENV_CONFIRMATION_DELAY_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_ENFORCE_LIQUIDITY) {
            config.enforce_liquidity = parse(ENV_ENFORCE_LIQUIDITY, &value)?;
        }
        if let Some(value) = lookup(ENV_MIN_RELIABILITY_SCORE) {
            let score: u8 = parse(ENV_MIN_RELIABILITY_SCORE, &value)?;
            if score > 100 {
                return Err(invalid(ENV_MIN_RELIABILITY_SCORE, &value));
            }
            config.loan_policy.min_reliability_score = score;
        }
        if let Some(value) = lookup(ENV_PAYMENT_FORMULA) {
            config.loan_policy.payment_formula = match value.trim().to_ascii_lowercase().as_str() {
                "annuity" => PaymentFormula::Annuity,
                "flat" => PaymentFormula::legacy_flat(),
                _ => return Err(invalid(ENV_PAYMENT_FORMULA, &value)),
            };
        }
        if let Some(value) = lookup(ENV_MAX_DURATION_MONTHS) {
            let months: u32 = parse(ENV_MAX_DURATION_MONTHS, &value)?;
            if months == 0 {
                return Err(invalid(ENV_MAX_DURATION_MONTHS, &value));
            }
            config.loan_policy.max_duration_months = months;
        }

        Ok(config)
    }

    /// Sets the confirmation delay.
    #[must_use]
    pub fn with_confirmation_delay(mut self, delay_ms: u64) -> Self {
        self.confirmation_delay_ms = delay_ms;
        self
    }

    /// Sets the loan policy.
    #[must_use]
    pub fn with_loan_policy(mut self, policy: LoanPolicy) -> Self {
        self.loan_policy = policy;
        self
    }

    /// Returns the confirmation delay as a duration.
    #[must_use]
    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.confirmation_delay_ms)
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError {
        key,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.confirmation_delay_ms, 900);
        assert!(config.enforce_liquidity);
        assert_eq!(config.loan_policy.min_reliability_score, 70);
        assert_eq!(config.loan_policy.payment_formula, PaymentFormula::Annuity);
        assert_eq!(config.loan_policy.max_duration_months, 360);
        assert_eq!(config.confirmation_delay(), Duration::from_millis(900));
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            (ENV_CONFIRMATION_DELAY_MS, "0"),
            (ENV_ENFORCE_LIQUIDITY, "false"),
            (ENV_MIN_RELIABILITY_SCORE, "80"),
            (ENV_PAYMENT_FORMULA, "Flat"),
            (ENV_MAX_DURATION_MONTHS, "120"),
        ]))
        .unwrap();

        assert_eq!(config.confirmation_delay_ms, 0);
        assert!(!config.enforce_liquidity);
        assert_eq!(config.loan_policy.min_reliability_score, 80);
        assert_eq!(config.loan_policy.payment_formula, PaymentFormula::legacy_flat());
        assert_eq!(config.loan_policy.max_duration_months, 120);
    }

    #[test]
    fn test_invalid_values() {
        let err = ServiceConfig::from_lookup(lookup_from(&[(ENV_CONFIRMATION_DELAY_MS, "soon")]))
            .unwrap_err();
        assert_eq!(err.key, ENV_CONFIRMATION_DELAY_MS);

        let err = ServiceConfig::from_lookup(lookup_from(&[(ENV_MIN_RELIABILITY_SCORE, "120")]))
            .unwrap_err();
        assert_eq!(err.key, ENV_MIN_RELIABILITY_SCORE);

        let err = ServiceConfig::from_lookup(lookup_from(&[(ENV_PAYMENT_FORMULA, "balloon")]))
            .unwrap_err();
        assert_eq!(err.value, "balloon");

        let err = ServiceConfig::from_lookup(lookup_from(&[(ENV_MAX_DURATION_MONTHS, "0")]))
            .unwrap_err();
        assert_eq!(err.key, ENV_MAX_DURATION_MONTHS);
    }
}
