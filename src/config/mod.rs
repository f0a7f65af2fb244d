//! Configuration for the reconciliation core.

use crate::error::ReconError;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

/// Matching configuration for one reconciliation run.
///
/// Validated once at engine construction; invalid values never surface
/// mid-run.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Candidate date window around the invoice due date, in days.
    pub date_window_days: i64,
    /// Amount tolerance as a fraction of the invoice amount.
    pub fee_tolerance_pct: f64,
    /// Absolute ceiling on the amount tolerance, in minor units.
    pub fee_tolerance_cap_minor: i64,
    /// Known payment-gateway fee formulas, per currency.
    pub fee_profiles: Vec<FeeProfile>,
    pub weights: ScoreWeights,
    /// Minimum composite confidence for a candidate to survive scoring.
    pub acceptance_threshold: f64,
    /// Minimum name score for an equal-amount pair to classify as exact.
    pub exact_name_threshold: f64,
    /// Minimum name score for a fee-shaped delta to classify as
    /// fee-adjusted rather than merely fuzzy.
    pub fee_name_floor: f64,
    /// Slack when checking that partial-payment legs sum to the invoice.
    pub partial_sum_tolerance_minor: i64,
}

/// Composite score weights. Must sum to 1.0.
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    pub name: f64,
    pub amount: f64,
    pub date: f64,
}

/// A percentage-plus-fixed gateway fee formula: `net = gross * (1 - percent) - fixed`.
#[derive(Debug, Clone)]
pub struct FeeProfile {
    pub currency: String,
    pub percent: Decimal,
    pub fixed_minor: i64,
    /// Rounding slack, in minor units. Gateways round per line item.
    pub tolerance_minor: i64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            date_window_days: 7,
            fee_tolerance_pct: 0.05,
            fee_tolerance_cap_minor: 10_000,
            fee_profiles: vec![FeeProfile {
                currency: "USD".to_string(),
                percent: Decimal::new(29, 3),
                fixed_minor: 30,
                tolerance_minor: 5,
            }],
            weights: ScoreWeights {
                name: 0.4,
                amount: 0.4,
                date: 0.2,
            },
            acceptance_threshold: 0.6,
            exact_name_threshold: 0.85,
            fee_name_floor: 0.6,
            partial_sum_tolerance_minor: 100,
        }
    }
}

impl MatcherConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for unset variables. Set variables must parse.
    pub fn from_env() -> Result<Self, ReconError> {
        let defaults = Self::default();

        let config = Self {
            date_window_days: env_parse("RECON_DATE_WINDOW_DAYS", defaults.date_window_days)?,
            fee_tolerance_pct: env_parse("RECON_FEE_TOLERANCE_PCT", defaults.fee_tolerance_pct)?,
            fee_tolerance_cap_minor: env_parse(
                "RECON_FEE_TOLERANCE_CAP_MINOR",
                defaults.fee_tolerance_cap_minor,
            )?,
            fee_profiles: vec![FeeProfile {
                currency: env::var("RECON_FEE_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
                percent: env_parse("RECON_FEE_PERCENT", Decimal::new(29, 3))?,
                fixed_minor: env_parse("RECON_FEE_FIXED_MINOR", 30)?,
                tolerance_minor: env_parse("RECON_FEE_SLACK_MINOR", 5)?,
            }],
            weights: ScoreWeights {
                name: env_parse("RECON_NAME_WEIGHT", defaults.weights.name)?,
                amount: env_parse("RECON_AMOUNT_WEIGHT", defaults.weights.amount)?,
                date: env_parse("RECON_DATE_WEIGHT", defaults.weights.date)?,
            },
            acceptance_threshold: env_parse(
                "RECON_ACCEPTANCE_THRESHOLD",
                defaults.acceptance_threshold,
            )?,
            exact_name_threshold: env_parse(
                "RECON_EXACT_NAME_THRESHOLD",
                defaults.exact_name_threshold,
            )?,
            fee_name_floor: env_parse("RECON_FEE_NAME_FLOOR", defaults.fee_name_floor)?,
            partial_sum_tolerance_minor: env_parse(
                "RECON_PARTIAL_SUM_TOLERANCE_MINOR",
                defaults.partial_sum_tolerance_minor,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject structurally invalid configuration before any run starts.
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.date_window_days < 1 {
            return Err(config_error(format!(
                "date window must be at least one day, got {}",
                self.date_window_days
            )));
        }
        if !(self.fee_tolerance_pct > 0.0 && self.fee_tolerance_pct < 1.0) {
            return Err(config_error(format!(
                "fee tolerance fraction must be in (0, 1), got {}",
                self.fee_tolerance_pct
            )));
        }
        if self.fee_tolerance_cap_minor < 1 {
            return Err(config_error(format!(
                "fee tolerance cap must be positive, got {}",
                self.fee_tolerance_cap_minor
            )));
        }
        if self.partial_sum_tolerance_minor < 0 {
            return Err(config_error(format!(
                "partial sum tolerance must be non-negative, got {}",
                self.partial_sum_tolerance_minor
            )));
        }

        let w = &self.weights;
        for (label, value) in [("name", w.name), ("amount", w.amount), ("date", w.date)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(config_error(format!(
                    "{label} weight must be in [0, 1], got {value}"
                )));
            }
        }
        if ((w.name + w.amount + w.date) - 1.0).abs() > 1e-6 {
            return Err(config_error(format!(
                "score weights must sum to 1.0, got {}",
                w.name + w.amount + w.date
            )));
        }

        for (label, value) in [
            ("acceptance threshold", self.acceptance_threshold),
            ("exact name threshold", self.exact_name_threshold),
            ("fee name floor", self.fee_name_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(config_error(format!(
                    "{label} must be in [0, 1], got {value}"
                )));
            }
        }

        for profile in &self.fee_profiles {
            if profile.currency.len() != 3
                || !profile.currency.chars().all(|c| c.is_ascii_uppercase())
            {
                return Err(config_error(format!(
                    "fee profile currency must be a three-letter code, got {:?}",
                    profile.currency
                )));
            }
            if profile.percent < Decimal::ZERO || profile.percent >= Decimal::ONE {
                return Err(config_error(format!(
                    "fee profile percent must be in [0, 1), got {}",
                    profile.percent
                )));
            }
            if profile.fixed_minor < 0 || profile.tolerance_minor < 0 {
                return Err(config_error(format!(
                    "fee profile amounts must be non-negative for {}",
                    profile.currency
                )));
            }
        }

        Ok(())
    }

    /// Effective amount tolerance for one invoice: the configured fraction
    /// of its amount, capped by the absolute ceiling.
    pub fn fee_ceiling_minor(&self, amount_minor: i64) -> i64 {
        let fractional = (amount_minor as f64 * self.fee_tolerance_pct).round() as i64;
        fractional.min(self.fee_tolerance_cap_minor)
    }

    /// Fee profile for a currency, if one is configured.
    pub fn fee_profile(&self, currency: &str) -> Option<&FeeProfile> {
        self.fee_profiles.iter().find(|p| p.currency == currency)
    }
}

fn config_error(message: String) -> ReconError {
    ReconError::Configuration(anyhow::anyhow!(message))
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ReconError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| config_error(format!("{key} has invalid value {raw:?}"))),
        Err(_) => Ok(default),
    }
}
