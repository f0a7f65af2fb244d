//! Composite confidence scoring and tier classification.
//!
//! Pure computation: one candidate pair in, one scored candidate out (or
//! nothing, when the pair falls below the acceptance threshold).

use crate::config::{FeeProfile, MatcherConfig};
use crate::models::{BankTransactionRecord, InvoiceRecord, MatchTier, ScoredCandidate};
use crate::services::similarity::NameSimilarity;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Amount score assigned when the delta matches a gateway fee formula.
const FEE_ADJUSTED_AMOUNT_SCORE: f64 = 0.95;

/// Score one candidate pair. Returns `None` when the pair does not clear
/// the acceptance threshold; sub-threshold pairs are discarded, not kept
/// as unmatched noise.
pub fn score_candidate(
    invoice: &InvoiceRecord,
    txn: &BankTransactionRecord,
    similarity: &dyn NameSimilarity,
    config: &MatcherConfig,
) -> Option<ScoredCandidate> {
    let name_score = similarity.score(&invoice.vendor_name, &txn.counterparty);

    let paid_minor = txn.amount_minor.abs();
    let delta_minor = invoice.amount_minor - paid_minor;
    let inferred_fee =
        detect_fee_delta(invoice.amount_minor, paid_minor, &invoice.currency, config);

    let amount_score = if delta_minor == 0 {
        1.0
    } else if inferred_fee.is_some() {
        FEE_ADJUSTED_AMOUNT_SCORE
    } else {
        let ceiling = config.fee_ceiling_minor(invoice.amount_minor);
        if ceiling == 0 {
            0.0
        } else {
            (1.0 - delta_minor.abs() as f64 / ceiling as f64).max(0.0)
        }
    };

    let days_off = (txn.posted_date - invoice.due_date).num_days().abs();
    let date_score = (1.0 - days_off as f64 / config.date_window_days as f64).max(0.0);

    let w = &config.weights;
    let confidence = (w.name * name_score + w.amount * amount_score + w.date * date_score)
        .clamp(0.0, 1.0);

    // A fee-shaped delta only earns the fee-adjusted tier when the names
    // agree too; an unrelated payee with a coincidental delta stays fuzzy.
    let fee_confirmed = inferred_fee.is_some() && name_score >= config.fee_name_floor;

    let tier = if delta_minor == 0 && name_score >= config.exact_name_threshold {
        MatchTier::Exact
    } else if fee_confirmed && confidence >= config.acceptance_threshold {
        MatchTier::FeeAdjusted
    } else if confidence >= config.acceptance_threshold {
        MatchTier::Fuzzy
    } else {
        return None;
    };

    Some(ScoredCandidate {
        invoice_id: invoice.source_id.clone(),
        transaction_id: txn.transaction_id.clone(),
        name_score,
        amount_score,
        date_score,
        confidence,
        tier,
        amount_delta_minor: delta_minor,
        inferred_fee_minor: if tier == MatchTier::FeeAdjusted {
            inferred_fee
        } else {
            None
        },
    })
}

/// Check whether `gross - paid` is explained by a configured gateway fee
/// formula for the currency. Returns the inferred fee in minor units.
fn detect_fee_delta(
    gross_minor: i64,
    paid_minor: i64,
    currency: &str,
    config: &MatcherConfig,
) -> Option<i64> {
    if paid_minor >= gross_minor || paid_minor <= 0 {
        return None;
    }
    let profile = config.fee_profile(currency)?;
    let expected = expected_net_minor(gross_minor, profile)?;
    if (paid_minor - expected).abs() <= profile.tolerance_minor {
        Some(gross_minor - paid_minor)
    } else {
        None
    }
}

fn expected_net_minor(gross_minor: i64, profile: &FeeProfile) -> Option<i64> {
    let gross = Decimal::from(gross_minor);
    let after_percent = (gross * (Decimal::ONE - profile.percent))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    after_percent.to_i64().map(|n| n - profile.fixed_minor)
}
