//! Canonicalization of extractor and ingester output into typed records.
//!
//! Every function here is a pure function of its input. A record that
//! fails normalization is excluded from the run and reported as a
//! data-quality issue; it never aborts the run.

use crate::error::ReconError;
use crate::models::{BankTransactionRecord, InvoiceRecord, RawBankTransaction, RawInvoice};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Trailing legal-entity tokens stripped from vendor labels.
const LEGAL_SUFFIXES: &[&str] = &[
    "inc", "llc", "ltd", "limited", "corp", "corporation", "co", "company", "gmbh", "plc", "pvt",
    "pte", "sa",
];

static AMOUNT_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$€£₹,\s]").expect("valid regex"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d %b %Y"];

/// Canonicalize a vendor or counterparty label: case-fold, drop
/// punctuation, collapse whitespace, strip trailing legal-entity suffixes.
pub fn normalize_label(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    // Strip suffixes from the end only, so embedded words survive
    // ("Corporate Travel Inc" keeps "corporate travel").
    while tokens.len() > 1 {
        match tokens.last() {
            Some(last) if LEGAL_SUFFIXES.contains(last) => {
                tokens.pop();
            }
            _ => break,
        }
    }

    tokens.join(" ")
}

/// Parse a raw amount string into minor units (cents).
pub fn parse_amount_minor(raw: &str, allow_negative: bool) -> Result<i64, ReconError> {
    let cleaned = AMOUNT_NOISE.replace_all(raw.trim(), "");
    if cleaned.is_empty() {
        return Err(ReconError::InvalidAmount(format!("empty amount {raw:?}")));
    }

    let value = Decimal::from_str(&cleaned)
        .map_err(|_| ReconError::InvalidAmount(format!("non-numeric amount {raw:?}")))?;

    if value.is_sign_negative() && !allow_negative {
        return Err(ReconError::InvalidAmount(format!(
            "negative amount not allowed: {raw:?}"
        )));
    }

    let minor = (value * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    minor
        .to_i64()
        .ok_or_else(|| ReconError::InvalidAmount(format!("amount out of range: {raw:?}")))
}

/// Parse a raw date string, accepting ISO dates plus the two formats
/// extractors commonly emit.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ReconError> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ReconError::InvalidDate(format!("unparseable date {raw:?}")))
}

fn normalize_currency(raw: &str) -> Result<String, ReconError> {
    let code = raw.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(ReconError::InvalidAmount(format!(
            "invalid currency code {raw:?}"
        )))
    }
}

/// Build a validated invoice record. Invoice amounts must be positive.
pub fn normalize_invoice(raw: &RawInvoice) -> Result<InvoiceRecord, ReconError> {
    let amount_minor = parse_amount_minor(&raw.amount, false)?;
    if amount_minor == 0 {
        return Err(ReconError::InvalidAmount(format!(
            "zero invoice amount for {}",
            raw.source_id
        )));
    }

    Ok(InvoiceRecord {
        source_id: raw.source_id.clone(),
        tenant_id: raw.tenant_id,
        vendor_name_raw: raw.vendor_name.clone(),
        vendor_name: normalize_label(&raw.vendor_name),
        amount_minor,
        currency: normalize_currency(&raw.currency)?,
        due_date: parse_date(&raw.due_date)?,
    })
}

/// Build a validated bank transaction record. Amounts are signed.
pub fn normalize_transaction(
    raw: &RawBankTransaction,
) -> Result<BankTransactionRecord, ReconError> {
    Ok(BankTransactionRecord {
        transaction_id: raw.transaction_id.clone(),
        tenant_id: raw.tenant_id,
        counterparty_raw: raw.counterparty.clone(),
        counterparty: normalize_label(&raw.counterparty),
        amount_minor: parse_amount_minor(&raw.amount, true)?,
        currency: normalize_currency(&raw.currency)?,
        posted_date: parse_date(&raw.posted_date)?,
    })
}
