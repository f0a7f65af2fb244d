//! Bounded candidate-pair generation.
//!
//! Transactions are bucketed by posted date and by absolute amount so
//! each invoice does two range scans instead of a full cross product. A
//! pair is generated when the transaction posts within the date window of
//! the invoice due date, or when the amount delta is non-zero but inside
//! the fee-tolerance ceiling (a fee-shaped delta can settle outside the
//! window). Equal-amount pairs are only reachable through the date
//! window; candidates outside both arms are a documented non-goal.

use crate::config::MatcherConfig;
use crate::models::{BankTransactionRecord, CandidatePair, InvoiceRecord};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Generate every candidate pair worth scoring for one tenant's records.
/// Output order is deterministic: (invoice id, transaction id).
pub fn generate_candidates(
    invoices: &[InvoiceRecord],
    transactions: &[BankTransactionRecord],
    config: &MatcherConfig,
) -> Vec<CandidatePair> {
    let mut by_date: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    let mut by_amount: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (index, txn) in transactions.iter().enumerate() {
        by_date.entry(txn.posted_date).or_default().push(index);
        by_amount
            .entry(txn.amount_minor.abs())
            .or_default()
            .push(index);
    }

    let window = Duration::days(config.date_window_days);
    let mut pairs = Vec::new();

    for invoice in invoices {
        let mut hits: BTreeSet<usize> = BTreeSet::new();

        let from = invoice
            .due_date
            .checked_sub_signed(window)
            .unwrap_or(invoice.due_date);
        let to = invoice
            .due_date
            .checked_add_signed(window)
            .unwrap_or(invoice.due_date);
        for (_, indices) in by_date.range(from..=to) {
            hits.extend(indices.iter().copied());
        }

        let ceiling = config.fee_ceiling_minor(invoice.amount_minor);
        let low = (invoice.amount_minor - ceiling).max(0);
        let high = invoice.amount_minor + ceiling;
        for (&amount, indices) in by_amount.range(low..=high) {
            if amount != invoice.amount_minor {
                hits.extend(indices.iter().copied());
            }
        }

        for index in hits {
            let txn = &transactions[index];
            if txn.tenant_id != invoice.tenant_id || txn.currency != invoice.currency {
                continue;
            }
            pairs.push(CandidatePair {
                invoice_id: invoice.source_id.clone(),
                transaction_id: txn.transaction_id.clone(),
            });
        }
    }

    pairs.sort_by(|a, b| {
        a.invoice_id
            .cmp(&b.invoice_id)
            .then_with(|| a.transaction_id.cmp(&b.transaction_id))
    });
    pairs
}
