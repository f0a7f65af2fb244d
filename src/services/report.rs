//! Report aggregation.
//!
//! Pure assembly of the resolver's assignment set into the exportable,
//! audit-ready report. Scores are carried through, never recomputed.

use crate::models::{
    AssignmentKind, BankTransactionRecord, InvoiceRecord, MatchAssignment, MatchTier,
    MatchedEntry, PartialLeg, PartialMatchGroup, ReconciliationReport, ReportSummary,
    UnprocessableRecord,
};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Build the report for one tenant's finished run.
pub fn build_report(
    tenant_id: Uuid,
    assignments: &[MatchAssignment],
    invoices: &[InvoiceRecord],
    transactions: &[BankTransactionRecord],
    unprocessable: Vec<UnprocessableRecord>,
) -> ReconciliationReport {
    let invoice_index: HashMap<&str, &InvoiceRecord> = invoices
        .iter()
        .map(|i| (i.source_id.as_str(), i))
        .collect();
    let transaction_index: HashMap<&str, &BankTransactionRecord> = transactions
        .iter()
        .map(|t| (t.transaction_id.as_str(), t))
        .collect();

    let mut matched = Vec::new();
    let mut unmatched_invoices = Vec::new();
    let mut unmatched_transactions = Vec::new();
    let mut partial_legs: Vec<&MatchAssignment> = Vec::new();

    for assignment in assignments {
        match (assignment.kind, assignment.tier) {
            (AssignmentKind::PartialPayment, _) => partial_legs.push(assignment),
            (AssignmentKind::OneToOne, MatchTier::Unmatched) => {
                if let Some(id) = &assignment.invoice_id {
                    if let Some(invoice) = invoice_index.get(id.as_str()) {
                        unmatched_invoices.push((*invoice).clone());
                    }
                }
                if let Some(id) = &assignment.transaction_id {
                    if let Some(txn) = transaction_index.get(id.as_str()) {
                        unmatched_transactions.push((*txn).clone());
                    }
                }
            }
            (AssignmentKind::OneToOne, _) => {
                let (Some(invoice_id), Some(transaction_id)) =
                    (&assignment.invoice_id, &assignment.transaction_id)
                else {
                    continue;
                };
                let (Some(invoice), Some(txn)) = (
                    invoice_index.get(invoice_id.as_str()),
                    transaction_index.get(transaction_id.as_str()),
                ) else {
                    continue;
                };
                matched.push(MatchedEntry {
                    invoice: (*invoice).clone(),
                    transaction: (*txn).clone(),
                    tier: assignment.tier,
                    confidence: assignment.confidence,
                    name_score: assignment.name_score,
                    amount_delta_minor: assignment.amount_delta_minor,
                    inferred_fee_minor: assignment.inferred_fee_minor,
                });
            }
        }
    }

    let partial = group_partial_legs(&partial_legs, &invoice_index, &transaction_index);

    let total_invoiced_minor: i64 = invoices.iter().map(|i| i.amount_minor).sum();
    let total_matched_invoice_minor: i64 = matched.iter().map(|m| m.invoice.amount_minor).sum::<i64>()
        + partial.iter().map(|g| g.total_invoiced_minor).sum::<i64>();
    let total_unmatched_invoice_minor: i64 =
        unmatched_invoices.iter().map(|i| i.amount_minor).sum();
    let total_unmatched_transaction_minor: i64 = unmatched_transactions
        .iter()
        .map(|t| t.amount_minor.abs())
        .sum();

    let summary = ReportSummary {
        invoice_count: invoices.len(),
        transaction_count: transactions.len(),
        matched_count: matched.len(),
        partial_group_count: partial.len(),
        unmatched_invoice_count: unmatched_invoices.len(),
        unmatched_transaction_count: unmatched_transactions.len(),
        unprocessable_count: unprocessable.len(),
        total_invoiced_minor,
        total_matched_invoice_minor,
        total_unmatched_invoice_minor,
        total_unmatched_transaction_minor,
    };

    ReconciliationReport {
        tenant_id,
        matched,
        partial,
        unmatched_invoices,
        unmatched_transactions,
        unprocessable,
        summary,
    }
}

/// Rebuild one-to-many groups from flat partial-payment assignments.
/// Legs sharing an invoice form an invoice-anchored group; the remainder
/// share a transaction.
fn group_partial_legs(
    legs: &[&MatchAssignment],
    invoice_index: &HashMap<&str, &InvoiceRecord>,
    transaction_index: &HashMap<&str, &BankTransactionRecord>,
) -> Vec<PartialMatchGroup> {
    let mut by_invoice: BTreeMap<&str, Vec<&MatchAssignment>> = BTreeMap::new();
    for leg in legs {
        if let Some(invoice_id) = &leg.invoice_id {
            by_invoice.entry(invoice_id.as_str()).or_default().push(leg);
        }
    }

    let mut groups = Vec::new();
    let mut txn_anchored: BTreeMap<&str, Vec<&MatchAssignment>> = BTreeMap::new();

    for group_legs in by_invoice.into_values() {
        if group_legs.len() > 1 {
            groups.push(build_group(&group_legs, invoice_index, transaction_index));
        } else if let Some(transaction_id) = &group_legs[0].transaction_id {
            txn_anchored
                .entry(transaction_id.as_str())
                .or_default()
                .push(group_legs[0]);
        }
    }

    for (_, group_legs) in txn_anchored {
        groups.push(build_group(&group_legs, invoice_index, transaction_index));
    }

    groups
}

fn build_group(
    legs: &[&MatchAssignment],
    invoice_index: &HashMap<&str, &InvoiceRecord>,
    transaction_index: &HashMap<&str, &BankTransactionRecord>,
) -> PartialMatchGroup {
    let mut invoices: Vec<InvoiceRecord> = Vec::new();
    let mut transactions: Vec<BankTransactionRecord> = Vec::new();
    let mut out_legs = Vec::new();

    for leg in legs {
        let (Some(invoice_id), Some(transaction_id)) = (&leg.invoice_id, &leg.transaction_id)
        else {
            continue;
        };
        if let Some(invoice) = invoice_index.get(invoice_id.as_str()) {
            if !invoices.iter().any(|i| &i.source_id == invoice_id) {
                invoices.push((*invoice).clone());
            }
        }
        if let Some(txn) = transaction_index.get(transaction_id.as_str()) {
            if !transactions.iter().any(|t| &t.transaction_id == transaction_id) {
                transactions.push((*txn).clone());
            }
        }
        out_legs.push(PartialLeg {
            invoice_id: invoice_id.clone(),
            transaction_id: transaction_id.clone(),
            tier: leg.tier,
            confidence: leg.confidence,
            name_score: leg.name_score,
        });
    }

    let total_invoiced_minor: i64 = invoices.iter().map(|i| i.amount_minor).sum();
    let total_paid_minor: i64 = transactions.iter().map(|t| t.amount_minor.abs()).sum();

    PartialMatchGroup {
        invoices,
        transactions,
        legs: out_legs,
        total_invoiced_minor,
        total_paid_minor,
        residual_minor: total_invoiced_minor - total_paid_minor,
    }
}
