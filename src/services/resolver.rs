//! Conflict-free assignment selection.
//!
//! Maximum-weight bipartite matching resolved greedily: candidates are
//! processed in descending (tier, confidence) order with identifier
//! tie-breaks, so the outcome is reproducible regardless of input order.
//! The commit loop is sequential; that is what preserves the
//! conflict-free invariant.

use crate::config::MatcherConfig;
use crate::models::{
    AssignmentKind, BankTransactionRecord, InvoiceRecord, MatchAssignment, ScoredCandidate,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Resolve the scored candidate set into a conflict-free assignment set.
/// Every input record ends in exactly one terminal state; absence of a
/// match is the normal unmatched outcome, never an error.
pub fn resolve_assignments(
    scored: &[ScoredCandidate],
    invoices: &[InvoiceRecord],
    transactions: &[BankTransactionRecord],
    config: &MatcherConfig,
) -> Vec<MatchAssignment> {
    let mut ordered: Vec<&ScoredCandidate> = scored.iter().collect();
    ordered.sort_by(|a, b| {
        b.tier
            .rank()
            .cmp(&a.tier.rank())
            .then_with(|| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal))
            .then_with(|| a.invoice_id.cmp(&b.invoice_id))
            .then_with(|| a.transaction_id.cmp(&b.transaction_id))
    });

    let mut taken_invoices: HashSet<&str> = HashSet::new();
    let mut taken_transactions: HashSet<&str> = HashSet::new();
    let mut assignments = Vec::new();

    // One-to-one pass. A candidate whose amount does not reconcile at all
    // (zero amount score, outside fee tolerance) cannot form a one-to-one
    // match; it stays available as a one-to-many leg.
    for candidate in &ordered {
        if candidate.amount_score <= 0.0 {
            continue;
        }
        if taken_invoices.contains(candidate.invoice_id.as_str())
            || taken_transactions.contains(candidate.transaction_id.as_str())
        {
            continue;
        }
        taken_invoices.insert(&candidate.invoice_id);
        taken_transactions.insert(&candidate.transaction_id);
        assignments.push(MatchAssignment::from_candidate(candidate, AssignmentKind::OneToOne));
    }

    let invoice_amounts: HashMap<&str, i64> = invoices
        .iter()
        .map(|i| (i.source_id.as_str(), i.amount_minor))
        .collect();
    let transaction_amounts: HashMap<&str, i64> = transactions
        .iter()
        .map(|t| (t.transaction_id.as_str(), t.amount_minor.abs()))
        .collect();

    // Partial payments: several transactions settling one invoice.
    let mut by_invoice: BTreeMap<&str, Vec<&ScoredCandidate>> = BTreeMap::new();
    for candidate in &ordered {
        if !taken_invoices.contains(candidate.invoice_id.as_str())
            && !taken_transactions.contains(candidate.transaction_id.as_str())
        {
            by_invoice
                .entry(candidate.invoice_id.as_str())
                .or_default()
                .push(candidate);
        }
    }
    for (invoice_id, candidates) in by_invoice {
        let Some(&target) = invoice_amounts.get(invoice_id) else {
            continue;
        };
        let legs = accumulate_legs(
            &candidates,
            target,
            config.partial_sum_tolerance_minor,
            |c| &c.transaction_id,
            &taken_transactions,
            &transaction_amounts,
        );
        if legs.len() >= 2 {
            taken_invoices.insert(invoice_id);
            for leg in legs {
                taken_transactions.insert(&leg.transaction_id);
                assignments
                    .push(MatchAssignment::from_candidate(leg, AssignmentKind::PartialPayment));
            }
        }
    }

    // Split settlements: one transaction covering several invoices.
    let mut by_transaction: BTreeMap<&str, Vec<&ScoredCandidate>> = BTreeMap::new();
    for candidate in &ordered {
        if !taken_invoices.contains(candidate.invoice_id.as_str())
            && !taken_transactions.contains(candidate.transaction_id.as_str())
        {
            by_transaction
                .entry(candidate.transaction_id.as_str())
                .or_default()
                .push(candidate);
        }
    }
    for (transaction_id, candidates) in by_transaction {
        let Some(&target) = transaction_amounts.get(transaction_id) else {
            continue;
        };
        let legs = accumulate_legs(
            &candidates,
            target,
            config.partial_sum_tolerance_minor,
            |c| &c.invoice_id,
            &taken_invoices,
            &invoice_amounts,
        );
        if legs.len() >= 2 {
            taken_transactions.insert(transaction_id);
            for leg in legs {
                taken_invoices.insert(&leg.invoice_id);
                assignments
                    .push(MatchAssignment::from_candidate(leg, AssignmentKind::PartialPayment));
            }
        }
    }

    // Everything left is a terminal unmatched outcome, emitted in
    // identifier order.
    let mut leftover_invoices: Vec<&InvoiceRecord> = invoices
        .iter()
        .filter(|i| !taken_invoices.contains(i.source_id.as_str()))
        .collect();
    leftover_invoices.sort_by(|a, b| a.source_id.cmp(&b.source_id));
    for invoice in leftover_invoices {
        assignments.push(MatchAssignment::unmatched_invoice(&invoice.source_id));
    }

    let mut leftover_transactions: Vec<&BankTransactionRecord> = transactions
        .iter()
        .filter(|t| !taken_transactions.contains(t.transaction_id.as_str()))
        .collect();
    leftover_transactions.sort_by(|a, b| a.transaction_id.cmp(&b.transaction_id));
    for txn in leftover_transactions {
        assignments.push(MatchAssignment::unmatched_transaction(&txn.transaction_id));
    }

    assignments
}

/// Greedily accumulate legs (already in tier/confidence order) until the
/// amounts sum to the target within tolerance. Returns the accepted legs,
/// or an empty vector when the sum never lands inside the tolerance.
fn accumulate_legs<'a>(
    candidates: &[&'a ScoredCandidate],
    target_minor: i64,
    tolerance_minor: i64,
    leg_id: impl Fn(&ScoredCandidate) -> &String,
    taken: &HashSet<&str>,
    amounts: &HashMap<&str, i64>,
) -> Vec<&'a ScoredCandidate> {
    let mut legs: Vec<&ScoredCandidate> = Vec::new();
    let mut seen_legs: HashSet<&str> = HashSet::new();
    let mut sum = 0i64;

    for candidate in candidates {
        let id = leg_id(candidate).as_str();
        if taken.contains(id) || seen_legs.contains(id) {
            continue;
        }
        let Some(&amount) = amounts.get(id) else {
            continue;
        };
        if sum + amount <= target_minor + tolerance_minor {
            legs.push(candidate);
            seen_legs.insert(id);
            sum += amount;
            if (target_minor - sum).abs() <= tolerance_minor {
                return legs;
            }
        }
    }

    Vec::new()
}
