//! Conflict resolution, determinism, and one-to-many scenarios.

mod common;

use common::{engine, invoice, transaction};
use reconciliation_core::models::{MatchTier, RawBankTransaction, RawInvoice};
use std::collections::HashSet;
use uuid::Uuid;

#[test]
fn assignments_are_conflict_free() {
    let tenant = Uuid::new_v4();
    let report = engine()
        .reconcile_tenant(
            tenant,
            &[
                invoice(&tenant, "inv-a", "Acme Corp", "50.00", "2024-03-01"),
                invoice(&tenant, "inv-b", "Acme Corp", "50.00", "2024-03-01"),
            ],
            &[
                transaction(&tenant, "txn-a", "ACME CORP", "50.00", "2024-03-01"),
                transaction(&tenant, "txn-b", "ACME CORP", "50.00", "2024-03-01"),
            ],
        )
        .unwrap();

    assert_eq!(report.matched.len(), 2);
    let invoice_ids: HashSet<&str> = report
        .matched
        .iter()
        .map(|m| m.invoice.source_id.as_str())
        .collect();
    let transaction_ids: HashSet<&str> = report
        .matched
        .iter()
        .map(|m| m.transaction.transaction_id.as_str())
        .collect();
    assert_eq!(invoice_ids.len(), 2);
    assert_eq!(transaction_ids.len(), 2);

    // Indistinguishable candidates break ties by identifier.
    assert_eq!(report.matched[0].invoice.source_id, "inv-a");
    assert_eq!(report.matched[0].transaction.transaction_id, "txn-a");
}

#[test]
fn higher_tier_wins_over_higher_confidence() {
    let tenant = Uuid::new_v4();
    // The fee-adjusted candidate posts on the due date and carries the
    // higher composite; the exact candidate posts four days late. Tier
    // ordering must still prefer the exact pairing.
    let report = engine()
        .reconcile_tenant(
            tenant,
            &[invoice(&tenant, "inv-1", "Acme Corp", "100.00", "2024-03-01")],
            &[
                transaction(&tenant, "txn-exact", "ACME CORP", "100.00", "2024-03-05"),
                transaction(&tenant, "txn-fee", "ACME CORP", "96.80", "2024-03-01"),
            ],
        )
        .unwrap();

    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.matched[0].tier, MatchTier::Exact);
    assert_eq!(report.matched[0].transaction.transaction_id, "txn-exact");
    assert_eq!(report.unmatched_transactions.len(), 1);
    assert_eq!(
        report.unmatched_transactions[0].transaction_id,
        "txn-fee"
    );
}

fn permutation_fixture(tenant: &Uuid) -> (Vec<RawInvoice>, Vec<RawBankTransaction>) {
    let invoices = vec![
        invoice(tenant, "inv-1", "Acme Corp", "50.00", "2024-03-01"),
        invoice(tenant, "inv-2", "Globex Ltd", "100.00", "2024-03-04"),
        invoice(tenant, "inv-3", "Initech LLC", "75.25", "2024-03-06"),
        invoice(tenant, "inv-4", "Wayne Enterprises", "20.00", "2024-03-08"),
    ];
    let transactions = vec![
        transaction(tenant, "txn-1", "ACME CORP", "50.00", "2024-03-02"),
        transaction(tenant, "txn-2", "GLOBEX", "96.80", "2024-03-05"),
        transaction(tenant, "txn-3", "INITECH PAYMENT", "75.25", "2024-03-06"),
        transaction(tenant, "txn-4", "STARK INDUSTRIES", "11.11", "2024-03-09"),
    ];
    (invoices, transactions)
}

#[test]
fn rerunning_identical_input_is_idempotent() {
    let tenant = Uuid::new_v4();
    let engine = engine();
    let (invoices, transactions) = permutation_fixture(&tenant);

    let first = engine
        .reconcile_tenant(tenant, &invoices, &transactions)
        .unwrap();
    let second = engine
        .reconcile_tenant(tenant, &invoices, &transactions)
        .unwrap();

    assert_eq!(*first, *second);
}

#[test]
fn input_permutation_does_not_change_the_outcome() {
    let tenant = Uuid::new_v4();
    let engine = engine();
    let (mut invoices, mut transactions) = permutation_fixture(&tenant);

    let baseline = engine
        .reconcile_tenant(tenant, &invoices, &transactions)
        .unwrap();

    invoices.reverse();
    transactions.reverse();
    invoices.swap(0, 2);
    let shuffled = engine
        .reconcile_tenant(tenant, &invoices, &transactions)
        .unwrap();

    assert_eq!(baseline.matched, shuffled.matched);
    assert_eq!(baseline.partial, shuffled.partial);
    assert_eq!(baseline.unmatched_invoices, shuffled.unmatched_invoices);
    assert_eq!(
        baseline.unmatched_transactions,
        shuffled.unmatched_transactions
    );
}

#[test]
fn partial_payments_summing_to_the_invoice_form_a_group() {
    let tenant = Uuid::new_v4();
    let report = engine()
        .reconcile_tenant(
            tenant,
            &[invoice(&tenant, "inv-1", "Globex Ltd", "100.00", "2024-03-01")],
            &[
                transaction(&tenant, "txn-a", "GLOBEX PAYMENT", "60.00", "2024-03-01"),
                transaction(&tenant, "txn-b", "GLOBEX PAYMENT", "40.00", "2024-03-01"),
            ],
        )
        .unwrap();

    assert!(report.matched.is_empty());
    assert_eq!(report.partial.len(), 1);
    let group = &report.partial[0];
    assert_eq!(group.invoices.len(), 1);
    assert_eq!(group.transactions.len(), 2);
    assert_eq!(group.legs.len(), 2);
    assert_eq!(group.total_paid_minor, 10_000);
    assert_eq!(group.residual_minor, 0);
    assert!(report.unmatched_invoices.is_empty());
    assert!(report.unmatched_transactions.is_empty());
}

#[test]
fn one_transaction_settling_two_invoices_forms_a_group() {
    let tenant = Uuid::new_v4();
    let report = engine()
        .reconcile_tenant(
            tenant,
            &[
                invoice(&tenant, "inv-a", "Initech", "30.00", "2024-03-01"),
                invoice(&tenant, "inv-b", "Initech", "70.00", "2024-03-01"),
            ],
            &[transaction(&tenant, "txn-1", "INITECH", "100.00", "2024-03-01")],
        )
        .unwrap();

    assert!(report.matched.is_empty());
    assert_eq!(report.partial.len(), 1);
    let group = &report.partial[0];
    assert_eq!(group.invoices.len(), 2);
    assert_eq!(group.transactions.len(), 1);
    assert_eq!(group.total_invoiced_minor, 10_000);
    assert_eq!(group.residual_minor, 0);
}

#[test]
fn no_partial_group_when_the_sum_does_not_reconcile() {
    let tenant = Uuid::new_v4();
    let report = engine()
        .reconcile_tenant(
            tenant,
            &[invoice(&tenant, "inv-1", "Globex Ltd", "100.00", "2024-03-01")],
            &[
                transaction(&tenant, "txn-a", "GLOBEX PAYMENT", "60.00", "2024-03-01"),
                transaction(&tenant, "txn-b", "GLOBEX PAYMENT", "30.00", "2024-03-01"),
            ],
        )
        .unwrap();

    assert!(report.partial.is_empty());
    assert_eq!(report.unmatched_invoices.len(), 1);
    assert_eq!(report.unmatched_transactions.len(), 2);
}
