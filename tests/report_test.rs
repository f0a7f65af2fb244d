//! Report partitioning, summary totals, and serialization.

mod common;

use common::{engine, invoice, transaction};
use reconciliation_core::models::{MatchTier, ReconciliationReport};
use uuid::Uuid;

/// One of each outcome: an exact match, a fee-adjusted match, an
/// unmatched invoice, an unmatched transaction, and an unprocessable
/// invoice.
fn mixed_report(tenant: &Uuid) -> std::sync::Arc<ReconciliationReport> {
    engine()
        .reconcile_tenant(
            *tenant,
            &[
                invoice(tenant, "inv-exact", "Acme Corp Inc", "50.00", "2024-03-01"),
                invoice(tenant, "inv-fee", "Globex Ltd", "100.00", "2024-03-05"),
                invoice(tenant, "inv-lost", "Wayne Enterprises", "75.00", "2024-03-10"),
                invoice(tenant, "inv-bad", "Umbrella Co", "not-a-number", "2024-03-01"),
            ],
            &[
                transaction(tenant, "txn-exact", "ACME CORP", "50.00", "2024-03-02"),
                transaction(tenant, "txn-fee", "GLOBEX", "96.80", "2024-03-06"),
                transaction(tenant, "txn-stray", "Stark Industries", "12.34", "2024-03-12"),
            ],
        )
        .unwrap()
}

#[test]
fn every_record_lands_in_exactly_one_partition() {
    let tenant = Uuid::new_v4();
    let report = mixed_report(&tenant);

    assert_eq!(report.matched.len(), 2);
    assert!(report.partial.is_empty());
    assert_eq!(report.unmatched_invoices.len(), 1);
    assert_eq!(report.unmatched_invoices[0].source_id, "inv-lost");
    assert_eq!(report.unmatched_transactions.len(), 1);
    assert_eq!(report.unmatched_transactions[0].transaction_id, "txn-stray");
    assert_eq!(report.unprocessable.len(), 1);
    assert_eq!(report.unprocessable[0].identifier, "inv-bad");

    // The unprocessable invoice is a data-quality issue, not an
    // unmatched outcome.
    assert!(report
        .unmatched_invoices
        .iter()
        .all(|i| i.source_id != "inv-bad"));

    let tiers: Vec<MatchTier> = report.matched.iter().map(|m| m.tier).collect();
    assert!(tiers.contains(&MatchTier::Exact));
    assert!(tiers.contains(&MatchTier::FeeAdjusted));
}

#[test]
fn summary_totals_are_consistent_with_the_partitions() {
    let tenant = Uuid::new_v4();
    let report = mixed_report(&tenant);
    let summary = &report.summary;

    assert_eq!(summary.invoice_count, 3);
    assert_eq!(summary.transaction_count, 3);
    assert_eq!(summary.matched_count, 2);
    assert_eq!(summary.unmatched_invoice_count, 1);
    assert_eq!(summary.unmatched_transaction_count, 1);
    assert_eq!(summary.unprocessable_count, 1);

    assert_eq!(summary.total_invoiced_minor, 5_000 + 10_000 + 7_500);
    assert_eq!(summary.total_matched_invoice_minor, 15_000);
    assert_eq!(summary.total_unmatched_invoice_minor, 7_500);
    assert_eq!(summary.total_unmatched_transaction_minor, 1_234);
    assert_eq!(
        summary.total_matched_invoice_minor + summary.total_unmatched_invoice_minor,
        summary.total_invoiced_minor
    );
}

#[test]
fn matched_entries_carry_audit_explanations() {
    let tenant = Uuid::new_v4();
    let report = mixed_report(&tenant);

    let fee_entry = report
        .matched
        .iter()
        .find(|m| m.tier == MatchTier::FeeAdjusted)
        .unwrap();
    assert_eq!(fee_entry.amount_delta_minor, 320);
    assert_eq!(fee_entry.inferred_fee_minor, Some(320));
    assert!(fee_entry.name_score >= 0.99);
    assert!(fee_entry.confidence > 0.6 && fee_entry.confidence <= 1.0);
}

#[test]
fn report_serializes_for_the_export_layer() {
    let tenant = Uuid::new_v4();
    let report = mixed_report(&tenant);

    let json = serde_json::to_value(&*report).unwrap();
    assert_eq!(json["tenant_id"], serde_json::json!(tenant));
    assert_eq!(json["summary"]["matched_count"], 2);

    let tiers: Vec<&str> = json["matched"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["tier"].as_str().unwrap())
        .collect();
    assert!(tiers.contains(&"exact"));
    assert!(tiers.contains(&"fee_adjusted"));

    // Round-trips losslessly.
    let back: ReconciliationReport = serde_json::from_value(json).unwrap();
    assert_eq!(back, *report);
}
