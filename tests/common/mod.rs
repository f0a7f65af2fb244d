//! Common test utilities for reconciliation-core integration tests.

#![allow(dead_code)]

use reconciliation_core::config::MatcherConfig;
use reconciliation_core::models::{RawBankTransaction, RawInvoice};
use reconciliation_core::services::ReconciliationEngine;
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,reconciliation_core=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Engine with default configuration.
pub fn engine() -> ReconciliationEngine {
    init_tracing();
    ReconciliationEngine::new(MatcherConfig::default()).expect("default config is valid")
}

pub fn invoice(
    tenant_id: &Uuid,
    source_id: &str,
    vendor_name: &str,
    amount: &str,
    due_date: &str,
) -> RawInvoice {
    RawInvoice {
        source_id: source_id.to_string(),
        tenant_id: *tenant_id,
        vendor_name: vendor_name.to_string(),
        amount: amount.to_string(),
        currency: "USD".to_string(),
        due_date: due_date.to_string(),
    }
}

pub fn transaction(
    tenant_id: &Uuid,
    transaction_id: &str,
    counterparty: &str,
    amount: &str,
    posted_date: &str,
) -> RawBankTransaction {
    RawBankTransaction {
        transaction_id: transaction_id.to_string(),
        tenant_id: *tenant_id,
        counterparty: counterparty.to_string(),
        amount: amount.to_string(),
        currency: "USD".to_string(),
        posted_date: posted_date.to_string(),
    }
}
