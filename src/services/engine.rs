//! Pipeline orchestration and the per-tenant report registry.
//!
//! One run is normalizer -> candidate generator -> scorer -> resolver ->
//! report builder. Each stage consumes the previous stage's full output
//! and produces new immutable values. Distinct tenants share nothing and
//! run in parallel; within a run the resolver commit is sequential.

use crate::config::MatcherConfig;
use crate::error::ReconError;
use crate::models::{
    BankTransactionRecord, InvoiceRecord, RawBankTransaction, RawInvoice, ReconciliationReport,
    RecordKind, ScoredCandidate, UnprocessableRecord,
};
use crate::services::similarity::{NameSimilarity, TokenSetSimilarity};
use crate::services::{candidates, metrics, normalizer, report, resolver, scorer};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// One tenant's raw input for a reconciliation run.
#[derive(Debug, Clone)]
pub struct TenantBatch {
    pub tenant_id: Uuid,
    pub invoices: Vec<RawInvoice>,
    pub transactions: Vec<RawBankTransaction>,
}

struct EngineInner {
    config: MatcherConfig,
    similarity: Arc<dyn NameSimilarity>,
    reports: RwLock<HashMap<Uuid, Arc<ReconciliationReport>>>,
}

/// Reconciliation engine. Cheap to clone; clones share the report
/// registry.
#[derive(Clone)]
pub struct ReconciliationEngine {
    inner: Arc<EngineInner>,
}

impl ReconciliationEngine {
    /// Create an engine with the default token-set similarity.
    pub fn new(config: MatcherConfig) -> Result<Self, ReconError> {
        Self::with_similarity(config, Arc::new(TokenSetSimilarity))
    }

    /// Create an engine with a caller-supplied similarity function.
    pub fn with_similarity(
        config: MatcherConfig,
        similarity: Arc<dyn NameSimilarity>,
    ) -> Result<Self, ReconError> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                similarity,
                reports: RwLock::new(HashMap::new()),
            }),
        })
    }

    /// Run the full pipeline for one tenant. Per-record normalization
    /// failures are isolated into the unprocessable bucket; the run
    /// completes regardless. Fails only on structurally invalid input.
    #[instrument(skip(self, invoices, transactions), fields(tenant_id = %tenant_id))]
    pub fn reconcile_tenant(
        &self,
        tenant_id: Uuid,
        invoices: &[RawInvoice],
        transactions: &[RawBankTransaction],
    ) -> Result<Arc<ReconciliationReport>, ReconError> {
        let started = Instant::now();
        let config = &self.inner.config;

        let mut unprocessable = Vec::new();
        let typed_invoices =
            self.normalize_invoices(tenant_id, invoices, &mut unprocessable)?;
        let typed_transactions =
            self.normalize_transactions(tenant_id, transactions, &mut unprocessable)?;

        let pairs = candidates::generate_candidates(&typed_invoices, &typed_transactions, config);
        metrics::record_candidates(pairs.len());

        let invoice_index: HashMap<&str, &InvoiceRecord> = typed_invoices
            .iter()
            .map(|i| (i.source_id.as_str(), i))
            .collect();
        let transaction_index: HashMap<&str, &BankTransactionRecord> = typed_transactions
            .iter()
            .map(|t| (t.transaction_id.as_str(), t))
            .collect();

        let scored: Vec<ScoredCandidate> = pairs
            .iter()
            .filter_map(|pair| {
                let invoice = invoice_index.get(pair.invoice_id.as_str())?;
                let txn = transaction_index.get(pair.transaction_id.as_str())?;
                scorer::score_candidate(invoice, txn, self.inner.similarity.as_ref(), config)
            })
            .collect();

        let assignments =
            resolver::resolve_assignments(&scored, &typed_invoices, &typed_transactions, config);
        for assignment in &assignments {
            metrics::record_assignment(assignment.tier.as_str());
        }

        let report = Arc::new(report::build_report(
            tenant_id,
            &assignments,
            &typed_invoices,
            &typed_transactions,
            unprocessable,
        ));

        self.inner
            .reports
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(tenant_id, Arc::clone(&report));

        metrics::record_run("completed");
        metrics::record_run_duration(started.elapsed().as_secs_f64());
        info!(
            candidate_pairs = pairs.len(),
            matched = report.summary.matched_count,
            partial_groups = report.summary.partial_group_count,
            unmatched_invoices = report.summary.unmatched_invoice_count,
            unmatched_transactions = report.summary.unmatched_transaction_count,
            unprocessable = report.summary.unprocessable_count,
            "Reconciliation run completed"
        );

        Ok(report)
    }

    /// Reconcile a set of independent tenants in parallel. Fails with a
    /// reconciliation error when the batch set is empty.
    pub async fn reconcile_batches(
        &self,
        batches: Vec<TenantBatch>,
    ) -> Result<Vec<Arc<ReconciliationReport>>, ReconError> {
        if batches.is_empty() {
            metrics::record_run("rejected");
            return Err(ReconError::Reconciliation(anyhow::anyhow!(
                "no tenants supplied for reconciliation"
            )));
        }

        let tasks: Vec<_> = batches
            .into_iter()
            .map(|batch| {
                let engine = self.clone();
                tokio::task::spawn_blocking(move || {
                    engine.reconcile_tenant(batch.tenant_id, &batch.invoices, &batch.transactions)
                })
            })
            .collect();

        let mut reports = Vec::with_capacity(tasks.len());
        for joined in futures::future::join_all(tasks).await {
            let report = joined.map_err(|e| {
                ReconError::Reconciliation(anyhow::anyhow!("reconciliation worker failed: {e}"))
            })??;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Read-only access to the most recent report for a tenant. This is
    /// the query surface consumed by downstream layers.
    pub fn latest_report(&self, tenant_id: &Uuid) -> Option<Arc<ReconciliationReport>> {
        self.inner
            .reports
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(tenant_id)
            .cloned()
    }

    fn normalize_invoices(
        &self,
        tenant_id: Uuid,
        invoices: &[RawInvoice],
        unprocessable: &mut Vec<UnprocessableRecord>,
    ) -> Result<Vec<InvoiceRecord>, ReconError> {
        let mut typed = Vec::with_capacity(invoices.len());
        for raw in invoices {
            if raw.tenant_id != tenant_id {
                return Err(ReconError::Reconciliation(anyhow::anyhow!(
                    "invoice {} belongs to tenant {}, expected {}",
                    raw.source_id,
                    raw.tenant_id,
                    tenant_id
                )));
            }
            match normalizer::normalize_invoice(raw) {
                Ok(record) => typed.push(record),
                Err(error) => {
                    warn!(source_id = %raw.source_id, error = %error, "Invoice failed normalization");
                    metrics::record_unprocessable(RecordKind::Invoice.as_str());
                    unprocessable.push(UnprocessableRecord {
                        kind: RecordKind::Invoice,
                        identifier: raw.source_id.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }
        Ok(typed)
    }

    fn normalize_transactions(
        &self,
        tenant_id: Uuid,
        transactions: &[RawBankTransaction],
        unprocessable: &mut Vec<UnprocessableRecord>,
    ) -> Result<Vec<BankTransactionRecord>, ReconError> {
        let mut typed = Vec::with_capacity(transactions.len());
        for raw in transactions {
            if raw.tenant_id != tenant_id {
                return Err(ReconError::Reconciliation(anyhow::anyhow!(
                    "transaction {} belongs to tenant {}, expected {}",
                    raw.transaction_id,
                    raw.tenant_id,
                    tenant_id
                )));
            }
            match normalizer::normalize_transaction(raw) {
                Ok(record) => typed.push(record),
                Err(error) => {
                    warn!(transaction_id = %raw.transaction_id, error = %error, "Transaction failed normalization");
                    metrics::record_unprocessable(RecordKind::BankTransaction.as_str());
                    unprocessable.push(UnprocessableRecord {
                        kind: RecordKind::BankTransaction,
                        identifier: raw.transaction_id.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }
        Ok(typed)
    }
}
