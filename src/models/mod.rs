//! Domain models for the reconciliation core.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Boundary Models
// ============================================================================

/// Invoice as delivered by the external extractor. Amounts and dates are
/// raw strings; nothing is validated until the normalizer runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInvoice {
    pub source_id: String,
    pub tenant_id: Uuid,
    pub vendor_name: String,
    pub amount: String,
    pub currency: String,
    pub due_date: String,
}

/// Bank transaction as delivered by the external statement ingester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBankTransaction {
    pub transaction_id: String,
    pub tenant_id: Uuid,
    pub counterparty: String,
    pub amount: String,
    pub currency: String,
    pub posted_date: String,
}

// ============================================================================
// Normalized Records
// ============================================================================

/// Validated invoice record. Immutable once built by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub source_id: String,
    pub tenant_id: Uuid,
    pub vendor_name_raw: String,
    /// Canonicalized vendor name used for similarity scoring.
    pub vendor_name: String,
    pub amount_minor: i64,
    pub currency: String,
    pub due_date: NaiveDate,
}

/// Validated bank transaction record. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransactionRecord {
    pub transaction_id: String,
    pub tenant_id: Uuid,
    pub counterparty_raw: String,
    /// Canonicalized counterparty label used for similarity scoring.
    pub counterparty: String,
    /// Signed amount in minor units; matching compares magnitudes.
    pub amount_minor: i64,
    pub currency: String,
    pub posted_date: NaiveDate,
}

/// A record the normalizer rejected. Reported separately from unmatched
/// records as a data-quality issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnprocessableRecord {
    pub kind: RecordKind,
    pub identifier: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Invoice,
    BankTransaction,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::BankTransaction => "bank_transaction",
        }
    }
}

// ============================================================================
// Candidate Models
// ============================================================================

/// Non-owning association between one invoice and one transaction,
/// produced by the candidate generator. Ephemeral within a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePair {
    pub invoice_id: String,
    pub transaction_id: String,
}

/// A candidate pair with its computed similarity components.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub invoice_id: String,
    pub transaction_id: String,
    pub name_score: f64,
    pub amount_score: f64,
    pub date_score: f64,
    /// Weighted composite in [0, 1].
    pub confidence: f64,
    pub tier: MatchTier,
    /// Invoice amount minus paid magnitude, in minor units.
    pub amount_delta_minor: i64,
    pub inferred_fee_minor: Option<i64>,
}

// ============================================================================
// Assignment Models
// ============================================================================

/// Confidence tier for a finalized outcome. Totally ordered:
/// exact > fee-adjusted > fuzzy > unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    FeeAdjusted,
    Fuzzy,
    Unmatched,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::FeeAdjusted => "fee_adjusted",
            Self::Fuzzy => "fuzzy",
            Self::Unmatched => "unmatched",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "exact" => Self::Exact,
            "fee_adjusted" => Self::FeeAdjusted,
            "fuzzy" => Self::Fuzzy,
            _ => Self::Unmatched,
        }
    }

    /// Numeric rank for ordering; higher wins conflicts.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Exact => 3,
            Self::FeeAdjusted => 2,
            Self::Fuzzy => 1,
            Self::Unmatched => 0,
        }
    }
}

/// Whether an assignment is a plain one-to-one pairing or one leg of an
/// explicit one-to-many group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    OneToOne,
    PartialPayment,
}

impl AssignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "one_to_one",
            Self::PartialPayment => "partial_payment",
        }
    }
}

/// A finalized pairing. Produced once per run and never mutated after the
/// resolver commits; re-running produces a new, independent set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchAssignment {
    pub invoice_id: Option<String>,
    pub transaction_id: Option<String>,
    pub kind: AssignmentKind,
    pub tier: MatchTier,
    pub confidence: f64,
    pub name_score: f64,
    pub amount_delta_minor: i64,
    pub inferred_fee_minor: Option<i64>,
}

impl MatchAssignment {
    pub fn from_candidate(candidate: &ScoredCandidate, kind: AssignmentKind) -> Self {
        Self {
            invoice_id: Some(candidate.invoice_id.clone()),
            transaction_id: Some(candidate.transaction_id.clone()),
            kind,
            tier: candidate.tier,
            confidence: candidate.confidence,
            name_score: candidate.name_score,
            amount_delta_minor: candidate.amount_delta_minor,
            inferred_fee_minor: candidate.inferred_fee_minor,
        }
    }

    pub fn unmatched_invoice(source_id: &str) -> Self {
        Self {
            invoice_id: Some(source_id.to_string()),
            transaction_id: None,
            kind: AssignmentKind::OneToOne,
            tier: MatchTier::Unmatched,
            confidence: 0.0,
            name_score: 0.0,
            amount_delta_minor: 0,
            inferred_fee_minor: None,
        }
    }

    pub fn unmatched_transaction(transaction_id: &str) -> Self {
        Self {
            invoice_id: None,
            transaction_id: Some(transaction_id.to_string()),
            kind: AssignmentKind::OneToOne,
            tier: MatchTier::Unmatched,
            confidence: 0.0,
            name_score: 0.0,
            amount_delta_minor: 0,
            inferred_fee_minor: None,
        }
    }
}

// ============================================================================
// Report Models
// ============================================================================

/// One committed one-to-one match with its audit explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedEntry {
    pub invoice: InvoiceRecord,
    pub transaction: BankTransactionRecord,
    pub tier: MatchTier,
    pub confidence: f64,
    pub name_score: f64,
    pub amount_delta_minor: i64,
    pub inferred_fee_minor: Option<i64>,
}

/// One leg of a one-to-many group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialLeg {
    pub invoice_id: String,
    pub transaction_id: String,
    pub tier: MatchTier,
    pub confidence: f64,
    pub name_score: f64,
}

/// An explicit one-to-many group: one invoice settled by several
/// transactions, or one transaction settling several invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialMatchGroup {
    pub invoices: Vec<InvoiceRecord>,
    pub transactions: Vec<BankTransactionRecord>,
    pub legs: Vec<PartialLeg>,
    pub total_invoiced_minor: i64,
    pub total_paid_minor: i64,
    /// Invoiced minus paid across the group.
    pub residual_minor: i64,
}

/// Aggregate totals over one report, in minor units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub invoice_count: usize,
    pub transaction_count: usize,
    pub matched_count: usize,
    pub partial_group_count: usize,
    pub unmatched_invoice_count: usize,
    pub unmatched_transaction_count: usize,
    pub unprocessable_count: usize,
    pub total_invoiced_minor: i64,
    pub total_matched_invoice_minor: i64,
    pub total_unmatched_invoice_minor: i64,
    pub total_unmatched_transaction_minor: i64,
}

/// The exportable result of one reconciliation run. Immutable; callers
/// hold the returned value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub tenant_id: Uuid,
    pub matched: Vec<MatchedEntry>,
    pub partial: Vec<PartialMatchGroup>,
    pub unmatched_invoices: Vec<InvoiceRecord>,
    pub unmatched_transactions: Vec<BankTransactionRecord>,
    pub unprocessable: Vec<UnprocessableRecord>,
    pub summary: ReportSummary,
}
