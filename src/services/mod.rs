//! Services module for the reconciliation core.

pub mod candidates;
pub mod engine;
pub mod metrics;
pub mod normalizer;
pub mod report;
pub mod resolver;
pub mod scorer;
pub mod similarity;

pub use engine::{ReconciliationEngine, TenantBatch};
pub use metrics::{get_metrics, init_metrics};
pub use similarity::{JaroWinklerSimilarity, NameSimilarity, TokenSetSimilarity};
