use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Reconciliation error: {0}")]
    Reconciliation(anyhow::Error),

    #[error("Configuration error: {0}")]
    Configuration(anyhow::Error),
}
