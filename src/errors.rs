use serde::Serialize;
use uuid::Uuid;

/// A single order line that could not be covered by current stock.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StockShortage {
    pub product_id: Uuid,
    pub product_name: String,
    pub requested: i64,
    pub available: i64,
}

impl std::fmt::Display for StockShortage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (requested {}, available {})",
            self.product_name, self.requested, self.available
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Insufficient stock: {}", format_shortages(.0))]
    InsufficientStock(Vec<StockShortage>),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

fn format_shortages(lines: &[StockShortage]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::StorageError(err.to_string())
    }
}
