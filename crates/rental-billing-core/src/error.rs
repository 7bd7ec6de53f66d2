use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid tier table: {reason}")]
    InvalidTierTable { reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Contract {contract_id} already has bills and cannot be modified")]
    ContractLocked { contract_id: u64 },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for BillingError {
    fn from(e: serde_json::Error) -> Self {
        BillingError::SerializationError(e.to_string())
    }
}
