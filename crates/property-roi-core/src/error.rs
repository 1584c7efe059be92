use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropertyRoiError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid horizon: {field} must be at least 1 year (got {value})")]
    InvalidHorizon { field: String, value: i64 },

    #[error("Invalid rate: {field} = {rate} is outside the permitted range")]
    InvalidRate { field: String, rate: Decimal },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PropertyRoiError {
    fn from(e: serde_json::Error) -> Self {
        PropertyRoiError::SerializationError(e.to_string())
    }
}
