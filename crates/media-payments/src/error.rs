//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Request is malformed (missing or sentinel item id, bad kind string)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Item or payment attempt does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// User has no entitlement for the item
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Gateway call failed or returned an unusable response
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// The atomic settle step aborted; no partial state persists
    #[error("Settlement aborted: {0}")]
    Consistency(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::Gateway(_) | PaymentError::Consistency(_) | PaymentError::Storage(_)
        )
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::InvalidRequest(_) => "The request is missing required information.",
            PaymentError::NotFound(_) => "The requested media was not found.",
            PaymentError::Forbidden(_) => "You must pay to watch this media.",
            PaymentError::Gateway(_) => "Payment processing failed. Please try again.",
            PaymentError::Consistency(_) | PaymentError::Storage(_) => {
                "An error occurred processing your payment. Please try again."
            }
            PaymentError::Config(_) => "Service configuration error.",
        }
    }
}

impl From<media_core::CoreError> for PaymentError {
    fn from(err: media_core::CoreError) -> Self {
        match err {
            media_core::CoreError::NotFound(msg) => PaymentError::NotFound(msg),
            media_core::CoreError::InvalidItem(msg) => PaymentError::InvalidRequest(msg),
            media_core::CoreError::Storage(msg) => PaymentError::Storage(msg),
        }
    }
}

impl From<anyhow::Error> for PaymentError {
    fn from(err: anyhow::Error) -> Self {
        PaymentError::Storage(err.to_string())
    }
}
