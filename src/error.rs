//! Error taxonomy for the risk engine

use thiserror::Error;

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised inside the risk engine.
///
/// Only [`EngineError::Validation`] ever leaves the orchestrator. External
/// service and parse failures are absorbed by the narrative client and turned
/// into fallback values; configuration failures surface at construction.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid transaction {transaction_id}: {reason}")]
    Validation {
        transaction_id: String,
        reason: String,
    },

    #[error("Text generation service error: {0}")]
    ExternalService(String),

    #[error("Unable to parse {field} from narrative reply: {reason}")]
    Parse { field: &'static str, reason: String },
}

impl EngineError {
    pub fn validation(transaction_id: &str, reason: impl Into<String>) -> Self {
        EngineError::Validation {
            transaction_id: transaction_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn parse(field: &'static str, reason: impl Into<String>) -> Self {
        EngineError::Parse {
            field,
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EngineError::ExternalService(format!("request timed out: {}", e))
        } else {
            EngineError::ExternalService(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = EngineError::validation("tx_1", "amount must be non-negative");
        assert_eq!(
            err.to_string(),
            "Invalid transaction tx_1: amount must be non-negative"
        );
    }

    #[test]
    fn test_parse_message() {
        let err = EngineError::parse("risk score", "no match");
        assert!(err.to_string().contains("risk score"));
    }
}
