//! Transaction data structures submitted for fraud-risk analysis

use crate::error::{EngineError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A payment transaction to be analyzed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier within a request
    pub transaction_id: String,

    /// Transaction amount (must be non-negative)
    pub amount: f64,

    /// Merchant name as reported by the acquirer
    pub merchant_name: String,

    /// Free-form location of the transaction
    pub location: String,

    /// ISO-8601 timestamp, validated when features are derived
    pub timestamp: String,

    /// Prior activity of the customer, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_history: Option<CustomerHistory>,
}

/// Historical activity of the customer behind a transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerHistory {
    /// Previous transactions, oldest first
    #[serde(default)]
    pub previous_transactions: Vec<PriorTransaction>,

    /// Average transaction amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_transaction: Option<f64>,

    /// Number of location changes observed
    #[serde(default)]
    pub location_changes: u32,
}

/// A single past transaction in a customer history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorTransaction {
    pub amount: f64,
    pub merchant: String,
    pub date: String,
}

impl Transaction {
    /// Create a new transaction without customer history
    pub fn new(
        transaction_id: impl Into<String>,
        amount: f64,
        merchant_name: impl Into<String>,
        location: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            amount,
            merchant_name: merchant_name.into(),
            location: location.into(),
            timestamp: timestamp.into(),
            customer_history: None,
        }
    }

    /// Attach a customer history
    pub fn with_history(mut self, history: CustomerHistory) -> Self {
        self.customer_history = Some(history);
        self
    }

    /// Parse the timestamp into the wall-clock time it was written in.
    ///
    /// Offset-carrying timestamps keep their local hour; naive ones are taken
    /// as-is and a bare date means midnight.
    pub fn parsed_timestamp(&self) -> Result<NaiveDateTime> {
        let raw = self.timestamp.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.naive_local());
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(dt);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }

        Err(EngineError::validation(
            &self.transaction_id,
            format!("unparseable timestamp '{}'", self.timestamp),
        ))
    }

    /// Reject transactions that cannot be scored meaningfully
    pub fn validate(&self) -> Result<()> {
        if self.transaction_id.trim().is_empty() {
            return Err(EngineError::validation(
                &self.transaction_id,
                "transaction id must not be empty",
            ));
        }
        if !self.amount.is_finite() {
            return Err(EngineError::validation(
                &self.transaction_id,
                "amount must be a finite number",
            ));
        }
        if self.amount < 0.0 {
            return Err(EngineError::validation(
                &self.transaction_id,
                format!("amount must be non-negative, got {}", self.amount),
            ));
        }
        self.parsed_timestamp().map(|_| ())
    }
}

impl CustomerHistory {
    pub fn new(previous_transactions: Vec<PriorTransaction>, location_changes: u32) -> Self {
        let average_transaction = if previous_transactions.is_empty() {
            None
        } else {
            let total: f64 = previous_transactions.iter().map(|t| t.amount).sum();
            Some(total / previous_transactions.len() as f64)
        };

        Self {
            previous_transactions,
            average_transaction,
            location_changes,
        }
    }

    /// True when the history carries no information at all (e.g. `{}` on the wire)
    pub fn is_empty(&self) -> bool {
        self.previous_transactions.is_empty()
            && self.average_transaction.is_none()
            && self.location_changes == 0
    }
}

impl PriorTransaction {
    pub fn new(amount: f64, merchant: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            amount,
            merchant: merchant.into(),
            date: date.into(),
        }
    }
}
