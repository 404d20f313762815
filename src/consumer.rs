//! NATS message consumer for incoming analysis requests

use crate::types::transaction::Transaction;
use anyhow::Result;
use async_nats::{Client, Subscriber};
use tracing::info;

/// Kind of request, determined by the subject it arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Single,
    Batch,
}

/// A decoded analysis request
#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    Single(Transaction),
    Batch(Vec<Transaction>),
}

impl AnalysisRequest {
    /// Decode a JSON payload according to its request kind
    pub fn decode(kind: RequestKind, payload: &[u8]) -> serde_json::Result<Self> {
        match kind {
            RequestKind::Single => serde_json::from_slice(payload).map(AnalysisRequest::Single),
            RequestKind::Batch => serde_json::from_slice(payload).map(AnalysisRequest::Batch),
        }
    }

    /// Number of transactions carried by the request
    pub fn len(&self) -> usize {
        match self {
            AnalysisRequest::Single(_) => 1,
            AnalysisRequest::Batch(transactions) => transactions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer for receiving transactions from NATS
pub struct TransactionConsumer {
    client: Client,
    transaction_subject: String,
    batch_subject: String,
}

impl TransactionConsumer {
    /// Create a new transaction consumer
    pub fn new(client: Client, transaction_subject: &str, batch_subject: &str) -> Self {
        Self {
            client,
            transaction_subject: transaction_subject.to_string(),
            batch_subject: batch_subject.to_string(),
        }
    }

    /// Subscribe to the subject for the given request kind
    pub async fn subscribe(&self, kind: RequestKind) -> Result<Subscriber> {
        let subject = self.subject(kind).to_string();
        let subscriber = self.client.subscribe(subject.clone()).await?;
        info!(subject = %subject, kind = ?kind, "Subscribed to request subject");
        Ok(subscriber)
    }

    /// Get the subject name for a request kind
    pub fn subject(&self, kind: RequestKind) -> &str {
        match kind {
            RequestKind::Single => &self.transaction_subject,
            RequestKind::Batch => &self.batch_subject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single() {
        let payload = br#"{"transaction_id":"tx_1","amount":12.5,"merchant_name":"Shop","location":"City","timestamp":"2024-01-01T10:00:00"}"#;

        match AnalysisRequest::decode(RequestKind::Single, payload).unwrap() {
            AnalysisRequest::Single(tx) => assert_eq!(tx.transaction_id, "tx_1"),
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_decode_batch() {
        let payload = br#"[
            {"transaction_id":"a","amount":1.0,"merchant_name":"m","location":"l","timestamp":"2024-01-01"},
            {"transaction_id":"b","amount":2.0,"merchant_name":"m","location":"l","timestamp":"2024-01-01"}
        ]"#;

        let request = AnalysisRequest::decode(RequestKind::Batch, payload).unwrap();
        assert_eq!(request.len(), 2);
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let payload = br#"{"transaction_id":"a"}"#;
        assert!(AnalysisRequest::decode(RequestKind::Single, payload).is_err());
        assert!(AnalysisRequest::decode(RequestKind::Batch, payload).is_err());
    }

    // Subscription tests would require a running NATS server
}
