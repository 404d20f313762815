//! Incident report generation for flagged batch items

use crate::narrative::client::NarrativeAnalysisClient;
use crate::narrative::prompt::report_prompt;
use crate::types::analysis::{AnalysisResult, Incident};
use crate::types::transaction::Transaction;
use tracing::info;

/// Turns flagged incidents into a narrative report.
#[derive(Clone)]
pub struct IncidentReportGenerator {
    client: NarrativeAnalysisClient,
}

impl IncidentReportGenerator {
    pub fn new(client: NarrativeAnalysisClient) -> Self {
        Self { client }
    }

    /// Generate a report; returns the failure sentinel if the service fails
    pub async fn generate(&self, incidents: &[Incident]) -> String {
        info!(incidents = incidents.len(), "Generating incident report");
        self.client.generate_report(&report_prompt(incidents)).await
    }
}

impl Incident {
    /// Summarize a flagged result together with the transaction it came from
    pub fn from_result(tx: &Transaction, result: &AnalysisResult) -> Self {
        Self {
            transaction_id: result.transaction_id.clone(),
            amount: tx.amount,
            merchant: tx.merchant_name.clone(),
            risk_score: result.combined_risk_score,
            fraud_indicators: result.narrative.fraud_indicators.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::client::tests::ScriptedGenerator;
    use crate::narrative::client::REPORT_FAILURE_SENTINEL;
    use std::sync::Arc;

    fn incidents() -> Vec<Incident> {
        vec![Incident {
            transaction_id: "TX123456".to_string(),
            amount: 1500.0,
            merchant: "Online Electronics".to_string(),
            risk_score: 0.85,
            fraud_indicators: vec!["Unusual amount".to_string()],
        }]
    }

    #[tokio::test]
    async fn test_generate_report() {
        let generator = Arc::new(ScriptedGenerator::replying("1. Summary of incidents: one"));
        let reporter = IncidentReportGenerator::new(NarrativeAnalysisClient::new(generator.clone()));

        let report = reporter.generate(&incidents()).await;

        assert_eq!(report, "1. Summary of incidents: one");
        let calls = generator.calls.lock().unwrap();
        assert!(calls[0][1].content.contains("Transaction ID: TX123456"));
        assert!(calls[0][1].content.contains("Fraud Indicators: Unusual amount"));
    }

    #[tokio::test]
    async fn test_failure_sentinel() {
        let reporter = IncidentReportGenerator::new(NarrativeAnalysisClient::new(Arc::new(
            ScriptedGenerator::failing(),
        )));

        assert_eq!(reporter.generate(&incidents()).await, REPORT_FAILURE_SENTINEL);
    }
}
