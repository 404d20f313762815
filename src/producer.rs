//! NATS message producer for analysis results and review alerts

use crate::types::alert::{ReviewAlert, RiskLevelThresholds};
use crate::types::analysis::AnalysisResult;
use anyhow::Result;
use async_nats::{Client, Subject};
use serde::Serialize;
use tracing::{debug, error};

/// Error body sent back for rejected requests
#[derive(Debug, Serialize)]
pub struct ErrorReply<'a> {
    pub error: &'a str,
}

/// Producer for publishing results and alerts to NATS
#[derive(Clone)]
pub struct ResultProducer {
    client: Client,
    result_subject: String,
    alert_subject: String,
    risk_levels: RiskLevelThresholds,
}

impl ResultProducer {
    /// Create a new result producer
    pub fn new(
        client: Client,
        result_subject: &str,
        alert_subject: &str,
        risk_levels: RiskLevelThresholds,
    ) -> Self {
        Self {
            client,
            result_subject: result_subject.to_string(),
            alert_subject: alert_subject.to_string(),
            risk_levels,
        }
    }

    /// Publish a reply to the request's reply subject, or the result subject
    pub async fn reply<T: Serialize>(&self, reply_to: Option<Subject>, body: &T) -> Result<()> {
        let payload = serde_json::to_vec(body)?;

        match reply_to {
            Some(subject) => self.client.publish(subject, payload.into()).await?,
            None => {
                self.client
                    .publish(self.result_subject.clone(), payload.into())
                    .await?
            }
        }

        Ok(())
    }

    /// Answer a rejected request; only requests with a reply subject get one
    pub async fn reply_error(&self, reply_to: Option<Subject>, message: &str) -> Result<()> {
        if let Some(subject) = reply_to {
            let payload = serde_json::to_vec(&ErrorReply { error: message })?;
            self.client.publish(subject, payload.into()).await?;
        }
        Ok(())
    }

    /// Publish a review alert
    pub async fn publish_alert(&self, alert: &ReviewAlert) -> Result<()> {
        let payload = serde_json::to_vec(alert)?;

        self.client
            .publish(self.alert_subject.clone(), payload.into())
            .await?;

        debug!(
            alert_id = %alert.alert_id,
            transaction_id = %alert.transaction_id,
            risk_score = alert.risk_score,
            "Published review alert"
        );

        Ok(())
    }

    /// Publish alerts for every result that needs review
    pub async fn publish_alerts(&self, results: &[AnalysisResult]) -> Result<()> {
        for result in results.iter().filter(|r| r.needs_review) {
            let alert = ReviewAlert::from_result(result, &self.risk_levels);
            if let Err(e) = self.publish_alert(&alert).await {
                error!(
                    alert_id = %alert.alert_id,
                    error = %e,
                    "Failed to publish alert"
                );
            }
        }
        Ok(())
    }

    /// Get the alert subject name
    pub fn alert_subject(&self) -> &str {
        &self.alert_subject
    }
}
