//! Analysis outputs produced by the orchestrator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Indicator reported when the text-generation call failed
pub const API_ERROR_INDICATOR: &str = "API Error";
/// Recommendation reported when the text-generation call failed
pub const API_ERROR_RECOMMENDATION: &str = "Please try again later";
/// Raw analysis text reported when the text-generation call failed
pub const API_ERROR_ANALYSIS: &str = "Error in analysis";
/// Neutral score used when no narrative score could be recovered
pub const NEUTRAL_RISK_SCORE: f64 = 0.5;

/// Structured signal recovered from a free-text narrative analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSignal {
    /// Reply text as returned by the model
    pub raw_analysis: String,
    /// Narrative risk score (0.0 - 1.0)
    pub risk_score: f64,
    /// Fraud indicators, never empty
    pub fraud_indicators: Vec<String>,
    /// Recommended actions, never empty
    pub recommendations: Vec<String>,
}

impl NarrativeSignal {
    /// Signal used when the text-generation service could not be reached
    pub fn service_unavailable() -> Self {
        Self {
            raw_analysis: API_ERROR_ANALYSIS.to_string(),
            risk_score: NEUTRAL_RISK_SCORE,
            fraud_indicators: vec![API_ERROR_INDICATOR.to_string()],
            recommendations: vec![API_ERROR_RECOMMENDATION.to_string()],
        }
    }

    /// Whether this signal is the service-unavailable fallback
    pub fn is_fallback(&self) -> bool {
        self.fraud_indicators.len() == 1
            && self.fraud_indicators[0] == API_ERROR_INDICATOR
            && self.raw_analysis == API_ERROR_ANALYSIS
    }
}

/// Verdict for a single transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub transaction_id: String,
    /// Analysis completion time
    pub timestamp: DateTime<Utc>,
    /// Deterministic rule-based score (0.0 - 1.0)
    pub rule_score: f64,
    /// Narrative analysis of the transaction
    pub narrative: NarrativeSignal,
    /// Weighted blend of rule and narrative scores (0.0 - 1.0)
    pub combined_risk_score: f64,
    /// Whether the combined score reached the review threshold
    pub needs_review: bool,
    pub fraud_indicators: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Verdicts for a batch of transactions, in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub results: Vec<AnalysisResult>,
    /// Number of results flagged for review
    pub high_risk_count: usize,
    /// Narrative incident report, present iff `high_risk_count > 0`
    pub batch_report: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A flagged transaction summarized for the incident report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub transaction_id: String,
    pub amount: f64,
    pub merchant: String,
    /// Combined risk score of the flagged transaction
    pub risk_score: f64,
    pub fraud_indicators: Vec<String>,
}
