//! Review alerts published for transactions that need human review

use crate::types::analysis::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Determine risk level from score and thresholds
    pub fn from_score(score: f64, thresholds: &RiskLevelThresholds) -> Self {
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Configurable risk level thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            low: 0.3,
            medium: 0.5,
            high: 0.7,
            critical: 0.9,
        }
    }
}

/// Alert raised for a transaction flagged for review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewAlert {
    /// Unique alert identifier
    pub alert_id: String,

    /// Associated transaction ID
    pub transaction_id: String,

    /// Combined risk score (0.0 - 1.0)
    pub risk_score: f64,

    /// Risk level classification
    pub risk_level: RiskLevel,

    /// Indicators reported by the narrative analysis
    pub fraud_indicators: Vec<String>,

    /// Actions suggested by the narrative analysis
    pub recommendations: Vec<String>,

    /// Alert generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl ReviewAlert {
    /// Build an alert from a flagged analysis result
    pub fn from_result(result: &AnalysisResult, thresholds: &RiskLevelThresholds) -> Self {
        Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            transaction_id: result.transaction_id.clone(),
            risk_score: result.combined_risk_score,
            risk_level: RiskLevel::from_score(result.combined_risk_score, thresholds),
            fraud_indicators: result.fraud_indicators.clone(),
            recommendations: result.recommendations.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::analysis::NarrativeSignal;

    #[test]
    fn test_risk_level_from_score() {
        let thresholds = RiskLevelThresholds::default();

        assert_eq!(RiskLevel::from_score(0.1, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.5, &thresholds), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.75, &thresholds), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.95, &thresholds), RiskLevel::Critical);
    }

    #[test]
    fn test_alert_from_result() {
        let narrative = NarrativeSignal {
            raw_analysis: "Risk Score: 0.9".to_string(),
            risk_score: 0.9,
            fraud_indicators: vec!["Unusual amount".to_string()],
            recommendations: vec!["Hold for review".to_string()],
        };
        let result = AnalysisResult {
            transaction_id: "tx_123".to_string(),
            timestamp: Utc::now(),
            rule_score: 0.8,
            combined_risk_score: 0.84,
            needs_review: true,
            fraud_indicators: narrative.fraud_indicators.clone(),
            recommendations: narrative.recommendations.clone(),
            narrative,
        };

        let alert = ReviewAlert::from_result(&result, &RiskLevelThresholds::default());

        assert_eq!(alert.transaction_id, "tx_123");
        assert_eq!(alert.risk_level, RiskLevel::High);
        assert_eq!(alert.fraud_indicators, vec!["Unusual amount".to_string()]);

        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["risk_level"], "high");
    }
}
