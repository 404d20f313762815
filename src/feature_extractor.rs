//! Feature derivation for rule-based scoring.
//!
//! Transactions are validated here and fail closed: an invalid timestamp or
//! amount is rejected instead of being replaced by a substitute value.

use crate::config::RulesConfig;
use crate::error::Result;
use crate::types::transaction::{CustomerHistory, Transaction};
use chrono::{Datelike, Timelike};
use std::collections::HashSet;

/// Reputation score for entities on a configured risk list
const LISTED_RISK: f64 = 0.8;
/// Reputation score for entities not on a risk list
const UNLISTED_RISK: f64 = 0.2;
/// Customer risk when no history is available
const UNKNOWN_CUSTOMER_RISK: f64 = 0.5;

/// Features derived from a single transaction. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub amount: f64,
    /// Hour of day (0-23) in the transaction's own wall-clock time
    pub hour: u32,
    /// Day of week, 0 = Monday
    pub day_of_week: u32,
    pub merchant_name: String,
    pub location: String,
    pub merchant_risk_score: f64,
    pub location_risk_score: f64,
    pub customer_risk_score: f64,
}

/// Feature extractor that turns transactions into scorer inputs.
pub struct FeatureExtractor {
    suspicious_merchants: HashSet<String>,
    suspicious_locations: HashSet<String>,
}

impl FeatureExtractor {
    /// Create a feature extractor using the configured risk lists.
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            suspicious_merchants: rules.suspicious_merchants.iter().cloned().collect(),
            suspicious_locations: rules.suspicious_locations.iter().cloned().collect(),
        }
    }

    /// Validate a transaction and derive its features.
    pub fn extract(&self, tx: &Transaction) -> Result<FeatureSet> {
        tx.validate()?;
        let timestamp = tx.parsed_timestamp()?;

        Ok(FeatureSet {
            amount: tx.amount,
            hour: timestamp.hour(),
            day_of_week: timestamp.weekday().num_days_from_monday(),
            merchant_name: tx.merchant_name.clone(),
            location: tx.location.clone(),
            merchant_risk_score: self.merchant_risk(&tx.merchant_name),
            location_risk_score: self.location_risk(&tx.location),
            customer_risk_score: Self::customer_risk(tx.customer_history.as_ref()),
        })
    }

    fn merchant_risk(&self, merchant_name: &str) -> f64 {
        if self.suspicious_merchants.contains(merchant_name) {
            LISTED_RISK
        } else {
            UNLISTED_RISK
        }
    }

    fn location_risk(&self, location: &str) -> f64 {
        if self.suspicious_locations.contains(location) {
            LISTED_RISK
        } else {
            UNLISTED_RISK
        }
    }

    /// Absent or empty history is unknown risk, not zero risk.
    fn customer_risk(history: Option<&CustomerHistory>) -> f64 {
        let Some(history) = history.filter(|h| !h.is_empty()) else {
            return UNKNOWN_CUSTOMER_RISK;
        };

        let mut risk = 0.0;

        // Thin history
        if history.previous_transactions.len() < 3 {
            risk += 0.2;
        }

        // Frequent location changes
        if history.location_changes > 2 {
            risk += 0.3;
        }

        f64::min(risk, 1.0)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}
