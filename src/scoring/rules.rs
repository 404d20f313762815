//! Deterministic rule-based risk scoring

use crate::config::RulesConfig;
use crate::feature_extractor::FeatureSet;
use std::collections::HashSet;
use std::fmt;

const HIGH_AMOUNT_WEIGHT: f64 = 0.3;
const SUSPICIOUS_HOUR_WEIGHT: f64 = 0.2;
const SUSPICIOUS_MERCHANT_WEIGHT: f64 = 0.3;
const SUSPICIOUS_LOCATION_WEIGHT: f64 = 0.2;

/// A rule that contributed to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleHit {
    HighAmount,
    SuspiciousHour,
    SuspiciousMerchant,
    SuspiciousLocation,
}

impl RuleHit {
    /// Points this rule adds to the score
    pub fn weight(&self) -> f64 {
        match self {
            RuleHit::HighAmount => HIGH_AMOUNT_WEIGHT,
            RuleHit::SuspiciousHour => SUSPICIOUS_HOUR_WEIGHT,
            RuleHit::SuspiciousMerchant => SUSPICIOUS_MERCHANT_WEIGHT,
            RuleHit::SuspiciousLocation => SUSPICIOUS_LOCATION_WEIGHT,
        }
    }
}

impl fmt::Display for RuleHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleHit::HighAmount => "high_amount",
            RuleHit::SuspiciousHour => "suspicious_hour",
            RuleHit::SuspiciousMerchant => "suspicious_merchant",
            RuleHit::SuspiciousLocation => "suspicious_location",
        };
        write!(f, "{}:{:.1}", name, self.weight())
    }
}

/// Score together with the rules that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEvaluation {
    /// Accumulated score, capped at 1.0
    pub score: f64,
    pub hits: Vec<RuleHit>,
}

/// Additive rule scorer. Stateless, never fails.
pub struct RuleBasedScorer {
    high_amount_threshold: f64,
    suspicious_hours: HashSet<u32>,
    suspicious_merchants: HashSet<String>,
    suspicious_locations: HashSet<String>,
}

impl RuleBasedScorer {
    pub fn new(rules: &RulesConfig) -> Self {
        Self {
            high_amount_threshold: rules.high_amount_threshold,
            suspicious_hours: rules.suspicious_hours.iter().copied().collect(),
            suspicious_merchants: rules.suspicious_merchants.iter().cloned().collect(),
            suspicious_locations: rules.suspicious_locations.iter().cloned().collect(),
        }
    }

    /// Risk score in [0, 1] for the given features
    pub fn score(&self, features: &FeatureSet) -> f64 {
        self.evaluate(features).score
    }

    /// Evaluate every rule and report which ones fired
    pub fn evaluate(&self, features: &FeatureSet) -> RuleEvaluation {
        let mut hits = Vec::with_capacity(4);

        if features.amount > self.high_amount_threshold {
            hits.push(RuleHit::HighAmount);
        }
        if self.suspicious_hours.contains(&features.hour) {
            hits.push(RuleHit::SuspiciousHour);
        }
        if self.suspicious_merchants.contains(&features.merchant_name) {
            hits.push(RuleHit::SuspiciousMerchant);
        }
        if self.suspicious_locations.contains(&features.location) {
            hits.push(RuleHit::SuspiciousLocation);
        }

        let score = hits.iter().map(RuleHit::weight).sum::<f64>().min(1.0);

        RuleEvaluation { score, hits }
    }
}

impl Default for RuleBasedScorer {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn features(amount: f64, hour: u32, merchant: &str, location: &str) -> FeatureSet {
        FeatureSet {
            amount,
            hour,
            day_of_week: 0,
            merchant_name: merchant.to_string(),
            location: location.to_string(),
            merchant_risk_score: 0.2,
            location_risk_score: 0.2,
            customer_risk_score: 0.5,
        }
    }

    #[test]
    fn test_clean_transaction_scores_zero() {
        let scorer = RuleBasedScorer::default();
        let eval = scorer.evaluate(&features(25.0, 14, "Coffee Shop", "New York, NY"));

        assert_eq!(eval.score, 0.0);
        assert!(eval.hits.is_empty());
    }

    #[test]
    fn test_individual_rules() {
        let scorer = RuleBasedScorer::default();

        assert!((scorer.score(&features(1500.0, 14, "Shop", "City")) - 0.3).abs() < 1e-9);
        assert!((scorer.score(&features(10.0, 2, "Shop", "City")) - 0.2).abs() < 1e-9);
        assert!((scorer.score(&features(10.0, 14, "Unknown", "City")) - 0.3).abs() < 1e-9);
        assert!((scorer.score(&features(10.0, 14, "Shop", "High Risk Area")) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let scorer = RuleBasedScorer::default();
        assert_eq!(scorer.score(&features(1000.0, 14, "Shop", "City")), 0.0);
        // 06:00 is outside the default suspicious window
        assert_eq!(scorer.score(&features(10.0, 6, "Shop", "City")), 0.0);
    }

    #[test]
    fn test_all_rules_fire() {
        let scorer = RuleBasedScorer::default();
        let eval = scorer.evaluate(&features(5000.0, 0, "New Merchant", "High Risk Area"));

        assert_eq!(eval.hits.len(), 4);
        assert!((eval.score - 1.0).abs() < 1e-9);
        assert_eq!(eval.hits[0].to_string(), "high_amount:0.3");
    }

    #[test]
    fn test_custom_rules() {
        let rules = RulesConfig {
            high_amount_threshold: 100.0,
            suspicious_hours: vec![22, 23],
            suspicious_merchants: vec!["Casino".to_string()],
            suspicious_locations: vec![],
        };
        let scorer = RuleBasedScorer::new(&rules);

        let eval = scorer.evaluate(&features(150.0, 23, "Casino", "High Risk Area"));
        assert_eq!(
            eval.hits,
            vec![
                RuleHit::HighAmount,
                RuleHit::SuspiciousHour,
                RuleHit::SuspiciousMerchant
            ]
        );
    }

    proptest! {
        #[test]
        fn score_stays_in_unit_interval(
            amount in 0.0f64..1_000_000.0,
            hour in 0u32..24,
            merchant in prop::sample::select(vec!["Unknown", "New Merchant", "Coffee Shop", ""]),
            location in prop::sample::select(vec!["High Risk Area", "New York, NY", ""]),
        ) {
            let scorer = RuleBasedScorer::default();
            let score = scorer.score(&features(amount, hour, merchant, location));
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
