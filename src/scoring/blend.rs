//! Score blending and review decision

use crate::config::ScoringConfig;
use crate::error::Result;

/// Blends the rule-based and narrative scores into one risk score.
pub struct ScoreBlender {
    rule_weight: f64,
    narrative_weight: f64,
}

impl ScoreBlender {
    /// Create a blender; weights are normalized to sum to 1.
    pub fn new(rule_weight: f64, narrative_weight: f64) -> Self {
        let total = rule_weight + narrative_weight;
        Self {
            rule_weight: rule_weight / total,
            narrative_weight: narrative_weight / total,
        }
    }

    /// Build a blender from validated scoring configuration.
    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.rule_weight, config.narrative_weight))
    }

    /// Convex combination of the two scores, clamped to [0, 1].
    pub fn combine(&self, rule_score: f64, narrative_score: f64) -> f64 {
        (self.rule_weight * rule_score + self.narrative_weight * narrative_score).clamp(0.0, 1.0)
    }

    /// Normalized (rule, narrative) weights.
    pub fn weights(&self) -> (f64, f64) {
        (self.rule_weight, self.narrative_weight)
    }
}

impl Default for ScoreBlender {
    fn default() -> Self {
        Self::new(0.6, 0.4)
    }
}

/// Decides whether a combined score needs human review.
#[derive(Debug, Clone, Copy)]
pub struct ReviewPolicy {
    threshold: f64,
}

impl ReviewPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Scores at or above the threshold are flagged.
    pub fn needs_review(&self, combined_score: f64) -> bool {
        combined_score >= self.threshold
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self::new(0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_weights() {
        let blender = ScoreBlender::default();

        // 0.6 * 0.5 + 0.4 * 1.0 = 0.7
        assert!((blender.combine(0.5, 1.0) - 0.7).abs() < 1e-9);
        assert_eq!(blender.weights(), (0.6, 0.4));
    }

    #[test]
    fn test_weights_are_normalized() {
        let blender = ScoreBlender::new(3.0, 1.0);
        let (rule, narrative) = blender.weights();

        assert!((rule - 0.75).abs() < 1e-9);
        assert!((narrative - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScoringConfig {
            rule_weight: 0.0,
            narrative_weight: 0.0,
            ..ScoringConfig::default()
        };
        assert!(ScoreBlender::from_config(&config).is_err());
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let policy = ReviewPolicy::default();

        assert!(policy.needs_review(0.7));
        assert!(!policy.needs_review(0.6999));
        assert!(policy.needs_review(1.0));
    }

    #[test]
    fn test_blended_score_at_threshold_needs_review() {
        let blender = ScoreBlender::default();
        let combined = blender.combine(0.5, 1.0);
        let policy = ReviewPolicy::new(combined);

        assert!(policy.needs_review(combined));
    }

    proptest! {
        #[test]
        fn combined_score_is_bounded(rule in 0.0f64..=1.0, narrative in 0.0f64..=1.0) {
            let blender = ScoreBlender::default();
            let combined = blender.combine(rule, narrative);

            prop_assert!((0.0..=1.0).contains(&combined));
            prop_assert!((combined - (0.6 * rule + 0.4 * narrative)).abs() < 1e-12);
            prop_assert!(combined >= rule.min(narrative) - 1e-12);
            prop_assert!(combined <= rule.max(narrative) + 1e-12);
        }

        #[test]
        fn review_matches_threshold(combined in 0.0f64..=1.0, threshold in 0.0f64..=1.0) {
            let policy = ReviewPolicy::new(threshold);
            prop_assert_eq!(policy.needs_review(combined), combined >= threshold);
        }
    }
}
