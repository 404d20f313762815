//! Extraction of structured signals from free-text model replies.
//!
//! Replies are arbitrary prose. Each field is extracted independently and
//! either yields [`Extraction::Found`] or falls back to a default, so format
//! drift in one section never affects the others.

use crate::error::EngineError;
use crate::types::analysis::{NarrativeSignal, NEUTRAL_RISK_SCORE};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Placeholder used when no indicators could be extracted
pub const INDICATORS_PLACEHOLDER: &str = "Unable to extract indicators";
/// Placeholder used when no recommendations could be extracted
pub const RECOMMENDATIONS_PLACEHOLDER: &str = "Unable to extract recommendations";

static RISK_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\brisk(?:\s*score\s*:?|\s*:)\s*(\d*\.?\d+)")
        .expect("risk score pattern is valid")
});

static INDICATORS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\b(?:fraud\s*)?indicators\s*:?\s*(.*?)(?:\n\s*\n|\z)")
        .expect("indicators pattern is valid")
});

static RECOMMENDATIONS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\b(?:recommended\s*actions|recommendations)\s*:?\s*(.*?)(?:\n\s*\n|\z)")
        .expect("recommendations pattern is valid")
});

/// Outcome of extracting one field from a reply
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    /// The field was present and recovered
    Found(T),
    /// The field could not be recovered; the default applies
    Defaulted { reason: String },
}

impl<T> Extraction<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }

    /// Recovered value, or the given default
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Extraction::Found(value) => value,
            Extraction::Defaulted { .. } => default,
        }
    }

    fn from_result(result: Result<T, EngineError>) -> Self {
        match result {
            Ok(value) => Extraction::Found(value),
            Err(e) => {
                debug!(error = %e, "Narrative field defaulted");
                Extraction::Defaulted {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// All three fields extracted from one reply
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNarrative {
    pub risk_score: Extraction<f64>,
    pub fraud_indicators: Extraction<Vec<String>>,
    pub recommendations: Extraction<Vec<String>>,
}

impl ParsedNarrative {
    /// Resolve defaults and attach the raw reply
    pub fn into_signal(self, raw_analysis: String) -> NarrativeSignal {
        NarrativeSignal {
            raw_analysis,
            risk_score: self.risk_score.unwrap_or(NEUTRAL_RISK_SCORE),
            fraud_indicators: self
                .fraud_indicators
                .unwrap_or(vec![INDICATORS_PLACEHOLDER.to_string()]),
            recommendations: self
                .recommendations
                .unwrap_or(vec![RECOMMENDATIONS_PLACEHOLDER.to_string()]),
        }
    }
}

/// Parse a model reply into its three independently-extracted fields
pub fn parse_narrative(text: &str) -> ParsedNarrative {
    ParsedNarrative {
        risk_score: extract_risk_score(text),
        fraud_indicators: extract_indicators(text),
        recommendations: extract_recommendations(text),
    }
}

/// First "risk score: <number>" (or "risk: <number>"), clamped to [0, 1]
pub fn extract_risk_score(text: &str) -> Extraction<f64> {
    Extraction::from_result(find_risk_score(text))
}

/// Lines of the "indicators:" section
pub fn extract_indicators(text: &str) -> Extraction<Vec<String>> {
    Extraction::from_result(find_section(&INDICATORS_RE, text, "fraud indicators"))
}

/// Lines of the "recommendations:" / "recommended actions:" section
pub fn extract_recommendations(text: &str) -> Extraction<Vec<String>> {
    Extraction::from_result(find_section(&RECOMMENDATIONS_RE, text, "recommendations"))
}

fn find_risk_score(text: &str) -> Result<f64, EngineError> {
    let captures = RISK_SCORE_RE
        .captures(text)
        .ok_or_else(|| EngineError::parse("risk score", "no risk score pattern"))?;

    let raw = &captures[1];
    let score: f64 = raw
        .parse()
        .map_err(|_| EngineError::parse("risk score", format!("not a number: '{}'", raw)))?;

    if !score.is_finite() {
        return Err(EngineError::parse("risk score", "score is not finite"));
    }

    Ok(score.clamp(0.0, 1.0))
}

fn find_section(re: &Regex, text: &str, field: &'static str) -> Result<Vec<String>, EngineError> {
    let captures = re
        .captures(text)
        .ok_or_else(|| EngineError::parse(field, "section not found"))?;

    let lines: Vec<String> = captures[1]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        return Err(EngineError::parse(field, "section is empty"));
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "Risk Score: 0.85\nFraud Indicators:\nUnusual amount\nNew merchant\n\nRecommendations:\nHold for review";

    #[test]
    fn test_well_formed_reply() {
        let parsed = parse_narrative(WELL_FORMED);

        assert_eq!(parsed.risk_score, Extraction::Found(0.85));
        assert_eq!(
            parsed.fraud_indicators,
            Extraction::Found(vec!["Unusual amount".to_string(), "New merchant".to_string()])
        );
        assert_eq!(
            parsed.recommendations,
            Extraction::Found(vec!["Hold for review".to_string()])
        );
    }

    #[test]
    fn test_missing_score_defaults() {
        let parsed = parse_narrative("This transaction looks fairly ordinary to me.");

        assert!(!parsed.risk_score.is_found());
        let signal = parsed.into_signal("ordinary".to_string());
        assert_eq!(signal.risk_score, 0.5);
        assert_eq!(signal.fraud_indicators, vec![INDICATORS_PLACEHOLDER.to_string()]);
        assert_eq!(
            signal.recommendations,
            vec![RECOMMENDATIONS_PLACEHOLDER.to_string()]
        );
    }

    #[test]
    fn test_score_variants() {
        assert_eq!(extract_risk_score("RISK SCORE 0.4"), Extraction::Found(0.4));
        assert_eq!(extract_risk_score("risk score: .9"), Extraction::Found(0.9));
        assert_eq!(extract_risk_score("Overall risk: 0.3"), Extraction::Found(0.3));
        assert_eq!(extract_risk_score("risk score: 7"), Extraction::Found(1.0));
        assert!(!extract_risk_score("high risk 5 times").is_found());
    }

    #[test]
    fn test_first_score_wins() {
        let text = "Risk score: 0.2 initially, revised risk score: 0.9";
        assert_eq!(extract_risk_score(text), Extraction::Found(0.2));
    }

    #[test]
    fn test_fields_fail_independently() {
        let text = "Recommendations:\nCall the customer\nFreeze card";
        let parsed = parse_narrative(text);

        assert!(!parsed.risk_score.is_found());
        assert!(!parsed.fraud_indicators.is_found());
        assert_eq!(
            parsed.recommendations,
            Extraction::Found(vec!["Call the customer".to_string(), "Freeze card".to_string()])
        );
    }

    #[test]
    fn test_recommended_actions_header() {
        let text = "Indicators: odd hour\n\nRecommended Actions:\n- Verify identity\n- Monitor account";
        let parsed = parse_narrative(text);

        assert_eq!(
            parsed.fraud_indicators,
            Extraction::Found(vec!["odd hour".to_string()])
        );
        assert_eq!(
            parsed.recommendations,
            Extraction::Found(vec![
                "- Verify identity".to_string(),
                "- Monitor account".to_string()
            ])
        );
    }

    #[test]
    fn test_transactions_word_does_not_open_section() {
        let text = "Fraud Indicators:\nMany small transactions\n\nRecommendations:\nHold";
        let parsed = parse_narrative(text);

        assert_eq!(
            parsed.recommendations,
            Extraction::Found(vec!["Hold".to_string()])
        );
    }

    #[test]
    fn test_empty_section_defaults() {
        let parsed = parse_narrative("Risk Score: 0.1\nFraud Indicators:");
        assert!(parsed.risk_score.is_found());
        assert!(!parsed.fraud_indicators.is_found());
    }

    #[test]
    fn test_crlf_reply() {
        let text = "Risk Score: 0.6\r\nFraud Indicators:\r\nLate night\r\n\r\nRecommendations:\r\nCall";
        let parsed = parse_narrative(text);

        assert_eq!(parsed.risk_score, Extraction::Found(0.6));
        assert_eq!(
            parsed.fraud_indicators,
            Extraction::Found(vec!["Late night".to_string()])
        );
    }
}
