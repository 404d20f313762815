//! Rule-based scoring and score combination

pub mod blend;
pub mod rules;

pub use blend::{ReviewPolicy, ScoreBlender};
pub use rules::{RuleBasedScorer, RuleEvaluation, RuleHit};
