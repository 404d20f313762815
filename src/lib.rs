//! Fraud Risk Engine Library
//!
//! Assigns a fraud-risk verdict to payment transactions by blending a
//! deterministic rule-based score with a narrative analysis produced by a
//! large language model, and decides which transactions need human review.

pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_extractor;
pub mod incident;
pub mod metrics;
pub mod narrative;
pub mod orchestrator;
pub mod producer;
pub mod scoring;
pub mod types;

pub use config::AppConfig;
pub use error::EngineError;
pub use feature_extractor::{FeatureExtractor, FeatureSet};
pub use incident::IncidentReportGenerator;
pub use narrative::{NarrativeAnalysisClient, TextGenerator};
pub use orchestrator::RiskOrchestrator;
pub use scoring::{ReviewPolicy, RuleBasedScorer, ScoreBlender};
pub use types::{AnalysisResult, BatchResult, Incident, NarrativeSignal, Transaction};
