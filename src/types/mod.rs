//! Type definitions for the risk engine

pub mod alert;
pub mod analysis;
pub mod transaction;

pub use alert::{ReviewAlert, RiskLevel, RiskLevelThresholds};
pub use analysis::{AnalysisResult, BatchResult, Incident, NarrativeSignal};
pub use transaction::{CustomerHistory, PriorTransaction, Transaction};
