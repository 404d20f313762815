//! Configuration management for the risk engine

use crate::error::EngineError;
use crate::types::alert::RiskLevelThresholds;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "FRAUD_ENGINE_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub narrative: NarrativeConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for single incoming transactions
    pub transaction_subject: String,
    /// Subject for incoming transaction batches
    pub batch_subject: String,
    /// Subject for analysis results when a request carries no reply subject
    pub result_subject: String,
    /// Subject for outgoing review alerts
    pub alert_subject: String,
}

/// Text-generation service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NarrativeConfig {
    /// Chat completions endpoint URL
    pub endpoint: String,
    /// Model identifier sent with each request
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Environment variable holding the API credential
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Inline credential, takes precedence over `api_key_env`
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f64 {
    0.3
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl NarrativeConfig {
    /// Resolve the API credential, failing if none is configured
    pub fn resolve_api_key(&self) -> std::result::Result<String, EngineError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }

        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(EngineError::Configuration(format!(
                "{} environment variable not set",
                self.api_key_env
            ))),
        }
    }
}

/// Rule-based scorer parameters
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// Amounts strictly above this value trigger the high-amount rule
    #[serde(default = "default_high_amount_threshold")]
    pub high_amount_threshold: f64,
    /// Hours of day (0-23) considered suspicious
    #[serde(default = "default_suspicious_hours")]
    pub suspicious_hours: Vec<u32>,
    /// Merchant names considered suspicious
    #[serde(default = "default_suspicious_merchants")]
    pub suspicious_merchants: Vec<String>,
    /// Locations considered suspicious
    #[serde(default = "default_suspicious_locations")]
    pub suspicious_locations: Vec<String>,
}

fn default_high_amount_threshold() -> f64 {
    1000.0
}

fn default_suspicious_hours() -> Vec<u32> {
    // Midnight to 5 AM
    vec![0, 1, 2, 3, 4, 5]
}

fn default_suspicious_merchants() -> Vec<String> {
    vec!["Unknown".to_string(), "New Merchant".to_string()]
}

fn default_suspicious_locations() -> Vec<String> {
    vec!["High Risk Area".to_string()]
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            high_amount_threshold: default_high_amount_threshold(),
            suspicious_hours: default_suspicious_hours(),
            suspicious_merchants: default_suspicious_merchants(),
            suspicious_locations: default_suspicious_locations(),
        }
    }
}

/// Score combination and review policy
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Weight of the rule-based score in the blend
    #[serde(default = "default_rule_weight")]
    pub rule_weight: f64,
    /// Weight of the narrative score in the blend
    #[serde(default = "default_narrative_weight")]
    pub narrative_weight: f64,
    /// Combined scores at or above this value need review
    #[serde(default = "default_review_threshold")]
    pub review_threshold: f64,
    /// Maximum narrative calls in flight per batch (1 = sequential)
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// Risk level classification thresholds for review alerts
    #[serde(default)]
    pub risk_levels: RiskLevelThresholds,
}

fn default_rule_weight() -> f64 {
    0.6
}

fn default_narrative_weight() -> f64 {
    0.4
}

fn default_review_threshold() -> f64 {
    0.7
}

fn default_batch_concurrency() -> usize {
    1
}

impl ScoringConfig {
    /// Check the policy values before an engine is built from them
    pub fn validate(&self) -> std::result::Result<(), EngineError> {
        let weights = [self.rule_weight, self.narrative_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::Configuration(format!(
                "combination weights must be non-negative, got rule={} narrative={}",
                self.rule_weight, self.narrative_weight
            )));
        }
        if self.rule_weight + self.narrative_weight <= 0.0 {
            return Err(EngineError::Configuration(
                "combination weights must not both be zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.review_threshold) {
            return Err(EngineError::Configuration(format!(
                "review threshold must lie in [0, 1], got {}",
                self.review_threshold
            )));
        }
        if self.batch_concurrency == 0 {
            return Err(EngineError::Configuration(
                "batch concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            rule_weight: default_rule_weight(),
            narrative_weight: default_narrative_weight(),
            review_threshold: default_review_threshold(),
            batch_concurrency: default_batch_concurrency(),
            risk_levels: RiskLevelThresholds::default(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of requests processed concurrently
    pub workers: usize,
    /// Interval between metrics summaries in seconds
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from the default path or `FRAUD_ENGINE_CONFIG`
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, layered with `FRAUD_ENGINE__*` variables
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("FRAUD_ENGINE").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app.scoring
            .validate()
            .context("Invalid scoring configuration")?;

        Ok(app)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                transaction_subject: "transactions".to_string(),
                batch_subject: "transactions.batch".to_string(),
                result_subject: "fraud.results".to_string(),
                alert_subject: "fraud.alerts".to_string(),
            },
            narrative: NarrativeConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                model: default_model(),
                temperature: default_temperature(),
                timeout_ms: default_timeout_ms(),
                api_key_env: default_api_key_env(),
                api_key: None,
            },
            rules: RulesConfig::default(),
            scoring: ScoringConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: default_metrics_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
