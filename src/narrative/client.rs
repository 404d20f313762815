//! Text-generation client for narrative risk analysis

use crate::config::NarrativeConfig;
use crate::error::{EngineError, Result};
use crate::narrative::parser::parse_narrative;
use crate::narrative::prompt::{analysis_prompt, ANALYSIS_SYSTEM_PROMPT, REPORT_SYSTEM_PROMPT};
use crate::types::analysis::NarrativeSignal;
use crate::types::transaction::Transaction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Report text returned when report generation fails
pub const REPORT_FAILURE_SENTINEL: &str = "Error generating fraud report";

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// External text-generation service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply for the given conversation
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat completions client
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f64,
    api_key: String,
}

impl ChatCompletionsClient {
    /// Create a client; fails if no credential is configured
    pub fn new(config: &NarrativeConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EngineError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::ExternalService(format!(
                "status {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| EngineError::ExternalService("reply contained no content".to_string()))
    }
}

/// Narrative analysis over a text-generation service.
///
/// Never returns an error: failed calls degrade to fallback values.
#[derive(Clone)]
pub struct NarrativeAnalysisClient {
    generator: Arc<dyn TextGenerator>,
}

impl NarrativeAnalysisClient {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Analyze a transaction and parse the reply into a signal
    pub async fn analyze(&self, tx: &Transaction) -> NarrativeSignal {
        let messages = [
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(analysis_prompt(tx)),
        ];

        match self.generator.generate(&messages).await {
            Ok(reply) => {
                let parsed = parse_narrative(&reply);
                debug!(
                    transaction_id = %tx.transaction_id,
                    score_found = parsed.risk_score.is_found(),
                    indicators_found = parsed.fraud_indicators.is_found(),
                    recommendations_found = parsed.recommendations.is_found(),
                    "Narrative reply parsed"
                );
                parsed.into_signal(reply)
            }
            Err(e) => {
                warn!(
                    transaction_id = %tx.transaction_id,
                    error = %e,
                    "Narrative analysis failed, using fallback signal"
                );
                NarrativeSignal::service_unavailable()
            }
        }
    }

    /// Generate an incident report from a rendered prompt
    pub async fn generate_report(&self, prompt: &str) -> String {
        let messages = [
            ChatMessage::system(REPORT_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];

        match self.generator.generate(&messages).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Incident report generation failed");
                REPORT_FAILURE_SENTINEL.to_string()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replies with a fixed text and records every conversation it receives
    pub(crate) struct ScriptedGenerator {
        reply: Option<String>,
        pub(crate) calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedGenerator {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                reply: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
            self.calls.lock().unwrap().push(messages.to_vec());
            self.reply
                .clone()
                .ok_or_else(|| EngineError::ExternalService("connection refused".to_string()))
        }
    }

    fn sample_tx() -> Transaction {
        Transaction::new("TX123456", 1500.0, "Online Electronics Store", "New York, NY", "2024-01-03T14:30:00")
    }

    #[tokio::test]
    async fn test_analyze_parses_reply() {
        let generator = Arc::new(ScriptedGenerator::replying(
            "Risk Score: 0.85\nFraud Indicators:\nUnusual amount\nNew merchant\n\nRecommendations:\nHold for review",
        ));
        let client = NarrativeAnalysisClient::new(generator.clone());

        let signal = client.analyze(&sample_tx()).await;

        assert_eq!(signal.risk_score, 0.85);
        assert_eq!(signal.fraud_indicators, vec!["Unusual amount", "New merchant"]);
        assert_eq!(signal.recommendations, vec!["Hold for review"]);
        assert!(signal.raw_analysis.starts_with("Risk Score"));

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0].role, "system");
        assert_eq!(calls[0][0].content, ANALYSIS_SYSTEM_PROMPT);
        assert!(calls[0][1].content.contains("TX123456"));
    }

    #[tokio::test]
    async fn test_analyze_falls_back_on_service_error() {
        let client = NarrativeAnalysisClient::new(Arc::new(ScriptedGenerator::failing()));

        let signal = client.analyze(&sample_tx()).await;

        assert_eq!(signal, NarrativeSignal::service_unavailable());
    }

    #[tokio::test]
    async fn test_analyze_tolerates_unstructured_reply() {
        let client = NarrativeAnalysisClient::new(Arc::new(ScriptedGenerator::replying(
            "I cannot determine anything about this payment.",
        )));

        let signal = client.analyze(&sample_tx()).await;

        assert_eq!(signal.risk_score, 0.5);
        assert_eq!(signal.fraud_indicators, vec!["Unable to extract indicators"]);
        assert_eq!(
            signal.recommendations,
            vec!["Unable to extract recommendations"]
        );
    }

    #[tokio::test]
    async fn test_report_uses_report_system_prompt() {
        let generator = Arc::new(ScriptedGenerator::replying("Summary: two incidents"));
        let client = NarrativeAnalysisClient::new(generator.clone());

        let report = client.generate_report("Incident 1: ...").await;

        assert_eq!(report, "Summary: two incidents");
        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls[0][0].content, REPORT_SYSTEM_PROMPT);
        assert_eq!(calls[0][1].content, "Incident 1: ...");
    }

    #[tokio::test]
    async fn test_report_failure_returns_sentinel() {
        let client = NarrativeAnalysisClient::new(Arc::new(ScriptedGenerator::failing()));
        assert_eq!(
            client.generate_report("anything").await,
            REPORT_FAILURE_SENTINEL
        );
    }

    #[test]
    fn test_missing_credential_is_configuration_error() {
        let mut config = crate::config::AppConfig::default().narrative;
        config.api_key_env = "FRAUD_ENGINE_TEST_NO_SUCH_KEY".to_string();

        assert!(matches!(
            ChatCompletionsClient::new(&config),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
            temperature: 0.3,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["temperature"], 0.3);
    }

    #[test]
    fn test_response_content_extraction() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Risk Score: 0.2"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Risk Score: 0.2")
        );
    }
}
