//! Risk orchestration: rule scoring, narrative analysis and review decision

use crate::config::{RulesConfig, ScoringConfig};
use crate::error::Result;
use crate::feature_extractor::FeatureExtractor;
use crate::incident::IncidentReportGenerator;
use crate::metrics::PipelineMetrics;
use crate::narrative::client::{NarrativeAnalysisClient, TextGenerator, REPORT_FAILURE_SENTINEL};
use crate::scoring::{ReviewPolicy, RuleBasedScorer, ScoreBlender};
use crate::types::analysis::{AnalysisResult, BatchResult, Incident};
use crate::types::transaction::Transaction;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Combines rule-based and narrative scoring into review decisions.
///
/// Holds only immutable configuration and shared counters, so one instance
/// can serve concurrent requests.
pub struct RiskOrchestrator {
    extractor: FeatureExtractor,
    scorer: RuleBasedScorer,
    blender: ScoreBlender,
    policy: ReviewPolicy,
    narrative: NarrativeAnalysisClient,
    reporter: IncidentReportGenerator,
    batch_concurrency: usize,
    metrics: Option<Arc<PipelineMetrics>>,
}

impl RiskOrchestrator {
    /// Build an orchestrator around the given text-generation service
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        rules: &RulesConfig,
        scoring: &ScoringConfig,
    ) -> Result<Self> {
        let blender = ScoreBlender::from_config(scoring)?;
        let narrative = NarrativeAnalysisClient::new(generator);

        info!(
            rule_weight = blender.weights().0,
            narrative_weight = blender.weights().1,
            review_threshold = scoring.review_threshold,
            batch_concurrency = scoring.batch_concurrency,
            "Risk orchestrator initialized"
        );

        Ok(Self {
            extractor: FeatureExtractor::new(rules),
            scorer: RuleBasedScorer::new(rules),
            blender,
            policy: ReviewPolicy::new(scoring.review_threshold),
            reporter: IncidentReportGenerator::new(narrative.clone()),
            narrative,
            batch_concurrency: scoring.batch_concurrency,
            metrics: None,
        })
    }

    /// Record analysis statistics into shared metrics
    pub fn with_metrics(mut self, metrics: Arc<PipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn review_threshold(&self) -> f64 {
        self.policy.threshold()
    }

    /// Analyze a single transaction.
    ///
    /// Fails only when the transaction itself is invalid.
    pub async fn analyze_transaction(&self, tx: &Transaction) -> Result<AnalysisResult> {
        let start = Instant::now();

        let features = self.extractor.extract(tx)?;
        let evaluation = self.scorer.evaluate(&features);

        let narrative = self.narrative.analyze(tx).await;

        let combined_risk_score = self.blender.combine(evaluation.score, narrative.risk_score);
        let needs_review = self.policy.needs_review(combined_risk_score);

        if let Some(metrics) = &self.metrics {
            metrics.record_analysis(
                start.elapsed(),
                combined_risk_score,
                needs_review,
                narrative.is_fallback(),
            );
        }

        if needs_review {
            info!(
                transaction_id = %tx.transaction_id,
                rule_score = evaluation.score,
                narrative_score = narrative.risk_score,
                combined_risk_score,
                "Transaction flagged for review"
            );
        } else {
            debug!(
                transaction_id = %tx.transaction_id,
                rule_score = evaluation.score,
                rules = ?evaluation.hits,
                narrative_score = narrative.risk_score,
                combined_risk_score,
                "Transaction analysed (below threshold)"
            );
        }

        Ok(AnalysisResult {
            transaction_id: tx.transaction_id.clone(),
            timestamp: Utc::now(),
            rule_score: evaluation.score,
            fraud_indicators: narrative.fraud_indicators.clone(),
            recommendations: narrative.recommendations.clone(),
            narrative,
            combined_risk_score,
            needs_review,
        })
    }

    /// Analyze a batch; results keep the input order.
    ///
    /// Every transaction is validated before any narrative call is made.
    pub async fn analyze_batch(&self, transactions: &[Transaction]) -> Result<BatchResult> {
        for tx in transactions {
            tx.validate()?;
        }

        let futures: Vec<_> = transactions
            .iter()
            .map(|tx| self.analyze_transaction(tx))
            .collect();
        let results: Vec<AnalysisResult> = stream::iter(futures)
            .buffered(self.batch_concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_>>()?;

        let incidents: Vec<Incident> = transactions
            .iter()
            .zip(&results)
            .filter(|(_, result)| result.needs_review)
            .map(|(tx, result)| Incident::from_result(tx, result))
            .collect();
        let high_risk_count = incidents.len();

        let batch_report = if high_risk_count > 0 {
            Some(self.reporter.generate(&incidents).await)
        } else {
            None
        };

        if let Some(metrics) = &self.metrics {
            let report_failed = batch_report.as_deref() == Some(REPORT_FAILURE_SENTINEL);
            metrics.record_batch(batch_report.is_some() && !report_failed);
            if report_failed {
                metrics.record_report_failure();
            }
        }

        info!(
            transactions = results.len(),
            high_risk_count,
            "Batch analysis complete"
        );

        Ok(BatchResult {
            results,
            high_risk_count,
            batch_report,
            timestamp: Utc::now(),
        })
    }
}
