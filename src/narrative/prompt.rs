//! Prompt rendering for narrative analysis and incident reports

use crate::types::analysis::Incident;
use crate::types::transaction::{CustomerHistory, Transaction};

pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a fraud detection expert analyzing financial transactions.";
pub const REPORT_SYSTEM_PROMPT: &str =
    "You are a fraud detection expert generating incident reports.";

const NO_HISTORY: &str = "No customer history available";

/// Prompt asking the model to assess a single transaction
pub fn analysis_prompt(tx: &Transaction) -> String {
    format!(
        "Analyze the following transaction for potential fraud:\n\
         \n\
         Transaction ID: {id}\n\
         Amount: ${amount}\n\
         Merchant: {merchant}\n\
         Location: {location}\n\
         Timestamp: {timestamp}\n\
         \n\
         Customer History:\n\
         {history}\n\
         \n\
         Please provide:\n\
         1. A risk score between 0 and 1 (format: \"Risk Score: <number>\")\n\
         2. List of potential fraud indicators (under \"Fraud Indicators:\", one per line)\n\
         3. Recommendations for further action (under \"Recommendations:\", one per line)\n",
        id = tx.transaction_id,
        amount = tx.amount,
        merchant = tx.merchant_name,
        location = tx.location,
        timestamp = tx.timestamp,
        history = format_customer_history(tx.customer_history.as_ref()),
    )
}

/// Render customer history for a prompt
pub fn format_customer_history(history: Option<&CustomerHistory>) -> String {
    let Some(history) = history.filter(|h| !h.is_empty()) else {
        return NO_HISTORY.to_string();
    };

    let mut lines = Vec::new();

    if !history.previous_transactions.is_empty() {
        lines.push("Previous Transactions:".to_string());
        for prior in &history.previous_transactions {
            lines.push(format!(
                "- ${} at {} on {}",
                prior.amount, prior.merchant, prior.date
            ));
        }
    }

    if let Some(average) = history.average_transaction {
        lines.push(format!("Average Transaction: ${}", average));
    }

    lines.push(format!("Location Changes: {}", history.location_changes));

    lines.join("\n")
}

/// Prompt asking the model for a report over flagged incidents
pub fn report_prompt(incidents: &[Incident]) -> String {
    let incidents_text = incidents
        .iter()
        .enumerate()
        .map(|(i, incident)| {
            format!(
                "Incident {}:\n\
                 Transaction ID: {}\n\
                 Amount: ${}\n\
                 Merchant: {}\n\
                 Risk Score: {}\n\
                 Fraud Indicators: {}",
                i + 1,
                incident.transaction_id,
                incident.amount,
                incident.merchant,
                incident.risk_score,
                incident.fraud_indicators.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Generate a comprehensive fraud report for the following incidents:\n\
         \n\
         {}\n\
         \n\
         Please include:\n\
         1. Summary of incidents\n\
         2. Common patterns and trends\n\
         3. Risk assessment\n\
         4. Recommended actions\n",
        incidents_text
    )
}
