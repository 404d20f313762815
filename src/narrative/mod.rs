//! Narrative (LLM) risk analysis

pub mod client;
pub mod parser;
pub mod prompt;

pub use client::{
    ChatCompletionsClient, ChatMessage, NarrativeAnalysisClient, TextGenerator,
    REPORT_FAILURE_SENTINEL,
};
pub use parser::{parse_narrative, Extraction, ParsedNarrative};
