//! Renderer traits and types
//!
//! This module defines the boundary between a finished harvest and whatever
//! turns it into a document.

use crate::model::QuestionRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Identifies the provider and exam a record set belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamLabel {
    /// Provider id, e.g. `paloalto-networks`
    pub provider: String,

    /// Human-readable provider name, e.g. `Palo Alto Networks`
    pub provider_name: String,

    /// Selected exam code; empty when every discussion was harvested
    pub exam: String,
}

impl ExamLabel {
    pub fn new(provider: &str, exam: &str) -> Self {
        let provider = provider.trim().to_lowercase();
        Self {
            provider_name: super::provider_display_name(&provider),
            provider,
            exam: exam.trim().to_lowercase(),
        }
    }

    /// Short title such as "Cisco 200-301"
    pub fn title(&self) -> String {
        if self.exam.is_empty() {
            format!("{} (all discussions)", self.provider_name)
        } else {
            format!("{} {}", self.provider_name, self.exam)
        }
    }
}

/// Trait for renderers
///
/// A renderer receives the ordered records of one harvest together with
/// their label. Implementations decide the format and destination.
pub trait Renderer {
    /// Renders one harvest
    ///
    /// # Arguments
    ///
    /// * `label` - Provider and exam the records belong to
    /// * `records` - Records in final (topic, question) order
    fn render(&self, label: &ExamLabel, records: &[QuestionRecord]) -> OutputResult<()>;

    /// File extension of the rendered document, without the dot
    fn extension(&self) -> &'static str;
}
