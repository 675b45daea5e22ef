//! JSON renderer
//!
//! Writes one harvest as a single JSON document.

use crate::model::QuestionRecord;
use crate::output::traits::{ExamLabel, OutputResult, Renderer};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    provider: &'a str,
    provider_name: &'a str,
    exam: &'a str,
    generated_at: String,
    question_count: usize,
    questions: &'a [QuestionRecord],
}

/// Renders records to a JSON file
#[derive(Debug, Clone)]
pub struct JsonRenderer {
    path: PathBuf,
    pretty: bool,
}

impl JsonRenderer {
    /// Creates a renderer writing pretty-printed JSON to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: true,
        }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes a harvest without writing it
    pub fn to_json(&self, label: &ExamLabel, records: &[QuestionRecord]) -> OutputResult<String> {
        let document = JsonDocument {
            provider: &label.provider,
            provider_name: &label.provider_name,
            exam: &label.exam,
            generated_at: Utc::now().to_rfc3339(),
            question_count: records.len(),
            questions: records,
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(json)
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, label: &ExamLabel, records: &[QuestionRecord]) -> OutputResult<()> {
        let json = self.to_json(label, records)?;

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(&self.path, json)?;

        tracing::info!(
            "Wrote {} questions to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
