//! Output module for rendering harvested records
//!
//! This module handles:
//! - The [`Renderer`] seam and the JSON renderer
//! - Default output file naming
//! - Provider display names
//! - Printing crawl reports

mod json;
pub mod stats;
mod traits;

pub use json::JsonRenderer;
pub use stats::{print_crawl_summary, print_providers};
pub use traits::{ExamLabel, OutputError, OutputResult, Renderer};

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Providers whose names do not title-case cleanly
const PROVIDER_NAME_OVERRIDES: &[(&str, &str)] = &[
    ("aws", "AWS"),
    ("ec-council", "EC-Council"),
    ("eccouncil", "EC-Council"),
    ("isc2", "ISC2"),
    ("isaca", "ISACA"),
    ("paloalto-networks", "Palo Alto Networks"),
    ("palo-alto-networks", "Palo Alto Networks"),
    ("servicenow", "ServiceNow"),
    ("vmware", "VMware"),
    ("lpi", "LPI"),
];

/// Human-readable name for a provider id
///
/// # Examples
///
/// ```
/// use exam_harvest::output::provider_display_name;
///
/// assert_eq!(provider_display_name("vmware"), "VMware");
/// assert_eq!(provider_display_name("microsoft"), "Microsoft");
/// assert_eq!(provider_display_name("google-cloud"), "Google Cloud");
/// assert_eq!(provider_display_name(""), "Unknown");
/// ```
pub fn provider_display_name(provider: &str) -> String {
    let provider = provider.trim().to_lowercase();
    if provider.is_empty() {
        return "Unknown".to_string();
    }

    if let Some((_, name)) = PROVIDER_NAME_OVERRIDES.iter().find(|(id, _)| *id == provider) {
        return name.to_string();
    }

    provider
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn invalid_filename_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9._-]+").expect("filename pattern is valid"))
}

/// Reduces a string to `[a-z0-9._-]`, trimming separators from both ends
pub fn sanitize_segment(input: &str) -> String {
    let lowered = input.trim().to_lowercase().replace(' ', "-");
    invalid_filename_chars()
        .replace_all(&lowered, "-")
        .trim_matches(|c| c == '-' || c == '.' || c == '_')
        .to_string()
}

/// Default output file for a harvest: `<provider>_<exam>.<extension>`
///
/// Empty segments fall back to `examtopics` and `output`.
pub fn default_output_path(provider: &str, exam: &str, extension: &str) -> PathBuf {
    let provider = match sanitize_segment(provider) {
        s if s.is_empty() => "examtopics".to_string(),
        s => s,
    };
    let exam = match sanitize_segment(exam) {
        s if s.is_empty() => "output".to_string(),
        s => s,
    };
    PathBuf::from(format!("{}_{}.{}", provider, exam, extension))
}
