//! Exam slug normalization and link matching
//!
//! Vendors name the same exam inconsistently across pages (`1z0-1042`,
//! `1z0-1042-20`, `1z0-1042-23`). This module canonicalizes those raw slugs
//! through an ordered [`RuleTable`] and decides whether a discussion link
//! belongs to a selected exam.

mod matcher;
mod rules;

pub use matcher::{extract_exam_slug, matches, SelectionMatcher, VariantSummary};
pub use rules::{ProviderNormalizer, RuleTable, SlugRule, Transform};

/// Canonicalizes a raw exam slug using the standard rule table
///
/// # Examples
///
/// ```
/// use exam_harvest::normalize_exam_slug;
///
/// assert_eq!(normalize_exam_slug("oracle", "1z0-1042-20"), "1z0-1042");
/// assert_eq!(normalize_exam_slug("some-vendor", "exam-core-2024"), "exam-core");
/// assert_eq!(normalize_exam_slug("cisco", "200-301"), "200-301");
/// ```
pub fn normalize_exam_slug(provider: &str, raw_slug: &str) -> String {
    RuleTable::shared().for_provider(provider).normalize(raw_slug)
}

/// Decides whether `link` belongs to `selection` using the standard rule table
///
/// An empty selection matches every link.
pub fn matches_selection(provider: &str, selection: &str, link: &str) -> bool {
    matches(&RuleTable::shared().for_provider(provider), selection, link)
}
