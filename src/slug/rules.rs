//! Declarative exam slug rules
//!
//! Each vendor naming quirk is one [`SlugRule`] row: an optional provider
//! scope, a shape, and the transform applied when the shape matches. Rules
//! are tried in table order and the first match wins; normalization repeats
//! until no rule matches.

use regex::Regex;
use std::sync::OnceLock;

/// What a rule does to a slug whose shape matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Replace the whole slug with capture group 1 of the shape
    KeepCapture,

    /// Drop the final hyphen-separated segment. The shape is matched against
    /// that segment alone, and only slugs with at least `min_segments`
    /// segments qualify.
    DropLastSegment { min_segments: usize },
}

/// One row of the rule table
#[derive(Debug, Clone)]
pub struct SlugRule {
    name: &'static str,
    provider: Option<String>,
    shape: Regex,
    transform: Transform,
    variant_base: Option<Regex>,
}

impl SlugRule {
    /// Creates a rule that applies to every provider
    pub fn generic(name: &'static str, shape: Regex, transform: Transform) -> Self {
        Self {
            name,
            provider: None,
            shape,
            transform,
            variant_base: None,
        }
    }

    /// Creates a rule scoped to one provider id
    pub fn for_provider(
        name: &'static str,
        provider: &str,
        shape: Regex,
        transform: Transform,
    ) -> Self {
        Self {
            name,
            provider: Some(provider.trim().to_lowercase()),
            shape,
            transform,
            variant_base: None,
        }
    }

    /// Enables variant matching for selections shaped like `base`.
    ///
    /// A link then matches when it contains the selection followed by a
    /// 1-2 digit variant suffix, bounded by `-`, `/` or the ends of the link.
    pub fn with_variant_base(mut self, base: Regex) -> Self {
        self.variant_base = Some(base);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn applies_to(&self, provider: &str) -> bool {
        self.provider.as_deref().map_or(true, |p| p == provider)
    }

    fn apply(&self, slug: &str) -> Option<String> {
        match self.transform {
            Transform::KeepCapture => {
                let captures = self.shape.captures(slug)?;
                let kept = captures.get(1)?.as_str().trim();
                Some(kept.to_string())
            }
            Transform::DropLastSegment { min_segments } => {
                let parts: Vec<&str> = slug.split('-').collect();
                if parts.len() < min_segments.max(2) {
                    return None;
                }
                let last = parts[parts.len() - 1].trim();
                if !self.shape.is_match(last) {
                    return None;
                }
                Some(parts[..parts.len() - 1].join("-"))
            }
        }
    }
}

/// An ordered table of slug rules
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<SlugRule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rules used by the crawler
    ///
    /// 1. `oracle`: `1z0-1042-20` collapses to `1z0-1042` (1-2 digit variant)
    /// 2. any provider: a slug of three or more segments drops a final
    ///    segment shaped `NN`, `NNNN`, `vN`, `verN` or `revN`
    pub fn standard() -> Self {
        Self::new()
            .with_rule(
                SlugRule::for_provider(
                    "oracle-version",
                    "oracle",
                    Regex::new(r"^(1z\d-\d{3,4})-\d{1,2}$").expect("oracle version shape is valid"),
                    Transform::KeepCapture,
                )
                .with_variant_base(
                    Regex::new(r"^1z\d-\d{3,4}$").expect("oracle base shape is valid"),
                ),
            )
            .with_rule(SlugRule::generic(
                "trailing-version-token",
                Regex::new(r"^(?:\d{2}|\d{4}|v\d+|ver\d+|rev\d+)$")
                    .expect("version token shape is valid"),
                Transform::DropLastSegment { min_segments: 3 },
            ))
    }

    /// Shared instance of [`RuleTable::standard`]
    pub fn shared() -> &'static RuleTable {
        static TABLE: OnceLock<RuleTable> = OnceLock::new();
        TABLE.get_or_init(RuleTable::standard)
    }

    /// Appends a rule; later rules lose to earlier ones
    pub fn with_rule(mut self, rule: SlugRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the normalizer for one provider
    pub fn for_provider(&self, provider: &str) -> ProviderNormalizer<'_> {
        let provider = provider.trim().to_lowercase();
        let rules = self
            .rules
            .iter()
            .filter(|rule| rule.applies_to(&provider))
            .collect();
        ProviderNormalizer { provider, rules }
    }
}

/// The rules in effect for one provider
#[derive(Debug, Clone)]
pub struct ProviderNormalizer<'a> {
    provider: String,
    rules: Vec<&'a SlugRule>,
}

impl ProviderNormalizer<'_> {
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Canonicalizes a raw exam slug
    ///
    /// The slug is trimmed and lowercased, then rules are applied until none
    /// matches, so `normalize(normalize(s)) == normalize(s)`.
    pub fn normalize(&self, raw: &str) -> String {
        let mut slug = raw.trim().to_lowercase();

        'rewrite: loop {
            for rule in &self.rules {
                if let Some(next) = rule.apply(&slug) {
                    // Every transform shortens the slug, so this terminates
                    if next.is_empty() || next.len() >= slug.len() {
                        break 'rewrite;
                    }
                    slug = next;
                    continue 'rewrite;
                }
            }
            break;
        }

        slug
    }

    /// Compiles the provider's variant fallback for a normalized selection
    ///
    /// Returns `None` when no rule of this provider treats the selection as
    /// a variant base.
    pub fn variant_pattern(&self, selected_normalized: &str) -> Option<Regex> {
        let is_base = self
            .rules
            .iter()
            .filter_map(|rule| rule.variant_base.as_ref())
            .any(|base| base.is_match(selected_normalized));
        if !is_base {
            return None;
        }

        let pattern = format!(
            r"(?:^|[-/]){}-\d{{1,2}}(?:[-/]|$)",
            regex::escape(selected_normalized)
        );
        Regex::new(&pattern).ok()
    }
}
