use crate::model::DiscussionLink;
use crate::slug::rules::ProviderNormalizer;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

fn exam_in_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"-exam-([a-z0-9-]+?)(?:-topic-|-question-|/|$)")
            .expect("exam-in-link pattern is valid")
    })
}

/// Extracts the raw exam slug a discussion link encodes
///
/// The slug is the token after `-exam-`, ending at `-topic-`, `-question-`,
/// a slash or the end of the link.
///
/// # Examples
///
/// ```
/// use exam_harvest::slug::extract_exam_slug;
///
/// assert_eq!(
///     extract_exam_slug("/discussions/oracle/view/315137-exam-1z0-1072-25-topic-1-question-4-discussion/"),
///     Some("1z0-1072-25".to_string())
/// );
/// assert_eq!(extract_exam_slug("/discussions/x/view/100-topic-1-question-2-discussion/"), None);
/// ```
pub fn extract_exam_slug(link: &str) -> Option<String> {
    let link = link.trim().to_lowercase();
    if link.is_empty() {
        return None;
    }

    let captures = exam_in_link_pattern().captures(&link)?;
    let slug = captures.get(1)?.as_str().trim_matches(|c| c == '-' || c == ' ');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// A selection prepared for checking many links of one provider
///
/// # Matching Order
///
/// 1. An empty selection matches every link
/// 2. If the link encodes an exam slug, compare normalized slugs
/// 3. Provider variant fallback (e.g. `1z0-1042-23` anywhere in the link)
/// 4. Substring containment of the raw or normalized selection
#[derive(Debug, Clone)]
pub struct SelectionMatcher<'n, 'r> {
    normalizer: &'n ProviderNormalizer<'r>,
    selection: String,
    normalized: String,
    variant: Option<Regex>,
}

impl<'n, 'r> SelectionMatcher<'n, 'r> {
    pub fn new(normalizer: &'n ProviderNormalizer<'r>, selection: &str) -> Self {
        let selection = selection.trim().to_lowercase();
        let normalized = normalizer.normalize(&selection);
        let variant = if selection.is_empty() {
            None
        } else {
            normalizer.variant_pattern(&normalized)
        };

        Self {
            normalizer,
            selection,
            normalized,
            variant,
        }
    }

    pub fn is_match(&self, link: &str) -> bool {
        if self.selection.is_empty() {
            return true;
        }

        let link = link.trim().to_lowercase();
        if link.is_empty() {
            return false;
        }

        if let Some(link_slug) = extract_exam_slug(&link) {
            return self.normalizer.normalize(&link_slug) == self.normalized;
        }

        if self.variant.as_ref().is_some_and(|variant| variant.is_match(&link)) {
            return true;
        }

        link.contains(&self.selection)
            || (!self.normalized.is_empty() && link.contains(&self.normalized))
    }
}

/// Decides whether a discussion link belongs to the selected exam
///
/// Prepares the selection on every call; use [`SelectionMatcher`] when
/// checking many links.
pub fn matches(normalizer: &ProviderNormalizer<'_>, selection: &str, link: &str) -> bool {
    SelectionMatcher::new(normalizer, selection).is_match(link)
}

/// Raw slugs folded into one canonical selection, with their link counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSummary {
    pub canonical: String,
    pub variants: BTreeMap<String, usize>,
}

impl VariantSummary {
    /// Groups the raw slugs of `links` that normalize to the selection
    ///
    /// Returns `None` for an empty selection, when no link encodes a matching
    /// slug, or when the only variant is the canonical code itself.
    pub fn collect(
        normalizer: &ProviderNormalizer<'_>,
        selection: &str,
        links: &[DiscussionLink],
    ) -> Option<Self> {
        let selection = selection.trim().to_lowercase();
        if selection.is_empty() {
            return None;
        }

        let canonical = normalizer.normalize(&selection);
        if canonical.is_empty() {
            return None;
        }

        let mut variants = BTreeMap::new();
        for link in links {
            let Some(raw) = extract_exam_slug(link.as_str()) else {
                continue;
            };
            if normalizer.normalize(&raw) != canonical {
                continue;
            }
            *variants.entry(raw).or_insert(0) += 1;
        }

        if variants.is_empty() {
            return None;
        }
        if variants.len() == 1 && variants.contains_key(&canonical) {
            return None;
        }

        Some(Self {
            canonical,
            variants,
        })
    }
}

impl fmt::Display for VariantSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listed: Vec<String> = self
            .variants
            .iter()
            .map(|(slug, count)| format!("{} ({})", slug, count))
            .collect();
        write!(
            f,
            "Including grouped variants for {}: {}",
            self.canonical,
            listed.join(", ")
        )
    }
}
