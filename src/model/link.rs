use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// A normalized, site-relative path to one question's discussion page
///
/// Instances are produced by [`crate::url::normalize_discussion_href`], so the
/// path is lowercase and carries no scheme, host, query or fragment. The path
/// itself is the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DiscussionLink(String);

impl DiscussionLink {
    pub(crate) fn new(path: &str) -> Self {
        Self(path.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Topic ordinal embedded as `topic-<n>-`; 0 when absent or unparseable
    pub fn topic_number(&self) -> u32 {
        self.0
            .split("topic-")
            .nth(1)
            .and_then(|rest| rest.split('-').next())
            .and_then(|num| num.parse().ok())
            .unwrap_or(0)
    }

    /// Question ordinal embedded as `question-<n>[-discussion][/]`; 0 when absent
    pub fn question_number(&self) -> u32 {
        self.0
            .split("question-")
            .nth(1)
            .map(|rest| rest.trim_end_matches('/'))
            .map(|rest| rest.strip_suffix("-discussion").unwrap_or(rest))
            .and_then(|num| num.parse().ok())
            .unwrap_or(0)
    }

    /// Key the final record order is derived from
    pub fn sort_key(&self) -> (u32, u32) {
        (self.topic_number(), self.question_number())
    }
}

impl fmt::Display for DiscussionLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DiscussionLink {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Removes exact repeats, keeping the first occurrence of each link
pub fn dedup_links(links: impl IntoIterator<Item = DiscussionLink>) -> Vec<DiscussionLink> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Sorts links by (topic number, question number)
///
/// The sort is stable, so links with equal keys keep their relative order.
pub fn sort_links(links: &mut [DiscussionLink]) {
    links.sort_by_key(DiscussionLink::sort_key);
}
