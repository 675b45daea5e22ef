use crate::model::DiscussionLink;
use crate::url::Site;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Site-relative shape of a single question's discussion page
fn discussion_view_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^/discussions/[a-z0-9-]+/view/").expect("discussion view pattern is valid")
    })
}

/// Normalizes an anchor href into a discussion link
///
/// # Normalization Steps
///
/// 1. Trim and lowercase the href
/// 2. Absolute URLs on the site host are rewritten to their path;
///    absolute URLs on any other host are discarded
/// 3. A missing leading slash is added
/// 4. Query string and fragment are removed
/// 5. Only paths shaped like `/discussions/<provider>/view/...` are kept
///
/// # Examples
///
/// ```
/// use exam_harvest::url::{normalize_discussion_href, Site};
///
/// let site = Site::new("https://www.examtopics.com").unwrap();
/// let link = normalize_discussion_href(
///     "https://www.examtopics.com/discussions/cisco/view/1-exam-200-301-topic-1-question-2-discussion/?p=1#c",
///     &site,
/// )
/// .unwrap();
/// assert_eq!(
///     link.as_str(),
///     "/discussions/cisco/view/1-exam-200-301-topic-1-question-2-discussion/"
/// );
/// ```
pub fn normalize_discussion_href(raw_href: &str, site: &Site) -> Option<DiscussionLink> {
    let mut href = raw_href.trim().to_lowercase();
    if href.is_empty() {
        return None;
    }

    if href.starts_with("https://") || href.starts_with("http://") {
        let parsed = Url::parse(&href).ok()?;
        let host = parsed.host_str()?;
        if !site.owns_host(host) {
            return None;
        }
        href = parsed.path().to_string();
    }

    if !href.starts_with('/') {
        href.insert(0, '/');
    }

    if let Some(cut) = href.find(['?', '#']) {
        href.truncate(cut);
    }

    let href = href.trim();
    if href.is_empty() || !discussion_view_pattern().is_match(href) {
        return None;
    }

    Some(DiscussionLink::new(href))
}

/// Normalizes an exhibit image reference into an absolute http(s) URL
///
/// Data URIs are dropped, protocol-relative references get `https:` and
/// root-relative references are resolved against the site.
pub fn normalize_exhibit_url(raw: &str, site: &Site) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }

    let candidate = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else if raw.starts_with('/') {
        site.absolute(raw)
    } else {
        raw.to_string()
    };

    let url = Url::parse(&candidate).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    Some(url.to_string())
}

/// Returns the URL of the first candidate in a `srcset` attribute
pub fn first_srcset_url(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .next()
        .and_then(|first| first.split_whitespace().next())
}
