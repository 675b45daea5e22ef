use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use exam_harvest::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Examtopics.com/exams/").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.examtopics.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Compares two hosts, treating a leading `www.` as insignificant
pub fn same_site_host(site_host: &str, candidate: &str) -> bool {
    let site = site_host.trim().to_lowercase();
    let candidate = candidate.trim().to_lowercase();
    strip_www(&site) == strip_www(&candidate)
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
