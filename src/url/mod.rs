//! Site addressing and href handling for Exam-Harvest
//!
//! The crawler only ever talks to one host. This module builds the listing
//! URLs for that host, decides whether an absolute URL belongs to it, and
//! turns raw anchor/image attributes into normalized links.

mod domain;
mod normalize;

use crate::ConfigError;
use ::url::Url;

pub use domain::{extract_domain, same_site_host};
pub use normalize::{first_srcset_url, normalize_discussion_href, normalize_exhibit_url};

/// The fixed host a harvest runs against
///
/// # Examples
///
/// ```
/// use exam_harvest::url::Site;
///
/// let site = Site::new("https://www.examtopics.com").unwrap();
/// assert_eq!(
///     site.provider_discussion_page("oracle", 3),
///     "https://www.examtopics.com/discussions/oracle/3"
/// );
/// assert!(site.owns_host("examtopics.com"));
/// ```
#[derive(Debug, Clone)]
pub struct Site {
    base: Url,
    origin: String,
    host: String,
}

impl Site {
    /// Creates a site from an absolute http(s) base URL
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: only http and https are supported",
                base_url
            )));
        }

        let host = extract_domain(&base)
            .ok_or_else(|| ConfigError::InvalidUrl(format!("{}: missing host", base_url)))?;
        let origin = base.as_str().trim_end_matches('/').to_string();

        Ok(Self { base, origin, host })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns true if `host` is this site, with or without a `www.` prefix
    pub fn owns_host(&self, host: &str) -> bool {
        same_site_host(&self.host, host)
    }

    /// Makes a site-relative path absolute
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.origin, path)
        } else {
            format!("{}/{}", self.origin, path)
        }
    }

    /// Index of every provider's exam list
    pub fn exam_index(&self) -> String {
        self.absolute("/exams/")
    }

    /// Index of every provider's discussion category
    pub fn discussion_index(&self) -> String {
        self.absolute("/discussions/")
    }

    /// Official exam list of one provider
    pub fn provider_exams(&self, provider: &str) -> String {
        self.absolute(&format!("/exams/{}/", provider))
    }

    /// First page of one provider's discussion listing
    pub fn provider_discussions(&self, provider: &str) -> String {
        self.absolute(&format!("/discussions/{}/", provider))
    }

    /// One numbered page of a provider's discussion listing (1-based)
    pub fn provider_discussion_page(&self, provider: &str, page: u32) -> String {
        self.absolute(&format!("/discussions/{}/{}", provider, page))
    }
}
