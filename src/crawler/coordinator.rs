//! Crawler coordinator - main crawl orchestration logic
//!
//! This module ties the fetcher, worker pool, extractor, slug rules and
//! discovery cache together into three top-level operations:
//! - Provider discovery (exam index plus discussion index)
//! - Exam discovery for one provider (official index plus inferred slugs)
//! - Harvesting every question record of one selected exam
//!
//! Only these entry points return errors. Individual pages and questions
//! that fail simply shrink the result.

use crate::cache::{self, DiscoveryCache};
use crate::config::{validate, Config};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser;
use crate::crawler::scheduler::{Progress, WorkerPool};
use crate::model::{dedup_links, sort_links, DiscussionLink, QuestionRecord};
use crate::slug::{extract_exam_slug, RuleTable, SelectionMatcher, VariantSummary};
use crate::url::Site;
use crate::{HarvestError, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Selection value meaning "every discussion of the provider"
pub const ALL_DISCUSSIONS: &str = "all-discussions";

/// Providers found by discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSet {
    /// Sorted, deduplicated provider ids
    pub providers: Vec<String>,

    /// True when the discussion index never reached its coverage target and
    /// the best partial listing was used
    pub partial: bool,
}

/// Exams available for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamCatalog {
    /// Canonical exam codes, sorted
    Exams(Vec<String>),

    /// No exam could be identified; crawl every discussion instead
    AllDiscussions,
}

impl ExamCatalog {
    /// Selection values to offer, with the catch-all sentinel for an
    /// unidentified catalog
    pub fn selections(&self) -> Vec<String> {
        match self {
            ExamCatalog::Exams(exams) => exams.clone(),
            ExamCatalog::AllDiscussions => vec![ALL_DISCUSSIONS.to_string()],
        }
    }

    pub fn is_all_discussions(&self) -> bool {
        matches!(self, ExamCatalog::AllDiscussions)
    }
}

/// Everything a single exam crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub provider: String,

    /// The selection as given; empty means every discussion
    pub selection: String,

    /// Records ordered by (topic, question)
    pub records: Vec<QuestionRecord>,

    /// Raw slugs folded into the selection, when there was more than one
    pub variant_summary: Option<VariantSummary>,

    /// Listing pages crawled
    pub pages: u32,

    /// Distinct links that matched the selection
    pub matched_links: usize,

    /// Listing pages that could not be fetched
    pub failed_pages: usize,

    /// Matched links that produced no record
    pub failed_records: usize,

    pub elapsed: Duration,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    site: Arc<Site>,
    fetcher: Fetcher,
    pool: WorkerPool,
    rules: Arc<RuleTable>,
    cache: Option<Arc<DiscoveryCache>>,
    debug: bool,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration, including the debug toggle
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - Invalid configuration or HTTP client failure
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let debug = config.debug;
        let site = Site::new(&config.site.base_url)?;
        let fetcher = Fetcher::new(&config.http, &config.crawler, debug)?;
        let pool = WorkerPool::new(config.crawler.max_concurrent_requests as usize, Progress::new());
        let cache = cache::from_config(&config.cache, debug).map(Arc::new);

        Ok(Self {
            config: Arc::new(config),
            site: Arc::new(site),
            fetcher,
            pool,
            rules: Arc::new(RuleTable::standard()),
            cache,
            debug,
        })
    }

    /// Replaces the discovery cache; `None` disables caching
    pub fn with_cache(mut self, cache: Option<DiscoveryCache>) -> Self {
        self.cache = cache.map(|c| Arc::new(c.with_debug(self.debug)));
        self
    }

    /// Replaces the slug rule table
    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn cache(&self) -> Option<&DiscoveryCache> {
        self.cache.as_deref()
    }

    /// Completed-unit counter shared by every crawl phase
    pub fn progress(&self) -> Progress {
        self.pool.progress().clone()
    }

    /// Drops a provider's cached exam slugs before the next discovery
    pub async fn refresh_cache(&self, provider: &str) {
        let Some(cache) = self.cache.clone() else {
            return;
        };

        let key = provider.trim().to_lowercase();
        let task_key = key.clone();
        match tokio::task::spawn_blocking(move || cache.invalidate(&task_key)).await {
            Ok(()) => tracing::info!("Cleared cached exam list for {}", key),
            Err(e) => tracing::warn!("Failed to clear cached exam list for {}: {}", key, e),
        }
    }

    /// Reads a provider's cached slugs off the async runtime
    async fn cached_exam_slugs(&self, provider: &str) -> Option<BTreeSet<String>> {
        let cache = self.cache.clone()?;
        let provider = provider.to_string();
        match tokio::task::spawn_blocking(move || cache.get(&provider)).await {
            Ok(cached) => cached,
            Err(e) => {
                if self.debug {
                    tracing::debug!("Discovery cache read task failed: {}", e);
                }
                None
            }
        }
    }

    /// Writes a provider's slugs off the async runtime
    async fn store_exam_slugs(&self, provider: &str, slugs: &BTreeSet<String>) {
        let Some(cache) = self.cache.clone() else {
            return;
        };

        let provider = provider.to_string();
        let slugs = slugs.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || cache.put(&provider, &slugs)).await {
            if self.debug {
                tracing::debug!("Discovery cache write task failed: {}", e);
            }
        }
    }

    /// Discovers every provider on the site
    ///
    /// The exam index and discussion index are read concurrently and their
    /// providers unioned.
    ///
    /// # Returns
    ///
    /// * `Ok(ProviderSet)` - At least one provider was found
    /// * `Err(HarvestError::NoProviders)` - Both sources came back empty
    pub async fn discover_providers(&self) -> Result<ProviderSet> {
        let (from_exams, (from_discussions, adequate)) =
            tokio::join!(self.providers_from_exam_index(), self.providers_from_discussion_index());

        if self.debug {
            tracing::debug!(
                "Provider discovery: {} from exam index, {} from discussion index",
                from_exams.len(),
                from_discussions.len()
            );
        }

        let providers: BTreeSet<String> = from_exams.into_iter().chain(from_discussions).collect();
        if providers.is_empty() {
            return Err(HarvestError::NoProviders);
        }

        let partial = !adequate;
        if partial {
            tracing::warn!(
                "Discussion index coverage target not reached; provider list may be incomplete"
            );
        }

        Ok(ProviderSet {
            providers: providers.into_iter().collect(),
            partial,
        })
    }

    async fn providers_from_exam_index(&self) -> Vec<String> {
        match self.fetcher.fetch(&self.site.exam_index()).await {
            Some(html) => parser::providers_from_exam_index(&html),
            None => Vec::new(),
        }
    }

    /// Reads the discussion index until its listing looks complete
    ///
    /// Returns the largest listing observed and whether it met the target:
    /// the configured share of the declared category count, or the provider
    /// floor when no count is declared.
    async fn providers_from_discussion_index(&self) -> (Vec<String>, bool) {
        let crawler = &self.config.crawler;
        let attempts = crawler.provider_discovery_attempts.max(1);
        let url = self.site.discussion_index();

        let mut best: Vec<String> = Vec::new();
        let mut declared: u64 = 0;

        for attempt in 1..=attempts {
            match self.fetcher.fetch(&url).await {
                Some(html) => {
                    if let Some(count) = parser::discussion_category_count(&html) {
                        declared = declared.max(count);
                    }

                    let current = parser::providers_from_discussions(&html);
                    if current.len() > best.len() {
                        best = current;
                    }

                    let target = if declared > 0 {
                        (declared as f64 * crawler.category_coverage) as usize
                    } else {
                        crawler.provider_floor
                    };
                    if !best.is_empty() && best.len() >= target {
                        return (best, true);
                    }
                }
                None => {
                    if self.debug {
                        tracing::debug!(
                            "Discussion index unavailable (attempt {}/{})",
                            attempt,
                            attempts
                        );
                    }
                }
            }

            if attempt < attempts {
                tokio::time::sleep(crawler.provider_discovery_pause()).await;
            }
        }

        (best, false)
    }

    /// Lists the exams of one provider
    ///
    /// Slugs from the official exam index and slugs inferred from the
    /// provider's discussion listing are normalized and unioned.
    ///
    /// # Returns
    ///
    /// * `Ok(ExamCatalog::Exams(..))` - Canonical exam codes, sorted
    /// * `Ok(ExamCatalog::AllDiscussions)` - Neither source yielded a slug
    /// * `Err(HarvestError::InvalidProvider)` - Empty provider id
    pub async fn discover_exam_slugs(&self, provider: &str) -> Result<ExamCatalog> {
        let provider = provider_id(provider)?;

        let (official, inferred) = tokio::join!(
            self.official_exam_slugs(&provider),
            self.inferred_exam_slugs(&provider)
        );

        let normalizer = self.rules.for_provider(&provider);
        let exams: BTreeSet<String> = official
            .iter()
            .chain(inferred.iter())
            .map(|slug| normalizer.normalize(slug))
            .filter(|slug| !slug.is_empty())
            .collect();

        if exams.is_empty() {
            tracing::info!("No exams identified for {}; falling back to every discussion", provider);
            return Ok(ExamCatalog::AllDiscussions);
        }

        Ok(ExamCatalog::Exams(exams.into_iter().collect()))
    }

    async fn official_exam_slugs(&self, provider: &str) -> Vec<String> {
        match self.fetcher.fetch(&self.site.provider_exams(provider)).await {
            Some(html) => parser::provider_exam_slugs(provider, &html),
            None => Vec::new(),
        }
    }

    /// Raw exam slugs encoded in the provider's discussion links
    ///
    /// Served from the discovery cache when fresh. A cold crawl is written
    /// back only when every listing page was fetched.
    async fn inferred_exam_slugs(&self, provider: &str) -> BTreeSet<String> {
        if let Some(cached) = self.cached_exam_slugs(provider).await {
            if self.debug {
                tracing::debug!("Using {} cached exam slugs for {}", cached.len(), provider);
            }
            return cached;
        }

        let pages = self.listing_page_count(provider).await;
        let results = self.fetch_listing_pages(provider, pages).await;
        let complete = results.iter().all(Option::is_some);

        let slugs: BTreeSet<String> = results
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|link| extract_exam_slug(link.as_str()))
            .collect();

        if self.cache.is_some() {
            if complete {
                self.store_exam_slugs(provider, &slugs).await;
            } else if self.debug {
                tracing::debug!(
                    "Not caching exam slugs for {}: some listing pages failed",
                    provider
                );
            }
        }

        slugs
    }

    /// Number of pages in a provider's discussion listing (at least 1)
    async fn listing_page_count(&self, provider: &str) -> u32 {
        match self.fetcher.fetch(&self.site.provider_discussions(provider)).await {
            Some(html) => parser::page_count(&html),
            None => {
                if self.debug {
                    tracing::debug!("Listing for {} unavailable; assuming one page", provider);
                }
                1
            }
        }
    }

    /// Fetches listing pages `1..=pages` concurrently, one slot per page
    async fn fetch_listing_pages(&self, provider: &str, pages: u32) -> Vec<Option<Vec<DiscussionLink>>> {
        let urls: Vec<String> = (1..=pages)
            .map(|page| self.site.provider_discussion_page(provider, page))
            .collect();

        let fetcher = self.fetcher.clone();
        let site = Arc::clone(&self.site);
        let debug = self.debug;

        self.pool
            .run_all(urls, move |url| {
                let fetcher = fetcher.clone();
                let site = Arc::clone(&site);
                async move {
                    let Some(html) = fetcher.fetch(&url).await else {
                        if debug {
                            tracing::debug!("Listing page {} returned nothing", url);
                        }
                        return None;
                    };
                    Some(parser::discussion_links(&html, &site))
                }
            })
            .await
    }

    /// Harvests every question record of one exam
    ///
    /// # Steps
    ///
    /// 1. Count the provider's listing pages
    /// 2. Fetch every listing page concurrently and keep matching links
    /// 3. Deduplicate and sort the links by (topic, question)
    /// 4. Fetch and parse one record per link concurrently
    /// 5. Keep non-empty records in link order
    /// 6. Summarize the raw slug variants folded into the selection
    ///
    /// An empty selection, or [`ALL_DISCUSSIONS`], matches every link.
    pub async fn crawl_exam(&self, provider: &str, selection: &str) -> Result<CrawlOutcome> {
        let started = Instant::now();
        let provider = provider_id(provider)?;
        let selection = effective_selection(selection);

        let pages = self.listing_page_count(&provider).await;
        tracing::info!("Crawling {} listing pages for {}", pages, provider);

        let page_results = self.fetch_listing_pages(&provider, pages).await;
        let failed_pages = page_results.iter().filter(|r| r.is_none()).count();

        let normalizer = self.rules.for_provider(&provider);
        let matcher = SelectionMatcher::new(&normalizer, &selection);
        let mut matching = Vec::new();
        for page_links in page_results.into_iter().flatten() {
            matching.extend(
                page_links
                    .into_iter()
                    .filter(|link| matcher.is_match(link.as_str())),
            );
        }
        let mut links = dedup_links(matching);
        sort_links(&mut links);

        let variant_summary = VariantSummary::collect(&normalizer, &selection, &links);
        if let Some(summary) = &variant_summary {
            tracing::info!("{}", summary);
        }

        if links.is_empty() {
            tracing::info!("No matching questions were found");
        } else {
            tracing::info!("Fetching {} questions", links.len());
        }

        let matched_links = links.len();
        let records = self.fetch_records(links).await;
        let failed_records = matched_links - records.len();

        let elapsed = started.elapsed();
        tracing::info!(
            "Extraction complete in {:.1}s: {} records",
            elapsed.as_secs_f64(),
            records.len()
        );

        Ok(CrawlOutcome {
            provider,
            selection,
            records,
            variant_summary,
            pages,
            matched_links,
            failed_pages,
            failed_records,
            elapsed,
        })
    }

    async fn fetch_records(&self, links: Vec<DiscussionLink>) -> Vec<QuestionRecord> {
        let fetcher = self.fetcher.clone();
        let site = Arc::clone(&self.site);
        let debug = self.debug;

        let results = self
            .pool
            .run_all(links, move |link| {
                let fetcher = fetcher.clone();
                let site = Arc::clone(&site);
                async move {
                    let url = site.absolute(link.as_str());
                    let Some(html) = fetcher.fetch(&url).await else {
                        if debug {
                            tracing::debug!("Question page {} returned nothing", url);
                        }
                        return None;
                    };

                    let record = parser::question_record(&html, &url, &site);
                    if record.is_empty() {
                        if debug {
                            tracing::debug!("Question page {} has no title; dropping", url);
                        }
                        return None;
                    }
                    Some(record)
                }
            })
            .await;

        results.into_iter().flatten().collect()
    }
}

fn provider_id(provider: &str) -> Result<String> {
    let id = provider.trim().to_lowercase();
    if id.is_empty() {
        return Err(HarvestError::InvalidProvider(provider.to_string()));
    }
    Ok(id)
}

fn effective_selection(selection: &str) -> String {
    let selection = selection.trim().to_lowercase();
    if selection == ALL_DISCUSSIONS {
        String::new()
    } else {
        selection
    }
}
