use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Directory name under the per-user cache directory
const CACHE_DIR_NAME: &str = "exam-harvest";

/// Document file name under [`CACHE_DIR_NAME`]
const CACHE_FILE_NAME: &str = "discussion_exam_slugs.json";

/// Used when no per-user cache directory exists
const LOCAL_FALLBACK_FILE: &str = ".exam_harvest_discussion_exam_cache.json";

/// One provider's inferred exam slugs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default)]
    pub exam_slugs: Vec<String>,

    #[serde(default)]
    pub updated_at_unix: i64,
}

impl CacheEntry {
    fn new(exam_slugs: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            exam_slugs,
            updated_at_unix: now.timestamp(),
        }
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        if self.updated_at_unix <= 0 {
            return None;
        }
        Utc.timestamp_opt(self.updated_at_unix, 0).single()
    }

    /// Entries are valid while their age is at most `ttl`
    ///
    /// Entries with a missing or future-garbled timestamp are stale.
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match self.updated_at() {
            Some(updated_at) => now - updated_at > ttl,
            None => true,
        }
    }
}

/// The whole persisted document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDocument {
    #[serde(default)]
    pub providers: BTreeMap<String, CacheEntry>,
}

#[derive(Debug, Default)]
struct CacheState {
    loaded: bool,
    document: CacheDocument,
}

/// TTL-backed store of provider → exam slug sets
///
/// The document is loaded lazily on first access and rewritten as a whole on
/// every change. A single mutex serializes all access; there is no
/// cross-process coordination. A missing, unreadable or malformed document
/// reads as empty.
#[derive(Debug)]
pub struct DiscoveryCache {
    path: PathBuf,
    ttl: Duration,
    debug: bool,
    state: Mutex<CacheState>,
}

impl DiscoveryCache {
    /// Creates a cache backed by the document at `path`
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            debug: false,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Creates a cache at [`DiscoveryCache::default_path`]
    pub fn at_default_location(ttl: Duration) -> Self {
        Self::new(Self::default_path(), ttl)
    }

    /// Enables diagnostic logging of load/save failures
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Per-user cache directory, or a file in the working directory
    pub fn default_path() -> PathBuf {
        match dirs::cache_dir() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                dir.join(CACHE_DIR_NAME).join(CACHE_FILE_NAME)
            }
            _ => PathBuf::from(".").join(LOCAL_FALLBACK_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached slugs for a provider if the entry is fresh
    ///
    /// An expired entry is removed and the document persisted immediately.
    pub fn get(&self, provider: &str) -> Option<BTreeSet<String>> {
        self.get_at(provider, Utc::now())
    }

    pub(crate) fn get_at(&self, provider: &str, now: DateTime<Utc>) -> Option<BTreeSet<String>> {
        let provider = normalize_key(provider)?;
        let mut state = self.lock_loaded();

        let entry = state.document.providers.get(&provider)?;
        if entry.is_stale(self.ttl, now) {
            state.document.providers.remove(&provider);
            self.persist(&state.document);
            return None;
        }

        let slugs: BTreeSet<String> = entry.exam_slugs.iter().cloned().collect();
        if slugs.is_empty() {
            None
        } else {
            Some(slugs)
        }
    }

    /// Overwrites a provider's entry and persists the document
    ///
    /// An empty slug set is ignored.
    pub fn put(&self, provider: &str, exam_slugs: &BTreeSet<String>) {
        self.put_at(provider, exam_slugs, Utc::now());
    }

    pub(crate) fn put_at(&self, provider: &str, exam_slugs: &BTreeSet<String>, now: DateTime<Utc>) {
        let Some(provider) = normalize_key(provider) else {
            return;
        };
        if exam_slugs.is_empty() {
            return;
        }

        let mut state = self.lock_loaded();
        state.document.providers.insert(
            provider,
            CacheEntry::new(exam_slugs.iter().cloned().collect(), now),
        );
        self.persist(&state.document);
    }

    /// Deletes a provider's entry so the next lookup is a cold miss
    pub fn invalidate(&self, provider: &str) {
        let Some(provider) = normalize_key(provider) else {
            return;
        };

        let mut state = self.lock_loaded();
        if state.document.providers.remove(&provider).is_some() {
            self.persist(&state.document);
        }
    }

    /// Number of entries currently held, fresh or not
    pub fn len(&self) -> usize {
        self.lock_loaded().document.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_loaded(&self) -> MutexGuard<'_, CacheState> {
        // A panic while holding the lock cannot leave a half-written
        // document in memory, so a poisoned lock is still usable.
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !state.loaded {
            state.loaded = true;
            state.document = self.load();
        }

        state
    }

    fn load(&self) -> CacheDocument {
        let payload = match fs::read(&self.path) {
            Ok(payload) => payload,
            Err(_) => return CacheDocument::default(),
        };

        match serde_json::from_slice::<CacheDocument>(&payload) {
            Ok(document) => document,
            Err(e) => {
                if self.debug {
                    tracing::debug!(
                        "Ignoring malformed discovery cache {}: {}",
                        self.path.display(),
                        e
                    );
                }
                CacheDocument::default()
            }
        }
    }

    fn persist(&self, document: &CacheDocument) {
        if let Err(e) = write_document(&self.path, document) {
            if self.debug {
                tracing::debug!(
                    "Failed to write discovery cache {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

fn normalize_key(provider: &str) -> Option<String> {
    let key = provider.trim().to_lowercase();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Writes the document to a sibling temp file and renames it into place
fn write_document(path: &Path, document: &CacheDocument) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let payload = serde_json::to_vec_pretty(document)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload)?;
    fs::rename(&tmp, path)
}
