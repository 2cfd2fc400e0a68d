//! Build-once matcher cache.
//!
//! State moves `Unbuilt -> Building -> Ready` and never back. The matcher is
//! published exactly once through a [`OnceCell`]; callers arriving while a
//! build runs wait for it instead of starting their own. A failed build leaves
//! the cache `Unbuilt` and the error goes to the caller that ran it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use once_cell::sync::OnceCell;

use super::{build_matcher, ListSource};
use crate::config::MatcherConfig;
use crate::error::Result;
use crate::matcher::UrlMatcher;

/// Observable lifecycle of a [`MatcherCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No matcher and no build in progress
    Unbuilt,
    /// A preload was scheduled or a build is running
    Building,
    /// Matcher published
    Ready,
}

/// Lazily built, shared matcher.
///
/// Create one per process and hand `Arc<MatcherCache>` to every request
/// interceptor.
pub struct MatcherCache {
    source: Box<dyn ListSource>,
    config: Arc<MatcherConfig>,
    matcher: OnceCell<Arc<UrlMatcher>>,
    /// Scheduled preloads plus running builds
    inflight: AtomicUsize,
}

/// Decrements the in-flight counter on drop, including on panic.
struct InflightGuard<'a>(&'a AtomicUsize);

impl<'a> InflightGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl MatcherCache {
    /// Create an unbuilt cache over a list source
    pub fn new(source: impl ListSource + 'static, config: Arc<MatcherConfig>) -> Self {
        Self {
            source: Box::new(source),
            config,
            matcher: OnceCell::new(),
            inflight: AtomicUsize::new(0),
        }
    }

    /// Category configuration shared with every matcher this cache builds
    pub fn config(&self) -> &Arc<MatcherConfig> {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> CacheState {
        if self.matcher.get().is_some() {
            CacheState::Ready
        } else if self.inflight.load(Ordering::Acquire) > 0 {
            CacheState::Building
        } else {
            CacheState::Unbuilt
        }
    }

    /// The published matcher, without building
    pub fn get(&self) -> Option<Arc<UrlMatcher>> {
        self.matcher.get().cloned()
    }

    /// Return the published matcher, building it on this thread if needed.
    ///
    /// Blocks while another thread's build is running and then returns its
    /// result.
    pub fn get_or_build(&self) -> Result<Arc<UrlMatcher>> {
        self.matcher
            .get_or_try_init(|| {
                let _guard = InflightGuard::enter(&self.inflight);
                log::debug!("Building tracker matcher");
                build_matcher(self.source.as_ref(), Arc::clone(&self.config)).map(Arc::new)
            })
            .cloned()
    }

    /// Start building on a background thread unless a matcher is already
    /// published or a build is known to be under way.
    ///
    /// Returns true if a preload thread was started. Calling this redundantly
    /// is harmless: concurrent builds join the one already running.
    pub fn trigger_preload(self: &Arc<Self>) -> bool {
        if self.state() != CacheState::Unbuilt {
            return false;
        }

        // Count the preload before spawning so the cache reads as Building at once
        self.inflight.fetch_add(1, Ordering::AcqRel);
        let cache = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("tracker-preload".to_string())
            .spawn(move || {
                let _scheduled = InflightGuard(&cache.inflight);
                if let Err(e) = cache.get_or_build() {
                    log::warn!("Tracker list preload failed: {}", e);
                }
            });

        match spawned {
            Ok(_) => true,
            Err(e) => {
                self.inflight.fetch_sub(1, Ordering::AcqRel);
                log::warn!("Failed to spawn tracker preload thread: {}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for MatcherCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherCache")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlocklistError;
    use crate::loader::MemoryListSource;
    use parking_lot::Mutex;
    use std::sync::mpsc;
    use std::time::Duration;

    const BLOCKLIST: &str = r#"{"categories": {
        "Advertising": [{"Ads": {"http://ads/": ["ads.example.com"]}}],
        "Social": []
    }}"#;

    /// Counts reads and optionally waits for a release signal before answering.
    struct GatedSource {
        inner: MemoryListSource,
        reads: Arc<AtomicUsize>,
        gate: Option<Mutex<mpsc::Receiver<()>>>,
    }

    impl ListSource for GatedSource {
        fn read_blocklist(&self) -> Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if let Some(ref gate) = self.gate {
                gate.lock()
                    .recv_timeout(Duration::from_secs(10))
                    .expect("gate released");
            }
            self.inner.read_blocklist()
        }

        fn read_entity_list(&self) -> Result<String> {
            self.inner.read_entity_list()
        }
    }

    fn counted_cache(gate: Option<mpsc::Receiver<()>>) -> (Arc<MatcherCache>, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = GatedSource {
            inner: MemoryListSource::new(BLOCKLIST, "{}"),
            reads: reads.clone(),
            gate: gate.map(Mutex::new),
        };
        let cache = Arc::new(MatcherCache::new(source, Arc::new(MatcherConfig::new())));
        (cache, reads)
    }

    #[test]
    fn test_get_or_build_publishes_once() {
        let (cache, reads) = counted_cache(None);
        assert_eq!(cache.state(), CacheState::Unbuilt);
        assert!(cache.get().is_none());

        let first = cache.get_or_build().unwrap();
        let second = cache.get_or_build().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.state(), CacheState::Ready);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preload_then_get() {
        let (tx, rx) = mpsc::channel();
        let (cache, reads) = counted_cache(Some(rx));

        assert!(cache.trigger_preload());
        assert_eq!(cache.state(), CacheState::Building);

        // A build is already scheduled
        assert!(!cache.trigger_preload());

        tx.send(()).unwrap();
        let matcher = cache.get_or_build().unwrap();
        assert!(matcher.should_block("http://ads.example.com/x", None));
        assert_eq!(cache.state(), CacheState::Ready);
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        assert!(!cache.trigger_preload());
    }

    #[test]
    fn test_concurrent_first_use_shares_one_matcher() {
        let (cache, reads) = counted_cache(None);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || cache.get_or_build().unwrap())
            })
            .collect();
        let matchers: Vec<Arc<UrlMatcher>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        for matcher in &matchers {
            assert!(Arc::ptr_eq(matcher, &matchers[0]));
        }
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_build_leaves_cache_unbuilt() {
        let source = MemoryListSource::new("{not json", "{}");
        let cache = MatcherCache::new(source, Arc::new(MatcherConfig::new()));

        assert!(matches!(
            cache.get_or_build(),
            Err(BlocklistError::Malformed { .. })
        ));
        assert_eq!(cache.state(), CacheState::Unbuilt);
    }

    #[test]
    fn test_config_is_shared_with_matcher() {
        let (cache, _) = counted_cache(None);
        let matcher = cache.get_or_build().unwrap();

        cache.config().set_enabled("Advertising", false);
        assert!(!matcher.should_block("http://ads.example.com/x", None));
        assert!(Arc::ptr_eq(cache.config(), matcher.config()));
    }
}
