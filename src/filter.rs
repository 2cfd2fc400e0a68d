//! Request filter.
//!
//! Embedding glue for a browsing session: remembers the page currently being
//! loaded and answers whether each resource request should be intercepted.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::loader::MatcherCache;
use crate::types::Verdict;

/// Per-session request filter over a shared [`MatcherCache`].
///
/// Creating a filter schedules a background preload so the lists are usually
/// parsed before the first request arrives.
pub struct RequestFilter {
    cache: Arc<MatcherCache>,
    current_page: RwLock<Option<String>>,
}

impl RequestFilter {
    /// Create a filter and start preloading the matcher.
    pub fn new(cache: Arc<MatcherCache>) -> Self {
        cache.trigger_preload();
        Self {
            cache,
            current_page: RwLock::new(None),
        }
    }

    /// Record the top-level page the session is now loading.
    pub fn notify_current_url(&self, url: impl Into<String>) {
        let url = url.into();
        log::trace!("Current page: {}", url);
        *self.current_page.write() = Some(url);
    }

    /// Forget the current page, e.g. when the session navigates away.
    pub fn clear_current_url(&self) {
        *self.current_page.write() = None;
    }

    /// Top-level page last recorded
    pub fn current_url(&self) -> Option<String> {
        self.current_page.read().clone()
    }

    /// Decide whether a resource request should be intercepted.
    ///
    /// Builds the matcher on first use if the preload has not finished. An
    /// error here means the lists could not be loaded.
    pub fn should_intercept(&self, request_url: &str) -> Result<bool> {
        let matcher = self.cache.get_or_build()?;
        let page = self.current_page.read();
        let verdict = matcher.evaluate(request_url, page.as_deref());

        match verdict {
            Verdict::Blocked { category } => {
                log::debug!("Intercepting {} ({})", request_url, category);
                Ok(true)
            }
            Verdict::FirstParty { entity, .. } => {
                log::trace!("Allowing first-party request {} ({})", request_url, entity);
                Ok(false)
            }
            Verdict::NoHost | Verdict::NotListed => Ok(false),
        }
    }

    /// Shared matcher cache
    pub fn cache(&self) -> &Arc<MatcherCache> {
        &self.cache
    }
}

impl std::fmt::Debug for RequestFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestFilter")
            .field("cache", &self.cache)
            .field("current_page", &*self.current_page.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatcherConfig;
    use crate::loader::{CacheState, MemoryListSource};

    const BLOCKLIST: &str = r#"{"categories": {
        "Advertising": [{"Ads": {"http://ads/": ["ads.example.com"]}}],
        "Social": [{"Social": {"http://social/": ["social.example"]}}]
    }}"#;
    const ENTITY_LIST: &str =
        r#"{"ExampleCorp": {"properties": ["news.example.com"], "resources": ["ads.example.com"]}}"#;

    fn filter() -> RequestFilter {
        let source = MemoryListSource::new(BLOCKLIST, ENTITY_LIST);
        let cache = Arc::new(MatcherCache::new(source, Arc::new(MatcherConfig::new())));
        RequestFilter::new(cache)
    }

    #[test]
    fn test_intercepts_third_party_tracker() {
        let filter = filter();
        filter.notify_current_url("http://blog.example.org/post");
        assert!(filter.should_intercept("http://ads.example.com/px.gif").unwrap());
        assert!(!filter.should_intercept("http://cdn.example.org/site.css").unwrap());
    }

    #[test]
    fn test_first_party_page_is_not_intercepted() {
        let filter = filter();
        filter.notify_current_url("http://news.example.com/");
        assert!(!filter.should_intercept("http://ads.example.com/px.gif").unwrap());

        filter.notify_current_url("http://other.org/");
        assert!(filter.should_intercept("http://ads.example.com/px.gif").unwrap());
    }

    #[test]
    fn test_without_current_page() {
        let filter = filter();
        assert_eq!(filter.current_url(), None);
        assert!(filter.should_intercept("http://ads.example.com/px.gif").unwrap());

        filter.notify_current_url("http://news.example.com/");
        assert_eq!(filter.current_url().as_deref(), Some("http://news.example.com/"));
        filter.clear_current_url();
        assert!(filter.should_intercept("http://ads.example.com/px.gif").unwrap());
    }

    #[test]
    fn test_new_filter_is_ready_after_first_request() {
        let filter = filter();
        assert_ne!(filter.cache().state(), CacheState::Unbuilt);
        filter.should_intercept("http://social.example/").unwrap();
        assert_eq!(filter.cache().state(), CacheState::Ready);
    }

    #[test]
    fn test_load_failure_is_reported() {
        let source = MemoryListSource::new(r#"{"categories": {}}"#, "{}");
        let cache = Arc::new(MatcherCache::new(source, Arc::new(MatcherConfig::new())));
        let filter = RequestFilter::new(cache);

        let err = filter.should_intercept("http://ads.example.com/").unwrap_err();
        assert!(err.is_configuration_error());
    }
}
