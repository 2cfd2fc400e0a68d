//! Per-request blocking decision.
//!
//! A request is blocked when its host is listed in an enabled category and
//! the page being viewed does not belong to the same entity as the request.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use url::Url;

use crate::config::MatcherConfig;
use crate::entity::EntityTable;
use crate::error::Result;
use crate::parser::{parse_blocklist, parse_entity_list};
use crate::trie::{DomainKey, DomainTrie};
use crate::types::Verdict;

/// Matching engine: category tries, entity table and a shared config handle.
///
/// Immutable once built. Only the category flags in [`MatcherConfig`] change
/// afterwards, and toggling them never rebuilds a trie.
#[derive(Debug)]
pub struct UrlMatcher {
    /// Sorted by name so the reported category is stable
    categories: BTreeMap<String, DomainTrie>,
    entities: EntityTable,
    config: Arc<MatcherConfig>,
}

impl UrlMatcher {
    /// Assemble a matcher from parsed parts
    pub fn new(
        categories: HashMap<String, DomainTrie>,
        entities: EntityTable,
        config: Arc<MatcherConfig>,
    ) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            entities,
            config,
        }
    }

    /// Parse both lists and build a matcher
    pub fn from_lists(
        blocklist: &str,
        entity_list: &str,
        config: Arc<MatcherConfig>,
    ) -> Result<Self> {
        let categories = parse_blocklist(blocklist)?;
        let entities = parse_entity_list(entity_list)?;
        Ok(Self::new(categories, entities, config))
    }

    /// Decide whether a resource request should be blocked.
    ///
    /// `current_page_url` is the top-level page being loaded; without it the
    /// first-party exception cannot apply. Unparseable URLs never block.
    pub fn should_block(&self, request_url: &str, current_page_url: Option<&str>) -> bool {
        self.evaluate(request_url, current_page_url).is_blocked()
    }

    /// Same decision as [`should_block`](Self::should_block), with the reason.
    pub fn evaluate(&self, request_url: &str, current_page_url: Option<&str>) -> Verdict<'_> {
        let Some(request) = parse_url(request_url) else {
            return Verdict::NoHost;
        };
        let request_key = match request.host_str() {
            Some(host) => DomainKey::new(host),
            None => return Verdict::NoHost,
        };
        if request_key.is_empty() {
            return Verdict::NoHost;
        }

        let Some(category) = self.listed_category(&request_key) else {
            return Verdict::NotListed;
        };

        if let Some(page) = current_page_url.and_then(parse_url) {
            if let Some(page_host) = page.host_str() {
                let page_key = DomainKey::new(page_host);
                if let Some(entity) = self.entities.shared_owner(&page_key, &request_key) {
                    return Verdict::FirstParty {
                        category,
                        entity: entity.name(),
                    };
                }
            }
        }

        Verdict::Blocked { category }
    }

    /// First enabled category listing `host` or one of its parents.
    pub fn match_host(&self, host: &str) -> Option<&str> {
        self.listed_category(&DomainKey::new(host))
    }

    fn listed_category(&self, key: &DomainKey<'_>) -> Option<&str> {
        if key.is_empty() {
            return None;
        }
        // One snapshot per decision so a concurrent toggle can't split it
        let config = self.config.snapshot();
        self.categories
            .iter()
            .find(|(name, trie)| config.is_enabled(name) && trie.matches_key(key))
            .map(|(name, _)| name.as_str())
    }

    /// Category names, sorted
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Check if a category was loaded
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    /// Trie of a single category
    pub fn category(&self, name: &str) -> Option<&DomainTrie> {
        self.categories.get(name)
    }

    /// Entity ownership table
    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    /// Shared category configuration
    pub fn config(&self) -> &Arc<MatcherConfig> {
        &self.config
    }
}

fn parse_url(url: &str) -> Option<Url> {
    Url::parse(url).ok()
}
