//! Tracker Blocklist - tracking protection matching engine for Rust
//!
//! Decides whether a browser resource request goes to a known tracker and
//! should be blocked. This library provides:
//! - Categorized blocklist parsing (Advertising, Analytics, Social, ...)
//! - Domain suffix matching over reversed-label tries
//! - First-party exceptions through an entity ownership list
//! - Per-category enable flags that can be toggled at runtime
//! - A build-once matcher cache with background preloading
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tracker_blocklist::{MatcherCache, MatcherConfig, MemoryListSource, RequestFilter};
//!
//! let blocklist = r#"{"categories": {
//!     "Advertising": [{"AdCo": {"http://adco.example/": ["adco.example"]}}],
//!     "Social": []
//! }}"#;
//! let entity_list = r#"{"AdCo": {"properties": ["adco-news.example"], "resources": ["adco.example"]}}"#;
//!
//! let source = MemoryListSource::new(blocklist, entity_list);
//! let config = Arc::new(MatcherConfig::new());
//! let cache = Arc::new(MatcherCache::new(source, config.clone()));
//!
//! // Starts building the matcher in the background
//! let filter = RequestFilter::new(cache);
//!
//! filter.notify_current_url("https://blog.example/");
//! assert!(filter.should_intercept("https://px.adco.example/t.gif").unwrap());
//!
//! // Same owner as the page being viewed
//! filter.notify_current_url("https://adco-news.example/");
//! assert!(!filter.should_intercept("https://px.adco.example/t.gif").unwrap());
//!
//! // Disabling a category takes effect immediately
//! filter.notify_current_url("https://blog.example/");
//! config.set_enabled("Advertising", false);
//! assert!(!filter.should_intercept("https://px.adco.example/t.gif").unwrap());
//! ```
//!
//! # Blocklist Format
//!
//! ```text
//! {"categories": {"<Category>": [{"<Site>": {"<site url>": ["domain", ...]}}]}}
//! ```
//!
//! | Category | Handling |
//! |----------|----------|
//! | `Legacy Disconnect`, `Legacy Content` | Ignored |
//! | `Disconnect` | Merged into `Social` |
//! | Anything else | Own trie, enabled unless configured otherwise |
//!
//! A listed domain matches itself and all of its subdomains.

pub mod config;
pub mod entity;
pub mod error;
pub mod filter;
pub mod loader;
pub mod matcher;
pub mod parser;
pub mod trie;
pub mod types;

pub use config::{CategorySettings, ConfigSnapshot, MatcherConfig};
pub use entity::{EntityRecord, EntityTable};
pub use error::{BlocklistError, ListKind, Result};
pub use filter::RequestFilter;
pub use loader::{build_matcher, CacheState, FileListSource, ListSource, MatcherCache, MemoryListSource};
pub use matcher::UrlMatcher;
pub use parser::{parse_blocklist, parse_entity_list};
pub use trie::{DomainKey, DomainTrie, SuffixTrie};
pub use types::Verdict;
