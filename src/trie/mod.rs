//! Suffix trie keyed by reversed domain labels.
//!
//! Inserting `example.com` stores the path `com -> example`. Looking up
//! `ads.example.com` walks `com -> example -> ads` and stops at the first
//! terminal node, so every subdomain of a stored domain matches. Each query is
//! O(number of labels) regardless of how many domains are stored.

mod key;

pub use key::DomainKey;

use std::collections::HashMap;

/// Trie node. Owned exclusively by its parent.
#[derive(Debug, Clone)]
struct TrieNode<V> {
    children: HashMap<String, TrieNode<V>>,
    /// Set when a stored domain ends at this node
    value: Option<V>,
}

impl<V> Default for TrieNode<V> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            value: None,
        }
    }
}

/// Suffix trie carrying an optional payload per stored domain.
///
/// The blocklist uses the payload-free [`DomainTrie`]; the entity table stores
/// an owner index per domain.
#[derive(Debug, Clone)]
pub struct SuffixTrie<V = ()> {
    root: TrieNode<V>,
    len: usize,
}

/// Trie of blocked domains.
pub type DomainTrie = SuffixTrie<()>;

impl<V> Default for SuffixTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SuffixTrie<V> {
    /// Create an empty trie
    pub fn new() -> Self {
        Self {
            root: TrieNode::default(),
            len: 0,
        }
    }

    /// Store `domain` with a payload, replacing any payload already stored for
    /// exactly that domain. Returns the replaced payload.
    ///
    /// Malformed domains (empty key) are ignored.
    pub fn insert_with(&mut self, domain: &str, value: V) -> Option<V> {
        self.insert_key_with(&DomainKey::new(domain), value)
    }

    /// Same as [`insert_with`](Self::insert_with) for a prebuilt key.
    pub fn insert_key_with(&mut self, key: &DomainKey<'_>, value: V) -> Option<V> {
        // An empty key would mark the root terminal and match everything
        if key.is_empty() {
            return None;
        }

        let mut node = &mut self.root;
        for label in key.labels() {
            node = node.children.entry(label.to_string()).or_default();
        }

        let previous = node.value.replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// True if `domain` or any of its parent domains is stored.
    pub fn matches(&self, domain: &str) -> bool {
        self.matches_key(&DomainKey::new(domain))
    }

    /// Same as [`matches`](Self::matches) for a prebuilt key.
    pub fn matches_key(&self, key: &DomainKey<'_>) -> bool {
        let mut node = &self.root;
        for label in key.labels() {
            match node.children.get(&**label) {
                Some(child) if child.value.is_some() => return true,
                Some(child) => node = child,
                None => return false,
            }
        }
        false
    }

    /// Payload of the most specific stored domain that equals `domain` or is
    /// one of its parents.
    pub fn lookup(&self, domain: &str) -> Option<&V> {
        self.lookup_key(&DomainKey::new(domain))
    }

    /// Same as [`lookup`](Self::lookup) for a prebuilt key.
    pub fn lookup_key(&self, key: &DomainKey<'_>) -> Option<&V> {
        let mut node = &self.root;
        let mut deepest = None;
        for label in key.labels() {
            match node.children.get(&**label) {
                Some(child) => {
                    if let Some(ref value) = child.value {
                        deepest = Some(value);
                    }
                    node = child;
                }
                None => break,
            }
        }
        deepest
    }

    /// Number of distinct stored domains
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the trie is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl DomainTrie {
    /// Store a blocked domain. Returns false if it was already present or malformed.
    pub fn insert(&mut self, domain: &str) -> bool {
        let key = DomainKey::new(domain);
        !key.is_empty() && self.insert_key_with(&key, ()).is_none()
    }
}

impl<'s> Extend<&'s str> for DomainTrie {
    fn extend<I: IntoIterator<Item = &'s str>>(&mut self, iter: I) {
        for domain in iter {
            self.insert(domain);
        }
    }
}

impl<'s> FromIterator<&'s str> for DomainTrie {
    fn from_iter<I: IntoIterator<Item = &'s str>>(iter: I) -> Self {
        let mut trie = DomainTrie::new();
        trie.extend(iter);
        trie
    }
}
