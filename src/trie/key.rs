//! Reversed-label lookup keys.
//!
//! A host like `mail.example.com` becomes `[com, example, mail]`, which turns
//! "is this a subdomain of a listed domain" into a prefix walk over the trie.
//! Internationalized names are stored in their ASCII (`xn--`) form, the same
//! form `url` reports for request hosts.

use std::borrow::Cow;

use url::Host;

/// Canonical lookup key for a hostname: labels in reverse order, lower-cased.
///
/// Malformed input produces an empty key, which never matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainKey<'a> {
    labels: Vec<Cow<'a, str>>,
}

impl<'a> DomainKey<'a> {
    /// Build a key from a hostname.
    ///
    /// A single trailing root dot is accepted (`example.com.`). Non-ASCII
    /// hosts are converted to their ASCII form first. Any empty label or label
    /// containing characters outside ASCII alphanumerics, `-` and `_` makes
    /// the whole key empty.
    pub fn new(host: &'a str) -> Self {
        let host = host.strip_suffix('.').unwrap_or(host);
        if host.is_empty() {
            return Self::default();
        }
        if !host.is_ascii() {
            return Self::from_unicode(host);
        }

        let mut labels = Vec::with_capacity(host.bytes().filter(|&b| b == b'.').count() + 1);
        for label in host.rsplit('.') {
            if !is_valid_label(label) {
                return Self::default();
            }
            // Only allocate when the label actually needs lowercasing
            if label.bytes().any(|b| b.is_ascii_uppercase()) {
                labels.push(Cow::Owned(label.to_ascii_lowercase()));
            } else {
                labels.push(Cow::Borrowed(label));
            }
        }

        Self { labels }
    }

    fn from_unicode(host: &str) -> Self {
        let ascii = match Host::parse(host) {
            Ok(Host::Domain(ascii)) => ascii,
            _ => return Self::default(),
        };

        let mut labels = Vec::new();
        for label in ascii.rsplit('.') {
            if !is_valid_label(label) {
                return Self::default();
            }
            labels.push(Cow::Owned(label.to_ascii_lowercase()));
        }
        Self { labels }
    }

    /// Labels from the top-level domain downwards.
    pub fn labels(&self) -> &[Cow<'a, str>] {
        &self.labels
    }

    /// Number of labels in the key
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// An empty key never matches.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Reassemble the hostname in normal (non-reversed) order.
    pub fn to_host(&self) -> String {
        let mut parts: Vec<&str> = self.labels.iter().map(|l| l.as_ref()).collect();
        parts.reverse();
        parts.join(".")
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
