use crate::trie::{DomainKey, SuffixTrie};

/// An organization and the domains it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    name: String,
    /// Primary domains (the sites a user visits)
    properties: Vec<String>,
    /// Affiliated domains serving the entity's own content (CDNs, APIs)
    resources: Vec<String>,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn with_property(mut self, domain: impl Into<String>) -> Self {
        self.properties.push(domain.into());
        self
    }

    pub fn with_resource(mut self, domain: impl Into<String>) -> Self {
        self.resources.push(domain.into());
        self
    }

    pub fn with_properties<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties.extend(domains.into_iter().map(Into::into));
        self
    }

    pub fn with_resources<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(domains.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Every domain owned by the entity, properties first.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.properties
            .iter()
            .chain(self.resources.iter())
            .map(String::as_str)
    }
}

/// Owned domain -> owning entity. Built once, read-only afterwards.
///
/// Lookups are suffix-aware: a host belongs to the entity registered for its
/// most specific registered ancestor, so `www.example.com` resolves through
/// `example.com`.
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    entities: Vec<EntityRecord>,
    owners: SuffixTrie<usize>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity. A domain already owned by an earlier entity is
    /// reassigned to this one.
    pub fn insert(&mut self, record: EntityRecord) {
        let index = self.entities.len();
        for domain in record.domains() {
            let key = DomainKey::new(domain);
            if key.is_empty() {
                log::warn!(
                    "Ignoring malformed domain '{}' of entity '{}'",
                    domain,
                    record.name
                );
                continue;
            }
            if let Some(previous) = self.owners.insert_key_with(&key, index) {
                if previous != index {
                    log::debug!(
                        "Domain '{}' moved from entity '{}' to '{}'",
                        domain,
                        self.entities[previous].name,
                        record.name
                    );
                }
            }
        }
        self.entities.push(record);
    }

    /// Owning entity of a host
    pub fn entity_for(&self, host: &str) -> Option<&EntityRecord> {
        self.entity_for_key(&DomainKey::new(host))
    }

    /// Owning entity of a prebuilt key
    pub fn entity_for_key(&self, key: &DomainKey<'_>) -> Option<&EntityRecord> {
        self.owners
            .lookup_key(key)
            .and_then(|&index| self.entities.get(index))
    }

    /// The entity owning both hosts, if they share one.
    pub fn shared_owner(&self, a: &DomainKey<'_>, b: &DomainKey<'_>) -> Option<&EntityRecord> {
        let owner_a = self.owners.lookup_key(a)?;
        let owner_b = self.owners.lookup_key(b)?;
        if owner_a == owner_b {
            self.entities.get(*owner_a)
        } else {
            None
        }
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of distinct registered domains
    pub fn domain_count(&self) -> usize {
        self.owners.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.iter()
    }
}

impl FromIterator<EntityRecord> for EntityTable {
    fn from_iter<I: IntoIterator<Item = EntityRecord>>(iter: I) -> Self {
        let mut table = EntityTable::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_table() -> EntityTable {
        [
            EntityRecord::new("ExampleCorp")
                .with_property("example.com")
                .with_resource("examplecdn.net"),
            EntityRecord::new("OtherCo").with_properties(["other.org", "other.io"]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_entity_for_property_and_resource() {
        let table = example_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table.domain_count(), 4);

        assert_eq!(table.entity_for("example.com").unwrap().name(), "ExampleCorp");
        assert_eq!(table.entity_for("examplecdn.net").unwrap().name(), "ExampleCorp");
        assert_eq!(table.entity_for("other.io").unwrap().name(), "OtherCo");
        assert!(table.entity_for("unrelated.com").is_none());
    }

    #[test]
    fn test_entity_for_subdomain() {
        let table = example_table();
        assert_eq!(
            table.entity_for("static.examplecdn.net").unwrap().name(),
            "ExampleCorp"
        );
        assert_eq!(table.entity_for("WWW.Example.COM").unwrap().name(), "ExampleCorp");
    }

    #[test]
    fn test_shared_owner() {
        let table = example_table();
        let page = DomainKey::new("news.example.com");

        let owner = table.shared_owner(&page, &DomainKey::new("img.examplecdn.net"));
        assert_eq!(owner.map(EntityRecord::name), Some("ExampleCorp"));

        assert!(table
            .shared_owner(&page, &DomainKey::new("other.org"))
            .is_none());
        assert!(table
            .shared_owner(&page, &DomainKey::new("unknown.net"))
            .is_none());
        assert!(table
            .shared_owner(&DomainKey::new(""), &DomainKey::new("example.com"))
            .is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let table: EntityTable = [
            EntityRecord::new("First").with_property("shared.com"),
            EntityRecord::new("Second").with_resource("shared.com"),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.entity_for("shared.com").unwrap().name(), "Second");
        assert_eq!(table.domain_count(), 1);
    }

    #[test]
    fn test_malformed_domains_are_skipped() {
        let table: EntityTable = [EntityRecord::new("Broken")
            .with_property("")
            .with_property("ok.com")]
        .into_iter()
        .collect();

        assert_eq!(table.domain_count(), 1);
        assert_eq!(table.entity_for("ok.com").unwrap().name(), "Broken");
    }

    #[test]
    fn test_unicode_domain_resolves_from_ascii_host() {
        let table: EntityTable = [EntityRecord::new("Рынок").with_property("магазин.рф")]
            .into_iter()
            .collect();

        let url = url::Url::parse("https://www.магазин.рф/").unwrap();
        let host = url.host_str().unwrap();
        assert!(host.is_ascii());
        assert_eq!(table.entity_for(host).unwrap().name(), "Рынок");
        assert_eq!(table.entity_for("магазин.рф").unwrap().name(), "Рынок");
    }

    #[test]
    fn test_domains_lists_properties_then_resources() {
        let record = EntityRecord::new("E")
            .with_resource("r.com")
            .with_property("p.com");
        let domains: Vec<&str> = record.domains().collect();
        assert_eq!(domains, vec!["p.com", "r.com"]);
    }
}
