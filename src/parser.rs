use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

use crate::entity::{EntityRecord, EntityTable};
use crate::error::{BlocklistError, ListKind, Result};
use crate::trie::{DomainKey, DomainTrie};

/// Category that receives the override entries.
pub const SOCIAL_CATEGORY: &str = "Social";

/// Category whose entries are merged into [`SOCIAL_CATEGORY`] instead of
/// forming their own category.
pub const OVERRIDE_CATEGORY: &str = "Disconnect";

/// Deprecated categories skipped during parsing.
pub const IGNORED_CATEGORIES: &[&str] = &["Legacy Disconnect", "Legacy Content"];

/// Top-level blocklist document. Keys other than `categories` are ignored.
#[derive(Deserialize)]
struct BlocklistDocument {
    categories: BTreeMap<String, Value>,
}

/// A category body: a list of site groups, or a single site map.
#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryBody {
    Sites(Vec<SiteMap>),
    Single(SiteMap),
}

/// Site name -> site URL -> entry
type SiteMap = BTreeMap<String, BTreeMap<String, SiteEntry>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum SiteEntry {
    Domains(Vec<String>),
    /// Non-list marker such as `"dnt": "eff"`
    Marker(String),
}

#[derive(Deserialize)]
struct EntityEntry {
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default)]
    resources: Vec<String>,
}

/// Result of the category pass, before override entries are merged.
#[derive(Debug, Default)]
pub struct ParsedBlocklist {
    /// One trie per materialized category
    pub categories: HashMap<String, DomainTrie>,
    /// Domains listed under the override category, in source order
    pub overrides: Vec<String>,
}

/// Check whether a category name is in the ignored set
pub fn is_ignored_category(name: &str) -> bool {
    IGNORED_CATEGORIES.contains(&name)
}

/// Parse a blocklist into one trie per category.
///
/// Fails if the document is malformed, or if the Social category that
/// receives the override entries is absent.
pub fn parse_blocklist(source: &str) -> Result<HashMap<String, DomainTrie>> {
    let ParsedBlocklist {
        mut categories,
        overrides,
    } = collect_categories(source)?;
    merge_overrides(&mut categories, overrides)?;
    Ok(categories)
}

/// First pass: build category tries and collect override domains.
pub fn collect_categories(source: &str) -> Result<ParsedBlocklist> {
    let document: BlocklistDocument = serde_json::from_str(source)
        .map_err(|e| BlocklistError::malformed(ListKind::Blocklist, e))?;

    let mut parsed = ParsedBlocklist {
        categories: HashMap::with_capacity(document.categories.len()),
        overrides: Vec::new(),
    };

    for (name, body) in document.categories {
        if is_ignored_category(&name) {
            log::debug!("Skipping ignored category '{}'", name);
            continue;
        }

        let body: CategoryBody = serde_json::from_value(body)
            .map_err(|e| BlocklistError::malformed(ListKind::Blocklist, e))?;

        if name == OVERRIDE_CATEGORY {
            for_each_domain(body, |domain| parsed.overrides.push(domain));
        } else {
            let mut trie = DomainTrie::new();
            for_each_domain(body, |domain| {
                insert_listed(&mut trie, &domain, &name);
            });
            parsed.categories.insert(name, trie);
        }
    }

    Ok(parsed)
}

/// Second pass: fold override domains into the Social trie.
///
/// Social must exist regardless of how many overrides were collected.
pub fn merge_overrides(
    categories: &mut HashMap<String, DomainTrie>,
    overrides: Vec<String>,
) -> Result<()> {
    let social = categories
        .get_mut(SOCIAL_CATEGORY)
        .ok_or_else(|| BlocklistError::MissingCategory {
            category: SOCIAL_CATEGORY.to_string(),
            required_by: OVERRIDE_CATEGORY.to_string(),
        })?;

    let mut count = 0;
    for domain in &overrides {
        if insert_listed(social, domain, OVERRIDE_CATEGORY) {
            count += 1;
        }
    }
    log::debug!(
        "Merged {} '{}' domains into '{}'",
        count,
        OVERRIDE_CATEGORY,
        SOCIAL_CATEGORY
    );
    Ok(())
}

/// Insert a listed domain, warning when it is not a usable hostname.
/// Returns false for malformed domains.
fn insert_listed(trie: &mut DomainTrie, domain: &str, category: &str) -> bool {
    if DomainKey::new(domain).is_empty() {
        log::warn!("Ignoring malformed domain '{}' in '{}'", domain, category);
        return false;
    }
    trie.insert(domain);
    true
}

/// Visit every domain string in a category body, skipping marker values.
fn for_each_domain(body: CategoryBody, mut visit: impl FnMut(String)) {
    let groups = match body {
        CategoryBody::Sites(groups) => groups,
        CategoryBody::Single(group) => vec![group],
    };

    for sites in groups {
        for urls in sites.into_values() {
            for entry in urls.into_values() {
                match entry {
                    SiteEntry::Domains(domains) => domains.into_iter().for_each(&mut visit),
                    SiteEntry::Marker(marker) => log::trace!("Skipping marker '{}'", marker),
                }
            }
        }
    }
}

/// Parse an entity list.
///
/// Accepts `{"entities": {...}}` or a flat map of entity name to
/// `{"properties": [...], "resources": [...]}`. Entities are registered in
/// name order, so a domain claimed twice always ends up with the same owner.
pub fn parse_entity_list(source: &str) -> Result<EntityTable> {
    let mut document: Value = serde_json::from_str(source)
        .map_err(|e| BlocklistError::malformed(ListKind::EntityList, e))?;

    let wrapped = document.get("entities").is_some_and(Value::is_object);
    let entities = if wrapped {
        document["entities"].take()
    } else {
        document
    };

    let entities: BTreeMap<String, EntityEntry> = serde_json::from_value(entities)
        .map_err(|e| BlocklistError::malformed(ListKind::EntityList, e))?;

    Ok(entities
        .into_iter()
        .map(|(name, entry)| {
            EntityRecord::new(name)
                .with_properties(entry.properties)
                .with_resources(entry.resources)
        })
        .collect())
}
