//! List sources and matcher construction.

mod cache;

pub use cache::{CacheState, MatcherCache};

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::MatcherConfig;
use crate::error::{BlocklistError, ListKind, Result};
use crate::matcher::UrlMatcher;
use crate::parser::{parse_blocklist, parse_entity_list};

/// Supplier of the raw blocklist and entity list documents.
///
/// Reads happen once per matcher build and may be slow.
pub trait ListSource: Send + Sync {
    /// Read the categorized blocklist document
    fn read_blocklist(&self) -> Result<String>;

    /// Read the entity list document
    fn read_entity_list(&self) -> Result<String>;
}

/// Reads both lists from files
#[derive(Debug, Clone)]
pub struct FileListSource {
    blocklist_path: PathBuf,
    entity_list_path: PathBuf,
}

impl FileListSource {
    /// Create a source from the two file paths
    pub fn new(blocklist: impl AsRef<Path>, entity_list: impl AsRef<Path>) -> Self {
        Self {
            blocklist_path: blocklist.as_ref().to_path_buf(),
            entity_list_path: entity_list.as_ref().to_path_buf(),
        }
    }

    /// Look for `blocklist.json` and `entitylist.json` in a directory
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("blocklist.json"), dir.join("entitylist.json"))
    }

    pub fn blocklist_path(&self) -> &Path {
        &self.blocklist_path
    }

    pub fn entity_list_path(&self) -> &Path {
        &self.entity_list_path
    }
}

fn read_list(path: &Path, kind: ListKind) -> Result<String> {
    fs::read_to_string(path).map_err(|e| BlocklistError::SourceError {
        kind,
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

impl ListSource for FileListSource {
    fn read_blocklist(&self) -> Result<String> {
        read_list(&self.blocklist_path, ListKind::Blocklist)
    }

    fn read_entity_list(&self) -> Result<String> {
        read_list(&self.entity_list_path, ListKind::EntityList)
    }
}

/// In-memory lists, e.g. resources embedded with `include_str!`
#[derive(Debug, Clone)]
pub struct MemoryListSource {
    blocklist: Cow<'static, str>,
    entity_list: Cow<'static, str>,
}

impl MemoryListSource {
    pub fn new(
        blocklist: impl Into<Cow<'static, str>>,
        entity_list: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            blocklist: blocklist.into(),
            entity_list: entity_list.into(),
        }
    }
}

impl ListSource for MemoryListSource {
    fn read_blocklist(&self) -> Result<String> {
        Ok(self.blocklist.to_string())
    }

    fn read_entity_list(&self) -> Result<String> {
        Ok(self.entity_list.to_string())
    }
}

/// Read, parse and assemble a matcher. A pure function of the source data.
pub fn build_matcher(source: &dyn ListSource, config: Arc<MatcherConfig>) -> Result<UrlMatcher> {
    let started = Instant::now();

    let categories = parse_blocklist(&source.read_blocklist()?)?;
    let entities = parse_entity_list(&source.read_entity_list()?)?;

    let domain_count: usize = categories.values().map(|trie| trie.len()).sum();
    log::info!(
        "Built tracker matcher: {} categories, {} domains, {} entities in {:?}",
        categories.len(),
        domain_count,
        entities.len(),
        started.elapsed()
    );

    Ok(UrlMatcher::new(categories, entities, config))
}
