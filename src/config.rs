//! Category enable/disable configuration.
//!
//! The settings store writes toggles here while request evaluation reads them
//! concurrently. Readers load an immutable snapshot without locking; writers
//! publish a fresh snapshot, so a toggle never touches the category tries.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// Per-category enabled flags as supplied by a settings store.
///
/// Serializes as a plain JSON object: `{"Advertising": true, "Social": false}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySettings {
    categories: HashMap<String, bool>,
}

impl CategorySettings {
    /// Create empty settings (every category enabled)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a category flag
    pub fn with_category(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.set(name, enabled);
        self
    }

    /// Set a category flag
    pub fn set(&mut self, name: impl Into<String>, enabled: bool) {
        self.categories.insert(name.into(), enabled);
    }

    /// Explicit flag for a category, if one was given
    pub fn get(&self, name: &str) -> Option<bool> {
        self.categories.get(name).copied()
    }

    /// Unspecified categories are enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).unwrap_or(true)
    }

    /// Number of explicitly configured categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Check if no category is explicitly configured
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl FromIterator<(String, bool)> for CategorySettings {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self {
            categories: iter.into_iter().collect(),
        }
    }
}

/// Immutable view of the configuration at one point in time.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    settings: CategorySettings,
    generation: u64,
}

impl ConfigSnapshot {
    /// Check if a category is enabled in this snapshot
    pub fn is_enabled(&self, category: &str) -> bool {
        self.settings.is_enabled(category)
    }

    /// Settings captured by this snapshot
    pub fn settings(&self) -> &CategorySettings {
        &self.settings
    }

    /// Incremented on every published change
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Shared, mutable category configuration.
///
/// Held by the matcher through an `Arc`; the settings collaborator keeps its
/// own handle to the same instance and toggles categories at any time.
#[derive(Debug)]
pub struct MatcherConfig {
    current: ArcSwap<ConfigSnapshot>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MatcherConfig {
    /// Create a configuration with every category enabled
    pub fn new() -> Self {
        Self::from_settings(CategorySettings::default())
    }

    /// Create a configuration from stored settings
    pub fn from_settings(settings: CategorySettings) -> Self {
        Self {
            current: ArcSwap::from_pointee(ConfigSnapshot {
                settings,
                generation: 0,
            }),
        }
    }

    /// Builder-style category flag, for use before the config is shared
    pub fn with_category(self, name: impl Into<String>, enabled: bool) -> Self {
        let name: String = name.into();
        self.set_enabled(&name, enabled);
        self
    }

    /// Current snapshot. Cheap; never blocks writers.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Check if a category is currently enabled
    pub fn is_enabled(&self, category: &str) -> bool {
        self.current.load().is_enabled(category)
    }

    /// Enable or disable a single category
    pub fn set_enabled(&self, category: &str, enabled: bool) {
        self.current.rcu(|snapshot| {
            let mut next = ConfigSnapshot::clone(snapshot);
            next.settings.set(category, enabled);
            next.generation += 1;
            next
        });
        log::debug!(
            "Category '{}' {}",
            category,
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Replace all category flags at once
    pub fn set_all(&self, settings: CategorySettings) {
        self.current.rcu(|snapshot| ConfigSnapshot {
            settings: settings.clone(),
            generation: snapshot.generation + 1,
        });
    }

    /// Generation of the current snapshot
    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }
}
