//! Resource Index
//!
//! Multi-version registry of every resource known to a run:
//! `type -> id -> {versions}`. Local files and dependency-manifest entries
//! land in the same structure, so a reference resolves against either
//! source. Built once per run and read-only afterwards.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::DependencyManifest;
use crate::parser::ParsedFile;
use crate::resource::ResourceType;
use crate::version::{version_satisfies, LATEST};

/// Known resources and their recorded versions
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    entries: BTreeMap<ResourceType, BTreeMap<String, BTreeSet<String>>>,
}

impl ResourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index parsed files under their canonical identity, then manifest entries
    pub fn build(files: &[ParsedFile], manifest: &DependencyManifest) -> Self {
        let mut index = Self::new();
        for file in files {
            index.insert(file.resource_type(), file.canonical_id(), file.version_or_latest());
        }
        for (resource_type, entry) in manifest.iter() {
            index.insert(resource_type, &entry.id, entry.version.as_deref().unwrap_or(LATEST));
        }

        tracing::debug!(
            "Indexed {} resource id(s) from {} file(s) and {} dependency entries",
            index.len(),
            files.len(),
            manifest.len()
        );
        index
    }

    pub fn insert(&mut self, resource_type: ResourceType, id: &str, version: &str) {
        self.entries
            .entry(resource_type)
            .or_default()
            .entry(id.to_string())
            .or_default()
            .insert(version.to_string());
    }

    /// Versions recorded for an id
    pub fn versions(&self, resource_type: ResourceType, id: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(&resource_type)?.get(id)
    }

    pub fn contains(&self, resource_type: ResourceType, id: &str) -> bool {
        self.versions(resource_type, id).is_some()
    }

    /// Does `id` at the requested version exist as `resource_type`?
    pub fn resolves(&self, resource_type: ResourceType, id: &str, version: Option<&str>) -> bool {
        match self.versions(resource_type, id) {
            Some(versions) => version_satisfies(version, versions),
            None => false,
        }
    }

    /// Does the reference resolve against any of the candidate types?
    pub fn resolves_any(&self, candidates: &[ResourceType], id: &str, version: Option<&str>) -> bool {
        candidates.iter().any(|rt| self.resolves(*rt, id, version))
    }

    /// Ids recorded for a type
    pub fn ids(&self, resource_type: ResourceType) -> impl Iterator<Item = &str> {
        self.entries
            .get(&resource_type)
            .into_iter()
            .flat_map(|ids| ids.keys().map(String::as_str))
    }

    /// Number of distinct `(type, id)` pairs
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
