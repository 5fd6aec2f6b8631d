//! Catalog resource types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of resource described by a catalog file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    Domain,
    Service,
    Event,
    Command,
    Query,
    Channel,
    Flow,
    Entity,
    User,
    Team,
    /// Databases, caches, object stores and friends (`containers/` on disk)
    DataStore,
}

impl ResourceType {
    /// Every resource type, in scan order
    pub const ALL: [ResourceType; 11] = [
        ResourceType::Domain,
        ResourceType::Service,
        ResourceType::Event,
        ResourceType::Command,
        ResourceType::Query,
        ResourceType::Channel,
        ResourceType::Flow,
        ResourceType::Entity,
        ResourceType::User,
        ResourceType::Team,
        ResourceType::DataStore,
    ];

    /// Types that count as messages for producer/consumer analysis
    pub const MESSAGES: [ResourceType; 3] = [
        ResourceType::Event,
        ResourceType::Command,
        ResourceType::Query,
    ];

    /// Canonical name used in findings and index keys
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Domain => "domain",
            ResourceType::Service => "service",
            ResourceType::Event => "event",
            ResourceType::Command => "command",
            ResourceType::Query => "query",
            ResourceType::Channel => "channel",
            ResourceType::Flow => "flow",
            ResourceType::Entity => "entity",
            ResourceType::User => "user",
            ResourceType::Team => "team",
            ResourceType::DataStore => "dataStore",
        }
    }

    /// Pluralised directory segment that holds resources of this type
    pub fn dir_name(&self) -> &'static str {
        match self {
            ResourceType::Domain => "domains",
            ResourceType::Service => "services",
            ResourceType::Event => "events",
            ResourceType::Command => "commands",
            ResourceType::Query => "queries",
            ResourceType::Channel => "channels",
            ResourceType::Flow => "flows",
            ResourceType::Entity => "entities",
            ResourceType::User => "users",
            ResourceType::Team => "teams",
            ResourceType::DataStore => "containers",
        }
    }

    /// Resolve a dependency-manifest key (`events`, `services`, ...) to a type.
    ///
    /// Data stores cannot be declared as dependencies.
    pub fn from_manifest_key(key: &str) -> Option<Self> {
        match key {
            "events" => Some(ResourceType::Event),
            "commands" => Some(ResourceType::Command),
            "queries" => Some(ResourceType::Query),
            "services" => Some(ResourceType::Service),
            "domains" => Some(ResourceType::Domain),
            "entities" => Some(ResourceType::Entity),
            "channels" => Some(ResourceType::Channel),
            "flows" => Some(ResourceType::Flow),
            "users" => Some(ResourceType::User),
            "teams" => Some(ResourceType::Team),
            _ => None,
        }
    }

    pub fn is_message(&self) -> bool {
        Self::MESSAGES.contains(self)
    }

    /// Users and teams live in flat files and carry no version
    pub fn is_directory_less(&self) -> bool {
        matches!(self, ResourceType::User | ResourceType::Team)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_keys() {
        assert_eq!(ResourceType::from_manifest_key("queries"), Some(ResourceType::Query));
        assert_eq!(ResourceType::from_manifest_key("teams"), Some(ResourceType::Team));
        assert_eq!(ResourceType::from_manifest_key("containers"), None);
        assert_eq!(ResourceType::from_manifest_key("unknownThing"), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ResourceType::DataStore).unwrap();
        assert_eq!(json, "\"dataStore\"");
        assert_eq!(ResourceType::DataStore.to_string(), "dataStore");
    }

    #[test]
    fn test_message_types() {
        assert!(ResourceType::Query.is_message());
        assert!(!ResourceType::Service.is_message());
    }
}
