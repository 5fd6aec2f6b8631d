//! Reference extraction and resolution
//!
//! Each resource type points at others through a known set of header
//! fields. Extraction turns those fields into [`Reference`]s tagged with the
//! types that could satisfy them; resolution checks each against the
//! [`ResourceIndex`] and reports the ones no candidate type satisfies.

use serde_json::{Map, Value};

use crate::finding::{rule, Finding, FindingKind};
use crate::index::ResourceIndex;
use crate::parser::ParsedFile;
use crate::resource::ResourceType;

/// What a reference points at, which decides the rule it reports under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Resource,
    /// `owners` entry
    Owner,
    /// Team `members` entry
    Member,
    /// `writesTo` / `readsFrom` data store
    Container,
    /// Channel inside `sends[].to` / `receives[].from`
    Channel,
}

/// A pointer from one resource to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub target_id: String,
    pub version: Option<String>,
    /// Types that may satisfy the reference, any one is enough
    pub candidate_types: Vec<ResourceType>,
    /// Header location, e.g. `sends` or `steps[2].message`
    pub field: String,
    pub kind: ReferenceKind,
}

impl Reference {
    /// Rule reported when the reference does not resolve
    pub fn rule(&self) -> &'static str {
        match self.kind {
            ReferenceKind::Owner => rule::OWNER_EXISTS,
            ReferenceKind::Container => rule::CONTAINER_EXISTS,
            ReferenceKind::Channel => rule::CHANNEL_EXISTS,
            ReferenceKind::Resource | ReferenceKind::Member if self.version.is_some() => {
                rule::VALID_VERSION_RANGE
            }
            ReferenceKind::Resource | ReferenceKind::Member => rule::RESOURCE_EXISTS,
        }
    }

    /// Owner and member links never count as usage of the target
    pub fn is_membership(&self) -> bool {
        matches!(self.kind, ReferenceKind::Owner | ReferenceKind::Member)
    }

    /// `event/command/query`
    pub fn candidate_label(&self) -> String {
        self.candidate_types
            .iter()
            .map(ResourceType::as_str)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// ` (version: X)` when a version was requested
    pub fn version_suffix(&self) -> String {
        match &self.version {
            Some(version) => format!(" (version: {})", version),
            None => String::new(),
        }
    }

    pub fn missing_message(&self) -> String {
        format!(
            "Referenced {} \"{}\"{} does not exist",
            self.candidate_label(),
            self.target_id,
            self.version_suffix()
        )
    }
}

/// Target of a pointer entry: a bare id or an object with a string `id`
pub fn pointer_target(value: &Value) -> Option<(&str, Option<&str>)> {
    match value {
        Value::String(id) => Some((id.as_str(), None)),
        Value::Object(map) => {
            let id = map.get("id")?.as_str()?;
            let version = map.get("version").and_then(Value::as_str);
            Some((id, version))
        }
        _ => None,
    }
}

fn array<'a>(header: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    header
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

struct Extractor {
    references: Vec<Reference>,
}

impl Extractor {
    fn push(&mut self, value: &Value, candidates: &[ResourceType], field: String, kind: ReferenceKind) {
        if let Some((id, version)) = pointer_target(value) {
            self.references.push(Reference {
                target_id: id.to_string(),
                version: version.map(String::from),
                candidate_types: candidates.to_vec(),
                field,
                kind,
            });
        }
    }

    /// Every entry of a list field
    fn list(
        &mut self,
        header: &Map<String, Value>,
        key: &str,
        candidates: &[ResourceType],
        kind: ReferenceKind,
    ) {
        for entry in array(header, key) {
            self.push(entry, candidates, key.to_string(), kind);
        }
    }

    /// Channels nested in `sends[].to` / `receives[].from`
    fn channels(&mut self, header: &Map<String, Value>, key: &str) {
        for (idx, pointer) in array(header, key).iter().enumerate() {
            for nested in ["to", "from"] {
                let Some(channels) = pointer.get(nested).and_then(Value::as_array) else {
                    continue;
                };
                for (c_idx, channel) in channels.iter().enumerate() {
                    self.push(
                        channel,
                        &[ResourceType::Channel],
                        format!("{}[{}].{}[{}]", key, idx, nested, c_idx),
                        ReferenceKind::Channel,
                    );
                }
            }
        }
    }
}

/// Every reference a file's header makes
pub fn extract_references(parsed: &ParsedFile) -> Vec<Reference> {
    use ResourceType::*;

    let header = &parsed.header;
    let mut ex = Extractor { references: Vec::new() };

    match parsed.resource_type() {
        Domain => {
            ex.list(header, "services", &[Service], ReferenceKind::Resource);
            ex.list(header, "domains", &[Domain], ReferenceKind::Resource);
            ex.list(header, "entities", &[Entity], ReferenceKind::Resource);
        }
        Service => {
            ex.list(header, "sends", &ResourceType::MESSAGES, ReferenceKind::Resource);
            ex.list(header, "receives", &ResourceType::MESSAGES, ReferenceKind::Resource);
            ex.list(header, "entities", &[Entity], ReferenceKind::Resource);
            ex.list(header, "writesTo", &[DataStore], ReferenceKind::Container);
            ex.list(header, "readsFrom", &[DataStore], ReferenceKind::Container);
        }
        Flow => {
            for (idx, step) in array(header, "steps").iter().enumerate() {
                if let Some(message) = step.get("message") {
                    ex.push(
                        message,
                        &ResourceType::MESSAGES,
                        format!("steps[{}].message", idx),
                        ReferenceKind::Resource,
                    );
                }
                if let Some(service) = step.get("service") {
                    ex.push(
                        service,
                        &[Service],
                        format!("steps[{}].service", idx),
                        ReferenceKind::Resource,
                    );
                }
            }
        }
        Entity => {
            for (idx, property) in array(header, "properties").iter().enumerate() {
                if let Some(target) = property.get("references") {
                    ex.push(
                        target,
                        &[Entity],
                        format!("properties[{}].references", idx),
                        ReferenceKind::Resource,
                    );
                }
            }
        }
        _ => {}
    }

    ex.list(header, "owners", &[User, Team], ReferenceKind::Owner);

    if parsed.resource_type() == Team {
        ex.list(header, "members", &[User], ReferenceKind::Member);
    }

    if matches!(parsed.resource_type(), Service | Domain) {
        ex.channels(header, "sends");
        ex.channels(header, "receives");
    }

    ex.references
}

/// Findings for every reference that resolves against no candidate type
pub fn validate_references(files: &[ParsedFile], index: &ResourceIndex) -> Vec<Finding> {
    let mut findings = Vec::new();

    for parsed in files {
        for reference in extract_references(parsed) {
            let found = index.resolves_any(
                &reference.candidate_types,
                &reference.target_id,
                reference.version.as_deref(),
            );
            if found {
                continue;
            }
            findings.push(
                Finding::for_file(FindingKind::Reference, parsed, reference.missing_message())
                    .with_field(reference.field.clone())
                    .with_rule(reference.rule()),
            );
        }
    }

    tracing::debug!("Reference resolution produced {} finding(s)", findings.len());
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DependencyManifest;
    use crate::scanner::CatalogFile;
    use serde_json::json;
    use std::path::Path;

    fn parsed(rel: &str, rt: ResourceType, header: Value) -> ParsedFile {
        ParsedFile::from_header(CatalogFile::new(Path::new("/catalog"), rel, rt), header, "")
    }

    fn fields(references: &[Reference]) -> Vec<&str> {
        references.iter().map(|r| r.field.as_str()).collect()
    }

    #[test]
    fn test_service_references() {
        let service = parsed(
            "services/Orders/index.mdx",
            ResourceType::Service,
            json!({
                "id": "order-service",
                "sends": [{ "id": "OrderPlaced", "version": "1.0.0", "to": [{ "id": "orders-topic" }] }],
                "receives": ["PaymentTaken"],
                "writesTo": [{ "id": "orders-db" }],
                "owners": ["jdoe", { "id": "platform", "collection": "teams" }, 42]
            }),
        );
        let refs = extract_references(&service);
        assert_eq!(
            fields(&refs),
            vec!["sends", "receives", "writesTo", "owners", "owners", "sends[0].to[0]"]
        );
        assert_eq!(refs[0].candidate_types, ResourceType::MESSAGES.to_vec());
        assert_eq!(refs[0].version.as_deref(), Some("1.0.0"));
        assert_eq!(refs[2].rule(), rule::CONTAINER_EXISTS);
        assert_eq!(refs[4].target_id, "platform");
        assert_eq!(refs[5].rule(), rule::CHANNEL_EXISTS);
    }

    #[test]
    fn test_flow_and_entity_references() {
        let flow = parsed(
            "flows/Checkout/index.mdx",
            ResourceType::Flow,
            json!({ "steps": [{ "id": 1, "title": "a" }, { "id": 2, "title": "b", "message": { "id": "OrderPlaced" }, "service": { "id": "orders" } }] }),
        );
        assert_eq!(fields(&extract_references(&flow)), vec!["steps[1].message", "steps[1].service"]);

        let entity = parsed(
            "entities/Order/index.mdx",
            ResourceType::Entity,
            json!({ "properties": [{ "name": "customer", "type": "Customer", "references": "Customer" }] }),
        );
        let refs = extract_references(&entity);
        assert_eq!(refs[0].field, "properties[0].references");
        assert_eq!(refs[0].candidate_types, vec![ResourceType::Entity]);
    }

    #[test]
    fn test_team_members() {
        let team = parsed("teams/platform.mdx", ResourceType::Team, json!({ "members": ["jdoe"] }));
        let refs = extract_references(&team);
        assert_eq!(refs[0].kind, ReferenceKind::Member);
        assert_eq!(refs[0].rule(), rule::RESOURCE_EXISTS);
    }

    #[test]
    fn test_missing_versioned_reference() {
        let files = vec![
            parsed(
                "services/OrderService/index.mdx",
                ResourceType::Service,
                json!({ "id": "order-service", "version": "1.0.0", "sends": [{ "id": "OrderPlaced", "version": "2.0.0" }] }),
            ),
            parsed(
                "events/OrderPlaced/index.mdx",
                ResourceType::Event,
                json!({ "id": "OrderPlaced", "version": "1.0.0" }),
            ),
        ];
        let index = ResourceIndex::build(&files, &DependencyManifest::new());
        let findings = validate_references(&files, &index);

        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(
            finding.message,
            "Referenced event/command/query \"OrderPlaced\" (version: 2.0.0) does not exist"
        );
        assert_eq!(finding.rule.as_deref(), Some(rule::VALID_VERSION_RANGE));
        assert_eq!(finding.resource, "service/order-service");
        assert_eq!(finding.field.as_deref(), Some("sends"));
    }

    #[test]
    fn test_owner_and_channel_findings() {
        let files = vec![parsed(
            "services/S/index.mdx",
            ResourceType::Service,
            json!({ "owners": ["ghost"], "receives": [{ "id": "E", "from": [{ "id": "bus", "version": "1.0.0" }] }] }),
        )];
        let mut manifest = DependencyManifest::new();
        manifest.add(ResourceType::Event, "E", None);
        let index = ResourceIndex::build(&files, &manifest);

        let findings = validate_references(&files, &index);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].message, "Referenced user/team \"ghost\" does not exist");
        assert_eq!(findings[0].rule.as_deref(), Some(rule::OWNER_EXISTS));
        assert_eq!(findings[1].message, "Referenced channel \"bus\" (version: 1.0.0) does not exist");
        assert_eq!(findings[1].field.as_deref(), Some("receives[0].from[0]"));
        assert_eq!(findings[1].rule.as_deref(), Some(rule::CHANNEL_EXISTS));
    }
}
