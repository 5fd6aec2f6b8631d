//! Per-resource-type field contracts
//!
//! Every resource type maps to one [`ResourceSchema`] variant holding the
//! field contract its header must satisfy. Shared building blocks (pointers,
//! owners, badges, ...) are defined once and composed into each contract.

use serde_json::{Map, Value};

use super::shape::{Field, Shape};
use crate::resource::ResourceType;

// ============================================================================
// Enumerations
// ============================================================================

const OWNER_COLLECTIONS: &[&str] = &["users", "teams"];
const SPECIFICATION_TYPES: &[&str] = &["openapi", "asyncapi", "graphql"];
const POINTER_TYPES: &[&str] = &[
    "service", "event", "command", "query", "flow", "channel", "domain", "user", "team",
];
const STEP_TYPES: &[&str] = &["node", "message", "user", "actor"];
pub const CONTAINER_TYPES: &[&str] = &[
    "database",
    "cache",
    "objectStore",
    "searchIndex",
    "dataWarehouse",
    "dataLake",
    "externalSaaS",
    "other",
];
const ACCESS_MODES: &[&str] = &["read", "write", "readWrite", "appendOnly"];
const CLASSIFICATIONS: &[&str] = &["public", "internal", "confidential", "regulated"];

// ============================================================================
// Building blocks
// ============================================================================

fn opt_string(name: &'static str) -> Field {
    Field::optional(name, Shape::String)
}

fn opt_bool(name: &'static str) -> Field {
    Field::optional(name, Shape::Bool)
}

/// `{id, version?}`
fn pointer() -> Shape {
    Shape::object(pointer_fields())
}

fn pointer_fields() -> Vec<Field> {
    vec![Field::required("id", Shape::String), opt_string("version")]
}

/// Pointer to a channel, optionally carrying parameter values
fn channel_pointer() -> Shape {
    let mut fields = pointer_fields();
    fields.push(Field::optional("parameters", Shape::record(Shape::String)));
    Shape::object(fields)
}

/// Entry of `sends` / `receives`
fn message_pointer() -> Shape {
    let mut fields = pointer_fields();
    fields.push(Field::optional("to", Shape::array(channel_pointer())));
    fields.push(Field::optional("from", Shape::array(channel_pointer())));
    Shape::object(fields)
}

/// Bare id or `{id}`
fn reference() -> Shape {
    Shape::one_of([Shape::String, Shape::object([Field::required("id", Shape::String)])])
}

fn owner() -> Shape {
    Shape::one_of([
        Shape::String,
        Shape::object([
            Field::required("id", Shape::String),
            Field::required("collection", Shape::Enum(OWNER_COLLECTIONS)),
        ]),
    ])
}

fn badge() -> Shape {
    Shape::object([
        Field::required("content", Shape::String),
        Field::required("backgroundColor", Shape::String),
        Field::required("textColor", Shape::String),
        opt_string("icon"),
    ])
}

fn draft() -> Shape {
    Shape::one_of([
        Shape::Bool,
        Shape::object([opt_string("title"), Field::required("message", Shape::String)]),
    ])
}

fn deprecated() -> Shape {
    Shape::one_of([Shape::Bool, Shape::object([opt_string("message"), opt_string("date")])])
}

fn specifications() -> Shape {
    Shape::one_of([
        Shape::object([
            opt_string("openapiPath"),
            opt_string("asyncapiPath"),
            opt_string("graphqlPath"),
        ]),
        Shape::array(Shape::object([
            Field::required("type", Shape::Enum(SPECIFICATION_TYPES)),
            Field::required("path", Shape::String),
            opt_string("name"),
        ])),
    ])
}

fn resource_groups() -> Shape {
    let item = Shape::object([
        Field::required("id", Shape::String),
        opt_string("version"),
        Field::required("type", Shape::Enum(POINTER_TYPES)),
    ]);
    Shape::array(Shape::object([
        opt_string("id"),
        opt_string("title"),
        Field::required("items", Shape::array(item)),
        Field::optional("limit", Shape::Number),
        opt_bool("sidebar"),
    ]))
}

fn styles() -> Shape {
    Shape::object([
        opt_string("icon"),
        Field::optional("node", Shape::object([opt_string("color"), opt_string("label")])),
    ])
}

/// Reference to another flow step: id, number or `{id, label?}`
fn step_ref() -> Shape {
    Shape::one_of([
        Shape::String,
        Shape::Number,
        Shape::object([
            Field::required("id", Shape::one_of([Shape::String, Shape::Number])),
            opt_string("label"),
        ]),
    ])
}

fn step() -> Shape {
    Shape::object([
        Field::required("id", Shape::one_of([Shape::String, Shape::Number])),
        Field::optional("type", Shape::Enum(STEP_TYPES)),
        Field::required("title", Shape::String),
        opt_string("summary"),
        Field::optional("message", pointer()),
        Field::optional("service", pointer()),
        Field::optional("flow", pointer()),
        Field::optional(
            "actor",
            Shape::object([Field::required("name", Shape::String), opt_string("summary")]),
        ),
        Field::optional(
            "externalSystem",
            Shape::object([
                Field::required("name", Shape::String),
                opt_string("summary"),
                Field::optional("url", Shape::Url),
            ]),
        ),
        Field::optional("next_step", step_ref()),
        Field::optional("next_steps", Shape::array(step_ref())),
    ])
}

fn entity_property() -> Shape {
    Shape::object([
        Field::required("name", Shape::String),
        Field::required("type", Shape::String),
        opt_bool("required"),
        opt_string("description"),
        Field::optional("references", reference()),
        opt_string("referencesIdentifier"),
        opt_string("relationType"),
        Field::optional("enum", Shape::array(Shape::String)),
    ])
}

fn channel_parameter() -> Shape {
    Shape::object([
        Field::optional("enum", Shape::array(Shape::String)),
        opt_string("default"),
        Field::optional("examples", Shape::array(Shape::String)),
        opt_string("description"),
    ])
}

fn references(name: &'static str) -> Field {
    Field::optional(name, Shape::array(reference()))
}

fn pointers(name: &'static str) -> Field {
    Field::optional(name, Shape::array(pointer()))
}

/// Fields shared by every versioned resource
fn base_fields() -> Vec<Field> {
    vec![
        Field::required("id", Shape::String),
        Field::required("name", Shape::String),
        Field::required("version", Shape::Version),
        opt_string("summary"),
        Field::optional("draft", draft()),
        Field::optional("badges", Shape::array(badge())),
        Field::optional("owners", Shape::array(owner())),
        opt_string("schemaPath"),
        Field::optional("sidebar", Shape::object([opt_string("label"), opt_string("badge")])),
        Field::optional(
            "repository",
            Shape::object([opt_string("language"), opt_string("url")]),
        ),
        Field::optional("specifications", specifications()),
        opt_bool("hidden"),
        opt_string("editUrl"),
        Field::optional("resourceGroups", resource_groups()),
        Field::optional("styles", styles()),
        Field::optional("deprecated", deprecated()),
        opt_bool("visualiser"),
        Field::optional("versions", Shape::array(Shape::String)),
        opt_string("latestVersion"),
    ]
}

/// Fields shared by users and teams
fn principal_fields() -> Vec<Field> {
    vec![
        Field::required("id", Shape::String),
        Field::required("name", Shape::String),
        opt_bool("hidden"),
        Field::optional("email", Shape::Email),
        opt_string("slackDirectMessageUrl"),
        opt_string("msTeamsDirectMessageUrl"),
        references("ownedDomains"),
        references("ownedServices"),
        references("ownedEvents"),
        references("ownedCommands"),
        references("ownedQueries"),
    ]
}

fn extend(mut fields: Vec<Field>, extra: impl IntoIterator<Item = Field>) -> Vec<Field> {
    fields.extend(extra);
    fields
}

// ============================================================================
// Contracts
// ============================================================================

/// Field contract for one resource type
#[derive(Debug, Clone)]
pub struct Contract {
    pub fields: Vec<Field>,
}

impl Contract {
    fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }
}

/// Header schema, one variant per resource type
#[derive(Debug, Clone)]
pub enum ResourceSchema {
    Domain(Contract),
    Service(Contract),
    /// Events, commands and queries share a contract
    Message(ResourceType, Contract),
    Channel(Contract),
    Flow(Contract),
    Entity(Contract),
    DataStore(Contract),
    User(Contract),
    Team(Contract),
}

impl ResourceSchema {
    pub fn for_type(resource_type: ResourceType) -> Self {
        match resource_type {
            ResourceType::Domain => Self::Domain(Contract::new(extend(
                base_fields(),
                [
                    pointers("services"),
                    pointers("domains"),
                    pointers("entities"),
                    Field::optional("sends", Shape::array(message_pointer())),
                    Field::optional("receives", Shape::array(message_pointer())),
                ],
            ))),
            ResourceType::Service => Self::Service(Contract::new(extend(
                base_fields(),
                [
                    Field::optional("sends", Shape::array(message_pointer())),
                    Field::optional("receives", Shape::array(message_pointer())),
                    pointers("entities"),
                    pointers("writesTo"),
                    pointers("readsFrom"),
                ],
            ))),
            ResourceType::Event | ResourceType::Command | ResourceType::Query => Self::Message(
                resource_type,
                Contract::new(extend(
                    base_fields(),
                    [
                        references("producers"),
                        references("consumers"),
                        Field::optional("channels", Shape::array(channel_pointer())),
                        references("messageChannels"),
                    ],
                )),
            ),
            ResourceType::Channel => Self::Channel(Contract::new(extend(
                base_fields(),
                [
                    opt_string("address"),
                    Field::optional("protocols", Shape::array(Shape::String)),
                    Field::optional("channels", Shape::array(channel_pointer())),
                    Field::optional("routes", Shape::array(channel_pointer())),
                    Field::optional("parameters", Shape::record(channel_parameter())),
                ],
            ))),
            ResourceType::Flow => Self::Flow(Contract::new(extend(
                base_fields(),
                [Field::required("steps", Shape::array(step()))],
            ))),
            ResourceType::Entity => Self::Entity(Contract::new(extend(
                base_fields(),
                [
                    opt_bool("aggregateRoot"),
                    opt_string("identifier"),
                    Field::optional("properties", Shape::array(entity_property())),
                    references("services"),
                    references("domains"),
                ],
            ))),
            ResourceType::DataStore => Self::DataStore(Contract::new(extend(
                base_fields(),
                [
                    Field::required("container_type", Shape::Enum(CONTAINER_TYPES)),
                    opt_string("technology"),
                    opt_bool("authoritative"),
                    Field::optional("access_mode", Shape::Enum(ACCESS_MODES)),
                    Field::optional("classification", Shape::Enum(CLASSIFICATIONS)),
                    opt_string("residency"),
                    opt_string("retention"),
                    references("services"),
                    references("servicesThatWriteToContainer"),
                    references("servicesThatReadFromContainer"),
                ],
            ))),
            ResourceType::User => Self::User(Contract::new(extend(
                principal_fields(),
                [opt_string("avatarUrl"), opt_string("role"), references("associatedTeams")],
            ))),
            ResourceType::Team => Self::Team(Contract::new(extend(
                principal_fields(),
                [opt_string("summary"), references("members")],
            ))),
        }
    }

    pub fn contract(&self) -> &Contract {
        match self {
            Self::Domain(c)
            | Self::Service(c)
            | Self::Message(_, c)
            | Self::Channel(c)
            | Self::Flow(c)
            | Self::Entity(c)
            | Self::DataStore(c)
            | Self::User(c)
            | Self::Team(c) => c,
        }
    }
}

// ============================================================================
// Typed header values
// ============================================================================

/// Decoded `deprecated` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deprecation {
    Flag(bool),
    Notice {
        message: Option<String>,
        date: Option<String>,
    },
}

impl Deprecation {
    /// Decode from a header; values of any other shape yield `None`
    pub fn from_header(header: &Map<String, Value>) -> Option<Self> {
        match header.get("deprecated")? {
            Value::Bool(flag) => Some(Self::Flag(*flag)),
            // An empty notice carries nothing and marks nothing
            Value::Object(map) if map.is_empty() => Some(Self::Flag(false)),
            Value::Object(map) => Some(Self::Notice {
                message: map.get("message").and_then(Value::as_str).map(String::from),
                date: map.get("date").and_then(Value::as_str).map(String::from),
            }),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Notice { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_every_type_has_a_contract() {
        for rt in ResourceType::ALL {
            let schema = ResourceSchema::for_type(rt);
            let names: Vec<_> = schema.contract().fields.iter().map(|f| f.name).collect();
            assert!(names.contains(&"id"), "{} contract lacks id", rt);
            assert!(names.contains(&"name"), "{} contract lacks name", rt);
        }
    }

    #[test]
    fn test_principals_are_unversioned() {
        for rt in [ResourceType::User, ResourceType::Team] {
            let schema = ResourceSchema::for_type(rt);
            assert!(!schema.contract().fields.iter().any(|f| f.name == "version"));
        }
    }

    #[test]
    fn test_deprecation_decoding() {
        assert_eq!(
            Deprecation::from_header(&header(json!({ "deprecated": true }))),
            Some(Deprecation::Flag(true))
        );
        let notice = Deprecation::from_header(&header(json!({
            "deprecated": { "message": "Use v2", "date": "2025-01-01" }
        })))
        .unwrap();
        assert!(notice.is_active());
        assert!(!Deprecation::from_header(&header(json!({ "deprecated": {} })))
            .unwrap()
            .is_active());
        assert_eq!(Deprecation::from_header(&header(json!({ "deprecated": "yes" }))), None);
        assert_eq!(Deprecation::from_header(&header(json!({}))), None);
    }
}
