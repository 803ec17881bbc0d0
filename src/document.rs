//! Wire-level document envelope types.
//!
//! These are the shapes exchanged with the transport layer: resource nodes,
//! single/collection payloads, relationship entries, and error documents.
//! They decode generically (every member optional except `type`) so that
//! reconstruction can inspect a document before committing to a destination
//! type.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Document or relationship links, keyed by link name.
pub type Links = Map<String, Value>;

/// Free-form meta information.
pub type Meta = Map<String, Value>;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One resource occurrence on the wire.
///
/// A node is created fresh for each object visited during flattening and
/// never mutated after it lands in an included table. An empty `id` is
/// allowed (and omitted from the wire) for client-generated resources that
/// have not been persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Client-generated correlation identifier for create flows.
    #[serde(
        rename = "client-id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,

    /// Keyed by relationship wire name; `IndexMap` keeps the descriptor
    /// order deterministic on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<IndexMap<String, Relationship>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Node {
    /// Identity key used by included tables: `type + "," + id`.
    pub fn key(&self) -> String {
        format!("{},{}", self.node_type, self.id)
    }

    /// Shallow reference to this node: `type` and `id` only.
    pub fn reference(&self) -> Node {
        Node {
            node_type: self.node_type.clone(),
            id: self.id.clone(),
            ..Default::default()
        }
    }
}

/// One relationship entry: a to-one or to-many `data` member plus optional
/// links and meta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Always serialized; a nil to-one relationship is an explicit
    /// `"data": null`, never an absent key.
    #[serde(default)]
    pub data: RelationshipData,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// The `data` member of a relationship entry.
///
/// Untagged: an array decodes as to-many, an object or `null` as to-one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    ToMany(Vec<Node>),
    ToOne(Option<Box<Node>>),
}

impl Default for RelationshipData {
    fn default() -> Self {
        RelationshipData::ToOne(None)
    }
}

/// Top-level envelope for a single-resource document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnePayload {
    pub data: Option<Box<Node>>,

    /// Only populated in sideloaded mode.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Node>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Top-level envelope for a resource-collection document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManyPayload {
    pub data: Vec<Node>,

    /// Only populated in sideloaded mode; deduplicated across all elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Node>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Top-level error document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorsPayload {
    pub errors: Vec<ErrorObject>,
}

/// One member of an error document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Pointer to the document member an error refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_key_joins_type_and_id() {
        let node = Node {
            node_type: "posts".into(),
            id: "7".into(),
            ..Default::default()
        };
        assert_eq!(node.key(), "posts,7");
    }

    #[test]
    fn reference_drops_everything_but_identity() {
        let node: Node = serde_json::from_value(json!({
            "type": "posts",
            "id": "1",
            "attributes": { "title": "Foo" }
        }))
        .unwrap();
        let shallow = node.reference();
        assert_eq!(
            serde_json::to_value(&shallow).unwrap(),
            json!({ "type": "posts", "id": "1" })
        );
    }

    #[test]
    fn empty_id_is_omitted() {
        let node = Node {
            node_type: "posts".into(),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&node).unwrap(), json!({ "type": "posts" }));
    }

    #[test]
    fn nil_to_one_serializes_as_explicit_null() {
        let rel = Relationship::default();
        assert_eq!(serde_json::to_value(&rel).unwrap(), json!({ "data": null }));
    }

    #[test]
    fn relationship_data_decodes_by_shape() {
        let one: Relationship = serde_json::from_value(json!({
            "data": { "type": "comments", "id": "2" }
        }))
        .unwrap();
        assert!(matches!(one.data, RelationshipData::ToOne(Some(_))));

        let none: Relationship = serde_json::from_value(json!({ "data": null })).unwrap();
        assert!(matches!(none.data, RelationshipData::ToOne(None)));

        let many: Relationship = serde_json::from_value(json!({
            "data": [{ "type": "comments", "id": "2" }]
        }))
        .unwrap();
        assert!(matches!(many.data, RelationshipData::ToMany(ref v) if v.len() == 1));

        let empty: Relationship = serde_json::from_value(json!({ "data": [] })).unwrap();
        assert!(matches!(empty.data, RelationshipData::ToMany(ref v) if v.is_empty()));
    }

    #[test]
    fn relationships_decode_typed_and_keep_order() {
        let node: Node = serde_json::from_value(json!({
            "type": "posts",
            "id": "1",
            "relationships": {
                "author": { "data": { "type": "people", "id": "9" } },
                "comments": { "data": [] }
            }
        }))
        .unwrap();

        let rels = node.relationships.as_ref().unwrap();
        assert_eq!(rels.keys().collect::<Vec<_>>(), ["author", "comments"]);
        assert!(matches!(
            rels["comments"].data,
            RelationshipData::ToMany(ref v) if v.is_empty()
        ));

        let wire = serde_json::to_value(&node).unwrap();
        assert_eq!(wire["relationships"]["author"]["data"]["id"], json!("9"));
    }

    #[test]
    fn empty_included_is_absent_from_the_wire() {
        let payload = OnePayload {
            data: Some(Box::new(Node {
                node_type: "posts".into(),
                id: "1".into(),
                ..Default::default()
            })),
            ..Default::default()
        };
        let wire = serde_json::to_value(&payload).unwrap();
        assert!(wire.get("included").is_none());
    }

    #[test]
    fn error_document_shape() {
        let payload = ErrorsPayload {
            errors: vec![ErrorObject {
                title: Some("Invalid Attribute".into()),
                status: Some("422".into()),
                source: Some(ErrorSource {
                    pointer: Some("/data/attributes/title".into()),
                    parameter: None,
                }),
                ..Default::default()
            }],
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "errors": [{
                    "title": "Invalid Attribute",
                    "status": "422",
                    "source": { "pointer": "/data/attributes/title" }
                }]
            })
        );
    }
}
