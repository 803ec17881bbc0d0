//! Graph reconstruction: wire documents into typed resource graphs.
//!
//! The document is decoded generically first, an index of included nodes is
//! built keyed by `(type, id)`, and the destination's field descriptor table
//! drives a rebuild into a plain JSON object that the typed deserializer
//! consumes. Destination types should carry `#[serde(default)]` so id-only
//! stubs and attribute-less nodes rebuild cleanly.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::coerce;
use crate::document::{json_type_name, ManyPayload, Node, OnePayload, RelationshipData};
use crate::error::Error;
use crate::schema::{AttrKind, FieldRole, Resource, ResourceSchema};

/// Reconstruct one resource from a single-resource document.
///
/// # Errors
///
/// Returns [`Error::MissingData`] when `data` is null or absent,
/// [`Error::UnexpectedType`] when `data` is a collection, [`Error::BadId`]
/// for a non-numeric id destined for a numeric field, and the
/// coercion-layer errors for mismatched attributes.
pub fn unmarshal<T: Resource + DeserializeOwned>(input: &str) -> Result<T, Error> {
    unmarshal_value(serde_json::from_str(input)?)
}

/// [`unmarshal`] over an already-decoded JSON value.
pub fn unmarshal_value<T: Resource + DeserializeOwned>(document: Value) -> Result<T, Error> {
    match document.get("data") {
        None | Some(Value::Null) => return Err(Error::MissingData),
        Some(Value::Object(_)) => {}
        Some(other) => {
            return Err(Error::UnexpectedType {
                actual: json_type_name(other).to_string(),
            })
        }
    }

    let payload: OnePayload = serde_json::from_value(document)?;
    let node = payload.data.ok_or(Error::MissingData)?;
    let index = included_index(&payload.included);
    rebuild_into(&node, &index)
}

/// Reconstruct a collection from a resource-collection document.
///
/// # Errors
///
/// Returns [`Error::ExpectedSlice`] when `data` is not an array, plus
/// everything [`unmarshal`] can return per element.
pub fn unmarshal_many<T: Resource + DeserializeOwned>(input: &str) -> Result<Vec<T>, Error> {
    unmarshal_many_value(serde_json::from_str(input)?)
}

/// [`unmarshal_many`] over an already-decoded JSON value.
pub fn unmarshal_many_value<T: Resource + DeserializeOwned>(
    document: Value,
) -> Result<Vec<T>, Error> {
    match document.get("data") {
        None | Some(Value::Null) => return Err(Error::MissingData),
        Some(Value::Array(_)) => {}
        Some(other) => {
            return Err(Error::ExpectedSlice {
                actual: json_type_name(other).to_string(),
            })
        }
    }

    let payload: ManyPayload = serde_json::from_value(document)?;
    let index = included_index(&payload.included);
    payload
        .data
        .iter()
        .map(|node| rebuild_into(node, &index))
        .collect()
}

type IncludedIndex<'a> = HashMap<(&'a str, &'a str), &'a Node>;

/// First writer wins, mirroring the flattening side's dedup rule.
fn included_index(included: &[Node]) -> IncludedIndex<'_> {
    let mut index = IncludedIndex::with_capacity(included.len());
    for node in included {
        index
            .entry((node.node_type.as_str(), node.id.as_str()))
            .or_insert(node);
    }
    index
}

fn rebuild_into<T: Resource + DeserializeOwned>(
    node: &Node,
    index: &IncludedIndex<'_>,
) -> Result<T, Error> {
    let mut in_progress = vec![node.key()];
    let obj = rebuild(node, T::schema(), index, &mut in_progress)?;
    Ok(serde_json::from_value(Value::Object(obj))?)
}

fn rebuild(
    node: &Node,
    schema: &ResourceSchema,
    index: &IncludedIndex<'_>,
    in_progress: &mut Vec<String>,
) -> Result<Map<String, Value>, Error> {
    let mut out = Map::new();

    for desc in schema.fields() {
        match desc.role {
            FieldRole::PrimaryId { kind } => {
                // An absent id leaves the field untouched; a malformed one
                // is an error. The two are distinguishable by construction.
                if !node.id.is_empty() {
                    out.insert(desc.field.to_string(), coerce::parse_id(&node.id, kind)?);
                }
            }
            FieldRole::ClientId => {
                if let Some(client_id) = &node.client_id {
                    out.insert(
                        desc.field.to_string(),
                        Value::String(client_id.clone()),
                    );
                }
            }
            FieldRole::Attribute { name, kind } => {
                let Some(wire) = node.attributes.as_ref().and_then(|attrs| attrs.get(name))
                else {
                    continue;
                };
                let plain = match kind {
                    AttrKind::Nested(related) => rebuild_nested(desc.field, wire, related())?,
                    _ => coerce::unmarshal_attr(desc.field, kind, wire)?,
                };
                out.insert(desc.field.to_string(), plain);
            }
            FieldRole::ToOne { name, related } => {
                let Some(relationship) =
                    node.relationships.as_ref().and_then(|rels| rels.get(name))
                else {
                    continue;
                };
                match &relationship.data {
                    // Explicit null and absent key both leave the
                    // destination nil.
                    RelationshipData::ToOne(None) => {}
                    RelationshipData::ToOne(Some(child)) => {
                        let obj = resolve_related(child.as_ref(), related(), index, in_progress)?;
                        out.insert(desc.field.to_string(), Value::Object(obj));
                    }
                    RelationshipData::ToMany(_) => {
                        return Err(Error::UnexpectedType {
                            actual: "array".to_string(),
                        })
                    }
                }
            }
            FieldRole::ToMany { name, related } => {
                let Some(relationship) =
                    node.relationships.as_ref().and_then(|rels| rels.get(name))
                else {
                    continue;
                };
                match &relationship.data {
                    RelationshipData::ToMany(children) => {
                        // An empty wire array becomes an explicitly empty
                        // sequence, distinct from an untouched field.
                        let mut items = Vec::with_capacity(children.len());
                        for child in children {
                            let obj = resolve_related(child, related(), index, in_progress)?;
                            items.push(Value::Object(obj));
                        }
                        out.insert(desc.field.to_string(), Value::Array(items));
                    }
                    RelationshipData::ToOne(inner) => {
                        return Err(Error::ExpectedSlice {
                            actual: if inner.is_some() { "object" } else { "null" }.to_string(),
                        })
                    }
                }
            }
        }
    }

    Ok(out)
}

/// Resolve one relationship node against the included index.
///
/// Inline nodes carrying their own attributes (a client posting a new nested
/// resource) are rebuilt directly. Bare references resolve through the
/// index; a reference with no included counterpart rebuilds to an id-only
/// stub rather than erroring. A reference whose rebuild is already in
/// progress (cyclic included chain) also degrades to the stub.
fn resolve_related(
    child: &Node,
    schema: &ResourceSchema,
    index: &IncludedIndex<'_>,
    in_progress: &mut Vec<String>,
) -> Result<Map<String, Value>, Error> {
    let chosen: &Node = if child.attributes.is_some() || child.relationships.is_some() {
        child
    } else {
        match index.get(&(child.node_type.as_str(), child.id.as_str())) {
            Some(full) if !in_progress.contains(&full.key()) => full,
            _ => child,
        }
    };

    in_progress.push(chosen.key());
    let result = rebuild(chosen, schema, index, in_progress);
    in_progress.pop();
    result
}

/// Rebuild a nested non-relationship attribute object through its schema.
fn rebuild_nested(field: &str, wire: &Value, schema: &ResourceSchema) -> Result<Value, Error> {
    match wire {
        Value::Null => Ok(Value::Null),
        Value::Object(obj) => {
            let mut out = Map::new();
            for desc in schema.fields() {
                if let FieldRole::Attribute { name, kind } = desc.role {
                    if let Some(v) = obj.get(name) {
                        let plain = match kind {
                            AttrKind::Nested(related) => {
                                rebuild_nested(desc.field, v, related())?
                            }
                            _ => coerce::unmarshal_attr(desc.field, kind, v)?,
                        };
                        out.insert(desc.field.to_string(), plain);
                    }
                }
            }
            Ok(Value::Object(out))
        }
        other => Err(Error::mismatch(field, other, "object")),
    }
}
