//! Graph flattening: typed resource graphs into wire documents.
//!
//! The typed graph is first serialized to a generic JSON tree, then walked
//! per the resource's field descriptor table. Two modes exist: sideloaded
//! (shallow relationship references plus a deduplicated `included` table)
//! and embedded (full inline nesting, no `included`).

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::coerce;
use crate::document::{json_type_name, ManyPayload, Node, OnePayload, Relationship, RelationshipData};
use crate::error::Error;
use crate::schema::{AttrKind, FieldRole, Resource, ResourceSchema};

/// Marshal one resource into a sideloaded document.
///
/// Related resources land once in `included`, keyed by `(type, id)` with the
/// first occurrence winning; relationship entries carry shallow
/// `type`/`id` references. Document-level links and meta come from the
/// resource's capability methods.
///
/// # Errors
///
/// Returns [`Error::UnexpectedType`] when the argument does not serialize to
/// an object, [`Error::BadId`] for an unsupported primary-id kind, and the
/// coercion-layer errors for malformed attribute values.
pub fn marshal<T: Resource + Serialize>(resource: &T) -> Result<OnePayload, Error> {
    marshal_mode(resource, true)
}

/// Marshal one resource with relationships embedded inline.
///
/// No `included` table is produced; every relationship nests its full node.
/// Unlike sideloaded mode there is no identity-based dedup, so a graph with
/// cyclic references must not be marshaled embedded.
pub fn marshal_embedded<T: Resource + Serialize>(resource: &T) -> Result<OnePayload, Error> {
    marshal_mode(resource, false)
}

/// Marshal a collection into a sideloaded document.
///
/// The `included` table is shared and deduplicated across all elements.
/// Collection documents carry no document-level links or meta; callers
/// attach pagination links on the returned payload directly.
pub fn marshal_many<T: Resource + Serialize>(resources: &[T]) -> Result<ManyPayload, Error> {
    let mut flattener = Flattener::new(true);
    let mut data = Vec::with_capacity(resources.len());

    for resource in resources {
        let value = serde_json::to_value(resource)?;
        let obj = as_resource_object(&value)?;
        data.push(flattener.flatten(obj, T::schema())?);
    }

    Ok(ManyPayload {
        data,
        included: flattener.into_included(),
        links: None,
        meta: None,
    })
}

fn marshal_mode<T: Resource + Serialize>(
    resource: &T,
    sideload: bool,
) -> Result<OnePayload, Error> {
    let value = serde_json::to_value(resource)?;
    let obj = as_resource_object(&value)?;

    let mut flattener = Flattener::new(sideload);
    let node = flattener.flatten(obj, T::schema())?;

    Ok(OnePayload {
        data: Some(Box::new(node)),
        included: flattener.into_included(),
        links: resource.document_links(),
        meta: resource.document_meta(),
    })
}

fn as_resource_object(value: &Value) -> Result<&Map<String, Value>, Error> {
    value.as_object().ok_or_else(|| Error::UnexpectedType {
        actual: json_type_name(value).to_string(),
    })
}

/// One top-level flattening pass. The included index lives and dies with it.
struct Flattener {
    sideload: bool,
    included: IndexMap<String, Node>,
}

impl Flattener {
    fn new(sideload: bool) -> Self {
        Flattener {
            sideload,
            included: IndexMap::new(),
        }
    }

    fn into_included(self) -> Vec<Node> {
        self.included.into_values().collect()
    }

    fn flatten(
        &mut self,
        obj: &Map<String, Value>,
        schema: &ResourceSchema,
    ) -> Result<Node, Error> {
        let mut node = Node {
            node_type: schema.resource_type().to_string(),
            ..Default::default()
        };
        let mut attributes = Map::new();
        let mut relationships: IndexMap<String, Relationship> = IndexMap::new();

        for desc in schema.fields() {
            let value = obj.get(desc.field);
            match desc.role {
                FieldRole::PrimaryId { kind } => {
                    if let Some(v) = value {
                        if v.is_null() || (desc.omit_empty && coerce::is_zero(v)) {
                            continue;
                        }
                        node.id = coerce::format_id(v, kind)?;
                    }
                }
                FieldRole::ClientId => {
                    if let Some(Value::String(s)) = value {
                        if !s.is_empty() {
                            node.client_id = Some(s.clone());
                        }
                    }
                }
                FieldRole::Attribute { name, kind } => {
                    let v = value.unwrap_or(&Value::Null);
                    let out = match kind {
                        AttrKind::Nested(related) => {
                            nested_attributes(desc.field, v, related(), desc.omit_empty)?
                        }
                        _ => coerce::marshal_attr(desc.field, kind, desc.omit_empty, desc.iso8601, v)?,
                    };
                    if let Some(out) = out {
                        attributes.insert(name.to_string(), out);
                    }
                }
                FieldRole::ToOne { name, related } => {
                    match value {
                        None | Some(Value::Null) => {
                            // A nil to-one is an explicit null unless omitted.
                            if !desc.omit_empty {
                                relationships
                                    .insert(name.to_string(), Relationship::default());
                            }
                        }
                        Some(Value::Object(child)) => {
                            let data = self.flatten_related(child, related())?;
                            relationships.insert(
                                name.to_string(),
                                Relationship {
                                    data: RelationshipData::ToOne(Some(Box::new(data))),
                                    ..Default::default()
                                },
                            );
                        }
                        Some(other) => {
                            return Err(Error::UnexpectedType {
                                actual: json_type_name(other).to_string(),
                            })
                        }
                    }
                }
                FieldRole::ToMany { name, related } => {
                    let elements: &[Value] = match value {
                        None | Some(Value::Null) => &[],
                        Some(Value::Array(items)) => items,
                        Some(other) => {
                            return Err(Error::ExpectedSlice {
                                actual: json_type_name(other).to_string(),
                            })
                        }
                    };
                    if desc.omit_empty && elements.is_empty() {
                        continue;
                    }
                    let mut nodes = Vec::with_capacity(elements.len());
                    for element in elements {
                        let child = as_resource_object(element)?;
                        nodes.push(self.flatten_related(child, related())?);
                    }
                    relationships.insert(
                        name.to_string(),
                        Relationship {
                            data: RelationshipData::ToMany(nodes),
                            ..Default::default()
                        },
                    );
                }
            }
        }

        // Relationship-level links/meta come from the schema hooks, queried
        // per node so that nested and included nodes surface theirs too.
        for (name, relationship) in relationships.iter_mut() {
            relationship.links = schema.relationship_links(obj, name);
            relationship.meta = schema.relationship_meta(obj, name);
        }

        if !attributes.is_empty() {
            node.attributes = Some(attributes);
        }
        if !relationships.is_empty() {
            node.relationships = Some(relationships);
        }
        Ok(node)
    }

    /// Flatten one related object, returning what belongs in the parent's
    /// relationship entry: a shallow reference when sideloading, the full
    /// node when embedding.
    fn flatten_related(
        &mut self,
        child: &Map<String, Value>,
        schema: &ResourceSchema,
    ) -> Result<Node, Error> {
        let node = self.flatten(child, schema)?;
        if !self.sideload {
            return Ok(node);
        }
        let reference = node.reference();
        // First writer wins: later occurrences of the same (type, id) are
        // dropped, not merged. This is also the cycle-breaking rule.
        self.included.entry(node.key()).or_insert(node);
        Ok(reference)
    }
}

/// Flatten a nested non-relationship struct to its attribute map.
///
/// No identity: the result carries no id/type and never reaches the
/// included table.
fn nested_attributes(
    field: &str,
    value: &Value,
    schema: &ResourceSchema,
    omit_empty: bool,
) -> Result<Option<Value>, Error> {
    match value {
        Value::Null => Ok(if omit_empty { None } else { Some(Value::Null) }),
        Value::Object(obj) => {
            let mut attributes = Map::new();
            for desc in schema.fields() {
                if let FieldRole::Attribute { name, kind } = desc.role {
                    let v = obj.get(desc.field).unwrap_or(&Value::Null);
                    let out = match kind {
                        AttrKind::Nested(related) => {
                            nested_attributes(desc.field, v, related(), desc.omit_empty)?
                        }
                        _ => coerce::marshal_attr(
                            desc.field,
                            kind,
                            desc.omit_empty,
                            desc.iso8601,
                            v,
                        )?,
                    };
                    if let Some(out) = out {
                        attributes.insert(name.to_string(), out);
                    }
                }
            }
            Ok(Some(Value::Object(attributes)))
        }
        other => Err(Error::mismatch(field, other, "object")),
    }
}
