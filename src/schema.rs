//! Resource schemas: per-type field descriptor tables.
//!
//! Rust has no runtime field reflection, so every resource type registers an
//! explicit descriptor table describing how its fields map onto the wire
//! format. Registration happens once per type (typically in a `LazyLock`
//! static behind [`Resource::schema`]); resolution is pure, so the same type
//! always yields the same table.
//!
//! Fields without a descriptor simply never appear in the wire format.

use serde_json::{Map, Value};

use crate::document::{Links, Meta};
use crate::error::SchemaError;

/// Pointer to a related type's schema.
///
/// Indirect through a function so mutually recursive registrations
/// (post ↔ comment) are possible from statics.
pub type SchemaFn = fn() -> &'static ResourceSchema;

/// Hook computing links or meta for one of a resource's relationships.
///
/// Receives the resource's serialized object and the relationship's wire
/// name. Registered on the schema (not the trait) so that it runs for every
/// node flattened through that schema, nested and included ones too.
pub type RelationshipHook = fn(&Map<String, Value>, &str) -> Option<Map<String, Value>>;

/// A type that can be flattened into and reconstructed from resource
/// documents.
///
/// The capability methods mirror the optional `Linkable` / `Metable`
/// collaborator contracts: they default to `None` and are queried once per
/// marshal call on the top-level argument. Relationship-level links and meta
/// are registered on the schema instead, via
/// [`ResourceSchema::with_relationship_links`] and
/// [`ResourceSchema::with_relationship_meta`].
pub trait Resource {
    /// The descriptor table for this type. Must be stable across calls.
    fn schema() -> &'static ResourceSchema
    where
        Self: Sized;

    /// Document-level links, attached only when this is the top-level
    /// marshal argument.
    fn document_links(&self) -> Option<Links> {
        None
    }

    /// Document-level meta, attached only when this is the top-level
    /// marshal argument.
    fn document_meta(&self) -> Option<Meta> {
        None
    }
}

/// Native kind of a primary id field.
///
/// The wire id is always a string; these are the native kinds it may coerce
/// to and from. Anything else fails with `BadId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Text,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IdKind {
    /// Native type name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            IdKind::Text => "string",
            IdKind::I8 => "i8",
            IdKind::I16 => "i16",
            IdKind::I32 => "i32",
            IdKind::I64 => "i64",
            IdKind::U8 => "u8",
            IdKind::U16 => "u16",
            IdKind::U32 => "u32",
            IdKind::U64 => "u64",
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, IdKind::I8 | IdKind::I16 | IdKind::I32 | IdKind::I64)
    }
}

/// Declared native kind of an attribute field.
///
/// Drives the scalar coercion layer in both directions. `Json` is the
/// generic passthrough for kinds with no special wire handling.
#[derive(Debug, Clone, Copy)]
pub enum AttrKind {
    String,
    Bool,
    F64,
    I64,
    U64,
    /// `Vec<String>` destinations.
    StringVec,
    /// `Map<String, Vec<String>>` destinations; elements must be a string or
    /// an array of strings.
    StringListMap,
    /// Timestamp, wire-encoded as epoch seconds or ISO 8601.
    Time,
    /// Arbitrary-precision decimal, wire-encoded as a bare number.
    Decimal,
    /// Nested non-relationship struct, flattened to its attribute map
    /// without identity.
    Nested(SchemaFn),
    Json,
}

impl AttrKind {
    /// Native type name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            AttrKind::String => "String",
            AttrKind::Bool => "bool",
            AttrKind::F64 => "f64",
            AttrKind::I64 => "i64",
            AttrKind::U64 => "u64",
            AttrKind::StringVec => "Vec<String>",
            AttrKind::StringListMap => "Map<String, Vec<String>>",
            AttrKind::Time => "timestamp",
            AttrKind::Decimal => "decimal",
            AttrKind::Nested(_) => "object",
            AttrKind::Json => "value",
        }
    }
}

/// The role a struct field plays in the wire format.
#[derive(Debug, Clone, Copy)]
pub enum FieldRole {
    PrimaryId { kind: IdKind },
    ClientId,
    Attribute { name: &'static str, kind: AttrKind },
    ToOne { name: &'static str, related: SchemaFn },
    ToMany { name: &'static str, related: SchemaFn },
}

/// One field's wire mapping: struct field name, role, and options.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// The struct/serde field name, as it appears in the serialized value.
    pub field: &'static str,
    pub role: FieldRole,
    pub omit_empty: bool,
    pub iso8601: bool,
}

impl FieldDescriptor {
    fn new(field: &'static str, role: FieldRole) -> Self {
        FieldDescriptor {
            field,
            role,
            omit_empty: false,
            iso8601: false,
        }
    }

    /// Primary id field of the given native kind.
    pub fn primary_id(field: &'static str, kind: IdKind) -> Self {
        Self::new(field, FieldRole::PrimaryId { kind })
    }

    /// Client-generated correlation id field.
    pub fn client_id(field: &'static str) -> Self {
        Self::new(field, FieldRole::ClientId)
    }

    /// Attribute with the given wire name and native kind.
    pub fn attribute(field: &'static str, name: &'static str, kind: AttrKind) -> Self {
        Self::new(field, FieldRole::Attribute { name, kind })
    }

    /// To-one relationship with the given wire name.
    pub fn to_one(field: &'static str, name: &'static str, related: SchemaFn) -> Self {
        Self::new(field, FieldRole::ToOne { name, related })
    }

    /// To-many relationship with the given wire name.
    pub fn to_many(field: &'static str, name: &'static str, related: SchemaFn) -> Self {
        Self::new(field, FieldRole::ToMany { name, related })
    }

    /// Skip this field when its value is empty/zero (or, for relationships,
    /// nil/zero-length).
    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    /// Emit this timestamp attribute as an ISO 8601 string instead of epoch
    /// seconds.
    pub fn iso8601(mut self) -> Self {
        self.iso8601 = true;
        self
    }

    /// Wire name, where the role has one.
    pub fn wire_name(&self) -> Option<&'static str> {
        match self.role {
            FieldRole::Attribute { name, .. }
            | FieldRole::ToOne { name, .. }
            | FieldRole::ToMany { name, .. } => Some(name),
            FieldRole::PrimaryId { .. } | FieldRole::ClientId => None,
        }
    }
}

/// Ordered field descriptor table for one resource type.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    resource_type: &'static str,
    fields: Vec<FieldDescriptor>,
    rel_links: Option<RelationshipHook>,
    rel_meta: Option<RelationshipHook>,
}

impl ResourceSchema {
    /// Build and validate a schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` when a descriptor table is malformed: more than
    /// one primary id or client id, an empty wire type or wire name, or the
    /// `iso8601` option on a non-timestamp field.
    pub fn new(
        resource_type: &'static str,
        fields: Vec<FieldDescriptor>,
    ) -> Result<Self, SchemaError> {
        if resource_type.is_empty() {
            return Err(SchemaError::MissingWireType);
        }

        let mut primary_seen = false;
        let mut client_seen = false;
        for desc in &fields {
            match desc.role {
                FieldRole::PrimaryId { .. } => {
                    if primary_seen {
                        return Err(SchemaError::DuplicatePrimaryId {
                            resource: resource_type.to_string(),
                        });
                    }
                    primary_seen = true;
                }
                FieldRole::ClientId => {
                    if client_seen {
                        return Err(SchemaError::DuplicateClientId {
                            resource: resource_type.to_string(),
                        });
                    }
                    client_seen = true;
                }
                _ => {}
            }

            if desc.field.is_empty() {
                return Err(SchemaError::EmptyWireName {
                    field: desc.field.to_string(),
                });
            }
            if let Some(name) = desc.wire_name() {
                if name.is_empty() {
                    return Err(SchemaError::EmptyWireName {
                        field: desc.field.to_string(),
                    });
                }
            }
            if desc.iso8601
                && !matches!(
                    desc.role,
                    FieldRole::Attribute {
                        kind: AttrKind::Time,
                        ..
                    }
                )
            {
                return Err(SchemaError::BadOption {
                    field: desc.field.to_string(),
                });
            }
        }

        Ok(ResourceSchema {
            resource_type,
            fields,
            rel_links: None,
            rel_meta: None,
        })
    }

    /// Build a schema, panicking on a malformed descriptor table.
    ///
    /// A bad table is a type-definition bug, not bad input; static
    /// registration sites use this to fail loudly at first use.
    pub fn must(resource_type: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        match Self::new(resource_type, fields) {
            Ok(schema) => schema,
            Err(err) => panic!("invalid resource schema for \"{resource_type}\": {err}"),
        }
    }

    /// Register a links hook for this type's relationships.
    pub fn with_relationship_links(mut self, hook: RelationshipHook) -> Self {
        self.rel_links = Some(hook);
        self
    }

    /// Register a meta hook for this type's relationships.
    pub fn with_relationship_meta(mut self, hook: RelationshipHook) -> Self {
        self.rel_meta = Some(hook);
        self
    }

    /// The wire type name.
    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    /// The ordered descriptor list.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Links for one relationship of a node serialized as `obj`, by wire
    /// name. `None` when no hook is registered or the hook declines.
    pub fn relationship_links(&self, obj: &Map<String, Value>, name: &str) -> Option<Links> {
        self.rel_links.and_then(|hook| hook(obj, name))
    }

    /// Meta for one relationship of a node serialized as `obj`, by wire
    /// name.
    pub fn relationship_meta(&self, obj: &Map<String, Value>, name: &str) -> Option<Meta> {
        self.rel_meta.and_then(|hook| hook(obj, name))
    }
}
