//! jsonapi-codec
//!
//! Bidirectional codec between typed resource graphs and the JSON:API
//! document format: resources with attributes and typed relationships,
//! flattened into a deduplicated "primary + included" document and
//! reconstructed back into a typed graph.
//!
//! Each resource type registers an explicit field descriptor table (there is
//! no runtime reflection); the codec serializes through serde, walks the
//! table, and emits or consumes the wire envelope. The codec is pure
//! computation: no I/O, no shared mutable state across calls, safe to use
//! from multiple threads.
//!
//! # Example
//!
//! ```
//! use std::sync::LazyLock;
//!
//! use serde::{Deserialize, Serialize};
//! use jsonapi_codec::{
//!     marshal, unmarshal, AttrKind, FieldDescriptor, IdKind, Resource, ResourceSchema,
//! };
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Comment {
//!     id: u64,
//!     body: String,
//! }
//!
//! impl Resource for Comment {
//!     fn schema() -> &'static ResourceSchema {
//!         static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
//!             ResourceSchema::must(
//!                 "comments",
//!                 vec![
//!                     FieldDescriptor::primary_id("id", IdKind::U64),
//!                     FieldDescriptor::attribute("body", "body", AttrKind::String),
//!                 ],
//!             )
//!         });
//!         &SCHEMA
//!     }
//! }
//!
//! let payload = marshal(&Comment { id: 7, body: "hello".into() }).unwrap();
//! let node = payload.data.as_ref().unwrap();
//! assert_eq!(node.node_type, "comments");
//! assert_eq!(node.id, "7");
//!
//! let wire = serde_json::to_string(&payload).unwrap();
//! let back: Comment = unmarshal(&wire).unwrap();
//! assert_eq!(back.id, 7);
//! assert_eq!(back.body, "hello");
//! ```
//!
//! # Modes
//!
//! | Mode | Relationships | `included` |
//! |------|---------------|------------|
//! | sideloaded ([`marshal`], [`marshal_many`]) | shallow `type`/`id` references | deduplicated, first writer wins |
//! | embedded ([`marshal_embedded`]) | full inline nodes | always absent |
//!
//! Sideloaded dedup doubles as the cycle-breaking rule; embedded mode has no
//! such guard and is only safe on acyclic graphs.
//!
//! # Decimals
//!
//! Decimal attributes are emitted as bare JSON numbers, which requires the
//! process-wide mode switch [`enable_unquoted_decimals`] to be set once at
//! startup. Marshaling a decimal while the mode is off is a configuration
//! error, not a silent fallback.

mod coerce;
mod document;
mod error;
mod marshal;
mod schema;
mod unmarshal;

pub use coerce::enable_unquoted_decimals;
pub use document::{
    json_type_name, ErrorObject, ErrorSource, ErrorsPayload, Links, ManyPayload, Meta, Node,
    OnePayload, Relationship, RelationshipData,
};
pub use error::{Error, SchemaError};
pub use marshal::{marshal, marshal_embedded, marshal_many};
pub use schema::{
    AttrKind, FieldDescriptor, FieldRole, IdKind, RelationshipHook, Resource, ResourceSchema,
    SchemaFn,
};
pub use unmarshal::{unmarshal, unmarshal_many, unmarshal_many_value, unmarshal_value};
