//! Error types for document marshaling and reconstruction.

use serde_json::Value;
use thiserror::Error;

use crate::document::{json_type_name, ErrorObject, ErrorSource};

/// Errors raised while constructing a resource schema.
///
/// These indicate a bug in a type's field-descriptor table, not bad input,
/// and are expected to surface at registration time. Static registration
/// through [`crate::ResourceSchema::must`] turns them into a panic.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("resource type \"{resource}\" declares more than one primary id field")]
    DuplicatePrimaryId { resource: String },

    #[error("resource type \"{resource}\" declares more than one client-id field")]
    DuplicateClientId { resource: String },

    #[error("resource schema is missing its wire type name")]
    MissingWireType,

    #[error("field \"{field}\": wire name must not be empty")]
    EmptyWireName { field: String },

    #[error("field \"{field}\": iso8601 is only valid on timestamp attributes")]
    BadOption { field: String },
}

/// Errors raised while flattening or reconstructing a resource graph.
///
/// Every variant is programmatically distinguishable so callers can map them
/// onto distinct wire-level statuses; [`Error::status`] provides the default
/// mapping and [`Error::to_error_object`] the wire error shape.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The primary id could not be coerced to or from its native kind.
    #[error("invalid id value {value}: expected {want}")]
    BadId { value: Value, want: &'static str },

    /// The top-level value was not a resource object (or the primary data of
    /// a single-resource document was an array).
    #[error("expected a resource object, got {actual}")]
    UnexpectedType { actual: String },

    /// A collection was required but the wire carried something else.
    #[error("expected a collection of resources, got {actual}")]
    ExpectedSlice { actual: String },

    #[error("document has no primary data")]
    MissingData,

    /// The wire value's JSON kind does not match the attribute's declared
    /// native kind. The message text is part of the client-facing contract.
    #[error("got value {value} expected type {want}: invalid type provided")]
    AttributeMismatch {
        field: String,
        value: Value,
        want: &'static str,
    },

    #[error("field \"{field}\": cannot parse \"{value}\" as an ISO 8601 timestamp")]
    InvalidIso8601 { field: String, value: String },

    /// A structured wire value arrived for a scalar destination; there is no
    /// pointer or value interpretation that could hold it.
    #[error("field \"{field}\": cannot unmarshal {kind} into {want}")]
    UnsupportedPointer {
        field: String,
        kind: &'static str,
        want: &'static str,
    },

    /// A decimal attribute was marshaled while unquoted-decimal mode is off.
    /// See [`crate::enable_unquoted_decimals`].
    #[error("field \"{field}\" is a decimal but unquoted decimal mode is disabled")]
    QuotedDecimalMode { field: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the HTTP status most appropriate for this error.
    ///
    /// Input-shape errors map to 422, malformed documents to 400, and
    /// schema/configuration errors (caller bugs) to 500.
    pub fn status(&self) -> u16 {
        match self {
            Error::Schema(_) | Error::QuotedDecimalMode { .. } => 500,
            Error::Json(_) => 400,
            _ => 422,
        }
    }

    /// Short human-readable title for the wire error document.
    pub fn title(&self) -> &'static str {
        match self {
            Error::Schema(_) => "Invalid Resource Schema",
            Error::BadId { .. } => "Invalid ID",
            Error::UnexpectedType { .. } => "Unexpected Type",
            Error::ExpectedSlice { .. } => "Expected Collection",
            Error::MissingData => "Missing Primary Data",
            Error::AttributeMismatch { .. } => "Invalid Attribute",
            Error::InvalidIso8601 { .. } => "Invalid Timestamp",
            Error::UnsupportedPointer { .. } => "Unsupported Value",
            Error::QuotedDecimalMode { .. } => "Codec Misconfigured",
            Error::Json(_) => "Invalid Document",
        }
    }

    /// Convert into the wire-level error-document member.
    pub fn to_error_object(&self) -> ErrorObject {
        let pointer = match self {
            Error::BadId { .. } => Some("/data/id".to_string()),
            Error::AttributeMismatch { field, .. }
            | Error::InvalidIso8601 { field, .. }
            | Error::UnsupportedPointer { field, .. }
            | Error::QuotedDecimalMode { field } => Some(format!("/data/attributes/{field}")),
            _ => None,
        };

        ErrorObject {
            title: Some(self.title().to_string()),
            detail: Some(self.to_string()),
            status: Some(self.status().to_string()),
            source: pointer.map(|pointer| ErrorSource {
                pointer: Some(pointer),
                parameter: None,
            }),
            ..Default::default()
        }
    }

    pub(crate) fn mismatch(field: &str, value: &Value, want: &'static str) -> Self {
        Error::AttributeMismatch {
            field: field.to_string(),
            value: value.clone(),
            want,
        }
    }

    pub(crate) fn unsupported(field: &str, value: &Value, want: &'static str) -> Self {
        Error::UnsupportedPointer {
            field: field.to_string(),
            kind: json_type_name(value),
            want,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mismatch_message_is_the_contract_text() {
        let err = Error::AttributeMismatch {
            field: "float_field".into(),
            value: json!("A string."),
            want: "f64",
        };
        assert_eq!(
            err.to_string(),
            r#"got value "A string." expected type f64: invalid type provided"#
        );
    }

    #[test]
    fn status_mapping() {
        let err = Error::BadId {
            value: json!(true),
            want: "string",
        };
        assert_eq!(err.status(), 422);

        let err = Error::QuotedDecimalMode {
            field: "price".into(),
        };
        assert_eq!(err.status(), 500);

        let err = Error::Schema(SchemaError::MissingWireType);
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn error_object_carries_source_pointer() {
        let err = Error::AttributeMismatch {
            field: "title".into(),
            value: json!(5),
            want: "String",
        };
        let obj = err.to_error_object();
        assert_eq!(obj.status.as_deref(), Some("422"));
        assert_eq!(
            obj.source.unwrap().pointer.as_deref(),
            Some("/data/attributes/title")
        );
    }

    #[test]
    fn error_object_without_field_has_no_source() {
        let obj = Error::MissingData.to_error_object();
        assert!(obj.source.is_none());
        assert_eq!(obj.title.as_deref(), Some("Missing Primary Data"));
    }
}
