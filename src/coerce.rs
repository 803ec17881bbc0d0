//! Scalar coercion between wire JSON values and native kinds.
//!
//! Centralizes the conversion rules used by both the flattening and the
//! reconstruction engines: primary-id text coercion across the supported
//! integer widths, timestamp and decimal special-casing, and the per-kind
//! mismatch checks whose messages are part of the client-facing contract.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use bigdecimal::BigDecimal;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

use crate::error::Error;
use crate::schema::{AttrKind, IdKind};

/// Process-wide "decimals emit unquoted" mode.
///
/// Single writer at startup, read-only afterwards; toggling concurrently
/// with in-flight marshal calls leaves the affected documents with an
/// unspecified mix of quoted and unquoted decimals.
static UNQUOTED_DECIMALS: AtomicBool = AtomicBool::new(false);

/// Enable bare-number encoding for decimal attributes.
///
/// Must be called once at process start before any marshal call that touches
/// a decimal field; marshaling a decimal while the mode is off fails with
/// [`Error::QuotedDecimalMode`].
pub fn enable_unquoted_decimals() {
    UNQUOTED_DECIMALS.store(true, Ordering::Relaxed);
}

pub(crate) fn unquoted_decimals() -> bool {
    UNQUOTED_DECIMALS.load(Ordering::Relaxed)
}

/// Format a native id value as wire text.
///
/// Accepts strings and the eight native integer widths; everything else is
/// `BadId`.
pub(crate) fn format_id(value: &Value, kind: IdKind) -> Result<String, Error> {
    let bad = || Error::BadId {
        value: value.clone(),
        want: kind.name(),
    };

    match kind {
        IdKind::Text => match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(bad()),
        },
        _ if kind.is_signed() => {
            let n = value.as_i64().ok_or_else(bad)?;
            let fits = match kind {
                IdKind::I8 => i8::try_from(n).is_ok(),
                IdKind::I16 => i16::try_from(n).is_ok(),
                IdKind::I32 => i32::try_from(n).is_ok(),
                _ => true,
            };
            if !fits {
                return Err(bad());
            }
            Ok(n.to_string())
        }
        _ => {
            let n = value.as_u64().ok_or_else(bad)?;
            let fits = match kind {
                IdKind::U8 => u8::try_from(n).is_ok(),
                IdKind::U16 => u16::try_from(n).is_ok(),
                IdKind::U32 => u32::try_from(n).is_ok(),
                _ => true,
            };
            if !fits {
                return Err(bad());
            }
            Ok(n.to_string())
        }
    }
}

/// Parse a wire id (always textual) into its native kind.
///
/// A non-numeric id destined for a numeric kind is `BadId`, distinguishable
/// from the id simply being absent.
pub(crate) fn parse_id(raw: &str, kind: IdKind) -> Result<Value, Error> {
    let bad = || Error::BadId {
        value: Value::String(raw.to_string()),
        want: kind.name(),
    };

    let number = match kind {
        IdKind::Text => return Ok(Value::String(raw.to_string())),
        IdKind::I8 => i64::from(raw.parse::<i8>().map_err(|_| bad())?).into(),
        IdKind::I16 => i64::from(raw.parse::<i16>().map_err(|_| bad())?).into(),
        IdKind::I32 => i64::from(raw.parse::<i32>().map_err(|_| bad())?).into(),
        IdKind::I64 => raw.parse::<i64>().map_err(|_| bad())?.into(),
        IdKind::U8 => u64::from(raw.parse::<u8>().map_err(|_| bad())?).into(),
        IdKind::U16 => u64::from(raw.parse::<u16>().map_err(|_| bad())?).into(),
        IdKind::U32 => u64::from(raw.parse::<u32>().map_err(|_| bad())?).into(),
        IdKind::U64 => raw.parse::<u64>().map_err(|_| bad())?.into(),
    };
    Ok(Value::Number(number))
}

/// True when a value deep-equals the zero value of its JSON kind.
pub(crate) fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Coerce one attribute for the marshal direction.
///
/// Returns `Ok(None)` when the field must be skipped entirely (omit-empty,
/// or a zero-value timestamp).
pub(crate) fn marshal_attr(
    field: &str,
    kind: AttrKind,
    omit_empty: bool,
    iso8601: bool,
    value: &Value,
) -> Result<Option<Value>, Error> {
    match kind {
        AttrKind::Decimal => match value {
            Value::Null => Ok(null_or_skip(omit_empty)),
            Value::String(s) => {
                require_unquoted(field)?;
                canonical_decimal(field, value, s)
            }
            Value::Number(n) => {
                require_unquoted(field)?;
                canonical_decimal(field, value, &n.to_string())
            }
            _ => Err(Error::mismatch(field, value, "decimal")),
        },
        AttrKind::Time => match value {
            Value::Null => Ok(null_or_skip(omit_empty)),
            Value::String(s) => {
                let ts = DateTime::parse_from_rfc3339(s)
                    .map_err(|_| Error::InvalidIso8601 {
                        field: field.to_string(),
                        value: s.clone(),
                    })?
                    .with_timezone(&Utc);
                Ok(emit_time(ts, iso8601))
            }
            Value::Number(_) => {
                let ts = wire_timestamp(field, value)?;
                Ok(emit_time(ts, iso8601))
            }
            Value::Object(_) | Value::Array(_) => {
                Err(Error::unsupported(field, value, "timestamp"))
            }
            _ => Err(Error::mismatch(field, value, "timestamp")),
        },
        AttrKind::String => match value {
            Value::Null => Ok(null_or_skip(omit_empty)),
            Value::String(s) => {
                if omit_empty && s.is_empty() {
                    Ok(None)
                } else {
                    // Explicit string emission: the wire value is exactly the
                    // native string, quoted.
                    Ok(Some(Value::String(s.clone())))
                }
            }
            Value::Object(_) | Value::Array(_) => Err(Error::unsupported(field, value, "String")),
            _ => Err(Error::mismatch(field, value, "String")),
        },
        // Everything else is emitted as serde produced it; omit-empty skips
        // values that deep-equal their kind's zero.
        _ => {
            if omit_empty && is_zero(value) {
                Ok(None)
            } else {
                Ok(Some(value.clone()))
            }
        }
    }
}

/// Coerce one wire attribute into the plain value handed to the typed
/// deserializer.
pub(crate) fn unmarshal_attr(field: &str, kind: AttrKind, wire: &Value) -> Result<Value, Error> {
    if wire.is_null() {
        return Ok(Value::Null);
    }

    match kind {
        AttrKind::Json | AttrKind::Nested(_) => Ok(wire.clone()),
        AttrKind::String => match wire {
            Value::String(_) => Ok(wire.clone()),
            Value::Object(_) | Value::Array(_) => Err(Error::unsupported(field, wire, "String")),
            _ => Err(Error::mismatch(field, wire, "String")),
        },
        AttrKind::Bool => match wire {
            Value::Bool(_) => Ok(wire.clone()),
            Value::Object(_) | Value::Array(_) => Err(Error::unsupported(field, wire, "bool")),
            _ => Err(Error::mismatch(field, wire, "bool")),
        },
        AttrKind::F64 => match wire {
            Value::Number(_) => Ok(wire.clone()),
            Value::Object(_) | Value::Array(_) => Err(Error::unsupported(field, wire, "f64")),
            _ => Err(Error::mismatch(field, wire, "f64")),
        },
        AttrKind::I64 => match wire {
            Value::Number(n) => Ok(Value::Number(wire_integer(field, wire, n)?.into())),
            Value::Object(_) | Value::Array(_) => Err(Error::unsupported(field, wire, "i64")),
            _ => Err(Error::mismatch(field, wire, "i64")),
        },
        AttrKind::U64 => match wire {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    return Ok(Value::Number(u.into()));
                }
                let i = wire_integer(field, wire, n).map_err(|_| {
                    Error::mismatch(field, wire, "u64")
                })?;
                u64::try_from(i)
                    .map(|u| Value::Number(u.into()))
                    .map_err(|_| Error::mismatch(field, wire, "u64"))
            }
            Value::Object(_) | Value::Array(_) => Err(Error::unsupported(field, wire, "u64")),
            _ => Err(Error::mismatch(field, wire, "u64")),
        },
        AttrKind::StringVec => match wire {
            Value::Array(items) => {
                for item in items {
                    if !item.is_string() {
                        return Err(Error::mismatch(field, item, "String"));
                    }
                }
                Ok(wire.clone())
            }
            Value::Object(_) => Err(Error::unsupported(field, wire, "Vec<String>")),
            _ => Err(Error::mismatch(field, wire, "Vec<String>")),
        },
        AttrKind::StringListMap => match wire {
            Value::Object(entries) => {
                let mut out = Map::new();
                for (key, entry) in entries {
                    let lists = match entry {
                        Value::String(s) => Value::Array(vec![Value::String(s.clone())]),
                        Value::Array(items) => {
                            for item in items {
                                if !item.is_string() {
                                    return Err(Error::mismatch(field, item, "String"));
                                }
                            }
                            entry.clone()
                        }
                        other => return Err(Error::mismatch(field, other, "Vec<String>")),
                    };
                    out.insert(key.clone(), lists);
                }
                Ok(Value::Object(out))
            }
            _ => Err(Error::mismatch(field, wire, "object")),
        },
        AttrKind::Time => match wire {
            Value::Number(_) => {
                let ts = wire_timestamp(field, wire)?;
                Ok(Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true)))
            }
            Value::String(s) => {
                let ts = DateTime::parse_from_rfc3339(s)
                    .map_err(|_| Error::InvalidIso8601 {
                        field: field.to_string(),
                        value: s.clone(),
                    })?
                    .with_timezone(&Utc);
                Ok(Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true)))
            }
            Value::Object(_) | Value::Array(_) => {
                Err(Error::unsupported(field, wire, "timestamp"))
            }
            _ => Err(Error::mismatch(field, wire, "timestamp")),
        },
        AttrKind::Decimal => match wire {
            Value::Number(n) => {
                let dec = BigDecimal::from_str(&n.to_string())
                    .map_err(|_| Error::mismatch(field, wire, "decimal"))?;
                Ok(Value::String(dec.normalized().to_string()))
            }
            Value::String(s) => {
                let dec = BigDecimal::from_str(s)
                    .map_err(|_| Error::mismatch(field, wire, "decimal"))?;
                Ok(Value::String(dec.normalized().to_string()))
            }
            Value::Object(_) | Value::Array(_) => Err(Error::unsupported(field, wire, "decimal")),
            _ => Err(Error::mismatch(field, wire, "decimal")),
        },
    }
}

// --- Internal helpers ---

fn null_or_skip(omit_empty: bool) -> Option<Value> {
    if omit_empty {
        None
    } else {
        Some(Value::Null)
    }
}

fn require_unquoted(field: &str) -> Result<(), Error> {
    if unquoted_decimals() {
        Ok(())
    } else {
        Err(Error::QuotedDecimalMode {
            field: field.to_string(),
        })
    }
}

fn canonical_decimal(field: &str, value: &Value, text: &str) -> Result<Option<Value>, Error> {
    let dec = BigDecimal::from_str(text).map_err(|_| Error::mismatch(field, value, "decimal"))?;
    // The canonical text is a valid JSON number by construction. Building
    // the Number straight from it keeps every digit; going through f64
    // would round anything past its 17 significant digits.
    Ok(Some(Value::Number(Number::from_string_unchecked(
        dec.normalized().to_string(),
    ))))
}

/// Zero-value timestamps (the Unix epoch) are never emitted.
fn emit_time(ts: DateTime<Utc>, iso8601: bool) -> Option<Value> {
    if ts.timestamp() == 0 && ts.timestamp_subsec_nanos() == 0 {
        return None;
    }
    if iso8601 {
        Some(Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true)))
    } else {
        Some(Value::Number(ts.timestamp().into()))
    }
}

fn wire_timestamp(field: &str, wire: &Value) -> Result<DateTime<Utc>, Error> {
    let secs = wire
        .as_number()
        .and_then(|n| {
            n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        })
        .ok_or_else(|| Error::mismatch(field, wire, "timestamp"))?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| Error::mismatch(field, wire, "timestamp"))
}

/// A float with a fractional part never truncates into an integer kind.
fn wire_integer(field: &str, wire: &Value, n: &Number) -> Result<i64, Error> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
        .map(|f| f as i64)
        .ok_or_else(|| Error::mismatch(field, wire, "i64"))
}
