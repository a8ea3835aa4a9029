//! Coercion of loosely typed document values into the types the Shipment model
//! expects. Both the JSON and the BSON decoders land here, so the accepted
//! numeric encodings cover whatever either format produces.

use bson::{oid::ObjectId, Bson};
use uuid::Uuid;

use super::identifiers::{from_wire_form, WireIdentifier};

/// Reason a single value could not be coerced. The caller attaches the field.
pub type CoercionResult<T> = Result<T, String>;

fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "document",
        Bson::Boolean(_) => "boolean",
        Bson::Null => "null",
        Bson::Int32(_) => "int32",
        Bson::Int64(_) => "int64",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "datetime",
        Bson::Binary(_) => "binary",
        _ => "unsupported type",
    }
}

pub fn coerce_string(value: &Bson) -> CoercionResult<String> {
    match value {
        Bson::String(s) => Ok(s.clone()),
        other => Err(format!("expected string, found {}", type_name(other))),
    }
}

/// Accepts fixed-width integers and integral doubles inside the i64 range.
/// Fractional doubles are rejected rather than truncated.
pub fn coerce_i64(value: &Bson) -> CoercionResult<i64> {
    match value {
        Bson::Int32(v) => Ok(i64::from(*v)),
        Bson::Int64(v) => Ok(*v),
        Bson::Double(v) => {
            // 2^63 is exactly representable, i64::MAX is not
            const BOUND: f64 = 9_223_372_036_854_775_808.0;
            if !v.is_finite() || v.fract() != 0.0 {
                return Err(format!("{} is not an integer", v));
            }
            if *v < -BOUND || *v >= BOUND {
                return Err(format!("{} is out of range for int64", v));
            }
            Ok(*v as i64)
        }
        other => Err(format!("expected integer, found {}", type_name(other))),
    }
}

pub fn coerce_f64(value: &Bson) -> CoercionResult<f64> {
    match value {
        Bson::Double(v) => Ok(*v),
        Bson::Int32(v) => Ok(f64::from(*v)),
        Bson::Int64(v) => Ok(*v as f64),
        other => Err(format!("expected number, found {}", type_name(other))),
    }
}

/// Identifier fields travel as their canonical string form.
pub fn coerce_uuid(value: &Bson) -> CoercionResult<Uuid> {
    match value {
        Bson::String(s) => from_wire_form::<Uuid>(s).map_err(|e| e.to_string()),
        other => Err(format!(
            "expected identifier string, found {}",
            type_name(other)
        )),
    }
}

/// The identity field is either already typed (BSON) or a hex string (JSON).
pub fn coerce_object_id(value: &Bson) -> CoercionResult<ObjectId> {
    match value {
        Bson::ObjectId(id) => Ok(*id),
        Bson::String(s) => ObjectId::from_wire_form(s).map_err(|e| e.to_string()),
        other => Err(format!(
            "expected objectId or hex string, found {}",
            type_name(other)
        )),
    }
}
