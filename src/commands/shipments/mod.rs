use bson::oid::ObjectId;
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::ValidationError;

use crate::{
    db::ShipmentCollection,
    events::{Event, ResponseEnvelope},
    models::{
        parse_non_nil,
        shipment::{IDENTIFIER_FIELDS, IDENTITY_FIELD},
        WireIdentifier,
    },
};

use super::handle;

pub mod delete_shipment_command;
pub mod insert_shipment_command;
pub mod update_shipment_command;

pub use delete_shipment_command::DeleteShipmentCommand;
pub use insert_shipment_command::InsertShipmentCommand;
pub use update_shipment_command::UpdateShipmentCommand;

pub async fn insert(collection: &dyn ShipmentCollection, event: &Event) -> ResponseEnvelope {
    handle::<InsertShipmentCommand>(collection, event).await
}

pub async fn update(collection: &dyn ShipmentCollection, event: &Event) -> ResponseEnvelope {
    handle::<UpdateShipmentCommand>(collection, event).await
}

pub async fn delete(collection: &dyn ShipmentCollection, event: &Event) -> ResponseEnvelope {
    handle::<DeleteShipmentCommand>(collection, event).await
}

fn validation_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub(crate) fn validate_non_empty_filter(
    filter: &Map<String, Value>,
) -> Result<(), ValidationError> {
    if filter.is_empty() {
        return Err(validation_error("blank_filter", "blank filter provided".to_string()));
    }
    Ok(())
}

/// An update set must not be empty, and any identifier it assigns must be a
/// usable, non-nil value.
pub(crate) fn validate_update_set(update: &Map<String, Value>) -> Result<(), ValidationError> {
    if update.is_empty() {
        return Err(validation_error("blank_update", "blank update provided".to_string()));
    }

    for field in IDENTIFIER_FIELDS {
        if let Some(value) = update.get(field) {
            check_identifier::<Uuid>(field, value)?;
        }
    }
    if let Some(value) = update.get(IDENTITY_FIELD) {
        check_identifier::<ObjectId>(IDENTITY_FIELD, value)?;
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_identifier<T: WireIdentifier>(field: &str, value: &Value) -> Result<(), ValidationError> {
    let raw = match value {
        Value::String(raw) => raw,
        other => {
            let message = format!(
                "invalid {}: expected identifier string, found {}",
                field,
                json_kind(other)
            );
            return Err(validation_error("invalid_identifier", message));
        }
    };
    parse_non_nil::<T>(raw)
        .map(|_| ())
        .map_err(|e| validation_error("invalid_identifier", format!("invalid {}: {}", field, e)))
}
