//! Conversion of schemaless JSON maps (filters and update sets) into
//! storage documents.

use bson::{oid::ObjectId, Bson, Document};
use serde_json::{Map, Value};

use super::identifiers::WireIdentifier;
use super::shipment::IDENTITY_FIELD;

pub fn json_to_document(map: &Map<String, Value>) -> Result<Document, bson::ser::Error> {
    bson::to_document(map)
}

/// Converts a JSON filter or update set into a storage document. A hex-string
/// identity is replaced by the native `ObjectId` stored under that key;
/// anything else is left for the store to compare as-is.
pub fn query_document(map: &Map<String, Value>) -> Result<Document, bson::ser::Error> {
    let mut document = json_to_document(map)?;
    let native = match document.get(IDENTITY_FIELD) {
        Some(Bson::String(hex)) => ObjectId::from_wire_form(hex).ok(),
        _ => None,
    };
    if let Some(id) = native {
        document.insert(IDENTITY_FIELD, id);
    }
    Ok(document)
}
