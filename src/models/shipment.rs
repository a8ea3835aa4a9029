use bson::{oid::ObjectId, Bson, Document};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::coercion::{coerce_f64, coerce_i64, coerce_object_id, coerce_string, coerce_uuid};
use super::identifiers::to_wire_form;

/// Aggregate id under which Shipment events travel through the pipeline.
pub const AGGREGATE_ID: i8 = 6;

/// Key of the storage-assigned identity.
pub const IDENTITY_FIELD: &str = "_id";

/// Keys holding UUID identifiers.
pub const IDENTIFIER_FIELDS: [&str; 3] = ["itemID", "deviceID", "rsCustomerID"];

/// Custom error type for shipment model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShipmentError {
    #[error("malformed shipment document: {0}")]
    Malformed(String),

    #[error("error while asserting {field}: {reason}")]
    Coercion { field: &'static str, reason: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("error encoding shipment: {0}")]
    Encode(String),
}

/// Shipment aggregate.
///
/// Every field except the identity is optional, and an unset field is never
/// written by either encoding. `None` and `Some(0)` are different values and
/// both survive a round-trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shipment {
    /// Storage-assigned identity; `None` until the first insert.
    pub id: Option<ObjectId>,
    pub item_id: Option<Uuid>,
    pub barcode: Option<String>,
    pub date_arrived: Option<i64>,
    pub date_sold: Option<i64>,
    pub device_id: Option<Uuid>,
    pub donate_weight: Option<f64>,
    pub expiry_date: Option<i64>,
    pub lot: Option<String>,
    pub name: Option<String>,
    pub origin: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub rs_customer_id: Option<Uuid>,
    pub sale_price: Option<f64>,
    pub sku: Option<String>,
    pub sold_weight: Option<f64>,
    pub timestamp: Option<i64>,
    pub total_weight: Option<f64>,
    pub upc: Option<i64>,
    pub waste_weight: Option<f64>,
}

/// Encoded field set shared by both formats. Only the identity type differs:
/// a native `ObjectId` in storage, its hex string on the wire.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShipmentRecord<'a, I: Serialize> {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<I>,
    #[serde(rename = "itemID", skip_serializing_if = "Option::is_none")]
    item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    barcode: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_arrived: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_sold: Option<i64>,
    #[serde(rename = "deviceID", skip_serializing_if = "Option::is_none")]
    device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    donate_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiry_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lot: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<i64>,
    #[serde(rename = "rsCustomerID", skip_serializing_if = "Option::is_none")]
    rs_customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sale_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sku: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sold_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upc: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    waste_weight: Option<f64>,
}

type ApplyFn = fn(&mut Shipment, &Bson) -> Result<(), String>;

struct FieldCoercion {
    key: &'static str,
    apply: ApplyFn,
}

impl FieldCoercion {
    fn apply_to(&self, shipment: &mut Shipment, value: &Bson) -> Result<(), ShipmentError> {
        (self.apply)(shipment, value).map_err(|reason| ShipmentError::Coercion {
            field: self.key,
            reason,
        })
    }
}

/// Decode table, one entry per recognised key.
static FIELD_TABLE: [FieldCoercion; 21] = [
    FieldCoercion {
        key: IDENTITY_FIELD,
        apply: |s, v| {
            s.id = Some(coerce_object_id(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "itemID",
        apply: |s, v| {
            s.item_id = Some(coerce_uuid(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "deviceID",
        apply: |s, v| {
            s.device_id = Some(coerce_uuid(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "rsCustomerID",
        apply: |s, v| {
            s.rs_customer_id = Some(coerce_uuid(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "barcode",
        apply: |s, v| {
            s.barcode = Some(coerce_string(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "dateArrived",
        apply: |s, v| {
            s.date_arrived = Some(coerce_i64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "dateSold",
        apply: |s, v| {
            s.date_sold = Some(coerce_i64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "donateWeight",
        apply: |s, v| {
            s.donate_weight = Some(coerce_f64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "expiryDate",
        apply: |s, v| {
            s.expiry_date = Some(coerce_i64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "lot",
        apply: |s, v| {
            s.lot = Some(coerce_string(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "name",
        apply: |s, v| {
            s.name = Some(coerce_string(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "origin",
        apply: |s, v| {
            s.origin = Some(coerce_string(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "price",
        apply: |s, v| {
            s.price = Some(coerce_f64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "quantity",
        apply: |s, v| {
            s.quantity = Some(coerce_i64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "salePrice",
        apply: |s, v| {
            s.sale_price = Some(coerce_f64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "sku",
        apply: |s, v| {
            s.sku = Some(coerce_string(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "soldWeight",
        apply: |s, v| {
            s.sold_weight = Some(coerce_f64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "timestamp",
        apply: |s, v| {
            s.timestamp = Some(coerce_i64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "totalWeight",
        apply: |s, v| {
            s.total_weight = Some(coerce_f64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "upc",
        apply: |s, v| {
            s.upc = Some(coerce_i64(v)?);
            Ok(())
        },
    },
    FieldCoercion {
        key: "wasteWeight",
        apply: |s, v| {
            s.waste_weight = Some(coerce_f64(v)?);
            Ok(())
        },
    },
];

impl Shipment {
    fn record<I: Serialize>(&self, id: Option<I>) -> ShipmentRecord<'_, I> {
        ShipmentRecord {
            id,
            item_id: self.item_id.as_ref().map(to_wire_form),
            barcode: self.barcode.as_deref(),
            date_arrived: self.date_arrived,
            date_sold: self.date_sold,
            device_id: self.device_id.as_ref().map(to_wire_form),
            donate_weight: self.donate_weight,
            expiry_date: self.expiry_date,
            lot: self.lot.as_deref(),
            name: self.name.as_deref(),
            origin: self.origin.as_deref(),
            price: self.price,
            quantity: self.quantity,
            rs_customer_id: self.rs_customer_id.as_ref().map(to_wire_form),
            sale_price: self.sale_price,
            sku: self.sku.as_deref(),
            sold_weight: self.sold_weight,
            timestamp: self.timestamp,
            total_weight: self.total_weight,
            upc: self.upc,
            waste_weight: self.waste_weight,
        }
    }

    /// Storage encoding: identity stays a native `ObjectId`, UUIDs become strings.
    pub fn to_storage_document(&self) -> Result<Document, ShipmentError> {
        bson::to_document(&self.record(self.id))
            .map_err(|e| ShipmentError::Encode(e.to_string()))
    }

    /// Storage encoding as raw BSON bytes.
    pub fn to_storage_bytes(&self) -> Result<Vec<u8>, ShipmentError> {
        let document = self.to_storage_document()?;
        let mut bytes = Vec::new();
        document
            .to_writer(&mut bytes)
            .map_err(|e| ShipmentError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    /// Interchange encoding: the identity is written as hex, and only once assigned.
    pub fn to_json_value(&self) -> Result<Value, ShipmentError> {
        let id = self.id.as_ref().map(to_wire_form);
        serde_json::to_value(self.record(id)).map_err(|e| ShipmentError::Encode(e.to_string()))
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ShipmentError> {
        let id = self.id.as_ref().map(to_wire_form);
        serde_json::to_vec(&self.record(id)).map_err(|e| ShipmentError::Encode(e.to_string()))
    }

    /// Decodes from a generic document. Absent and null keys leave the field
    /// unset; unknown keys are ignored; the first bad value aborts the decode.
    pub fn from_document(document: &Document) -> Result<Self, ShipmentError> {
        let mut shipment = Shipment::default();
        for field in FIELD_TABLE.iter() {
            match document.get(field.key) {
                None | Some(Bson::Null) => continue,
                Some(value) => field.apply_to(&mut shipment, value)?,
            }
        }
        Ok(shipment)
    }

    pub fn from_storage_bytes(bytes: &[u8]) -> Result<Self, ShipmentError> {
        let document = Document::from_reader(bytes)
            .map_err(|e| ShipmentError::Malformed(e.to_string()))?;
        Self::from_document(&document)
    }

    /// Decodes the interchange form. Only recognised keys are converted, so
    /// an unknown key never fails the decode whatever its value.
    pub fn from_json_value(value: &Value) -> Result<Self, ShipmentError> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(ShipmentError::Malformed(format!(
                    "expected a JSON object, found {}",
                    other
                )))
            }
        };

        let mut shipment = Shipment::default();
        for field in FIELD_TABLE.iter() {
            match map.get(field.key) {
                None | Some(Value::Null) => continue,
                Some(value) => {
                    let value = bson::to_bson(value).map_err(|e| ShipmentError::Coercion {
                        field: field.key,
                        reason: e.to_string(),
                    })?;
                    field.apply_to(&mut shipment, &value)?;
                }
            }
        }
        Ok(shipment)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ShipmentError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ShipmentError::Malformed(e.to_string()))?;
        Self::from_json_value(&value)
    }

    /// A shipment can only be created with a present, non-nil item id.
    pub fn validate_for_insert(&self) -> Result<(), ShipmentError> {
        match self.item_id {
            None => Err(ShipmentError::Validation("missing ItemID".to_string())),
            Some(id) if id.is_nil() => Err(ShipmentError::Validation(
                "ItemID must not be the nil identifier".to_string(),
            )),
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde_json::json;

    fn full_shipment() -> Shipment {
        Shipment {
            id: Some(ObjectId::new()),
            item_id: Some(Uuid::new_v4()),
            barcode: Some("0123456789".to_string()),
            date_arrived: Some(1_546_300_800),
            date_sold: Some(1_546_387_200),
            device_id: Some(Uuid::new_v4()),
            donate_weight: Some(1.25),
            expiry_date: Some(1_547_000_000),
            lot: Some("LOT-7".to_string()),
            name: Some("Apples".to_string()),
            origin: Some("ON, Canada".to_string()),
            price: Some(3.49),
            quantity: Some(120),
            rs_customer_id: Some(Uuid::new_v4()),
            sale_price: Some(2.99),
            sku: Some("ABC".to_string()),
            sold_weight: Some(40.5),
            timestamp: Some(1_546_300_900),
            total_weight: Some(100.0),
            upc: Some(123_456_789_012),
            waste_weight: Some(2.0),
        }
    }

    #[test]
    fn storage_document_keeps_native_identity_and_string_uuids() {
        let shipment = full_shipment();
        let document = shipment.to_storage_document().unwrap();

        assert_eq!(document.get_object_id("_id").unwrap(), shipment.id.unwrap());
        assert_eq!(
            document.get_str("itemID").unwrap(),
            shipment.item_id.unwrap().to_string()
        );
        assert_eq!(document.get_i64("quantity").unwrap(), 120);
        assert_eq!(document.get_f64("price").unwrap(), 3.49);
    }

    #[test]
    fn json_writes_identity_as_hex() {
        let shipment = full_shipment();
        let value = shipment.to_json_value().unwrap();
        assert_eq!(value["_id"], json!(shipment.id.unwrap().to_hex()));
        assert_eq!(value["rsCustomerID"], json!(shipment.rs_customer_id.unwrap().to_string()));
    }

    #[test]
    fn unassigned_identity_is_omitted() {
        let shipment = Shipment {
            item_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let value = shipment.to_json_value().unwrap();
        assert!(value.get("_id").is_none());
        let document = shipment.to_storage_document().unwrap();
        assert!(!document.contains_key("_id"));
        assert_eq!(document.len(), 1);
    }

    #[test]
    fn zero_values_are_kept_when_set() {
        let shipment = Shipment {
            quantity: Some(0),
            price: Some(0.0),
            ..Default::default()
        };
        let value = shipment.to_json_value().unwrap();
        assert_eq!(value, json!({"quantity": 0, "price": 0.0}));
        assert_eq!(Shipment::from_json_value(&value).unwrap(), shipment);
    }

    #[test]
    fn round_trips_through_both_encodings() {
        let shipment = full_shipment();

        let from_json = Shipment::from_json_slice(&shipment.to_json_bytes().unwrap()).unwrap();
        assert_eq!(from_json, shipment);

        let from_bson =
            Shipment::from_storage_bytes(&shipment.to_storage_bytes().unwrap()).unwrap();
        assert_eq!(from_bson, shipment);
    }

    #[test]
    fn null_and_unknown_keys_are_ignored() {
        let document = doc! { "name": Bson::Null, "colour": "red", "lot": "L1" };
        let shipment = Shipment::from_document(&document).unwrap();
        assert_eq!(
            shipment,
            Shipment {
                lot: Some("L1".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn coercion_failure_names_the_field() {
        let err = Shipment::from_json_value(&json!({"deviceID": "garbage"})).unwrap_err();
        assert!(matches!(err, ShipmentError::Coercion { field: "deviceID", .. }));
        assert!(err.to_string().contains("deviceID"));

        let err = Shipment::from_json_value(&json!({"sku": 12})).unwrap_err();
        assert!(matches!(err, ShipmentError::Coercion { field: "sku", .. }));
    }

    #[test]
    fn unknown_keys_never_fail_the_json_decode() {
        let item_id = Uuid::new_v4();
        let payload = format!(
            r#"{{"itemID":"{}","extra":18446744073709551615,"nested":{{"$weird":[1,2]}}}}"#,
            item_id
        );
        let shipment = Shipment::from_json_slice(payload.as_bytes()).unwrap();
        assert_eq!(
            shipment,
            Shipment {
                item_id: Some(item_id),
                ..Default::default()
            }
        );
    }

    #[test]
    fn unrepresentable_recognised_value_names_the_field() {
        let err = Shipment::from_json_slice(br#"{"quantity":18446744073709551615}"#).unwrap_err();
        assert!(matches!(err, ShipmentError::Coercion { field: "quantity", .. }));
    }

    #[test]
    fn non_object_json_is_malformed() {
        assert!(matches!(
            Shipment::from_json_slice(b"[1,2]"),
            Err(ShipmentError::Malformed(_))
        ));
        assert!(matches!(
            Shipment::from_json_slice(b"{"),
            Err(ShipmentError::Malformed(_))
        ));
    }

    #[test]
    fn insert_validation_requires_non_nil_item_id() {
        assert!(Shipment::default().validate_for_insert().is_err());
        let nil = Shipment {
            item_id: Some(Uuid::nil()),
            ..Default::default()
        };
        assert!(nil.validate_for_insert().is_err());
        let ok = Shipment {
            item_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(ok.validate_for_insert().is_ok());
    }
}
