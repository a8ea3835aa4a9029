//! Wire-form conversion for identifier fields.
//!
//! Identifiers are native values in memory (`Uuid`, `ObjectId`) and canonical
//! strings in both the interchange and the storage encodings. Every other part
//! of the crate goes through these functions, so the string form is decided in
//! exactly one place.

use bson::oid::ObjectId;
use thiserror::Error;
use uuid::Uuid;

/// Failure to read an identifier back from its string form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("malformed identifier {value:?}: {reason}")]
    Malformed { value: String, reason: String },

    #[error("identifier is the nil value")]
    Nil,
}

/// A native identifier that has a canonical string representation.
pub trait WireIdentifier: Sized {
    /// Canonical string form written to JSON and BSON.
    fn to_wire_form(&self) -> String;

    /// Parses the canonical string form. Total over every string produced
    /// by [`WireIdentifier::to_wire_form`].
    fn from_wire_form(raw: &str) -> Result<Self, IdentifierError>;

    /// True for the all-zero value, which is never a usable identity.
    fn is_nil(&self) -> bool;
}

impl WireIdentifier for Uuid {
    fn to_wire_form(&self) -> String {
        self.hyphenated().to_string()
    }

    fn from_wire_form(raw: &str) -> Result<Self, IdentifierError> {
        Uuid::parse_str(raw).map_err(|e| IdentifierError::Malformed {
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    fn is_nil(&self) -> bool {
        Uuid::is_nil(self)
    }
}

impl WireIdentifier for ObjectId {
    fn to_wire_form(&self) -> String {
        self.to_hex()
    }

    fn from_wire_form(raw: &str) -> Result<Self, IdentifierError> {
        ObjectId::parse_str(raw).map_err(|e| IdentifierError::Malformed {
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    fn is_nil(&self) -> bool {
        self.bytes() == [0u8; 12]
    }
}

pub fn to_wire_form<T: WireIdentifier>(id: &T) -> String {
    id.to_wire_form()
}

pub fn from_wire_form<T: WireIdentifier>(raw: &str) -> Result<T, IdentifierError> {
    T::from_wire_form(raw)
}

/// Parses an identifier and rejects the nil value.
pub fn parse_non_nil<T: WireIdentifier>(raw: &str) -> Result<T, IdentifierError> {
    let id = T::from_wire_form(raw)?;
    if id.is_nil() {
        return Err(IdentifierError::Nil);
    }
    Ok(id)
}
