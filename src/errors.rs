use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::db::CollectionError;
use crate::models::ShipmentError;

/// Coarse classification carried by every failed response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCode {
    /// Bad or missing input, a codec failure, or an unexpected result shape
    /// from the store. Retrying the same event will not help.
    Internal,
    /// The storage operation itself failed.
    Database,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] CollectionError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<ShipmentError> for ServiceError {
    fn from(err: ShipmentError) -> Self {
        match err {
            ShipmentError::Validation(msg) => ServiceError::ValidationError(msg),
            ShipmentError::Encode(msg) => ServiceError::SerializationError(msg),
            other => ServiceError::InvalidInput(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-classification mapping.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DatabaseError(_) => ErrorCode::Database,
            Self::ValidationError(_)
            | Self::InvalidInput(_)
            | Self::SerializationError(_)
            | Self::InternalError(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::str::FromStr;

    #[test]
    fn only_storage_failures_are_database_errors() {
        let db = ServiceError::from(CollectionError::Timeout("insert".into()));
        assert_eq!(db.error_code(), ErrorCode::Database);

        for err in [
            ServiceError::ValidationError("x".into()),
            ServiceError::InvalidInput("x".into()),
            ServiceError::SerializationError("x".into()),
            ServiceError::InternalError("x".into()),
        ] {
            assert_eq!(err.error_code(), ErrorCode::Internal);
        }
    }

    #[test]
    fn shipment_errors_map_by_kind() {
        let err: ServiceError = ShipmentError::Validation("missing ItemID".into()).into();
        assert_matches!(err, ServiceError::ValidationError(_));

        let err: ServiceError = ShipmentError::Coercion {
            field: "itemID",
            reason: "bad".into(),
        }
        .into();
        assert_matches!(err, ServiceError::InvalidInput(ref m) if m.contains("itemID"));
    }

    #[test]
    fn error_code_string_form() {
        assert_eq!(ErrorCode::Internal.to_string(), "internal");
        assert_eq!(ErrorCode::from_str("database").unwrap(), ErrorCode::Database);
        assert_eq!(
            serde_json::to_string(&ErrorCode::Database).unwrap(),
            "\"database\""
        );
    }
}
