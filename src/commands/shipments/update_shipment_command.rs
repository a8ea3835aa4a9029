use crate::{
    commands::Command,
    db::{ShipmentCollection, UpdateResult},
    errors::ServiceError,
    models::document::query_document,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};
use validator::Validate;

use super::{validate_non_empty_filter, validate_update_set};

/// Applies a field-set to every Shipment document matching `filter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateShipmentCommand {
    #[serde(default)]
    #[validate(custom = "validate_non_empty_filter")]
    pub filter: Map<String, Value>,
    #[serde(default)]
    #[validate(custom = "validate_update_set")]
    pub update: Map<String, Value>,
}

#[async_trait]
impl Command for UpdateShipmentCommand {
    type Result = UpdateResult;

    const NAME: &'static str = "Update";

    fn from_payload(data: &[u8]) -> Result<Self, ServiceError> {
        serde_json::from_slice(data).map_err(|e| {
            ServiceError::InvalidInput(format!("error while unmarshalling event data: {}", e))
        })
    }

    #[instrument(skip(self, collection))]
    async fn execute(
        &self,
        collection: &dyn ShipmentCollection,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let filter = query_document(&self.filter)
            .map_err(|e| ServiceError::InvalidInput(format!("invalid filter: {}", e)))?;
        let update = query_document(&self.update)
            .map_err(|e| ServiceError::InvalidInput(format!("invalid update: {}", e)))?;

        let result = collection.update_many(filter, update).await?;

        info!(
            matched_count = result.matched_count,
            modified_count = result.modified_count,
            "Shipments updated"
        );
        Ok(result)
    }

    fn encode_result(result: &Self::Result) -> Result<Vec<u8>, ServiceError> {
        Ok(serde_json::to_vec(result)?)
    }
}
