use crate::{
    commands::Command,
    db::{DeleteResult, ShipmentCollection},
    errors::ServiceError,
    models::document::query_document,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};
use validator::Validate;

use super::validate_non_empty_filter;

/// Removes every Shipment document matching the filter carried by a `delete`
/// event. An empty filter is refused so a bad event cannot wipe the
/// collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(transparent)]
pub struct DeleteShipmentCommand {
    #[validate(custom = "validate_non_empty_filter")]
    pub filter: Map<String, Value>,
}

#[async_trait]
impl Command for DeleteShipmentCommand {
    type Result = DeleteResult;

    const NAME: &'static str = "Delete";

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
        let result = collection.delete_many(filter).await?;

        info!(deleted_count = result.deleted_count, "Shipments deleted");
        Ok(result)
    }

    fn encode_result(result: &Self::Result) -> Result<Vec<u8>, ServiceError> {
        Ok(serde_json::to_vec(result)?)
    }
}
