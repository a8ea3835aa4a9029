use crate::{
    commands::Command,
    db::ShipmentCollection,
    errors::ServiceError,
    models::Shipment,
};
use async_trait::async_trait;
use tracing::{info, instrument};

/// Creates one Shipment document from the interchange form carried by an
/// `insert` event.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertShipmentCommand {
    pub shipment: Shipment,
}

#[async_trait]
impl Command for InsertShipmentCommand {
    type Result = Shipment;

    const NAME: &'static str = "Insert";

    fn from_payload(data: &[u8]) -> Result<Self, ServiceError> {
        let shipment = Shipment::from_json_slice(data).map_err(|e| {
            ServiceError::InvalidInput(format!("error while unmarshalling event data: {}", e))
        })?;
        Ok(Self { shipment })
    }

    #[instrument(skip(self, collection))]
    async fn execute(
        &self,
        collection: &dyn ShipmentCollection,
    ) -> Result<Self::Result, ServiceError> {
        self.shipment.validate_for_insert()?;

        let document = self.shipment.to_storage_document()?;
        let inserted = collection.insert_one(document).await?;

        let id = inserted.inserted_id.as_object_id().ok_or_else(|| {
            ServiceError::InternalError(format!(
                "error asserting inserted id {} to ObjectId",
                inserted.inserted_id
            ))
        })?;

        let mut shipment = self.shipment.clone();
        shipment.id = Some(id);
        info!(shipment_id = %id, "Shipment inserted");
        Ok(shipment)
    }

    fn encode_result(result: &Self::Result) -> Result<Vec<u8>, ServiceError> {
        Ok(result.to_json_bytes()?)
    }
}
