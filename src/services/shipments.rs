use crate::{
    commands::shipments,
    db::ShipmentCollection,
    errors::ErrorCode,
    events::{Action, Event, ResponseEnvelope},
    models::shipment::AGGREGATE_ID,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Routes Shipment events to their command handlers.
#[derive(Clone)]
pub struct ShipmentEventHandler {
    collection: Arc<dyn ShipmentCollection>,
    aggregate_id: i8,
}

impl ShipmentEventHandler {
    /// Creates a handler for the default Shipment aggregate id
    pub fn new(collection: Arc<dyn ShipmentCollection>) -> Self {
        Self::with_aggregate_id(collection, AGGREGATE_ID)
    }

    pub fn with_aggregate_id(collection: Arc<dyn ShipmentCollection>, aggregate_id: i8) -> Self {
        Self {
            collection,
            aggregate_id,
        }
    }

    pub fn aggregate_id(&self) -> i8 {
        self.aggregate_id
    }

    /// Handles one event. Returns `None` when the event belongs to another
    /// aggregate; every other event gets exactly one envelope.
    #[instrument(skip(self, event), fields(action = %event.action, event_uuid = %event.time_uuid))]
    pub async fn handle(&self, event: &Event) -> Option<ResponseEnvelope> {
        if event.aggregate_id != self.aggregate_id {
            debug!(aggregate_id = event.aggregate_id, "ignoring event for another aggregate");
            return None;
        }

        let envelope = match Action::from_str(&event.action) {
            Ok(Action::Insert) => self.insert(event).await,
            Ok(Action::Update) => self.update(event).await,
            Ok(Action::Delete) => self.delete(event).await,
            Err(_) => {
                let message = format!("unknown action: {:?}", event.action);
                error!(correlation_id = %event.correlation_id, "{}", message);
                ResponseEnvelope::failure(event, ErrorCode::Internal, message)
            }
        };
        Some(envelope)
    }

    /// Inserts the shipment carried by the event
    pub async fn insert(&self, event: &Event) -> ResponseEnvelope {
        shipments::insert(self.collection.as_ref(), event).await
    }

    /// Applies the event's field-set to matching shipments
    pub async fn update(&self, event: &Event) -> ResponseEnvelope {
        shipments::update(self.collection.as_ref(), event).await
    }

    /// Deletes shipments matching the event's filter
    pub async fn delete(&self, event: &Event) -> ResponseEnvelope {
        shipments::delete(self.collection.as_ref(), event).await
    }
}
