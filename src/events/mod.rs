use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::services::shipments::ShipmentEventHandler;

pub mod envelope;

pub use envelope::ResponseEnvelope;

/// Node id stamped into locally generated time-ordered event ids.
const LOCAL_NODE_ID: [u8; 6] = [0x02, 0x53, 0x48, 0x49, 0x50, 0x4d];

/// Actions a Shipment event can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Insert,
    Update,
    Delete,
}

/// Change-event delivered by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Action name. Kept as a string so an unknown action still gets a
    /// response instead of failing to deserialize.
    pub action: String,
    #[serde(rename = "aggregateID")]
    pub aggregate_id: i8,
    #[serde(rename = "correlationID")]
    pub correlation_id: Uuid,
    /// JSON payload whose shape depends on the action.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "userUUID")]
    pub user_uuid: Uuid,
    /// Time-ordered unique id of this event.
    #[serde(rename = "uuid")]
    pub time_uuid: Uuid,
    pub version: i64,
    #[serde(rename = "yearBucket")]
    pub year_bucket: i16,
}

impl Event {
    /// Creates an event with fresh correlation and event ids.
    pub fn new(action: impl Into<String>, aggregate_id: i8, data: Vec<u8>) -> Self {
        let timestamp = Utc::now();
        Self {
            action: action.into(),
            aggregate_id,
            correlation_id: Uuid::new_v4(),
            data,
            timestamp,
            user_uuid: Uuid::new_v4(),
            time_uuid: Uuid::now_v1(&LOCAL_NODE_ID),
            version: 0,
            year_bucket: timestamp.year() as i16,
        }
    }

    pub fn with_json<T: Serialize>(
        action: impl Into<String>,
        aggregate_id: i8,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(action, aggregate_id, serde_json::to_vec(payload)?))
    }
}

/// Serde adapter writing byte payloads as standard base64 strings.
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            bytes: &Option<Vec<u8>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match bytes {
                Some(bytes) => super::serialize(bytes, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Vec<u8>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|encoded| {
                    STANDARD
                        .decode(encoded.as_bytes())
                        .map_err(serde::de::Error::custom)
                })
                .transpose()
        }
    }
}

/// Outbound side of the pipeline: envelopes handed back for publication.
#[derive(Debug, Clone)]
pub struct ResponseSender {
    sender: mpsc::Sender<ResponseEnvelope>,
}

impl ResponseSender {
    pub fn new(sender: mpsc::Sender<ResponseEnvelope>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, envelope: ResponseEnvelope) -> Result<(), String> {
        self.sender
            .send(envelope)
            .await
            .map_err(|e| format!("Failed to send response: {}", e))
    }
}

/// Consumes events until the channel closes, handling each on its own task,
/// and waits for in-flight events before returning.
pub async fn process_events(
    mut rx: mpsc::Receiver<Event>,
    handler: Arc<ShipmentEventHandler>,
    responses: ResponseSender,
) {
    let mut in_flight = JoinSet::new();

    while let Some(event) = rx.recv().await {
        let handler = handler.clone();
        let responses = responses.clone();
        in_flight.spawn(async move {
            let Some(envelope) = handler.handle(&event).await else {
                return;
            };
            if let Err(e) = responses.send(envelope).await {
                error!(event_uuid = %event.time_uuid, "{}", e);
            }
        });

        while let Some(done) = in_flight.try_join_next() {
            if let Err(e) = done {
                error!("event task failed: {}", e);
            }
        }
    }

    debug!(pending = in_flight.len(), "event channel closed, draining");
    while let Some(done) = in_flight.join_next().await {
        if let Err(e) = done {
            error!("event task failed: {}", e);
        }
    }

    info!("Event processing loop has ended");
}
