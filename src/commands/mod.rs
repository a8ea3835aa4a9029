use async_trait::async_trait;
use tracing::{error, info};

use crate::{
    db::ShipmentCollection,
    errors::ServiceError,
    events::{Event, ResponseEnvelope},
};

pub mod shipments;

/// Command trait for implementing the Command Pattern
///
/// A command is decoded from an event payload, validated, and executed against
/// the collection with exactly one storage call. Commands hold no state
/// between invocations.
#[async_trait]
pub trait Command: Sized + Send + Sync {
    /// The return type of the command when executed successfully
    type Result: Send;

    /// Label used in logs and as the prefix of error messages.
    const NAME: &'static str;

    /// Decodes the command from the raw event payload.
    fn from_payload(data: &[u8]) -> Result<Self, ServiceError>;

    /// Execute the command against the given collection
    ///
    /// # Arguments
    /// * `collection` - Storage collaborator for the single persistence call
    ///
    /// # Returns
    /// * `Result<Self::Result, ServiceError>` - The result of command execution or an error
    async fn execute(
        &self,
        collection: &dyn ShipmentCollection,
    ) -> Result<Self::Result, ServiceError>;

    /// Serializes the result into the envelope's success payload.
    fn encode_result(result: &Self::Result) -> Result<Vec<u8>, ServiceError>;
}

/// Runs a command for an event and folds every outcome into one envelope.
///
/// Failures are logged here, once, and never propagated further.
pub async fn handle<C: Command>(
    collection: &dyn ShipmentCollection,
    event: &Event,
) -> ResponseEnvelope {
    match run::<C>(collection, event).await {
        Ok(payload) => {
            info!(
                action = C::NAME,
                event_uuid = %event.time_uuid,
                correlation_id = %event.correlation_id,
                "event handled"
            );
            ResponseEnvelope::success(event, payload)
        }
        Err(err) => {
            error!(
                action = C::NAME,
                event_uuid = %event.time_uuid,
                correlation_id = %event.correlation_id,
                error_code = %err.error_code(),
                "{}: {}",
                C::NAME,
                err
            );
            ResponseEnvelope::from_error(event, C::NAME, &err)
        }
    }
}

async fn run<C: Command>(
    collection: &dyn ShipmentCollection,
    event: &Event,
) -> Result<Vec<u8>, ServiceError> {
    let command = C::from_payload(&event.data)?;
    let result = command.execute(collection).await?;
    C::encode_result(&result)
}
