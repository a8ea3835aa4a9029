use std::sync::Arc;

use shipment_aggregate::{
    db::InMemoryCollection,
    events::{self, Event, ResponseEnvelope, ResponseSender},
    models::shipment::AGGREGATE_ID,
    ShipmentEventHandler,
};
use tokio::sync::mpsc;

/// Event pipeline wired to an in-memory collection, the same way the binary
/// wires it to stdin and stdout.
pub struct TestPipeline {
    pub collection: InMemoryCollection,
    events: Option<mpsc::Sender<Event>>,
    responses: mpsc::Receiver<ResponseEnvelope>,
    processor: tokio::task::JoinHandle<()>,
}

impl TestPipeline {
    pub fn new() -> Self {
        Self::with_collection(InMemoryCollection::new())
    }

    pub fn with_collection(collection: InMemoryCollection) -> Self {
        let handler = Arc::new(ShipmentEventHandler::new(Arc::new(collection.clone())));
        let (event_tx, event_rx) = mpsc::channel(64);
        let (response_tx, response_rx) = mpsc::channel(64);
        let processor = tokio::spawn(events::process_events(
            event_rx,
            handler,
            ResponseSender::new(response_tx),
        ));

        Self {
            collection,
            events: Some(event_tx),
            responses: response_rx,
            processor,
        }
    }

    pub async fn send(&self, event: Event) {
        self.events
            .as_ref()
            .expect("pipeline already closed")
            .send(event)
            .await
            .expect("event processor stopped");
    }

    /// Sends one event and waits for its envelope.
    pub async fn round_trip(&mut self, event: Event) -> ResponseEnvelope {
        self.send(event).await;
        self.responses.recv().await.expect("no response envelope")
    }

    /// Closes the inbound channel and collects every remaining envelope.
    pub async fn finish(mut self) -> Vec<ResponseEnvelope> {
        drop(self.events.take());
        (&mut self.processor).await.expect("event processor panicked");

        let mut envelopes = Vec::new();
        while let Some(envelope) = self.responses.recv().await {
            envelopes.push(envelope);
        }
        envelopes
    }
}

pub fn shipment_event(action: &str, payload: serde_json::Value) -> Event {
    Event::with_json(action, AGGREGATE_ID, &payload).expect("payload serializes")
}
