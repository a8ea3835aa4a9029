// Services layer: routes inbound events to command handlers
pub mod shipments;

pub use shipments::ShipmentEventHandler;
