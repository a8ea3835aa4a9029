pub mod coercion;
pub mod document;
pub mod identifiers;
pub mod shipment;

pub use identifiers::{
    from_wire_form, parse_non_nil, to_wire_form, IdentifierError, WireIdentifier,
};
pub use shipment::{Shipment, ShipmentError};
