//! Shipment Aggregate Library
//!
//! Turns Shipment change-events (insert, update, delete) into document-store
//! operations and reports every outcome as a response envelope.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod models;
pub mod services;

pub use errors::{ErrorCode, ServiceError};
pub use events::{Event, ResponseEnvelope};
pub use models::Shipment;
pub use services::ShipmentEventHandler;
