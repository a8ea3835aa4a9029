//! Storage collaborator seam.
//!
//! The handlers only ever see a [`ShipmentCollection`]; connection handling and
//! query execution belong to whichever client implements it.

use async_trait::async_trait;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod in_memory;

pub use in_memory::InMemoryCollection;

/// Errors reported by the document store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectionError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("operation timed out: {0}")]
    Timeout(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    /// Identity assigned by the store. Usually an `ObjectId`, but the store
    /// makes no promise, so callers check.
    pub inserted_id: Bson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Handle to the collection holding Shipment documents.
///
/// Implementations must be safe to share between concurrently running
/// handlers.
#[async_trait]
pub trait ShipmentCollection: Send + Sync {
    async fn insert_one(&self, document: Document) -> Result<InsertOneResult, CollectionError>;

    async fn delete_many(&self, filter: Document) -> Result<DeleteResult, CollectionError>;

    /// Applies `update` as a set of field assignments to every match.
    async fn update_many(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, CollectionError>;
}
