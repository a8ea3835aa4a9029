use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use tracing::debug;

use super::{CollectionError, DeleteResult, InsertOneResult, ShipmentCollection, UpdateResult};

/// In-memory collection used by tests and the stdin demo binary.
///
/// Filters are equality matches on every key; numbers compare by value
/// regardless of their width.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollection {
    documents: Arc<Mutex<Vec<Document>>>,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: Arc::new(Mutex::new(documents)),
        }
    }

    /// Copy of the stored documents, in insertion order.
    pub fn snapshot(&self) -> Result<Vec<Document>, CollectionError> {
        Ok(self.lock()?.clone())
    }

    pub fn len(&self) -> Result<usize, CollectionError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CollectionError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Document>>, CollectionError> {
        self.documents
            .lock()
            .map_err(|_| CollectionError::Storage("collection lock poisoned".to_string()))
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn values_match(stored: &Bson, wanted: &Bson) -> bool {
    match (as_number(stored), as_number(wanted)) {
        (Some(a), Some(b)) => a == b,
        _ => stored == wanted,
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, wanted)| {
        document
            .get(key)
            .map(|stored| values_match(stored, wanted))
            .unwrap_or(false)
    })
}

#[async_trait]
impl ShipmentCollection for InMemoryCollection {
    async fn insert_one(&self, mut document: Document) -> Result<InsertOneResult, CollectionError> {
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };

        let mut documents = self.lock()?;
        if documents.iter().any(|d| d.get("_id") == Some(&id)) {
            return Err(CollectionError::DuplicateKey(format!("_id {}", id)));
        }
        documents.push(document);
        debug!(inserted_id = %id, "document inserted");

        Ok(InsertOneResult { inserted_id: id })
    }

    async fn delete_many(&self, filter: Document) -> Result<DeleteResult, CollectionError> {
        let mut documents = self.lock()?;
        let before = documents.len();
        documents.retain(|d| !matches(d, &filter));
        let deleted_count = (before - documents.len()) as u64;
        debug!(deleted_count, "documents deleted");

        Ok(DeleteResult { deleted_count })
    }

    async fn update_many(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, CollectionError> {
        let mut documents = self.lock()?;
        let mut result = UpdateResult {
            matched_count: 0,
            modified_count: 0,
        };

        for document in documents.iter_mut().filter(|d| matches(d, &filter)) {
            result.matched_count += 1;
            let mut changed = false;
            for (key, value) in update.iter() {
                if document.get(key) != Some(value) {
                    document.insert(key.clone(), value.clone());
                    changed = true;
                }
            }
            if changed {
                result.modified_count += 1;
            }
        }
        debug!(
            matched_count = result.matched_count,
            modified_count = result.modified_count,
            "documents updated"
        );

        Ok(result)
    }
}
