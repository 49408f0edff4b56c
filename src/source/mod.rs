//! Document source module
//!
//! The boundary to the document store. A `DocumentSource` runs one query
//! (collection, filter, projection) and returns the matching documents in
//! store order.
//!
//! Implementations:
//! - `MongoSource` - MongoDB via the official driver
//! - `MemorySource` - in-process collections, for offline runs and tests

mod memory;
mod mongo;

pub use memory::MemorySource;
pub use mongo::{MongoSource, MongoSourceConfig};

use crate::error::Result;
use crate::loader::QueryDefinition;
use crate::types::JsonObject;
use async_trait::async_trait;
use mongodb::bson::{self, Document};

/// One query against a collection
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuery {
    /// Collection name
    pub collection: String,
    /// Filter document
    pub filter: Document,
    /// Inclusion projection; `None` returns whole documents
    pub projection: Option<Document>,
}

impl SourceQuery {
    /// Build a query for a group from its resolved filter
    pub fn from_definition(query: &QueryDefinition, filter: &JsonObject) -> Result<Self> {
        let filter = bson::to_document(filter)?;
        Ok(Self {
            collection: query.collection.clone(),
            filter,
            projection: projection_document(&query.projection),
        })
    }
}

/// Inclusion projection for a field allow-list
pub fn projection_document(fields: &[String]) -> Option<Document> {
    if fields.is_empty() {
        return None;
    }
    let mut projection = Document::new();
    for field in fields {
        projection.insert(field.clone(), 1_i32);
    }
    Some(projection)
}

/// A store that can answer queries
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Short description for logs
    fn describe(&self) -> String;

    /// Check the store is reachable
    async fn ping(&self) -> Result<()>;

    /// Run a query and collect every matching document
    async fn find(&self, query: &SourceQuery) -> Result<Vec<Document>>;
}
