//! MongoDB source

use super::{DocumentSource, SourceQuery};
use crate::error::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::{debug, info};

/// Connection settings for a MongoDB source
#[derive(Debug, Clone)]
pub struct MongoSourceConfig {
    /// Connection string
    pub connection_string: String,
    /// Database to query
    pub database: String,
    /// Application name reported to the server
    pub app_name: Option<String>,
}

/// MongoDB-backed document source
#[derive(Debug, Clone)]
pub struct MongoSource {
    database: Database,
}

impl MongoSource {
    /// Connect to the configured database
    ///
    /// The driver connects lazily; use `ping` to surface connection errors
    /// before running queries.
    pub async fn connect(config: &MongoSourceConfig) -> Result<Self> {
        let mut opts = ClientOptions::parse(&config.connection_string).await?;
        if let Some(app_name) = &config.app_name {
            opts.app_name = Some(app_name.clone());
        }
        let client = Client::with_options(opts)?;

        info!(database = %config.database, "connected to document store");
        Ok(Self {
            database: client.database(&config.database),
        })
    }

    /// Database name
    pub fn database_name(&self) -> &str {
        self.database.name()
    }
}

#[async_trait]
impl DocumentSource for MongoSource {
    fn describe(&self) -> String {
        format!("mongodb database '{}'", self.database.name())
    }

    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn find(&self, query: &SourceQuery) -> Result<Vec<Document>> {
        debug!(
            collection = %query.collection,
            filter = %query.filter,
            "running find"
        );

        let collection = self.database.collection::<Document>(&query.collection);
        let mut find = collection.find(query.filter.clone());
        if let Some(projection) = &query.projection {
            find = find.projection(projection.clone());
        }

        let documents: Vec<Document> = find.await?.try_collect().await?;
        Ok(documents)
    }
}
