//! Application context wiring the classifier to its collaborators.

use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use crate::graph::{GraphClient, MemoryGraph, WikidataClient};
use crate::models::CategoryConfig;
use crate::services::ClassificationService;
use crate::store::{HierarchyStore, MemoryStore, PostgresStore};

/// Root application context.
///
/// Holds the shared configuration and the classification service built on
/// top of the configured graph client and hierarchy store.
#[derive(Clone)]
pub struct Context {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Knowledge-graph client shared with the classifier.
    pub graph: Arc<dyn GraphClient>,
    /// Classification engine.
    pub classifier: ClassificationService,
}

impl Context {
    /// Builds the context from configuration.
    ///
    /// With `fixture` set, the knowledge graph is served from that JSON file
    /// instead of the Wikidata API.
    pub async fn from(config: Config, fixture: Option<&Path>) -> Result<Self, AppError> {
        let categories = CategoryConfig::load(&config.classifier.categories)?;
        tracing::info!(
            categories = categories.categories.len(),
            ignored = categories.ignored.len(),
            "Loaded category configuration from {}",
            config.classifier.categories.display()
        );

        let graph = Self::create_graph(&config, fixture)?;
        let store = Self::create_store(&config).await?;
        let classifier = ClassificationService::new(Arc::new(categories), graph.clone(), store)?;

        Ok(Self {
            config: Arc::new(config),
            graph,
            classifier,
        })
    }

    /// Creates the knowledge-graph client.
    pub fn create_graph(
        config: &Config,
        fixture: Option<&Path>,
    ) -> Result<Arc<dyn GraphClient>, AppError> {
        match fixture {
            Some(path) => {
                tracing::info!("Serving knowledge graph from fixture {}", path.display());
                Ok(Arc::new(MemoryGraph::from_fixture(path)?))
            }
            None => {
                tracing::debug!(endpoint = %config.wikidata.endpoint, "Using Wikidata API");
                Ok(Arc::new(WikidataClient::new(&config.wikidata)?))
            }
        }
    }

    /// Creates the hierarchy store for the configured backend.
    pub async fn create_store(config: &Config) -> Result<Arc<dyn HierarchyStore>, AppError> {
        match config.store.backend {
            StoreBackend::Memory => {
                tracing::debug!("Using in-memory hierarchy store");
                Ok(Arc::new(MemoryStore::new()))
            }
            StoreBackend::Postgres => Ok(Arc::new(Self::connect_postgres(config).await?)),
        }
    }

    /// Connects to the PostgreSQL store named in `store.uri`.
    pub async fn connect_postgres(config: &Config) -> Result<PostgresStore, AppError> {
        let uri = config.store.uri.as_deref().ok_or_else(|| {
            AppError::Store("store.uri is required for the postgres backend".to_string())
        })?;
        tracing::info!("Connecting to PostgreSQL hierarchy store");
        PostgresStore::connect(uri, config.store.pool_size).await
    }
}
