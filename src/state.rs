use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::embedding::EmbeddingGenerator;
use crate::indexing::Indexer;
use crate::retrieval::{CachedRetriever, HybridRetriever};
use crate::store::DocumentStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<DocumentStore>,
    pub indexer: Arc<Indexer>,
    pub retriever: Arc<CachedRetriever<HybridRetriever>>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        // Ensure data directories exist
        std::fs::create_dir_all(config.index_dir())?;
        std::fs::create_dir_all(config.vector_dir())?;

        let store = Arc::new(DocumentStore::open_or_create(
            &config.index_dir(),
            &config.vector_dir(),
        )?);

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        let embedder = Arc::new(EmbeddingGenerator::new(
            http_client.clone(),
            config.llm.clone(),
            config.expander.clone(),
        ));

        let indexer = Arc::new(Indexer::new(Arc::clone(&store), Arc::clone(&embedder)));

        let ttl = (config.cache_ttl_secs > 0).then(|| Duration::from_secs(config.cache_ttl_secs));
        let retriever = Arc::new(CachedRetriever::new(
            HybridRetriever::new(Arc::clone(&store), embedder),
            ttl,
        ));

        Ok(Self {
            config,
            store,
            indexer,
            retriever,
            http_client,
        })
    }
}
