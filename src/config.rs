use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where index and vector data are stored
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Target chunk size in estimated tokens
    pub chunk_size: usize,
    /// Words carried over between consecutive chunks
    pub chunk_overlap: usize,
    /// Result cache time-to-live in seconds (0 = entries never expire)
    pub cache_ttl_secs: u64,
    /// LLM provider configuration (chat + dense embeddings)
    pub llm: LlmConfig,
    /// Sparse term-expansion sidecar configuration
    pub expander: ExpanderConfig,
}

/// Configuration for the term-expansion inference sidecar that produces
/// sparse expansion vectors. If `base_url` is None the sparse signal is
/// disabled and every expansion resolves to "no value".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpanderConfig {
    /// Base URL for the expansion API (e.g. "http://127.0.0.1:8083").
    pub base_url: Option<String>,
    /// Model name to send in the expansion request.
    pub model: String,
    /// Request timeout in seconds (capped at 30).
    pub timeout_secs: u64,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "term-expander".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for answer generation
    pub chat_model: String,
    /// Model name for dense embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub embedding_dim: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:8000".to_string(),
            chunk_size: 300,
            chunk_overlap: 50,
            cache_ttl_secs: 300,
            llm: LlmConfig::default(),
            expander: ExpanderConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "all-minilm".to_string(),
            api_key: None,
            embedding_dim: 384,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("RAG_SEARCH_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("RAG_SEARCH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("RAG_SEARCH_CHUNK_SIZE") {
            if let Ok(v) = val.parse() {
                config.chunk_size = v;
            }
        }
        if let Ok(val) = std::env::var("RAG_SEARCH_CHUNK_OVERLAP") {
            if let Ok(v) = val.parse() {
                config.chunk_overlap = v;
            }
        }
        if let Ok(val) = std::env::var("RAG_SEARCH_CACHE_TTL_SECS") {
            if let Ok(v) = val.parse() {
                config.cache_ttl_secs = v;
            }
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = d;
            }
        }

        // Expander config
        if let Ok(url) = std::env::var("EXPANDER_BASE_URL") {
            config.expander.base_url = Some(url);
        }
        if let Ok(model) = std::env::var("EXPANDER_MODEL") {
            config.expander.model = model;
        }
        if let Ok(val) = std::env::var("EXPANDER_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.expander.timeout_secs = v.min(30); // Cap at 30s
            }
        }

        config
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }
}
