//! Configuration management.
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config`, `./literank.toml`, or
//!    `<config dir>/literank/config.toml`)
//! 3. `LITERANK_*` environment variables, with `__` between sections
//!    (e.g. `LITERANK_SOURCES__MAX_RESULTS=10`)
//!
//! ```toml
//! [http]
//! timeout_secs = 15
//! ncbi_requests_per_second = 3
//!
//! [sources]
//! max_results = 5
//! enabled = ["pubmed", "europe_pmc", "arxiv", "pmc"]
//!
//! [retry]
//! max_attempts = 2
//!
//! [embedding]
//! model_id = "pritamdeka/BioBERT-mnli-snli-scinli-scitail-mednli-stsb"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default sentence-embedding model
pub const DEFAULT_MODEL_ID: &str = "pritamdeka/BioBERT-mnli-snli-scinli-scitail-mednli-stsb";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Which sources to query and how
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Retry policy for top-level source calls
    #[serde(default)]
    pub retry: RetrySettings,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// User agent sent to every API
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Shared request budget for the NCBI E-utilities endpoints
    #[serde(default = "default_ncbi_rps")]
    pub ncbi_requests_per_second: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
            ncbi_requests_per_second: default_ncbi_rps(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_ncbi_rps() -> u32 {
    3
}

/// Source selection and endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Maximum articles requested from each source
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Deadline for one source's whole fetch, including per-record lookups
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,

    /// Source ids to query (`pubmed`, `europe_pmc`, `arxiv`, `pmc`)
    #[serde(default = "default_enabled_sources")]
    pub enabled: Vec<String>,

    /// API endpoints
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            source_timeout_secs: default_source_timeout_secs(),
            enabled: default_enabled_sources(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

fn default_max_results() -> usize {
    5
}

fn default_source_timeout_secs() -> u64 {
    60
}

fn default_enabled_sources() -> Vec<String> {
    ["pubmed", "europe_pmc", "arxiv", "pmc"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Base URLs of the external APIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// NCBI E-utilities base (serves both PubMed and PMC)
    #[serde(default = "default_eutils_base")]
    pub eutils_base_url: String,

    /// Europe PMC REST search endpoint
    #[serde(default = "default_europe_pmc_url")]
    pub europe_pmc_search_url: String,

    /// arXiv Atom query endpoint
    #[serde(default = "default_arxiv_url")]
    pub arxiv_query_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            eutils_base_url: default_eutils_base(),
            europe_pmc_search_url: default_europe_pmc_url(),
            arxiv_query_url: default_arxiv_url(),
        }
    }
}

fn default_eutils_base() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string()
}

fn default_europe_pmc_url() -> String {
    "https://www.ebi.ac.uk/europepmc/webservices/rest/search".to_string()
}

fn default_arxiv_url() -> String {
    "https://export.arxiv.org/api/query".to_string()
}

/// Retry policy, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    4_000
}

/// Embedding model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Hugging Face model id
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Model revision (branch, tag or commit)
    #[serde(default = "default_revision")]
    pub revision: String,

    /// Maximum tokens per text, longer inputs are truncated
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Texts per forward pass
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Where downloaded weights are cached (defaults to the hf-hub cache)
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Use CUDA/Metal when compiled in and available
    #[serde(default)]
    pub use_gpu: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            revision: default_revision(),
            max_length: default_max_length(),
            batch_size: default_batch_size(),
            cache_dir: None,
            use_gpu: false,
        }
    }
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_max_length() -> usize {
    256
}

fn default_batch_size() -> usize {
    16
}

/// Load configuration, layering an optional file and `LITERANK_*` env vars over defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("LITERANK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("sources.enabled"),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find a config file in the default locations
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("literank.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("literank").join("config.toml"))
        .filter(|path| path.is_file())
}
