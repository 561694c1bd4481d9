use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::defaults::{
    DEFAULT_CACHE_SERVICE, DEFAULT_DOCKER_MODEL_RUNNER_HOST_URL, DEFAULT_HTTP_CLIENT,
    DEFAULT_LMSTUDIO_HOST_URL, DEFAULT_OLLAMA_HOST_URL, DEFAULT_REDIS_KEY_PREFIX,
};
use super::model_ref::ModelRef;

// ============================================================================
// Platform Configuration
// ============================================================================

/// One section per model-serving provider. Absent sections mean the
/// provider is not configured.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    pub anthropic: Option<AnthropicPlatformConfig>,
    #[serde(default)]
    pub azure: BTreeMap<String, AzurePlatformConfig>,
    pub eleven_labs: Option<ElevenLabsPlatformConfig>,
    pub gemini: Option<ApiKeyPlatformConfig>,
    pub vertexai: Option<VertexAiPlatformConfig>,
    pub openai: Option<OpenAiPlatformConfig>,
    pub mistral: Option<ApiKeyPlatformConfig>,
    pub openrouter: Option<ApiKeyPlatformConfig>,
    pub lmstudio: Option<LmStudioPlatformConfig>,
    pub ollama: Option<OllamaPlatformConfig>,
    pub cerebras: Option<ApiKeyPlatformConfig>,
    pub voyage: Option<ApiKeyPlatformConfig>,
    pub perplexity: Option<ApiKeyPlatformConfig>,
    pub dockermodelrunner: Option<DockerModelRunnerPlatformConfig>,
    pub scaleway: Option<ApiKeyPlatformConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicPlatformConfig {
    pub api_key: String,
    pub version: Option<String>,
    /// Service ID of the HTTP client to use.
    #[serde(default = "default_http_client")]
    pub http_client: String,
}

/// Azure OpenAI deployments, keyed by a caller-chosen name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzurePlatformConfig {
    pub api_key: String,
    pub base_url: String,
    pub deployment: String,
    /// The used API version.
    pub api_version: Option<String>,
    #[serde(default = "default_http_client")]
    pub http_client: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsPlatformConfig {
    pub host: Option<String>,
    pub api_key: String,
    #[serde(default = "default_http_client")]
    pub http_client: String,
}

/// Shared shape for providers that only need an API key and an HTTP client
/// reference (gemini, mistral, openrouter, cerebras, voyage, perplexity,
/// scaleway).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyPlatformConfig {
    pub api_key: String,
    #[serde(default = "default_http_client")]
    pub http_client: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexAiPlatformConfig {
    pub location: String,
    pub project_id: String,
}

/// The region for the OpenAI API: "EU" (https://eu.api.openai.com),
/// "US" (https://us.api.openai.com), or absent for the default endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenAiRegion {
    #[serde(rename = "EU")]
    Eu,
    #[serde(rename = "US")]
    Us,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiPlatformConfig {
    pub api_key: String,
    pub region: Option<OpenAiRegion>,
    #[serde(default = "default_http_client")]
    pub http_client: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmStudioPlatformConfig {
    #[serde(default = "default_lmstudio_host_url")]
    pub host_url: String,
    #[serde(default = "default_http_client")]
    pub http_client: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaPlatformConfig {
    #[serde(default = "default_ollama_host_url")]
    pub host_url: String,
    #[serde(default = "default_http_client")]
    pub http_client: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerModelRunnerPlatformConfig {
    #[serde(default = "default_docker_model_runner_host_url")]
    pub host_url: String,
    #[serde(default = "default_http_client")]
    pub http_client: String,
}

// ============================================================================
// Model Configuration
// ============================================================================

/// Capability tags a model may declare. The set is closed; unknown tags are
/// rejected at deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    InputAudio,
    InputImage,
    InputMessages,
    InputMultiple,
    InputPdf,
    InputText,
    OutputAudio,
    OutputImage,
    OutputStreaming,
    OutputStructured,
    OutputText,
    ToolCalling,
}

/// Per-model declaration under `model.<platform>.<model_name>`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelConfig {
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

// ============================================================================
// Agent Configuration
// ============================================================================

/// Agent memory: a plain string for static memory, or a service reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MemoryRef {
    Static(String),
    Service { service: String },
}

impl<'de> Deserialize<'de> for MemoryRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(Self::Static(text)),
            Value::Object(map) => match map.get("service") {
                Some(Value::String(service)) => Ok(Self::Service {
                    service: service.clone(),
                }),
                Some(_) => Err(D::Error::custom("Memory service must be a string.")),
                None => Err(D::Error::custom(
                    r#"Memory array configuration must contain a "service" key."#,
                )),
            },
            _ => Err(D::Error::custom(
                r#"Memory must be a string or an array with a "service" key."#,
            )),
        }
    }
}

/// System prompt input: a bare string is shorthand for `{text: ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptInput {
    Shorthand(String),
    Full(PromptConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PromptConfig {
    /// The system prompt text.
    pub text: Option<String>,
    /// Path to a file containing the system prompt.
    pub file: Option<String>,
    /// Include tool definitions at the end of the system prompt.
    #[serde(default)]
    pub include_tools: bool,
    /// Enable translation for the system prompt.
    #[serde(default)]
    pub enable_translation: bool,
    /// The translation domain for the system prompt.
    pub translation_domain: Option<String>,
}

/// A tool entry: a bare string is shorthand for `{service: ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolEntry {
    Shorthand(String),
    Full(ToolServiceConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ToolServiceConfig {
    pub service: Option<String>,
    /// Expose another configured agent as a tool.
    pub agent: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub method: Option<String>,
}

/// The `tools` node accepts `false` (disable all tools), `true`, `null`,
/// or absent (enable, no explicit services), a bare list of entries, or
/// the full `{enabled, services}` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolsInput {
    Enabled(bool),
    List(Vec<ToolEntry>),
    Full(ToolsConfig),
}

impl Default for ToolsInput {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub services: Vec<ToolEntry>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            services: Vec::new(),
        }
    }
}

/// One configured agent, keyed by name under `agent`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    /// Service name of the platform; absent means the framework default.
    pub platform: Option<String>,
    /// Enable tracking of token usage for the agent.
    #[serde(default = "default_true")]
    pub track_token_usage: bool,
    pub model: Option<ModelRef>,
    #[serde(default = "default_true")]
    pub structured_output: bool,
    pub memory: Option<MemoryRef>,
    pub prompt: Option<PromptInput>,
    #[serde(default, deserialize_with = "tools_or_enabled")]
    pub tools: ToolsInput,
    #[serde(default = "default_true")]
    pub fault_tolerant_toolbox: bool,
}

// ============================================================================
// Multi-Agent Configuration
// ============================================================================

/// Keyword-routed orchestration over configured agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiAgentConfig {
    /// Name of the orchestrator agent.
    pub orchestrator: String,
    /// Handoff rules mapping agent names to trigger keywords.
    pub handoffs: BTreeMap<String, Vec<String>>,
    /// Name of the fallback agent for unmatched requests.
    pub fallback: String,
}

// ============================================================================
// Store Configuration
// ============================================================================

/// Vector store backends, each keyed by a caller-chosen instance name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub azure_search: BTreeMap<String, AzureSearchStoreConfig>,
    #[serde(default)]
    pub cache: BTreeMap<String, CacheStoreConfig>,
    #[serde(default)]
    pub chroma_db: BTreeMap<String, ChromaDbStoreConfig>,
    #[serde(default)]
    pub clickhouse: BTreeMap<String, ClickHouseStoreConfig>,
    #[serde(default)]
    pub cloudflare: BTreeMap<String, CloudflareStoreConfig>,
    #[serde(default)]
    pub meilisearch: BTreeMap<String, MeilisearchStoreConfig>,
    #[serde(default)]
    pub memory: BTreeMap<String, MemoryStoreConfig>,
    #[serde(default)]
    pub milvus: BTreeMap<String, MilvusStoreConfig>,
    #[serde(default)]
    pub mongodb: BTreeMap<String, MongoDbStoreConfig>,
    #[serde(default)]
    pub neo4j: BTreeMap<String, Neo4jStoreConfig>,
    #[serde(default)]
    pub pinecone: BTreeMap<String, PineconeStoreConfig>,
    #[serde(default)]
    pub qdrant: BTreeMap<String, QdrantStoreConfig>,
    #[serde(default)]
    pub redis: BTreeMap<String, RedisStoreConfig>,
    #[serde(default)]
    pub surreal_db: BTreeMap<String, SurrealDbStoreConfig>,
    #[serde(default)]
    pub typesense: BTreeMap<String, TypesenseStoreConfig>,
    #[serde(default)]
    pub weaviate: BTreeMap<String, WeaviateStoreConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureSearchStoreConfig {
    pub endpoint: String,
    pub api_key: String,
    pub index_name: String,
    pub api_version: String,
    pub vector_field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStoreConfig {
    #[serde(default = "default_cache_service")]
    pub service: String,
    pub cache_key: Option<String>,
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromaDbStoreConfig {
    /// Service ID of a ChromaDB client; absent means the framework default.
    pub client: Option<String>,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickHouseStoreConfig {
    pub dsn: Option<String>,
    pub http_client: Option<String>,
    pub database: String,
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudflareStoreConfig {
    pub account_id: String,
    pub api_key: String,
    pub index_name: String,
    pub dimensions: Option<u32>,
    pub metric: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeilisearchStoreConfig {
    pub endpoint: String,
    pub api_key: String,
    pub index_name: String,
    pub embedder: Option<String>,
    pub vector_field: Option<String>,
    pub dimensions: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemoryStoreConfig {
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilvusStoreConfig {
    pub endpoint: String,
    pub api_key: String,
    pub database: String,
    pub collection: String,
    pub vector_field: Option<String>,
    pub dimensions: Option<u32>,
    pub metric_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoDbStoreConfig {
    /// Service ID of a MongoDB client; absent means the framework default.
    pub client: Option<String>,
    pub database: String,
    pub collection: String,
    pub index_name: String,
    pub vector_field: Option<String>,
    pub bulk_write: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jStoreConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub vector_index_name: String,
    pub node_name: String,
    pub vector_field: Option<String>,
    pub dimensions: Option<u32>,
    pub distance: Option<String>,
    pub quantization: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PineconeStoreConfig {
    /// Service ID of a Pinecone client; absent means the framework default.
    pub client: Option<String>,
    pub namespace: Option<String>,
    #[serde(default)]
    pub filter: BTreeMap<String, String>,
    pub top_k: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantStoreConfig {
    pub endpoint: String,
    pub api_key: String,
    pub collection_name: String,
    pub dimensions: Option<u32>,
    pub distance: Option<String>,
}

/// Distance metric for Redis vector similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedisDistance {
    #[default]
    Cosine,
    L2,
    Ip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Raw client connection parameters, passed through untouched.
    pub connection_parameters: Option<Value>,
    /// Service ID of a Redis client.
    pub client: Option<String>,
    pub index_name: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
    #[serde(default)]
    pub distance: RedisDistance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrealDbStoreConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
    pub table: Option<String>,
    pub vector_field: Option<String>,
    pub strategy: Option<String>,
    pub dimensions: Option<u32>,
    pub namespaced_user: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesenseStoreConfig {
    pub endpoint: String,
    pub api_key: String,
    pub collection: String,
    pub vector_field: Option<String>,
    pub dimensions: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaviateStoreConfig {
    pub endpoint: String,
    pub api_key: String,
    pub collection: String,
}

// ============================================================================
// Message Store Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MessageStoreConfig {
    #[serde(default)]
    pub memory: BTreeMap<String, MemoryMessageStoreConfig>,
    #[serde(default)]
    pub cache: BTreeMap<String, CacheMessageStoreConfig>,
    #[serde(default)]
    pub session: BTreeMap<String, SessionMessageStoreConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemoryMessageStoreConfig {
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMessageStoreConfig {
    #[serde(default = "default_cache_service")]
    pub service: String,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionMessageStoreConfig {
    pub identifier: Option<String>,
}

// ============================================================================
// Vectorizer Configuration
// ============================================================================

/// A platform+model pair used to turn text into vector embeddings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VectorizerConfig {
    /// Service name of the platform; absent means the framework default.
    pub platform: Option<String>,
    pub model: Option<ModelRef>,
}

// ============================================================================
// Indexer Configuration
// ============================================================================

/// Source identifier (file path, URL, etc.) or a list of sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceConfig {
    One(String),
    Many(Vec<String>),
}

/// Document ingestion pipeline: loader, transformers/filters, vectorizer,
/// store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Service name of the loader.
    pub loader: String,
    pub source: Option<SourceConfig>,
    /// Transformer service names, applied in order.
    #[serde(default)]
    pub transformers: Vec<String>,
    /// Filter service names, applied in order.
    #[serde(default)]
    pub filters: Vec<String>,
    /// Service name of the vectorizer; absent means the framework default.
    pub vectorizer: Option<String>,
    /// Service name of the store; absent means the framework default.
    pub store: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub(crate) fn default_true() -> bool {
    true
}

/// An explicit `tools: null` means the same as leaving the key out:
/// tools enabled with no explicit services.
fn tools_or_enabled<'de, D>(deserializer: D) -> Result<ToolsInput, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let tools = Option::<ToolsInput>::deserialize(deserializer)?;
    Ok(tools.unwrap_or(ToolsInput::Enabled(true)))
}

fn default_http_client() -> String {
    DEFAULT_HTTP_CLIENT.to_string()
}

fn default_lmstudio_host_url() -> String {
    DEFAULT_LMSTUDIO_HOST_URL.to_string()
}

fn default_ollama_host_url() -> String {
    DEFAULT_OLLAMA_HOST_URL.to_string()
}

fn default_docker_model_runner_host_url() -> String {
    DEFAULT_DOCKER_MODEL_RUNNER_HOST_URL.to_string()
}

fn default_cache_service() -> String {
    DEFAULT_CACHE_SERVICE.to_string()
}

fn default_redis_key_prefix() -> String {
    DEFAULT_REDIS_KEY_PREFIX.to_string()
}
