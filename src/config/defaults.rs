/// Default configuration constants used across the schema.

/// Default service ID of the HTTP client used by platform bridges.
pub const DEFAULT_HTTP_CLIENT: &str = "http_client";

/// Default LM Studio host URL.
pub const DEFAULT_LMSTUDIO_HOST_URL: &str = "http://127.0.0.1:1234";

/// Default Ollama host URL.
pub const DEFAULT_OLLAMA_HOST_URL: &str = "http://127.0.0.1:11434";

/// Default Docker Model Runner host URL.
pub const DEFAULT_DOCKER_MODEL_RUNNER_HOST_URL: &str = "http://127.0.0.1:12434";

/// Default cache service ID for cache-backed stores.
pub const DEFAULT_CACHE_SERVICE: &str = "cache.app";

/// Default key prefix for Redis vector entries.
pub const DEFAULT_REDIS_KEY_PREFIX: &str = "vector:";
