use super::Config;
use crate::config::types::{MemoryRef, PromptInput, ToolEntry, ToolsInput};
use anyhow::Result;

/// A single semantic validation failure, located by config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Collaborator capabilities consulted during validation. The host
/// framework's container fills this in; defaults assume nothing optional
/// is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext {
    /// Whether a translator service is available for prompt translation.
    pub translator_available: bool,
}

/// Validate a normalized configuration tree.
///
/// Node-level rules run first and are all collected; the tree-wide rules
/// (name disjointness, reference resolution) run only once every node-level
/// rule passes.
pub fn validate_config(config: &Config, ctx: &ValidationContext) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    validate_models(config, &mut errors);
    validate_agents(config, ctx, &mut errors);
    validate_multi_agents(config, &mut errors);
    validate_stores(config, &mut errors);
    validate_message_stores(config, &mut errors);
    validate_indexers(config, &mut errors);

    if errors.is_empty() {
        validate_agent_references(config, &mut errors);
    }

    errors
}

/// Validate and collapse any failures into a single fatal error.
pub fn validate_config_object(config: &Config, ctx: &ValidationContext) -> Result<()> {
    let errors = validate_config(config, ctx);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}

fn push(errors: &mut Vec<ConfigValidationError>, path: String, message: impl Into<String>) {
    errors.push(ConfigValidationError {
        path,
        message: message.into(),
    });
}

// ============================================================================
// Node-level validators
// ============================================================================

fn validate_models(config: &Config, errors: &mut Vec<ConfigValidationError>) {
    for (platform, models) in &config.model {
        if models.is_empty() {
            push(
                errors,
                format!("model.{platform}"),
                "Model name cannot be empty.",
            );
        }
        for (model_name, model) in models {
            if model.capabilities.is_empty() {
                push(
                    errors,
                    format!("model.{platform}.{model_name}.capabilities"),
                    "At least one capability must be specified for each model.",
                );
            }
        }
    }
}

fn validate_agents(
    config: &Config,
    ctx: &ValidationContext,
    errors: &mut Vec<ConfigValidationError>,
) {
    for (name, agent) in &config.agent {
        match &agent.memory {
            Some(MemoryRef::Static(text)) if text.is_empty() => {
                push(errors, format!("agent.{name}.memory"), "Memory cannot be empty.");
            }
            Some(MemoryRef::Service { service }) if service.is_empty() => {
                push(
                    errors,
                    format!("agent.{name}.memory"),
                    "Memory service cannot be empty.",
                );
            }
            _ => {}
        }

        if let Some(PromptInput::Full(prompt)) = &agent.prompt {
            let path = format!("agent.{name}.prompt");
            // First failure wins within the prompt node.
            if prompt.text.is_none() && prompt.file.is_none() {
                push(
                    errors,
                    path,
                    r#"Either "text" or "file" must be configured for prompt."#,
                );
            } else if prompt.text.is_some() && prompt.file.is_some() {
                push(
                    errors,
                    path,
                    r#"Cannot use both "text" and "file" for prompt. Choose one."#,
                );
            } else if prompt.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
                push(errors, path, r#"The "text" cannot be empty."#);
            } else if prompt.file.as_deref().is_some_and(|f| f.trim().is_empty()) {
                push(errors, path, r#"The "file" cannot be empty."#);
            } else if prompt.enable_translation && !ctx.translator_available {
                push(
                    errors,
                    path,
                    "System prompt translation is enabled, but no translator is available. \
                     Install a translator service and register it with the container.",
                );
            }
        }

        if let ToolsInput::Full(tools) = &agent.tools {
            for (index, entry) in tools.services.iter().enumerate() {
                let ToolEntry::Full(tool) = entry else {
                    continue;
                };
                let has_service = tool.service.as_deref().is_some_and(|s| !s.is_empty());
                let has_agent = tool.agent.as_deref().is_some_and(|a| !a.is_empty());
                if has_service == has_agent {
                    push(
                        errors,
                        format!("agent.{name}.tools.services[{index}]"),
                        r#"Either "agent" or "service" must be configured, and never both."#,
                    );
                }
            }
        }
    }
}

fn validate_multi_agents(config: &Config, errors: &mut Vec<ConfigValidationError>) {
    for (name, multi_agent) in &config.multi_agent {
        if multi_agent.handoffs.is_empty() {
            push(
                errors,
                format!("multi_agent.{name}.handoffs"),
                "At least one handoff must be configured.",
            );
        }
        for (target, keywords) in &multi_agent.handoffs {
            if keywords.is_empty() {
                push(
                    errors,
                    format!("multi_agent.{name}.handoffs.{target}"),
                    "At least one trigger keyword must be configured.",
                );
            }
        }
    }
}

fn validate_stores(config: &Config, errors: &mut Vec<ConfigValidationError>) {
    for (name, store) in &config.store.cache {
        require_non_empty(
            errors,
            &format!("store.cache.{name}"),
            "service",
            &store.service,
        );
    }

    for (name, store) in &config.store.chroma_db {
        let path = format!("store.chroma_db.{name}");
        require_non_empty_if_set(errors, &path, "client", store.client.as_deref());
        require_non_empty(errors, &path, "collection", &store.collection);
    }

    for (name, store) in &config.store.clickhouse {
        let path = format!("store.clickhouse.{name}");
        if store.dsn.is_none() && store.http_client.is_none() {
            push(
                errors,
                path.clone(),
                r#"Either "dsn" or "http_client" must be configured."#,
            );
        }
        require_non_empty_if_set(errors, &path, "dsn", store.dsn.as_deref());
        require_non_empty_if_set(errors, &path, "http_client", store.http_client.as_deref());
        require_non_empty(errors, &path, "database", &store.database);
        require_non_empty(errors, &path, "table", &store.table);
    }

    for (name, store) in &config.store.cloudflare {
        let path = format!("store.cloudflare.{name}");
        require_non_empty(errors, &path, "account_id", &store.account_id);
        require_non_empty(errors, &path, "api_key", &store.api_key);
        require_non_empty(errors, &path, "index_name", &store.index_name);
    }

    for (name, store) in &config.store.meilisearch {
        let path = format!("store.meilisearch.{name}");
        require_non_empty(errors, &path, "endpoint", &store.endpoint);
        require_non_empty(errors, &path, "api_key", &store.api_key);
        require_non_empty(errors, &path, "index_name", &store.index_name);
    }

    for (name, store) in &config.store.memory {
        let path = format!("store.memory.{name}");
        require_non_empty_if_set(errors, &path, "strategy", store.strategy.as_deref());
    }

    for (name, store) in &config.store.milvus {
        let path = format!("store.milvus.{name}");
        require_non_empty(errors, &path, "endpoint", &store.endpoint);
    }

    for (name, store) in &config.store.mongodb {
        let path = format!("store.mongodb.{name}");
        require_non_empty_if_set(errors, &path, "client", store.client.as_deref());
    }

    for (name, store) in &config.store.neo4j {
        let path = format!("store.neo4j.{name}");
        require_non_empty(errors, &path, "endpoint", &store.endpoint);
        require_non_empty(errors, &path, "username", &store.username);
        require_non_empty(errors, &path, "password", &store.password);
        require_non_empty(errors, &path, "database", &store.database);
        require_non_empty(errors, &path, "vector_index_name", &store.vector_index_name);
        require_non_empty(errors, &path, "node_name", &store.node_name);
    }

    for (name, store) in &config.store.pinecone {
        let path = format!("store.pinecone.{name}");
        require_non_empty_if_set(errors, &path, "client", store.client.as_deref());
    }

    for (name, store) in &config.store.qdrant {
        let path = format!("store.qdrant.{name}");
        require_non_empty(errors, &path, "endpoint", &store.endpoint);
        require_non_empty(errors, &path, "api_key", &store.api_key);
        require_non_empty(errors, &path, "collection_name", &store.collection_name);
    }

    for (name, store) in &config.store.redis {
        let path = format!("store.redis.{name}");
        let has_params = store
            .connection_parameters
            .as_ref()
            .is_some_and(|v| !v.is_null());
        if !has_params && store.client.is_none() {
            push(
                errors,
                path.clone(),
                r#"Either "connection_parameters" or "client" must be configured."#,
            );
        } else if has_params && store.client.is_some() {
            push(
                errors,
                path.clone(),
                r#"Either "connection_parameters" or "client" can be configured, but not both."#,
            );
        }
        require_non_empty_if_set(errors, &path, "client", store.client.as_deref());
        require_non_empty(errors, &path, "index_name", &store.index_name);
    }

    for (name, store) in &config.store.surreal_db {
        let path = format!("store.surreal_db.{name}");
        require_non_empty(errors, &path, "endpoint", &store.endpoint);
        require_non_empty(errors, &path, "username", &store.username);
        require_non_empty(errors, &path, "password", &store.password);
        require_non_empty(errors, &path, "namespace", &store.namespace);
        require_non_empty(errors, &path, "database", &store.database);
    }

    for (name, store) in &config.store.typesense {
        let path = format!("store.typesense.{name}");
        require_non_empty(errors, &path, "endpoint", &store.endpoint);
    }

    for (name, store) in &config.store.weaviate {
        let path = format!("store.weaviate.{name}");
        require_non_empty(errors, &path, "endpoint", &store.endpoint);
    }
}

fn validate_message_stores(config: &Config, errors: &mut Vec<ConfigValidationError>) {
    for (name, store) in &config.message_store.memory {
        if let Some(identifier) = &store.identifier {
            require_non_empty(
                errors,
                &format!("message_store.memory.{name}"),
                "identifier",
                identifier,
            );
        }
    }
    for (name, store) in &config.message_store.cache {
        require_non_empty(
            errors,
            &format!("message_store.cache.{name}"),
            "service",
            &store.service,
        );
    }
    for (name, store) in &config.message_store.session {
        if let Some(identifier) = &store.identifier {
            require_non_empty(
                errors,
                &format!("message_store.session.{name}"),
                "identifier",
                identifier,
            );
        }
    }
}

fn validate_indexers(config: &Config, errors: &mut Vec<ConfigValidationError>) {
    for (name, indexer) in &config.indexer {
        require_non_empty(
            errors,
            &format!("indexer.{name}"),
            "loader",
            &indexer.loader,
        );
    }
}

fn require_non_empty_if_set(
    errors: &mut Vec<ConfigValidationError>,
    path: &str,
    field: &str,
    value: Option<&str>,
) {
    if let Some(value) = value {
        require_non_empty(errors, path, field, value);
    }
}

fn require_non_empty(
    errors: &mut Vec<ConfigValidationError>,
    path: &str,
    field: &str,
    value: &str,
) {
    if value.is_empty() {
        push(
            errors,
            format!("{path}.{field}"),
            format!(r#"The "{field}" cannot be empty."#),
        );
    }
}

// ============================================================================
// Tree-wide validators
// ============================================================================

/// Cross-section checks over the fully normalized tree: agent/multi-agent
/// name disjointness (all duplicates reported at once), then reference
/// resolution (first dangling reference reported).
fn validate_agent_references(config: &Config, errors: &mut Vec<ConfigValidationError>) {
    let duplicates: Vec<&str> = config
        .multi_agent
        .keys()
        .filter(|name| config.agent.contains_key(*name))
        .map(String::as_str)
        .collect();
    if !duplicates.is_empty() {
        push(
            errors,
            "multi_agent".to_string(),
            format!(
                "Agent names and multi-agent names must be unique. Duplicate name(s) found: \"{}\"",
                duplicates.join(", ")
            ),
        );
        return;
    }

    for (name, multi_agent) in &config.multi_agent {
        let missing = [
            (&multi_agent.orchestrator, "orchestrator"),
            (&multi_agent.fallback, "fallback"),
        ]
        .into_iter()
        .map(|(agent, role)| (agent.as_str(), role))
        .chain(
            multi_agent
                .handoffs
                .keys()
                .map(|agent| (agent.as_str(), "handoff target")),
        )
        .find(|(agent, _)| !config.agent.contains_key(*agent));

        if let Some((agent, role)) = missing {
            push(
                errors,
                format!("multi_agent.{name}"),
                format!(
                    "The agent \"{agent}\" referenced in multi-agent \"{name}\" as {role} does not exist"
                ),
            );
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{
        AgentConfig, ModelConfig, MultiAgentConfig, PromptConfig, RedisStoreConfig,
        ToolServiceConfig, ToolsConfig,
    };
    use crate::config::Capability;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn ctx() -> ValidationContext {
        ValidationContext::default()
    }

    fn agent() -> AgentConfig {
        AgentConfig::default()
    }

    fn multi_agent(orchestrator: &str, fallback: &str, handoff: &str) -> MultiAgentConfig {
        MultiAgentConfig {
            orchestrator: orchestrator.to_string(),
            fallback: fallback.to_string(),
            handoffs: BTreeMap::from([(handoff.to_string(), vec!["billing".to_string()])]),
        }
    }

    #[test]
    fn empty_capabilities_rejected() {
        let mut config = Config::default();
        config.model.insert(
            "openai".to_string(),
            BTreeMap::from([("gpt-4".to_string(), ModelConfig::default())]),
        );

        let errors = validate_config(&config, &ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "model.openai.gpt-4.capabilities");
        assert_eq!(
            errors[0].message,
            "At least one capability must be specified for each model."
        );
    }

    #[test]
    fn declared_capabilities_accepted() {
        let mut config = Config::default();
        config.model.insert(
            "openai".to_string(),
            BTreeMap::from([(
                "gpt-4".to_string(),
                ModelConfig {
                    capabilities: vec![Capability::InputText, Capability::OutputText],
                },
            )]),
        );
        assert!(validate_config(&config, &ctx()).is_empty());
    }

    #[test]
    fn empty_platform_model_map_rejected() {
        let mut config = Config::default();
        config.model.insert("openai".to_string(), BTreeMap::new());

        let errors = validate_config(&config, &ctx());
        assert_eq!(errors[0].message, "Model name cannot be empty.");
    }

    #[test]
    fn prompt_requires_text_or_file() {
        let mut config = Config::default();
        config.agent.insert(
            "a".to_string(),
            AgentConfig {
                prompt: Some(PromptInput::Full(PromptConfig::default())),
                ..agent()
            },
        );

        let errors = validate_config(&config, &ctx());
        assert_eq!(
            errors[0].message,
            r#"Either "text" or "file" must be configured for prompt."#
        );
    }

    #[test]
    fn prompt_rejects_text_and_file_together() {
        let mut config = Config::default();
        config.agent.insert(
            "a".to_string(),
            AgentConfig {
                prompt: Some(PromptInput::Full(PromptConfig {
                    text: Some("hi".to_string()),
                    file: Some("p.txt".to_string()),
                    ..PromptConfig::default()
                })),
                ..agent()
            },
        );

        let errors = validate_config(&config, &ctx());
        assert_eq!(
            errors[0].message,
            r#"Cannot use both "text" and "file" for prompt. Choose one."#
        );
    }

    #[test]
    fn prompt_rejects_whitespace_only_text() {
        let mut config = Config::default();
        config.agent.insert(
            "a".to_string(),
            AgentConfig {
                prompt: Some(PromptInput::Full(PromptConfig {
                    text: Some("  ".to_string()),
                    ..PromptConfig::default()
                })),
                ..agent()
            },
        );

        let errors = validate_config(&config, &ctx());
        assert_eq!(errors[0].message, r#"The "text" cannot be empty."#);
    }

    #[test]
    fn translation_requires_translator() {
        let prompt = PromptConfig {
            text: Some("hi".to_string()),
            enable_translation: true,
            ..PromptConfig::default()
        };
        let mut config = Config::default();
        config.agent.insert(
            "a".to_string(),
            AgentConfig {
                prompt: Some(PromptInput::Full(prompt)),
                ..agent()
            },
        );

        let errors = validate_config(&config, &ctx());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("no translator is available"));

        let translator_ctx = ValidationContext {
            translator_available: true,
        };
        assert!(validate_config(&config, &translator_ctx).is_empty());
    }

    #[test]
    fn tool_entry_requires_service_xor_agent() {
        let both = ToolServiceConfig {
            service: Some("a".to_string()),
            agent: Some("b".to_string()),
            ..ToolServiceConfig::default()
        };
        let neither = ToolServiceConfig::default();

        for tool in [both, neither] {
            let mut config = Config::default();
            config.agent.insert(
                "a".to_string(),
                AgentConfig {
                    tools: ToolsInput::Full(ToolsConfig {
                        enabled: true,
                        services: vec![ToolEntry::Full(tool)],
                    }),
                    ..agent()
                },
            );

            let errors = validate_config(&config, &ctx());
            assert_eq!(errors.len(), 1);
            assert_eq!(
                errors[0].message,
                r#"Either "agent" or "service" must be configured, and never both."#
            );
        }
    }

    #[test]
    fn duplicate_agent_and_multi_agent_names_rejected() {
        let mut config = Config::default();
        config.agent.insert("a".to_string(), agent());
        config.agent.insert("triage".to_string(), agent());
        config
            .multi_agent
            .insert("a".to_string(), multi_agent("triage", "triage", "triage"));

        let errors = validate_config(&config, &ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Agent names and multi-agent names must be unique. Duplicate name(s) found: \"a\""
        );
    }

    #[test]
    fn missing_orchestrator_reference_rejected() {
        let mut config = Config::default();
        config.agent.insert("a".to_string(), agent());
        config
            .multi_agent
            .insert("m1".to_string(), multi_agent("missing", "a", "a"));

        let errors = validate_config(&config, &ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "The agent \"missing\" referenced in multi-agent \"m1\" as orchestrator does not exist"
        );
    }

    #[test]
    fn missing_handoff_reference_rejected() {
        let mut config = Config::default();
        config.agent.insert("a".to_string(), agent());
        config
            .multi_agent
            .insert("m1".to_string(), multi_agent("a", "a", "ghost"));

        let errors = validate_config(&config, &ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "The agent \"ghost\" referenced in multi-agent \"m1\" as handoff target does not exist"
        );
    }

    #[test]
    fn references_not_checked_until_nodes_are_clean() {
        // The dangling orchestrator must not be reported while a node-level
        // problem (empty handoffs) is still present.
        let mut config = Config::default();
        config.agent.insert("a".to_string(), agent());
        config.multi_agent.insert(
            "m1".to_string(),
            MultiAgentConfig {
                orchestrator: "missing".to_string(),
                fallback: "a".to_string(),
                handoffs: BTreeMap::new(),
            },
        );

        let errors = validate_config(&config, &ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "multi_agent.m1.handoffs");
    }

    #[test]
    fn redis_requires_exactly_one_connection_form() {
        let neither = RedisStoreConfig {
            connection_parameters: None,
            client: None,
            index_name: "idx".to_string(),
            key_prefix: "vector:".to_string(),
            distance: Default::default(),
        };
        let both = RedisStoreConfig {
            connection_parameters: Some(serde_json::json!({"host": "localhost"})),
            client: Some("redis.client".to_string()),
            ..neither.clone()
        };

        let mut config = Config::default();
        config.store.redis.insert("main".to_string(), neither);
        let errors = validate_config(&config, &ctx());
        assert_eq!(
            errors[0].message,
            r#"Either "connection_parameters" or "client" must be configured."#
        );

        let mut config = Config::default();
        config.store.redis.insert("main".to_string(), both);
        let errors = validate_config(&config, &ctx());
        assert_eq!(
            errors[0].message,
            r#"Either "connection_parameters" or "client" can be configured, but not both."#
        );
    }

    #[test]
    fn clickhouse_requires_dsn_or_http_client() {
        let mut config = Config::default();
        config.store.clickhouse.insert(
            "main".to_string(),
            crate::config::types::ClickHouseStoreConfig {
                dsn: None,
                http_client: None,
                database: "vectors".to_string(),
                table: "documents".to_string(),
            },
        );

        let errors = validate_config(&config, &ctx());
        assert_eq!(
            errors[0].message,
            r#"Either "dsn" or "http_client" must be configured."#
        );
    }

    #[test]
    fn qdrant_connection_fields_cannot_be_empty() {
        let mut config = Config::default();
        config.store.qdrant.insert(
            "main".to_string(),
            crate::config::types::QdrantStoreConfig {
                endpoint: String::new(),
                api_key: String::new(),
                collection_name: String::new(),
                dimensions: None,
                distance: None,
            },
        );

        let errors = validate_config(&config, &ctx());
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "store.qdrant.main.endpoint",
                "store.qdrant.main.api_key",
                "store.qdrant.main.collection_name",
            ]
        );
        assert_eq!(errors[0].message, r#"The "endpoint" cannot be empty."#);
    }

    #[test]
    fn redis_empty_client_string_is_an_empty_value_not_an_absent_one() {
        let mut config = Config::default();
        config.store.redis.insert(
            "main".to_string(),
            RedisStoreConfig {
                connection_parameters: None,
                client: Some(String::new()),
                index_name: "idx".to_string(),
                key_prefix: "vector:".to_string(),
                distance: Default::default(),
            },
        );

        let errors = validate_config(&config, &ctx());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "store.redis.main.client");
        assert_eq!(errors[0].message, r#"The "client" cannot be empty."#);
    }

    #[test]
    fn neo4j_connection_fields_cannot_be_empty() {
        let mut config = Config::default();
        config.store.neo4j.insert(
            "graph".to_string(),
            crate::config::types::Neo4jStoreConfig {
                endpoint: "bolt://localhost".to_string(),
                username: String::new(),
                password: "secret".to_string(),
                database: "neo4j".to_string(),
                vector_index_name: "vectors".to_string(),
                node_name: String::new(),
                vector_field: None,
                dimensions: None,
                distance: None,
                quantization: None,
            },
        );

        let errors = validate_config(&config, &ctx());
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["store.neo4j.graph.username", "store.neo4j.graph.node_name"]
        );
    }

    #[test]
    fn validate_config_object_joins_messages() {
        let mut config = Config::default();
        config.agent.insert("a".to_string(), agent());
        config
            .multi_agent
            .insert("a".to_string(), multi_agent("a", "a", "a"));

        let err = validate_config_object(&config, &ctx()).unwrap_err();
        assert!(err.to_string().contains("Configuration validation failed"));
        assert!(err.to_string().contains("Duplicate name(s)"));
    }
}
