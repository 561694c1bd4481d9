//! Canonicalizes shorthand configuration forms in place.
//!
//! After this pass every model reference is a plain string, every prompt is
//! the full `{text/file/...}` shape, and every tools node is the full
//! `{enabled, services}` shape with per-entry `{service/agent/...}` maps.
//! The tree keeps its input shape; only the spelling of each node changes.

use super::validation::ConfigValidationError;
use super::Config;
use crate::config::types::{
    PromptConfig, PromptInput, ToolEntry, ToolServiceConfig, ToolsConfig, ToolsInput,
};
use crate::config::ModelRef;

/// Normalize the whole tree, collecting canonicalization failures.
///
/// Failures do not abort the pass: each offending node is reported once and
/// left untouched, so the caller sees every problem in one load attempt.
pub fn normalize_config(config: &mut Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    for (name, agent) in &mut config.agent {
        if let Some(model) = &mut agent.model {
            canonicalize_model(model, &format!("agent.{name}.model"), &mut errors);
        }
        canonicalize_prompt(&mut agent.prompt);
        canonicalize_tools(&mut agent.tools);
    }

    for (name, vectorizer) in &mut config.vectorizer {
        if let Some(model) = &mut vectorizer.model {
            canonicalize_model(model, &format!("vectorizer.{name}.model"), &mut errors);
        }
    }

    errors
}

fn canonicalize_model(model: &mut ModelRef, path: &str, errors: &mut Vec<ConfigValidationError>) {
    match model.normalize() {
        Ok(canonical) => *model = ModelRef::Name(canonical),
        Err(e) => errors.push(ConfigValidationError {
            path: path.to_string(),
            message: e.to_string(),
        }),
    }
}

fn canonicalize_prompt(prompt: &mut Option<PromptInput>) {
    if let Some(PromptInput::Shorthand(text)) = prompt {
        *prompt = Some(PromptInput::Full(PromptConfig {
            text: Some(std::mem::take(text)),
            ..PromptConfig::default()
        }));
    }
}

fn canonicalize_tools(tools: &mut ToolsInput) {
    let mut config = match std::mem::replace(tools, ToolsInput::Enabled(true)) {
        ToolsInput::Enabled(enabled) => ToolsConfig {
            enabled,
            services: Vec::new(),
        },
        ToolsInput::List(services) => ToolsConfig {
            enabled: true,
            services,
        },
        ToolsInput::Full(config) => config,
    };

    for entry in &mut config.services {
        if let ToolEntry::Shorthand(service) = entry {
            *entry = ToolEntry::Full(ToolServiceConfig {
                service: Some(std::mem::take(service)),
                ..ToolServiceConfig::default()
            });
        }
    }

    *tools = ToolsInput::Full(config);
}
