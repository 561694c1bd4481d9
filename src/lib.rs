//! Maestro: validated configuration for a multi-agent AI framework.
//!
//! The crate loads a nested configuration tree (JSON/JSON5/YAML/TOML),
//! deserializes it into typed sections, canonicalizes shorthand forms, and
//! validates cross-field and cross-section rules. The result is the
//! immutable [`config::Config`] the rest of the framework is built from.

pub mod cli;
pub mod config;
pub mod logging;
