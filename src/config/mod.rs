//! Configuration resolution for the mdeck converter.
//!
//! This module reconciles invocation options, an optional configuration file,
//! environment variables and defaults into one [`ResolvedConfiguration`]:
//! - File discovery and parsing (JSON, YAML, TOML, package.json section)
//! - A uniform precedence chain: argument > config file > environment > default
//! - Validation, path normalization and derived settings
//! - Pluggable collaborators for themes, engines and the host environment

mod builder;
mod constants;
mod derive;
mod engine;
mod environment;
mod error;
mod loader;
mod precedence;
mod resolver;
mod theme;
mod types;
mod validation;

// Re-export the main types for convenience
pub use error::ConfigError;
pub use resolver::ConfigResolver;
pub use types::{BespokeOptions, OneOrMany, OutputTarget, Parallelism, RawArguments, Resolution};
