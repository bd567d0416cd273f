//! Configuration for the zebras runtime.
//!
//! Layered loading with figment (defaults, profile file, main file, env) and
//! validation of the merged result.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, PluginsConfig,
    SpanEventConfig, ZebrasConfig,
};
pub use validation::validate_config;
