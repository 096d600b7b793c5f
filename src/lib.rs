//! Startup scaffolding for the identity service: configuration from a YAML
//! file with environment overrides, and a structured logger shaped by it.

pub mod bootstrap;
pub mod config;
pub mod logging;
