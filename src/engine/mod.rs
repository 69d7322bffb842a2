//! Engine facade and configuration

mod config;
mod engine;

pub use config::{ConfigError, ConfigResult, EngineConfig};
pub use engine::FederatedEngine;
