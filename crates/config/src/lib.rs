//! Configuration loading and validation for gatehouse
//!
//! Values are layered with increasing precedence: built-in defaults, a JSON
//! file (`$GATEHOUSE_CONFIG` or `<config dir>/gatehouse/config.json`), then
//! `GATEHOUSE_*` environment variables. The result is validated before use.

pub mod config;
pub mod loader;


pub use config::{
    CacheSettings, ConfigSource, GateConfig, GateConfigBuilder, RateLimitPolicy, SigningKeyHex,
};
pub use loader::{GateConfigLoader, LoadedConfig};
