//! Layered configuration loading: defaults, then file, then environment

use crate::config::{ConfigSource, GateConfig, RateLimitPolicy, SigningKeyHex};
use gatehouse_core::{
    constants::{
        CONFIG_DIR_NAME, CONFIG_FILE_NAME, GATEHOUSE_CACHE_MAX_ENTRIES_VAR,
        GATEHOUSE_CACHE_TTL_VAR, GATEHOUSE_CONFIG_VAR, GATEHOUSE_ENV_PREFIX,
        GATEHOUSE_SIGNING_KEY_VAR, GATEHOUSE_TOKEN_TTL_VAR,
    },
    Capability, Error, Result, Role, RouteClass,
};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Configuration together with the highest-precedence source that shaped it
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: GateConfig,
    pub source: ConfigSource,
}

/// Configuration loader that handles precedence
#[derive(Debug, Clone)]
pub struct GateConfigLoader {
    file: Option<PathBuf>,
    read_env: bool,
}

impl Default for GateConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl GateConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            read_env: true,
        }
    }

    /// Use an explicit file instead of resolving one; it must exist
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skip environment overrides
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    /// Load configuration with full precedence handling
    pub fn load(&self) -> Result<LoadedConfig> {
        let mut config = GateConfig::default();
        let mut source = ConfigSource::Default;

        if let Some(path) = self.config_file_path()? {
            Self::apply_file(&mut config, &path)?;
            info!(path = %path.display(), "loaded gate configuration file");
            source = ConfigSource::ConfigFile(path);
        }

        if self.read_env {
            if let Some(name) = Self::apply_env(&mut config)? {
                source = ConfigSource::EnvironmentVariable(name);
            }
        }

        config.validate()?;
        debug!(%source, "gate configuration ready");
        Ok(LoadedConfig { config, source })
    }

    /// Resolve the file to read, `None` when no implicit file exists
    fn config_file_path(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.file {
            return Self::require_file(path).map(Some);
        }

        if self.read_env {
            if let Ok(path) = std::env::var(GATEHOUSE_CONFIG_VAR) {
                return Self::require_file(Path::new(&path)).map(Some);
            }
        }

        let Some(path) = Self::default_config_file_path() else {
            return Ok(None);
        };
        Ok(path.exists().then_some(path))
    }

    fn require_file(path: &Path) -> Result<PathBuf> {
        if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(Error::file_system(
                path,
                "open config file",
                std::io::Error::new(std::io::ErrorKind::NotFound, "config file does not exist"),
            ))
        }
    }

    /// `$XDG_CONFIG_HOME/gatehouse/config.json`, falling back to the platform config dir
    pub fn default_config_file_path() -> Option<PathBuf> {
        let config_dir = match std::env::var("XDG_CONFIG_HOME") {
            Ok(xdg_config_home) if !xdg_config_home.is_empty() => PathBuf::from(xdg_config_home),
            _ => dirs::config_dir()?,
        };
        Some(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Merge a JSON file over `config`; absent fields keep their current values
    fn apply_file(config: &mut GateConfig, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read config file", e))?;
        let file: Value = serde_json::from_str(&content)
            .map_err(|e| Error::serialization(path.display().to_string(), e))?;

        if let Some(key) = file.get("signing_key").and_then(Value::as_str) {
            config.signing_key = Some(SigningKeyHex::new(key));
        }

        if let Some(ttl) = file.get("token_ttl_secs") {
            config.token_ttl_secs = expect_u64(ttl, "token_ttl_secs")?;
        }

        if let Some(limits) = file.get("rate_limits").and_then(Value::as_object) {
            for (class, policy) in limits {
                let class = RouteClass::from_str(class)?;
                let policy: RateLimitPolicy = serde_json::from_value(policy.clone())
                    .map_err(|e| Error::serialization(format!("rate_limits.{class}"), e))?;
                config.rate_limits.insert(class, policy);
            }
        }

        if let Some(roles) = file.get("roles").and_then(Value::as_object) {
            for (role, capabilities) in roles {
                let capabilities = parse_capabilities(capabilities, role)?;
                config.roles.insert(Role::parse(role), capabilities);
            }
        }

        if let Some(cache) = file.get("cache").and_then(Value::as_object) {
            if let Some(ttl) = cache.get("default_ttl_secs") {
                config.cache.default_ttl_secs = expect_u64(ttl, "cache.default_ttl_secs")?;
            }
            if let Some(max) = cache.get("max_entries") {
                config.cache.max_entries = expect_usize(max, "cache.max_entries")?;
            }
            if let Some(interval) = cache.get("sweep_interval_secs") {
                config.cache.sweep_interval_secs =
                    expect_u64(interval, "cache.sweep_interval_secs")?;
            }
            if let Some(routes) = cache.get("route_ttls").and_then(Value::as_object) {
                for (prefix, ttl) in routes {
                    let ttl = expect_u64(ttl, "cache.route_ttls")?;
                    config.cache.route_ttls.insert(prefix.clone(), ttl);
                }
            }
        }

        Ok(())
    }

    /// Apply `GATEHOUSE_*` overrides, returning the last variable that was set
    fn apply_env(config: &mut GateConfig) -> Result<Option<String>> {
        let mut applied = None;

        if let Ok(key) = std::env::var(GATEHOUSE_SIGNING_KEY_VAR) {
            config.signing_key = Some(SigningKeyHex::new(key));
            applied = Some(GATEHOUSE_SIGNING_KEY_VAR.to_string());
        }

        if let Some(ttl) = env_number(GATEHOUSE_TOKEN_TTL_VAR)? {
            config.token_ttl_secs = ttl;
            applied = Some(GATEHOUSE_TOKEN_TTL_VAR.to_string());
        }

        if let Some(ttl) = env_number(GATEHOUSE_CACHE_TTL_VAR)? {
            config.cache.default_ttl_secs = ttl;
            applied = Some(GATEHOUSE_CACHE_TTL_VAR.to_string());
        }

        if let Some(max) = env_number(GATEHOUSE_CACHE_MAX_ENTRIES_VAR)? {
            config.cache.max_entries = max;
            applied = Some(GATEHOUSE_CACHE_MAX_ENTRIES_VAR.to_string());
        }

        for class in RouteClass::ALL {
            let upper = class.as_str().to_ascii_uppercase();
            let limit_var = format!("{GATEHOUSE_ENV_PREFIX}{upper}_RATE_LIMIT");
            let window_var = format!("{GATEHOUSE_ENV_PREFIX}{upper}_RATE_WINDOW_MS");

            let limit = env_number::<u32>(&limit_var)?;
            let window_ms = env_number::<u64>(&window_var)?;
            if limit.is_none() && window_ms.is_none() {
                continue;
            }

            let current = config
                .rate_limits
                .get(&class)
                .copied()
                .unwrap_or(RateLimitPolicy::new(0, 0));
            config.rate_limits.insert(
                class,
                RateLimitPolicy::new(
                    limit.unwrap_or(current.limit),
                    window_ms.unwrap_or(current.window_ms),
                ),
            );
            applied = Some(if window_ms.is_some() { window_var } else { limit_var });
        }

        Ok(applied)
    }
}

fn env_number<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::configuration(format!("{name} must be a non-negative integer, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}

fn expect_u64(value: &Value, field: &str) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| Error::configuration(format!("{field} must be a non-negative integer")))
}

fn expect_usize(value: &Value, field: &str) -> Result<usize> {
    let raw = expect_u64(value, field)?;
    usize::try_from(raw).map_err(|_| Error::configuration(format!("{field} is too large")))
}

fn parse_capabilities(value: &Value, role: &str) -> Result<BTreeSet<Capability>> {
    let Some(items) = value.as_array() else {
        return Err(Error::configuration(format!(
            "roles.{role} must be a list of capabilities"
        )));
    };
    items
        .iter()
        .map(|item| {
            let name = item.as_str().ok_or_else(|| {
                Error::configuration(format!("roles.{role} entries must be strings"))
            })?;
            Capability::from_str(name)
        })
        .collect()
}
