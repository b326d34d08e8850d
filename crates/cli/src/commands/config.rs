use clap::Subcommand;
use gatehouse_config::{GateConfigLoader, LoadedConfig};
use gatehouse_core::Result;
use serde_json::{json, Value};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration and where it came from
    Show,
    /// Print the default configuration file location
    Path,
}

impl ConfigCommands {
    pub fn execute(self, loaded: &LoadedConfig) -> Result<()> {
        match self {
            ConfigCommands::Show => {
                println!("{}", render(loaded)?);
                Ok(())
            }
            ConfigCommands::Path => {
                match GateConfigLoader::default_config_file_path() {
                    Some(path) => println!("{}", path.display()),
                    None => tracing::warn!("no configuration directory available on this platform"),
                }
                Ok(())
            }
        }
    }
}

/// Effective configuration as pretty JSON, signing key redacted
pub fn render(loaded: &LoadedConfig) -> Result<String> {
    let mut config = serde_json::to_value(&loaded.config)?;

    if let Some(key) = config.get_mut("signing_key") {
        if !key.is_null() {
            *key = Value::from("[redacted]");
        }
    }

    let document = json!({
        "source": loaded.source.to_string(),
        "config": config,
    });
    Ok(serde_json::to_string_pretty(&document)?)
}
