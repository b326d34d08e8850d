use clap::Parser;
use gatehouse::Commands;
use gatehouse_config::GateConfigLoader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "Inspect and exercise the gatehouse request gate", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file to load instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ignore GATEHOUSE_* environment variables
    #[arg(long, global = true)]
    no_env: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    gatehouse_utils::tracing::init_with_default("warn")
        .map_err(|e| eyre::eyre!("failed to initialise logging: {e}"))?;

    let cli = Cli::parse();

    let mut loader = GateConfigLoader::new();
    if let Some(path) = cli.config {
        loader = loader.with_file(path);
    }
    if cli.no_env {
        loader = loader.without_env();
    }
    let loaded = loader.load()?;

    cli.command.execute(loaded).await?;
    Ok(())
}
