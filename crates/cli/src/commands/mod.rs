use clap::Subcommand;
use gatehouse_config::LoadedConfig;
use gatehouse_core::Result;
use std::net::IpAddr;

pub mod config;
pub mod simulate;
pub mod token;

use self::config::ConfigCommands;
use self::token::TokenCommands;

#[derive(Subcommand)]
pub enum Commands {
    /// Show the effective gate configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Issue and inspect bearer credentials
    #[command(visible_alias = "t")]
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Drive requests through a real gate and count its decisions
    Simulate {
        /// Route name, e.g. `auth.login` or `news.list`
        #[arg(short, long, default_value = "auth.login")]
        route: String,

        /// Number of requests to send
        #[arg(short = 'n', long, default_value = "10")]
        requests: u32,

        /// Bearer token sent with every request
        #[arg(long)]
        token: Option<String>,

        /// Source address of the simulated client
        #[arg(long, default_value = "127.0.0.1")]
        source: IpAddr,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    pub async fn execute(self, loaded: LoadedConfig) -> Result<()> {
        match self {
            Commands::Config { command } => command.execute(&loaded),
            Commands::Token { command } => command.execute(&loaded.config),
            Commands::Simulate {
                route,
                requests,
                token,
                source,
                json,
            } => {
                let report =
                    simulate::run(&loaded.config, &route, requests, token.as_deref(), source)
                        .await?;
                if json {
                    println!("{}", report.to_json()?);
                } else {
                    println!("{report}");
                }
                Ok(())
            }
        }
    }
}
