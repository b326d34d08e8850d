use clap::Subcommand;
use gatehouse_config::GateConfig;
use gatehouse_core::{
    constants::GATEHOUSE_SIGNING_KEY_VAR, Capability, Clock, Error, Result, Role, SystemClock,
};
use gatehouse_security::{CredentialAuthority, IssuedCredential, RoleTable};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Issue a bearer token for a principal
    Issue {
        /// User id the token is issued to
        #[arg(long)]
        subject: String,

        #[arg(long)]
        email: String,

        /// Role name carried by the token
        #[arg(long, default_value = "user")]
        role: String,

        /// Lifetime in seconds; defaults to the configured token lifetime
        #[arg(long)]
        ttl_secs: Option<u64>,
    },

    /// Verify a token and print the principal it resolves to
    Inspect {
        /// Token text, with or without the `Bearer ` prefix
        token: String,
    },
}

impl TokenCommands {
    pub fn execute(self, config: &GateConfig) -> Result<()> {
        let now_ms = SystemClock.now_ms();
        match self {
            TokenCommands::Issue {
                subject,
                email,
                role,
                ttl_secs,
            } => {
                let issued = issue(
                    config,
                    &subject,
                    &email,
                    &role,
                    ttl_secs.map(Duration::from_secs),
                    now_ms,
                )?;
                println!("{}", issued.token);
                tracing::info!(
                    token_id = %issued.claims.token_id,
                    expires_at = issued.claims.expires_at,
                    "issued credential"
                );
                Ok(())
            }
            TokenCommands::Inspect { token } => {
                let report = inspect(config, &token, now_ms)?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            }
        }
    }
}

/// Tokens are only useful when the server shares the key, so an ephemeral
/// authority is refused here
fn authority(config: &GateConfig) -> Result<CredentialAuthority> {
    if config.signing_key.is_none() {
        return Err(Error::configuration(format!(
            "no signing key configured; set {GATEHOUSE_SIGNING_KEY_VAR} or `signing_key` in the config file"
        )));
    }
    CredentialAuthority::from_config(config)
}

pub fn issue(
    config: &GateConfig,
    subject: &str,
    email: &str,
    role: &str,
    ttl: Option<Duration>,
    now_ms: u64,
) -> Result<IssuedCredential> {
    let authority = authority(config)?;
    if !Role::parse(role).is_known() {
        warn!(role, "issuing a credential for a role the gate does not recognise");
    }
    authority.issue_with_ttl(
        subject,
        email,
        role,
        ttl.unwrap_or_else(|| config.token_ttl()),
        now_ms,
    )
}

/// Verify `token` and describe what the gate would make of it
///
/// A rejected token is not an error of the command; the report carries the
/// denial code instead.
pub fn inspect(config: &GateConfig, token: &str, now_ms: u64) -> Result<Value> {
    let authority = authority(config)?;
    let token = token.trim();
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

    let report = match authority.verify(token, now_ms) {
        Ok(claims) => {
            let role = Role::parse(&claims.role);
            let capabilities: Vec<&str> = RoleTable::from_config(config)
                .capabilities(role)
                .iter()
                .map(Capability::as_str)
                .collect();
            json!({
                "valid": true,
                "subject": claims.subject,
                "email": claims.email,
                "role": role.as_str(),
                "capabilities": capabilities,
                "token_id": claims.token_id,
                "expires_in_secs": claims.remaining_at(now_ms).as_secs(),
            })
        }
        Err(err) => json!({
            "valid": false,
            "code": err.code().as_str(),
            "message": err.to_string(),
        }),
    };
    Ok(report)
}
