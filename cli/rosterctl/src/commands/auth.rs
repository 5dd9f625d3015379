//! Authentication commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use roster_reconcile::RosterStore;

use crate::client::ApiClient;
use crate::config::Credentials;
use crate::output::{print_info, print_success};

use super::CommandContext;

/// Authentication commands.
#[derive(Debug, Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuthSubcommand {
    /// Store an API token.
    Login(LoginArgs),

    /// Remove the stored token.
    Logout,

    /// Show whether a token is stored.
    Status,
}

#[derive(Debug, Args)]
struct LoginArgs {
    /// API token.
    #[arg(long, env = "ROSTER_TOKEN")]
    token: Option<String>,
}

impl AuthCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            AuthSubcommand::Login(args) => login(ctx, args).await,
            AuthSubcommand::Logout => logout().await,
            AuthSubcommand::Status => status(ctx).await,
        }
    }
}

async fn login(ctx: CommandContext, args: LoginArgs) -> Result<()> {
    let Some(token) = args.token else {
        print_info("Use --token or set the ROSTER_TOKEN environment variable.");
        return Ok(());
    };

    let creds = Credentials::new(token);

    // A token that can list locations is good enough.
    let client = ApiClient::new(&ctx.config, Some(&creds))?;
    client.list_locations(true).await?;

    creds.save()?;
    print_success("Logged in successfully.");
    Ok(())
}

async fn logout() -> Result<()> {
    Credentials::delete()?;
    print_success("Logged out successfully.");
    Ok(())
}

async fn status(ctx: CommandContext) -> Result<()> {
    match ctx.credentials {
        Some(creds) => {
            println!("{} Authenticated", "Status:".green().bold());
            println!("  API: {}", ctx.config.api_url());
            if let Some(saved_at) = creds.saved_at {
                println!("  Token saved: {}", saved_at);
            }
        }
        None => {
            println!("{} Not authenticated", "Status:".red().bold());
            println!("\nRun {} to log in.", "roster auth login".cyan());
        }
    }
    Ok(())
}
