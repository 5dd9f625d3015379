//! Configuration commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use roster_reconcile::NavigationPolicy;

use crate::config::{config_dir, CatalogConfig, Config};
use crate::output::{print_info, print_single, print_success};

use super::CommandContext;

/// Configuration commands.
#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
enum ConfigSubcommand {
    /// Print the effective configuration.
    Show,

    /// Set the API endpoint.
    SetUrl(SetUrlArgs),

    /// Set the day's slot range and granularity.
    SetCatalog(SetCatalogArgs),

    /// Set what happens to pending edits when switching dates.
    SetPolicy(SetPolicyArgs),
}

#[derive(Debug, Args)]
struct SetUrlArgs {
    /// API base URL, e.g. https://roster.example.org
    url: String,
}

#[derive(Debug, Args)]
struct SetCatalogArgs {
    /// First slot hour.
    #[arg(long)]
    start_hour: u32,

    /// Hour the last slot ends.
    #[arg(long)]
    end_hour: u32,

    /// Slot length in minutes.
    #[arg(long, default_value_t = 60)]
    granularity: u32,
}

#[derive(Debug, Args)]
struct SetPolicyArgs {
    /// `flush` or `discard`.
    policy: NavigationPolicy,
}

impl ConfigCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        // Edits start from the file so a one-off --api-url is not persisted.
        let mut config = Config::load()?;
        match self.command {
            ConfigSubcommand::Show => {
                print_single(&ctx.config);
                if let Ok(dir) = config_dir() {
                    print_info(&format!("Config directory: {}", dir.display()));
                }
                return Ok(());
            }
            ConfigSubcommand::SetUrl(args) => {
                let url = args.url.trim_end_matches('/').to_string();
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("API URL must start with http:// or https://");
                }
                config.api_url = url;
            }
            ConfigSubcommand::SetCatalog(args) => {
                let catalog = CatalogConfig {
                    start_hour: args.start_hour,
                    end_hour: args.end_hour,
                    granularity_minutes: args.granularity,
                };
                let slots = catalog.build()?.len();
                config.catalog = catalog;
                print_info(&format!("{slots} slots per day"));
            }
            ConfigSubcommand::SetPolicy(args) => {
                config.navigation_policy = args.policy;
            }
        }

        config.save()?;
        print_success("Configuration saved.");
        Ok(())
    }
}
