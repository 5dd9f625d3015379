//! CLI commands.

mod auth;
mod config;
mod day;
mod locations;
mod slots;
mod staff;
mod week;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use roster_grid::{Clock, SlotCatalog, SystemClock};
use roster_reconcile::Roster;

use crate::client::ApiClient;
use crate::config::{Config, Credentials};
use crate::output::OutputFormat;

/// roster - View and edit the duty roster grid.
#[derive(Debug, Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Log engine activity at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    /// Override the configured API endpoint.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Store and remove the API token.
    Auth(auth::AuthCommand),

    /// Show or change CLI configuration.
    Config(config::ConfigCommand),

    /// Show the configured time slots.
    Slots(slots::SlotsCommand),

    /// List locations.
    Locations(locations::LocationsCommand),

    /// List staff.
    Staff(staff::StaffCommand),

    /// Show and edit one roster day.
    Day(day::DayCommand),

    /// Weekly overview.
    Week(week::WeekCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn log_json(&self) -> bool {
        self.log_json
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        if let Some(url) = self.api_url {
            config.api_url = url;
        }
        let credentials = Credentials::load()?;

        let ctx = CommandContext {
            config,
            credentials,
            format: self.format,
            clock: Arc::new(SystemClock),
        };

        match self.command {
            Commands::Auth(cmd) => cmd.run(ctx).await,
            Commands::Config(cmd) => cmd.run(ctx).await,
            Commands::Slots(cmd) => cmd.run(ctx).await,
            Commands::Locations(cmd) => cmd.run(ctx).await,
            Commands::Staff(cmd) => cmd.run(ctx).await,
            Commands::Day(cmd) => cmd.run(ctx).await,
            Commands::Week(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("roster {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub credentials: Option<Credentials>,
    pub format: OutputFormat,
    pub clock: Arc<dyn Clock>,
}

impl CommandContext {
    /// Get an API client carrying the stored token, if any.
    pub fn client(&self) -> Result<Arc<ApiClient>> {
        Ok(Arc::new(ApiClient::new(
            &self.config,
            self.credentials.as_ref(),
        )?))
    }

    /// The slot catalog described by the config.
    pub fn catalog(&self) -> Result<Arc<SlotCatalog>> {
        let catalog = self
            .config
            .catalog
            .build()
            .context("Invalid catalog in config; run `roster config set-catalog`")?;
        Ok(Arc::new(catalog))
    }

    /// `date`, or today on the local clock.
    pub fn date_or_today(&self, date: Option<NaiveDate>) -> NaiveDate {
        date.unwrap_or_else(|| self.clock.today())
    }

    /// A roster bound to the API with reference data loaded.
    pub async fn roster(&self) -> Result<Roster<ApiClient>> {
        let mut roster = Roster::new(self.client()?, self.catalog()?, self.clock.clone());
        roster.load_reference_data().await?;
        Ok(roster)
    }
}
