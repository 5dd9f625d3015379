//! Location commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use roster_grid::Location;
use roster_reconcile::RosterStore;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{display_option, print_output};

use super::CommandContext;

/// Location commands.
#[derive(Debug, Args)]
pub struct LocationsCommand {
    #[command(subcommand)]
    command: LocationsSubcommand,
}

#[derive(Debug, Subcommand)]
enum LocationsSubcommand {
    /// List locations.
    List(ListLocationsArgs),
}

#[derive(Debug, Args)]
struct ListLocationsArgs {
    /// Include inactive locations.
    #[arg(long)]
    all: bool,
}

impl LocationsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            LocationsSubcommand::List(args) => list_locations(ctx, args).await,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct LocationLine {
    #[tabled(rename = "ID")]
    id: i64,

    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Color", display = "display_option")]
    color: Option<String>,

    #[tabled(rename = "Icon", display = "display_option")]
    icon_bytes: Option<usize>,

    #[tabled(rename = "Active")]
    active: bool,
}

impl From<&Location> for LocationLine {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id.value(),
            name: location.name.clone(),
            color: location.color.as_ref().map(|c| c.as_str().to_string()),
            icon_bytes: location.icon.as_ref().map(|i| i.len()),
            active: location.active,
        }
    }
}

async fn list_locations(ctx: CommandContext, args: ListLocationsArgs) -> Result<()> {
    let client = ctx.client()?;
    let locations = client.list_locations(!args.all).await?;

    let lines: Vec<LocationLine> = locations.iter().map(LocationLine::from).collect();
    print_output(&lines, ctx.format);
    Ok(())
}
