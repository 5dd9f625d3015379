//! Staff commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use roster_grid::Staff;
use roster_reconcile::{RosterStore, StaffFilter};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{display_option, print_output};

use super::CommandContext;

/// Staff commands.
#[derive(Debug, Args)]
pub struct StaffCommand {
    #[command(subcommand)]
    command: StaffSubcommand,
}

#[derive(Debug, Subcommand)]
enum StaffSubcommand {
    /// List staff.
    List(ListStaffArgs),
}

#[derive(Debug, Args)]
struct ListStaffArgs {
    /// Match on code or name.
    #[arg(long, short)]
    query: Option<String>,

    /// Include inactive staff.
    #[arg(long)]
    all: bool,
}

impl StaffCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            StaffSubcommand::List(args) => list_staff(ctx, args).await,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct StaffLine {
    #[tabled(rename = "ID")]
    id: i64,

    #[tabled(rename = "Code")]
    code: String,

    #[tabled(rename = "Name", display = "display_option")]
    name: Option<String>,

    #[tabled(rename = "Active")]
    active: bool,
}

impl From<&Staff> for StaffLine {
    fn from(staff: &Staff) -> Self {
        Self {
            id: staff.id.value(),
            code: staff.code.clone(),
            name: staff.name.clone(),
            active: staff.active,
        }
    }
}

async fn list_staff(ctx: CommandContext, args: ListStaffArgs) -> Result<()> {
    let mut filter = StaffFilter {
        active_only: !args.all,
        query: None,
    };
    if let Some(query) = args.query {
        filter = filter.with_query(query);
    }

    let client = ctx.client()?;
    let staff = client.list_staff(&filter).await?;

    let lines: Vec<StaffLine> = staff.iter().map(StaffLine::from).collect();
    print_output(&lines, ctx.format);
    Ok(())
}
