//! Weekly overview.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use colored::Colorize;
use roster_grid::{Location, WeekMatrix};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_output, print_single, OutputFormat};

use super::CommandContext;

/// Week commands.
#[derive(Debug, Args)]
pub struct WeekCommand {
    #[command(subcommand)]
    command: WeekSubcommand,
}

#[derive(Debug, Subcommand)]
enum WeekSubcommand {
    /// Slot counts per staff and weekday for the week containing a date.
    Show(ShowWeekArgs),
}

#[derive(Debug, Args)]
struct ShowWeekArgs {
    /// Any date within the week. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl WeekCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            WeekSubcommand::Show(args) => show_week(ctx, args).await,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct WeekLine {
    #[tabled(rename = "Staff")]
    staff: String,
    #[tabled(rename = "Mon")]
    mon: usize,
    #[tabled(rename = "Tue")]
    tue: usize,
    #[tabled(rename = "Wed")]
    wed: usize,
    #[tabled(rename = "Thu")]
    thu: usize,
    #[tabled(rename = "Fri")]
    fri: usize,
    #[tabled(rename = "Sat")]
    sat: usize,
    #[tabled(rename = "Sun")]
    sun: usize,
    #[tabled(rename = "Total")]
    total: usize,
}

fn week_lines(week: &WeekMatrix) -> Vec<WeekLine> {
    week.staff
        .iter()
        .map(|s| {
            let [mon, tue, wed, thu, fri, sat, sun] = s.slots_per_day;
            WeekLine {
                staff: s
                    .staff_code
                    .clone()
                    .unwrap_or_else(|| s.staff_id.to_string()),
                mon,
                tue,
                wed,
                thu,
                fri,
                sat,
                sun,
                total: s.total(),
            }
        })
        .collect()
}

fn location_name(locations: &[Location], id: roster_id::LocationId) -> String {
    locations
        .iter()
        .find(|l| l.id == id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| format!("location {id}"))
}

async fn show_week(ctx: CommandContext, args: ShowWeekArgs) -> Result<()> {
    let date = ctx.date_or_today(args.date);
    let roster = ctx.roster().await?;
    let week = roster.load_week(date).await?;

    match ctx.format {
        OutputFormat::Json => print_single(&week),
        OutputFormat::Table => {
            println!("{}", format!("Week {} .. {}", week.start, week.end).bold());
            print_output(&week_lines(&week), ctx.format);
            for (id, slots) in &week.location_totals {
                println!("  {}: {}", location_name(roster.locations(), *id), slots);
            }
        }
    }
    Ok(())
}
