//! Day commands: show and edit one roster date.
//!
//! Each editing command opens the day, applies one gesture and submits the
//! touched rows before exiting.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use colored::Colorize;
use roster_grid::{CellKey, DayMatrix, GridError, Location, SlotStart, StaffRow};
use roster_id::LocationId;
use roster_reconcile::{DaySession, MergeReport, Roster, SyncPhase};
use serde::Serialize;
use tabled::builder::Builder;

use crate::client::ApiClient;
use crate::error::CliError;
use crate::output::{print_info, print_single, print_success, print_warning, OutputFormat};

use super::CommandContext;

/// Day commands.
#[derive(Debug, Args)]
pub struct DayCommand {
    #[command(subcommand)]
    command: DaySubcommand,
}

#[derive(Debug, Subcommand)]
enum DaySubcommand {
    /// Show the grid for a date.
    Show(DateArgs),

    /// Assign a location to a cell, or clear it if it already holds it.
    Toggle(ToggleArgs),

    /// Clear a cell.
    Clear(ClearArgs),

    /// Move an allocation to another cell.
    Move(MoveArgs),

    /// Paint one location across several cells.
    Paint(PaintArgs),
}

#[derive(Debug, Args)]
struct DateArgs {
    /// Date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
struct ToggleArgs {
    #[command(flatten)]
    date: DateArgs,

    /// Cell as STAFF@HH:MM, e.g. 12@09:00.
    cell: CellKey,

    /// Location ID.
    #[arg(long, short)]
    location: LocationId,
}

#[derive(Debug, Args)]
struct ClearArgs {
    #[command(flatten)]
    date: DateArgs,

    /// Cell as STAFF@HH:MM.
    cell: CellKey,
}

#[derive(Debug, Args)]
struct MoveArgs {
    #[command(flatten)]
    date: DateArgs,

    /// Source cell as STAFF@HH:MM.
    from: CellKey,

    /// Target cell as STAFF@HH:MM.
    to: CellKey,
}

#[derive(Debug, Args)]
struct PaintArgs {
    #[command(flatten)]
    date: DateArgs,

    /// Location ID to paint.
    #[arg(long, short)]
    location: LocationId,

    /// Cells in stroke order, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    cells: Vec<CellKey>,
}

impl DayCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            DaySubcommand::Show(args) => show_day(ctx, args).await,
            DaySubcommand::Toggle(args) => toggle(ctx, args).await,
            DaySubcommand::Clear(args) => clear(ctx, args).await,
            DaySubcommand::Move(args) => relocate(ctx, args).await,
            DaySubcommand::Paint(args) => paint(ctx, args).await,
        }
    }
}

// =============================================================================
// Show
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DayView<'a> {
    date: NaiveDate,
    phase: SyncPhase,
    lock_boundary: Option<SlotStart>,
    rows: Vec<RowView<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RowView<'a> {
    #[serde(flatten)]
    row: &'a StaffRow,
    items: Vec<&'a roster_grid::Allocation>,
}

/// Header plus one line per staff row; locked slot headers carry a `*`.
fn day_grid(matrix: &DayMatrix, locations: &[Location]) -> Vec<Vec<String>> {
    let catalog = matrix.catalog();
    let mut header = vec!["Staff".to_string()];
    header.extend(catalog.iter().map(|slot| {
        if matrix.is_locked(slot.field) {
            format!("{}*", slot.label)
        } else {
            slot.label.clone()
        }
    }));

    let mut grid = vec![header];
    for row in matrix.rows() {
        let mut line = vec![row
            .staff_code
            .clone()
            .unwrap_or_else(|| row.staff_id.to_string())];
        line.extend(catalog.starts().map(|slot| {
            matrix
                .get(row.staff_id, slot)
                .map(|a| {
                    locations
                        .iter()
                        .find(|l| l.id == a.location_id)
                        .map(|l| l.name.clone())
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| a.location_id.to_string())
                })
                .unwrap_or_default()
        }));
        grid.push(line);
    }
    grid
}

fn print_day(session: &DaySession<ApiClient>, locations: &[Location], format: OutputFormat) {
    let matrix = session.matrix();
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            for line in day_grid(matrix, locations) {
                builder.push_record(line);
            }
            println!("{}", builder.build());
            println!(
                "{} {}  {}",
                matrix.date().to_string().bold(),
                session.phase(),
                "(* started, read-only)".dimmed()
            );
        }
        OutputFormat::Json => {
            let rows = matrix
                .rows()
                .map(|row| RowView {
                    row,
                    items: matrix.allocations_for(row.staff_id),
                })
                .collect();
            print_single(&DayView {
                date: matrix.date(),
                phase: session.phase(),
                lock_boundary: matrix.lock_boundary(),
                rows,
            });
        }
    }
}

async fn show_day(ctx: CommandContext, args: DateArgs) -> Result<()> {
    let date = ctx.date_or_today(args.date);
    let mut roster = ctx.roster().await?;
    let policy = ctx.config.navigation_policy;
    roster.switch_date(date, policy).await?;

    if let Some(session) = roster.session() {
        print_day(session, roster.locations(), ctx.format);
    }
    Ok(())
}

// =============================================================================
// Edits
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EditReceipt {
    date: NaiveDate,
    phase: SyncPhase,
    skipped: Vec<CellKey>,
    report: MergeReport,
}

fn find_location(roster: &Roster<ApiClient>, id: LocationId) -> Result<Location, CliError> {
    roster
        .location(id)
        .cloned()
        .ok_or_else(|| CliError::NotFound(format!("Location '{id}' not found or inactive")))
}

/// Open `date`, run `edit` on it, then submit what it touched.
async fn edit_day<F>(
    ctx: &CommandContext,
    roster: &mut Roster<ApiClient>,
    date: NaiveDate,
    edit: F,
) -> Result<()>
where
    F: FnOnce(&mut DaySession<ApiClient>) -> Result<Vec<CellKey>>,
{
    let session = roster.switch_date(date, ctx.config.navigation_policy).await?;
    let skipped = edit(session)?;

    if !session.phase().has_pending() {
        print_info("Nothing changed.");
        return Ok(());
    }

    let report = session.sync().await?;
    let receipt = EditReceipt {
        date,
        phase: session.phase(),
        skipped,
        report,
    };

    match ctx.format {
        OutputFormat::Json => print_single(&receipt),
        OutputFormat::Table => {
            for cell in &receipt.skipped {
                print_warning(&format!("{cell} has already started; left unchanged"));
            }
            for mismatch in &receipt.report.mismatches {
                print_warning(&format!(
                    "store dropped {} item(s) for staff {} on {}",
                    mismatch.submitted_items, mismatch.staff_id, mismatch.date
                ));
            }
            let saved = receipt.report.replaced.len() + receipt.report.cleared.len();
            print_success(&format!("{date}: saved {saved} row(s)."));
        }
    }
    Ok(())
}

async fn toggle(ctx: CommandContext, args: ToggleArgs) -> Result<()> {
    let date = ctx.date_or_today(args.date.date);
    let mut roster = ctx.roster().await?;
    let location = find_location(&roster, args.location)?;

    edit_day(&ctx, &mut roster, date, |session| {
        session.toggle_cell(args.cell.staff_id, args.cell.slot, &location)?;
        Ok(Vec::new())
    })
    .await
}

async fn clear(ctx: CommandContext, args: ClearArgs) -> Result<()> {
    let date = ctx.date_or_today(args.date.date);
    let mut roster = ctx.roster().await?;

    edit_day(&ctx, &mut roster, date, |session| {
        session.clear_cell(args.cell.staff_id, args.cell.slot)?;
        Ok(Vec::new())
    })
    .await
}

async fn relocate(ctx: CommandContext, args: MoveArgs) -> Result<()> {
    let date = ctx.date_or_today(args.date.date);
    let mut roster = ctx.roster().await?;

    edit_day(&ctx, &mut roster, date, |session| {
        if session.matrix().get(args.from.staff_id, args.from.slot).is_none() {
            return Err(CliError::NotFound(format!("No allocation at {}", args.from)).into());
        }
        session.begin_relocate(args.from)?;
        if let Err(e) = session.complete_relocate(Some(args.to)) {
            session.cancel_relocate();
            return Err(e.into());
        }
        Ok(Vec::new())
    })
    .await
}

async fn paint(ctx: CommandContext, args: PaintArgs) -> Result<()> {
    let date = ctx.date_or_today(args.date.date);
    let mut roster = ctx.roster().await?;
    let location = find_location(&roster, args.location)?;

    edit_day(&ctx, &mut roster, date, |session| {
        session.begin_paint_stroke(&location)?;
        let mut skipped = Vec::new();
        for cell in &args.cells {
            match session.paint_cell_enter(cell.staff_id, cell.slot) {
                Ok(_) => {}
                Err(e @ GridError::SlotLocked { .. }) => {
                    tracing::debug!(cell = %cell, error = %e, "skipping locked cell");
                    skipped.push(*cell);
                }
                Err(e) => {
                    session.end_paint_stroke()?;
                    return Err(e.into());
                }
            }
        }
        session.end_paint_stroke()?;
        Ok(skipped)
    })
    .await
}
