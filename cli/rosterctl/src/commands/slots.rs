//! Slot catalog listing.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use roster_grid::LockPolicy;
use serde::Serialize;
use tabled::Tabled;

use crate::output::print_output;

use super::CommandContext;

/// Show the configured time slots and whether each is still editable.
#[derive(Debug, Args)]
pub struct SlotsCommand {
    /// Date to evaluate locks for (defaults to today).
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct SlotLine {
    #[tabled(rename = "Slot")]
    slot: String,

    #[tabled(rename = "Label")]
    label: String,

    #[tabled(rename = "Locked")]
    locked: bool,
}

impl SlotsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let catalog = ctx.catalog()?;
        let date = ctx.date_or_today(self.date);
        let now = ctx.clock.now();

        let lines: Vec<SlotLine> = catalog
            .iter()
            .map(|slot| SlotLine {
                slot: slot.field.to_string(),
                label: slot.label.clone(),
                locked: LockPolicy::is_locked(date, slot.field, now),
            })
            .collect();

        print_output(&lines, ctx.format);
        Ok(())
    }
}
