use std::sync::Arc;

use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};

use crate::{
    cli::{solaredge::SolarEdgeArgs, store::StoreArgs, totals::TotalsArgs},
    core::{
        monitoring::{Monitoring, calendar_year},
        outputs::LogOutputs,
        power_flow::PowerFlowReadings,
        yearly_totals::{YearRecord, YearlyTotals},
    },
    prelude::*,
    tables::{build_power_flow_table, build_year_records_table},
};

#[derive(Parser)]
pub struct BurrowArgs {
    #[command(subcommand)]
    command: BurrowCommand,
}

impl BurrowArgs {
    pub async fn run(self) -> Result {
        match self.command {
            BurrowCommand::PowerFlow(args) => args.run().await,
            BurrowCommand::Summary(args) => args.run().await,
            BurrowCommand::Store(args) => args.run(),
            BurrowCommand::Totals(args) => args.run().await,
        }
    }
}

#[derive(Subcommand)]
pub enum BurrowCommand {
    /// Fetch the current power flow and show the readings.
    PowerFlow(BurrowPowerFlowArgs),

    /// Fetch the energy summary of a single year.
    Summary(BurrowSummaryArgs),

    /// Show the cached yearly measurements.
    Store(BurrowStoreArgs),

    /// Accumulate the lifetime totals without publishing them.
    Totals(BurrowTotalsArgs),
}

#[derive(Parser)]
pub struct BurrowPowerFlowArgs {
    #[clap(flatten)]
    solaredge: SolarEdgeArgs,
}

impl BurrowPowerFlowArgs {
    async fn run(self) -> Result {
        let snapshot = self.solaredge.new_client()?.get_power_flow(&self.solaredge.site_id).await?;
        debug!(?snapshot, "gotcha");
        println!("{}", build_power_flow_table(&PowerFlowReadings::from(&snapshot)));
        Ok(())
    }
}

#[derive(Parser)]
pub struct BurrowSummaryArgs {
    #[clap(flatten)]
    solaredge: SolarEdgeArgs,

    /// Defaults to the current year.
    #[clap(long)]
    year: Option<i32>,
}

impl BurrowSummaryArgs {
    async fn run(self) -> Result {
        let year = self.year.unwrap_or_else(|| Local::now().year());
        let summary = self
            .solaredge
            .new_client()?
            .get_energy_summary(&self.solaredge.site_id, calendar_year(year)?)
            .await?;
        let record = summary.map_or(YearRecord::Missing, YearRecord::from);
        println!("{}", build_year_records_table([(year, record)]));
        Ok(())
    }
}

#[derive(Parser)]
pub struct BurrowStoreArgs {
    #[clap(flatten)]
    store: StoreArgs,
}

impl BurrowStoreArgs {
    fn run(self) -> Result {
        let entries = self.store.open()?.entries()?;
        let records = entries.into_iter().filter_map(|(key, value)| {
            let year = key.strip_prefix("measurements-")?.parse::<i32>().ok()?;
            match serde_json::from_value::<YearRecord>(value) {
                Ok(record) => Some((year, record)),
                Err(error) => {
                    warn!(%key, "malformed record: {error:#}");
                    None
                }
            }
        });
        println!("{}", build_year_records_table(records));
        Ok(())
    }
}

#[derive(Parser)]
pub struct BurrowTotalsArgs {
    #[clap(flatten)]
    solaredge: SolarEdgeArgs,

    #[clap(flatten)]
    store: StoreArgs,

    #[clap(flatten)]
    totals: TotalsArgs,
}

impl BurrowTotalsArgs {
    async fn run(self) -> Result {
        let totals = YearlyTotals::builder()
            .site_id(self.solaredge.site_id.as_str())
            .monitoring(Arc::new(self.solaredge.new_client()?))
            .store(Arc::new(self.store.open()?))
            .outputs(Arc::new(LogOutputs::default()))
            .throttle(self.totals.throttle())
            .earliest_year(self.totals.earliest_year)
            .build()
            .accumulate(Local::now().year())
            .await?;
        info!(imported = %totals.imported, exported = %totals.exported, "gotcha");
        Ok(())
    }
}
