use std::{sync::Arc, time::Duration};

use bon::Builder;
use chrono::{Datelike, Local};
use clap::Parser;
use tokio::{
    signal,
    time::{MissedTickBehavior, interval},
};

use crate::{
    cli::{
        heartbeat::HeartbeatArgs,
        home_assistant::HomeAssistantArgs,
        solaredge::SolarEdgeArgs,
        store::StoreArgs,
        totals::TotalsArgs,
    },
    core::meter::Meter,
    prelude::*,
};

#[derive(Parser)]
pub struct PollArgs {
    #[clap(long, env = "POLLING_INTERVAL", default_value = "5min")]
    polling_interval: humantime::Duration,

    #[clap(flatten)]
    solaredge: SolarEdgeArgs,

    #[clap(flatten)]
    home_assistant: HomeAssistantArgs,

    #[clap(flatten)]
    store: StoreArgs,

    #[clap(flatten)]
    totals: TotalsArgs,

    #[clap(flatten)]
    heartbeat: HeartbeatArgs,
}

impl PollArgs {
    pub async fn run(self) -> Result {
        let meter = Meter::builder()
            .site_id(self.solaredge.site_id.as_str())
            .monitoring(Arc::new(self.solaredge.new_client()?))
            .store(Arc::new(self.store.open()?))
            .outputs(self.home_assistant.new_outputs()?)
            .throttle(self.totals.throttle())
            .earliest_year(self.totals.earliest_year)
            .build();
        Poller::builder()
            .meter(meter)
            .interval(self.polling_interval)
            .heartbeat(self.heartbeat)
            .build()
            .run()
            .await
    }
}

#[derive(Builder)]
struct Poller {
    meter: Meter,
    heartbeat: HeartbeatArgs,

    #[builder(into)]
    interval: Duration,
}

impl Poller {
    async fn run(self) -> Result {
        info!(interval = ?self.interval, "polling…");
        let mut interval = interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = signal::ctrl_c() => {
                    result.context("failed to listen for the interrupt signal")?;
                    info!("interrupted");
                    return Ok(());
                }
                _ = interval.tick() => {}
            }

            match self.meter.poll(Local::now().year()).await {
                Ok(_) => self.heartbeat.send().await,
                Err(error) => error!("poll failed: {error:#}"),
            }
        }
    }
}
