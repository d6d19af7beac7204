mod burrow;
mod heartbeat;
mod home_assistant;
mod poll;
mod solaredge;
mod store;
mod totals;

use clap::{Parser, Subcommand};

use crate::{
    cli::{burrow::BurrowArgs, poll::PollArgs},
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: poll the site and publish the readings.
    #[clap(name = "poll")]
    Poll(Box<PollArgs>),

    /// Development tools.
    #[clap(name = "burrow")]
    Burrow(Box<BurrowArgs>),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Poll(args) => args.run().await,
            Self::Burrow(args) => args.run().await,
        }
    }
}
