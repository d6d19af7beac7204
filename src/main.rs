#![allow(clippy::doc_markdown)]

mod api;
mod cli;
mod core;
mod prelude;
mod quantity;
mod store;
mod tables;
#[cfg(test)]
mod testing;

use clap::{Parser, crate_version};

use crate::{cli::Args, prelude::*};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    Args::parse().command.run().await?;

    info!("done!");
    Ok(())
}
