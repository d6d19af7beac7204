use std::path::PathBuf;

use clap::Parser;

use crate::{prelude::*, store::FileStore};

#[derive(Parser)]
pub struct StoreArgs {
    /// Cached yearly measurements.
    #[clap(long = "store-path", env = "STORE_PATH", default_value = "solaredge-meter.toml")]
    path: PathBuf,
}

impl StoreArgs {
    pub fn open(&self) -> Result<FileStore> {
        FileStore::open(&self.path)
    }
}
