use clap::Parser;
use reqwest::Url;

use crate::{api::solaredge, prelude::*};

#[derive(Parser)]
pub struct SolarEdgeArgs {
    #[clap(long = "solaredge-api-key", env = "SOLAREDGE_API_KEY")]
    api_key: String,

    #[clap(long = "solaredge-site-id", alias = "site-id", env = "SOLAREDGE_SITE_ID")]
    pub site_id: String,

    #[clap(
        long = "solaredge-api-base-url",
        env = "SOLAREDGE_API_BASE_URL",
        default_value = solaredge::Api::DEFAULT_BASE_URL,
    )]
    base_url: Url,
}

impl SolarEdgeArgs {
    pub fn new_client(&self) -> Result<solaredge::Api> {
        solaredge::Api::new(self.api_key.clone(), self.base_url.clone())
    }
}
