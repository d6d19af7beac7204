use std::sync::Arc;

use clap::Parser;
use reqwest::Url;

use crate::{
    api::home_assistant,
    core::outputs::{LogOutputs, Outputs},
    prelude::*,
};

#[derive(Parser)]
pub struct HomeAssistantArgs {
    /// Home Assistant API base URL. For example: `http://localhost:8123/api`.
    ///
    /// When not set, the readings only get logged.
    #[clap(long = "home-assistant-api-base-url", env = "HOME_ASSISTANT_API_BASE_URL")]
    base_url: Option<Url>,

    /// Home Assistant API access token.
    #[clap(long = "home-assistant-access-token", env = "HOME_ASSISTANT_ACCESS_TOKEN")]
    access_token: Option<String>,

    /// Entity ID prefix: `sensor.<prefix>_power` and so on.
    #[clap(long = "entity-prefix", env = "ENTITY_PREFIX", default_value = "solaredge")]
    entity_prefix: String,
}

impl HomeAssistantArgs {
    pub fn new_outputs(&self) -> Result<Arc<dyn Outputs>> {
        match (&self.base_url, &self.access_token) {
            (Some(base_url), Some(access_token)) => {
                let api = home_assistant::Api::new(access_token, base_url.clone())?;
                Ok(Arc::new(home_assistant::Outputs::new(api, self.entity_prefix.clone())))
            }
            (Some(_), None) => bail!("Home Assistant access token is required"),
            (None, _) => {
                warn!("Home Assistant is not configured, the readings will only be logged");
                Ok(Arc::new(LogOutputs::default()))
            }
        }
    }
}
