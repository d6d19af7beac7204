use serde::Deserialize;

use crate::core::{monitoring::EnergySummary, power_flow::PowerFlowSnapshot};

/// Power flow, either bare or wrapped into `siteCurrentPowerFlow`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum PowerFlowResponse {
    Wrapped {
        #[serde(rename = "siteCurrentPowerFlow")]
        snapshot: PowerFlowSnapshot,
    },
    Bare(PowerFlowSnapshot),
}

impl From<PowerFlowResponse> for PowerFlowSnapshot {
    fn from(response: PowerFlowResponse) -> Self {
        match response {
            PowerFlowResponse::Wrapped { snapshot } | PowerFlowResponse::Bare(snapshot) => snapshot,
        }
    }
}

#[derive(Deserialize)]
pub struct MeasurementsResponse {
    /// Empty when there is no data for the requested period.
    #[serde(default)]
    pub summary: Option<EnergySummary>,
}
