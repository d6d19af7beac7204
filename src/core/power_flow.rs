use serde::{Deserialize, de::IgnoredAny};
use serde_with::{DefaultOnError, serde_as};

use crate::{
    core::outputs::{Capability, Outputs},
    prelude::*,
    quantity::power::{Kilowatts, Watts},
};

/// Instantaneous site power flow.
///
/// Every field is lenient: a malformed value is treated as absent, so that it
/// cannot take the sibling readings down with it.
#[must_use]
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerFlowSnapshot {
    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub consumption: Option<Consumption>,

    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub grid: Option<Grid>,

    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub solar_production: Option<SolarProduction>,
}

#[serde_as]
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumption {
    /// [`None`] when the field is absent.
    #[serde(default)]
    pub current_power: Option<LoadPower>,

    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum LoadPower {
    Number(Kilowatts),

    /// Reported when the site consumes nothing.
    Null,

    /// Neither a number nor `null`.
    Other(IgnoredAny),
}

#[serde_as]
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub current_power: Option<Kilowatts>,

    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub status: Option<GridStatus>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridStatus {
    Import,
    Export,

    #[serde(other)]
    Other,
}

#[serde_as]
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarProduction {
    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub current_power: Option<Kilowatts>,

    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    pub is_producing: Option<bool>,
}

/// Readings derived from a single [`PowerFlowSnapshot`].
///
/// [`None`] means «leave the reading as it is».
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PowerFlowReadings {
    pub load: Option<Watts>,

    /// Positive when importing from the grid.
    pub grid: Option<Watts>,

    /// Negative when the inverter reports that it is not producing.
    pub solar: Option<Watts>,

    pub is_available: bool,
}

impl From<&PowerFlowSnapshot> for PowerFlowReadings {
    fn from(snapshot: &PowerFlowSnapshot) -> Self {
        let consumption = snapshot.consumption.as_ref();

        let load = consumption.and_then(|consumption| {
            match consumption.current_power.as_ref()? {
                LoadPower::Number(power) => Some(Watts::from(*power)),
                LoadPower::Null => Some(Watts::zero()),
                LoadPower::Other(_) => None,
            }
        });

        let grid = snapshot.grid.as_ref().and_then(|grid| {
            let power = Watts::from(grid.current_power?);
            Some(if grid.status == Some(GridStatus::Export) { -power } else { power })
        });

        let solar = snapshot.solar_production.as_ref().and_then(|solar| {
            let power = Watts::from(solar.current_power?);
            Some(if solar.is_producing == Some(false) { -power } else { power })
        });

        Self {
            load,
            grid,
            solar,
            is_available: consumption
                .and_then(|consumption| consumption.is_active)
                .unwrap_or(false),
        }
    }
}

impl PowerFlowReadings {
    /// Publish the readings one by one, logging and swallowing any failure.
    #[instrument(skip_all)]
    pub async fn publish(&self, outputs: &dyn Outputs) {
        debug!(readings = ?self, "publishing…");

        if let Some(load) = self.load {
            outputs.set_value_or_log(Capability::Power, load.0).await;
        }
        if let Some(grid) = self.grid {
            Self::publish_lazily(outputs, Capability::GridPower, grid).await;
        }
        if let Some(solar) = self.solar {
            Self::publish_lazily(outputs, Capability::SolarPower, solar).await;
        }
        if let Err(error) = outputs.set_available(self.is_available).await {
            error!(is_available = self.is_available, "failed to update the availability: {error:#}");
        }
    }

    async fn publish_lazily(outputs: &dyn Outputs, capability: Capability, power: Watts) {
        match outputs.ensure_capability(capability).await {
            Ok(()) => outputs.set_value_or_log(capability, power.0).await,
            Err(error) => error!(%capability, "skipped the reading: {error:#}"),
        }
    }
}
