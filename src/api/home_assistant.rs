//! Home Assistant REST API as the host platform for the meter readings.

use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Url};
use serde::Serialize;

use crate::{
    core::outputs::{Capability, Outputs as OutputsTrait},
    prelude::*,
};

pub struct Api {
    client: Client,
    base_url: Url,
}

impl Api {
    pub fn new(access_token: &str, base_url: Url) -> Result<Self> {
        let headers = HeaderMap::from_iter([(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&format!("Bearer {access_token}"))?,
        )]);
        let client = ClientBuilder::new()
            .user_agent("solaredge-meter")
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url })
    }

    #[instrument(skip_all, fields(entity_id = entity_id, state = state.state))]
    pub async fn set_state(&self, entity_id: &str, state: &State<'_>) -> Result {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid base URL"))?
            .pop_if_empty()
            .push("states")
            .push(entity_id);
        self.client
            .post(url)
            .json(state)
            .send()
            .await
            .with_context(|| format!("failed to set `{entity_id}`"))?
            .error_for_status()
            .with_context(|| format!("setting `{entity_id}` failed"))?;
        debug!("updated");
        Ok(())
    }
}

#[must_use]
#[derive(Serialize)]
pub struct State<'a> {
    pub state: &'a str,
    pub attributes: Attributes<'a>,
}

#[must_use]
#[derive(Serialize)]
pub struct Attributes<'a> {
    pub friendly_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<&'static str>,

    pub device_class: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'a str>,
}

/// Static description of the entity behind a capability.
struct Entity {
    suffix: &'static str,
    name: &'static str,
    unit: &'static str,
    device_class: &'static str,
    state_class: &'static str,
}

impl From<Capability> for Entity {
    fn from(capability: Capability) -> Self {
        let (suffix, name) = match capability {
            Capability::Power => ("power", "power"),
            Capability::GridPower => ("grid_power", "grid power"),
            Capability::SolarPower => ("solar_power", "solar power"),
            Capability::ImportedEnergy => ("imported_energy", "imported energy"),
            Capability::ExportedEnergy => ("exported_energy", "exported energy"),
        };
        match capability {
            Capability::Power | Capability::GridPower | Capability::SolarPower => Self {
                suffix,
                name,
                unit: "W",
                device_class: "power",
                state_class: "measurement",
            },
            Capability::ImportedEnergy | Capability::ExportedEnergy => Self {
                suffix,
                name,
                unit: "kWh",
                device_class: "energy",
                state_class: "total_increasing",
            },
        }
    }
}

/// Meter outputs published as Home Assistant entities.
pub struct Outputs {
    api: Api,

    /// Entity ID prefix, for example `solaredge`.
    prefix: String,

    capabilities: Mutex<HashSet<Capability>>,
}

impl Outputs {
    pub fn new(api: Api, prefix: String) -> Self {
        Self { api, prefix, capabilities: Mutex::new(Capability::BASE.into_iter().collect()) }
    }

    fn entity_id(&self, capability: Capability) -> String {
        format!("sensor.{}_{}", self.prefix, Entity::from(capability).suffix)
    }

    fn availability_entity_id(&self) -> String {
        format!("binary_sensor.{}_available", self.prefix)
    }
}

#[async_trait]
impl OutputsTrait for Outputs {
    async fn set_value(&self, capability: Capability, value: i64) -> Result {
        ensure!(self.has_capability(capability), "`{capability}` is not registered");
        let entity = Entity::from(capability);
        let state = value.to_string();
        let state = State {
            state: &state,
            attributes: Attributes {
                friendly_name: format!("{} {}", self.prefix, entity.name),
                unit_of_measurement: Some(entity.unit),
                device_class: entity.device_class,
                state_class: Some(entity.state_class),
                icon: None,
            },
        };
        self.api.set_state(&self.entity_id(capability), &state).await
    }

    fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.lock().is_ok_and(|capabilities| capabilities.contains(&capability))
    }

    async fn add_capability(&self, capability: Capability) -> Result {
        info!(%capability, entity_id = %self.entity_id(capability), "adding the capability…");
        self.capabilities
            .lock()
            .map_err(|_| anyhow!("the capability set is poisoned"))?
            .insert(capability);
        Ok(())
    }

    async fn set_available(&self, is_available: bool) -> Result {
        let state = State {
            state: if is_available { "on" } else { "off" },
            attributes: Attributes {
                friendly_name: format!("{} available", self.prefix),
                unit_of_measurement: None,
                device_class: "connectivity",
                state_class: None,
                icon: Some("mdi:solar-power"),
            },
        };
        self.api.set_state(&self.availability_entity_id(), &state).await
    }
}
