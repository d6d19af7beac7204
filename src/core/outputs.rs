use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;

use crate::prelude::*;

/// Named reading exposed to the host platform.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, derive_more::Display)]
pub enum Capability {
    /// Household consumption, W.
    #[display("measure_power")]
    Power,

    /// Grid power, W. Positive when importing.
    #[display("measure_power.grid")]
    GridPower,

    /// Solar production, W.
    #[display("measure_power.solar")]
    SolarPower,

    /// Lifetime imported energy, kWh.
    #[display("meter_power.imported")]
    ImportedEnergy,

    /// Lifetime exported energy, kWh.
    #[display("meter_power.exported")]
    ExportedEnergy,
}

impl Capability {
    /// Capabilities that every meter has from the start.
    pub const BASE: [Self; 3] = [Self::Power, Self::ImportedEnergy, Self::ExportedEnergy];
}

#[async_trait]
pub trait Outputs: Send + Sync {
    async fn set_value(&self, capability: Capability, value: i64) -> Result;

    fn has_capability(&self, capability: Capability) -> bool;

    async fn add_capability(&self, capability: Capability) -> Result;

    async fn set_available(&self, is_available: bool) -> Result;

    /// Set the value and log a failure instead of returning it.
    async fn set_value_or_log(&self, capability: Capability, value: i64) {
        if let Err(error) = self.set_value(capability, value).await {
            error!(%capability, value, "failed to publish the reading: {error:#}");
        }
    }

    /// Make sure the capability exists, adding it when needed.
    async fn ensure_capability(&self, capability: Capability) -> Result {
        if !self.has_capability(capability) {
            self.add_capability(capability)
                .await
                .with_context(|| format!("failed to add `{capability}`"))?;
        }
        Ok(())
    }
}

/// Outputs that only go to the log.
pub struct LogOutputs {
    capabilities: Mutex<HashSet<Capability>>,
}

impl Default for LogOutputs {
    fn default() -> Self {
        Self { capabilities: Mutex::new(Capability::BASE.into_iter().collect()) }
    }
}

#[async_trait]
impl Outputs for LogOutputs {
    async fn set_value(&self, capability: Capability, value: i64) -> Result {
        info!(%capability, value, "reading");
        Ok(())
    }

    fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.lock().is_ok_and(|capabilities| capabilities.contains(&capability))
    }

    async fn add_capability(&self, capability: Capability) -> Result {
        info!(%capability, "adding the capability…");
        self.capabilities
            .lock()
            .map_err(|_| anyhow!("the capability set is poisoned"))?
            .insert(capability);
        Ok(())
    }

    async fn set_available(&self, is_available: bool) -> Result {
        info!(is_available, "availability");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::GridPower.to_string(), "measure_power.grid");
        assert_eq!(Capability::ImportedEnergy.to_string(), "meter_power.imported");
    }

    #[tokio::test]
    async fn test_log_outputs_capabilities() -> Result {
        let outputs = LogOutputs::default();
        assert!(outputs.has_capability(Capability::Power));
        assert!(!outputs.has_capability(Capability::SolarPower));
        outputs.ensure_capability(Capability::SolarPower).await?;
        assert!(outputs.has_capability(Capability::SolarPower));
        Ok(())
    }
}
